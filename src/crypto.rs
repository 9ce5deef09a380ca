//! Cryptographic primitives for LedgerChain
//!
//! Signing and verification go through the [`SignatureScheme`] trait. The concrete
//! [`Secp256k1Scheme`] owns its curve context, so independent chains (or tests) can each
//! carry their own scheme instead of sharing process-wide state.

use crate::error::ChainError;
use rand::rngs::OsRng;
use secp256k1::{
    constants::SECRET_KEY_SIZE, ecdsa::Signature, All, Message, PublicKey, Secp256k1, SecretKey,
};
use sha2::{Digest, Sha256};

/// Raw SHA-256 digest.
pub type Sha256Hash = [u8; 32];

/// Name of the only curve this crate signs with.
pub const CURVE_NAME: &str = "secp256k1";

/// Hashes arbitrary bytes with SHA-256.
pub fn sha256(data: &[u8]) -> Sha256Hash {
    Sha256::digest(data).into()
}

#[derive(Debug, Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Hex-encoded compressed public key. This is the identifier used in
    /// a transfer's `from` and `to` fields.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key.serialize())
    }

    pub fn secret_key_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }
}

/// Sign/verify operations over 32-byte content hashes.
pub trait SignatureScheme: Send + Sync {
    fn curve_name(&self) -> &'static str;

    /// Signs `digest` and returns the hex-encoded signature.
    fn sign(&self, digest: &Sha256Hash, keypair: &KeyPair) -> Result<String, ChainError>;

    /// Returns true iff `signature_hex` is a valid signature over `digest` by
    /// `public_key_hex`. Malformed input is reported as `false`, never as an error.
    fn verify(&self, digest: &Sha256Hash, signature_hex: &str, public_key_hex: &str) -> bool;
}

/// ECDSA over secp256k1 with RFC 6979 nonces and hex-encoded DER signatures.
#[derive(Debug, Clone)]
pub struct Secp256k1Scheme {
    context: Secp256k1<All>,
}

impl Default for Secp256k1Scheme {
    fn default() -> Self {
        Self::new()
    }
}

impl Secp256k1Scheme {
    pub fn new() -> Self {
        Self::with_context(Secp256k1::new())
    }

    pub fn with_context(context: Secp256k1<All>) -> Self {
        Secp256k1Scheme { context }
    }

    /// Generates a new random KeyPair using the OS random number generator.
    pub fn generate_keypair(&self) -> KeyPair {
        let secret_key = SecretKey::new(&mut OsRng);
        self.keypair_from_secret_key(secret_key)
    }

    pub fn keypair_from_secret_key(&self, secret_key: SecretKey) -> KeyPair {
        let public_key = PublicKey::from_secret_key(&self.context, &secret_key);
        KeyPair {
            secret_key,
            public_key,
        }
    }

    /// Creates a KeyPair from raw secret key bytes.
    pub fn keypair_from_secret_bytes(&self, bytes: &[u8]) -> Result<KeyPair, ChainError> {
        let secret_key = SecretKey::from_slice(bytes).map_err(|e| {
            if bytes.len() != SECRET_KEY_SIZE {
                ChainError::CryptoError(format!(
                    "Secret key must be {} bytes, got {}",
                    SECRET_KEY_SIZE,
                    bytes.len()
                ))
            } else {
                ChainError::CryptoError(format!("Invalid secret key bytes: {}", e))
            }
        })?;

        Ok(self.keypair_from_secret_key(secret_key))
    }

    pub fn keypair_from_secret_hex(&self, secret_hex: &str) -> Result<KeyPair, ChainError> {
        let bytes = hex::decode(secret_hex)
            .map_err(|e| ChainError::CryptoError(format!("Invalid hex secret key: {}", e)))?;
        self.keypair_from_secret_bytes(&bytes)
    }
}

impl SignatureScheme for Secp256k1Scheme {
    fn curve_name(&self) -> &'static str {
        CURVE_NAME
    }

    fn sign(&self, digest: &Sha256Hash, keypair: &KeyPair) -> Result<String, ChainError> {
        let message = Message::from_digest(*digest);
        let signature = self.context.sign_ecdsa(&message, &keypair.secret_key);
        Ok(hex::encode(&*signature.serialize_der()))
    }

    fn verify(&self, digest: &Sha256Hash, signature_hex: &str, public_key_hex: &str) -> bool {
        let Ok(public_key_bytes) = hex::decode(public_key_hex) else {
            return false;
        };
        let Ok(public_key) = PublicKey::from_slice(&public_key_bytes) else {
            return false;
        };
        let Ok(signature_bytes) = hex::decode(signature_hex) else {
            return false;
        };
        let Ok(mut signature) = Signature::from_der(&signature_bytes) else {
            return false;
        };
        // libsecp256k1 only accepts low-S; signatures from other signers may be high-S.
        signature.normalize_s();

        let message = Message::from_digest(*digest);
        self.context
            .verify_ecdsa(&message, &signature, &public_key)
            .is_ok()
    }
}
