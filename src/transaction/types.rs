/// Transaction types for LedgerChain
use crate::crypto::{KeyPair, Sha256Hash, SignatureScheme};
use crate::error::ChainError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A transaction that can occur in a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transaction {
    Transfer(TransferTx),
    Coinbase(CoinbaseTx),
}

impl Transaction {
    /// Content hash over the semantic fields. The signature is not included.
    pub fn content_hash(&self) -> Sha256Hash {
        match self {
            Transaction::Transfer(tx) => tx.content_hash(),
            Transaction::Coinbase(tx) => tx.content_hash(),
        }
    }

    pub fn hash_str(&self) -> String {
        hex::encode(self.content_hash())
    }

    pub fn to(&self) -> &str {
        match self {
            Transaction::Transfer(tx) => &tx.to,
            Transaction::Coinbase(tx) => &tx.to,
        }
    }

    pub fn amount(&self) -> u64 {
        match self {
            Transaction::Transfer(tx) => tx.amount,
            Transaction::Coinbase(tx) => tx.amount,
        }
    }

    pub fn is_coinbase(&self) -> bool {
        matches!(self, Transaction::Coinbase(_))
    }

    /// Feeds the canonical encoding of this transaction into a block hasher.
    /// Every field is length-prefixed, the signature included, so editing any
    /// of them (or reordering transactions) changes the block hash.
    pub fn update_block_hasher(&self, hasher: &mut Sha256) {
        match self {
            Transaction::Transfer(tx) => {
                hasher.update(b"transfer");
                update_field(hasher, tx.from.as_bytes());
                update_field(hasher, tx.to.as_bytes());
                hasher.update(tx.amount.to_le_bytes());
                match &tx.signature {
                    Some(signature) => {
                        hasher.update([1u8]);
                        update_field(hasher, signature.as_bytes());
                    }
                    None => hasher.update([0u8]),
                }
            }
            Transaction::Coinbase(tx) => {
                hasher.update(b"coinbase");
                update_field(hasher, tx.to.as_bytes());
                hasher.update(tx.amount.to_le_bytes());
            }
        }
    }
}

impl From<TransferTx> for Transaction {
    fn from(tx: TransferTx) -> Self {
        Transaction::Transfer(tx)
    }
}

impl From<CoinbaseTx> for Transaction {
    fn from(tx: CoinbaseTx) -> Self {
        Transaction::Coinbase(tx)
    }
}

fn update_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

fn transfer_content_hash(from: &str, to: &str, amount: u64) -> Sha256Hash {
    let mut hasher = Sha256::new();
    update_field(&mut hasher, from.as_bytes());
    update_field(&mut hasher, to.as_bytes());
    hasher.update(amount.to_le_bytes());
    hasher.finalize().into()
}

/// Unsigned transfer under construction. Fields may be edited freely until
/// [`TransferDraft::sign`] turns the draft into an immutable [`TransferTx`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferDraft {
    pub from: String,
    pub to: String,
    pub amount: u64,
}

impl TransferDraft {
    pub fn new(from: impl Into<String>, to: impl Into<String>, amount: u64) -> Self {
        TransferDraft {
            from: from.into(),
            to: to.into(),
            amount,
        }
    }

    pub fn content_hash(&self) -> Sha256Hash {
        transfer_content_hash(&self.from, &self.to, self.amount)
    }

    /// Signs the content hash with `keypair`. Whether the key actually belongs
    /// to `from` is not checked here; a mismatch shows up as an invalid signature.
    pub fn sign(
        self,
        scheme: &dyn SignatureScheme,
        keypair: &KeyPair,
    ) -> Result<TransferTx, ChainError> {
        let signature = scheme.sign(&self.content_hash(), keypair)?;
        Ok(TransferTx {
            from: self.from,
            to: self.to,
            amount: self.amount,
            signature: Some(signature),
        })
    }

    /// Finishes the draft without a signature. The result is rejected with
    /// `MissingSignature` wherever validity is checked.
    pub fn into_unsigned(self) -> TransferTx {
        TransferTx {
            from: self.from,
            to: self.to,
            amount: self.amount,
            signature: None,
        }
    }
}

/// Transfer between two public-key identifiers. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferTx {
    pub(crate) from: String,
    pub(crate) to: String,
    pub(crate) amount: u64,
    #[serde(default)]
    pub(crate) signature: Option<String>,
}

impl TransferTx {
    pub fn from(&self) -> &str {
        &self.from
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    pub fn content_hash(&self) -> Sha256Hash {
        transfer_content_hash(&self.from, &self.to, self.amount)
    }
}

/// Coinbase transaction: miner reward minted by the chain itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinbaseTx {
    pub to: String,
    pub amount: u64,
}

impl CoinbaseTx {
    pub fn new(to: impl Into<String>, amount: u64) -> Self {
        CoinbaseTx {
            to: to.into(),
            amount,
        }
    }

    pub fn content_hash(&self) -> Sha256Hash {
        let mut hasher = Sha256::new();
        hasher.update(b"coinbase");
        update_field(&mut hasher, self.to.as_bytes());
        hasher.update(self.amount.to_le_bytes());
        hasher.finalize().into()
    }
}
