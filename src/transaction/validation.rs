/// Validation logic for transactions separated from type definitions
use crate::crypto::SignatureScheme;
use crate::error::ChainError;
use crate::transaction::types::{Transaction, TransferTx};

impl Transaction {
    /// Signature check. Coinbase transactions are minted by the chain and
    /// always pass; transfers must carry a signature by `from`.
    pub fn is_valid(&self, scheme: &dyn SignatureScheme) -> Result<bool, ChainError> {
        match self {
            Transaction::Coinbase(_) => Ok(true),
            Transaction::Transfer(tx) => tx.is_valid(scheme),
        }
    }

    /// Structural checks applied before a transaction may enter the pool.
    pub fn validate_fields(&self) -> Result<(), ChainError> {
        match self {
            Transaction::Coinbase(_) => Err(ChainError::InvalidTransaction(
                "coinbase transactions are minted by the chain and cannot be submitted".to_string(),
            )),
            Transaction::Transfer(tx) => tx.validate_fields(),
        }
    }
}

impl TransferTx {
    pub fn is_valid(&self, scheme: &dyn SignatureScheme) -> Result<bool, ChainError> {
        let signature = self
            .signature()
            .ok_or_else(|| ChainError::MissingSignature(hex::encode(self.content_hash())))?;

        Ok(scheme.verify(&self.content_hash(), signature, self.from()))
    }

    pub fn validate_fields(&self) -> Result<(), ChainError> {
        if self.from().is_empty() {
            return Err(ChainError::InvalidTransaction(
                "sender address cannot be empty".to_string(),
            ));
        }
        if self.to().is_empty() {
            return Err(ChainError::InvalidTransaction(
                "recipient address cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}
