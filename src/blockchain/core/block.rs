use crate::crypto::SignatureScheme;
use crate::error::ChainError;
use crate::miner::{
    meets_difficulty, search_nonce, validate_difficulty, BlockTemplate, MiningControl,
    INITIAL_NONCE,
};
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

/// Fixed creation time of every genesis block (2023-01-01T00:00:00Z, millis).
pub const GENESIS_TIMESTAMP: u64 = 1672531200000;

/// A clock set before the epoch stamps 0 rather than wrapping.
fn unix_millis(millis: i64) -> u64 {
    u64::try_from(millis).unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub transactions: Vec<Transaction>,
    pub previous_hash: String,
    pub timestamp: u64,
    pub nonce: u64,
    pub hash: String,
}

impl Block {
    /// Creates an unsealed block. The hash is computed right away for the
    /// initial nonce; call [`Block::mine`] to meet a difficulty target.
    pub fn new(transactions: Vec<Transaction>, previous_hash: impl Into<String>) -> Self {
        let timestamp = unix_millis(chrono::Utc::now().timestamp_millis());
        Self::with_timestamp(transactions, previous_hash.into(), timestamp)
    }

    /// The unmined first block: no transactions, empty previous hash.
    pub fn genesis() -> Self {
        Self::with_timestamp(Vec::new(), String::new(), GENESIS_TIMESTAMP)
    }

    fn with_timestamp(
        transactions: Vec<Transaction>,
        previous_hash: String,
        timestamp: u64,
    ) -> Self {
        let mut block = Block {
            transactions,
            previous_hash,
            timestamp,
            nonce: INITIAL_NONCE,
            hash: String::new(),
        };
        block.hash = block.compute_hash();
        block
    }

    pub fn template(&self) -> BlockTemplate {
        let mut prefix = Sha256::new();
        prefix.update((self.transactions.len() as u64).to_le_bytes());
        for tx in &self.transactions {
            tx.update_block_hasher(&mut prefix);
        }
        prefix.update((self.previous_hash.len() as u64).to_le_bytes());
        prefix.update(self.previous_hash.as_bytes());
        BlockTemplate::new(prefix, self.timestamp)
    }

    pub fn compute_hash(&self) -> String {
        self.template().hash_with_nonce(self.nonce)
    }

    /// True when the stored hash matches the content and meets `difficulty`.
    pub fn is_sealed(&self, difficulty: u32) -> bool {
        self.hash == self.compute_hash() && meets_difficulty(&self.hash, difficulty)
    }

    /// Batch check: false on the first transaction that is not valid.
    pub fn validate_transactions(&self, scheme: &dyn SignatureScheme) -> bool {
        for tx in &self.transactions {
            match tx.is_valid(scheme) {
                Ok(true) => {}
                Ok(false) => {
                    warn!("Invalid signature on transaction {}", tx.hash_str());
                    return false;
                }
                Err(e) => {
                    warn!("Rejecting transaction {}: {}", tx.hash_str(), e);
                    return false;
                }
            }
        }
        true
    }

    /// Searches nonces until the hash meets `difficulty`. Unbounded.
    pub fn mine(
        &mut self,
        difficulty: u32,
        scheme: &dyn SignatureScheme,
    ) -> Result<(), ChainError> {
        self.mine_with(difficulty, scheme, &MiningControl::unbounded())
    }

    /// Like [`Block::mine`], checking `control` between nonce batches. On any
    /// error the block keeps its unsealed nonce and hash.
    pub fn mine_with(
        &mut self,
        difficulty: u32,
        scheme: &dyn SignatureScheme,
        control: &MiningControl,
    ) -> Result<(), ChainError> {
        validate_difficulty(difficulty)?;
        if !self.validate_transactions(scheme) {
            return Err(ChainError::MiningAborted(
                "tampered or unsigned transactions found in candidate block".to_string(),
            ));
        }

        let template = self.template();
        let batch_size = control.batch_size.max(1);
        let mut start = self.nonce;

        loop {
            if let Some(reason) = control.stop_reason() {
                debug!("Stopping nonce search at {}: {}", start, reason);
                return Err(ChainError::MiningInterrupted(format!(
                    "{} after {} attempts",
                    reason,
                    start - self.nonce
                )));
            }

            let end = start.saturating_add(batch_size);
            if let Some(solution) = search_nonce(&template, difficulty, start..end) {
                info!(
                    "Block mined: hash {} nonce {} ({} attempts)",
                    solution.hash,
                    solution.nonce,
                    solution.nonce - self.nonce + 1
                );
                self.nonce = solution.nonce;
                self.hash = solution.hash;
                return Ok(());
            }

            if end == u64::MAX {
                return Err(ChainError::MiningInterrupted(
                    "nonce space exhausted".to_string(),
                ));
            }
            start = end;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Secp256k1Scheme;
    use crate::miner::CancellationToken;
    use crate::transaction::{CoinbaseTx, TransferDraft};

    fn signed_block(scheme: &Secp256k1Scheme) -> Block {
        let alice = scheme.generate_keypair();
        let bob = scheme.generate_keypair();
        let transfer = TransferDraft::new(alice.public_key_hex(), bob.public_key_hex(), 10)
            .sign(scheme, &alice)
            .unwrap();
        Block::new(
            vec![transfer.into(), CoinbaseTx::new(bob.public_key_hex(), 50).into()],
            "previous",
        )
    }

    #[test]
    fn test_new_block_starts_at_initial_nonce() {
        let block = Block::new(vec![], "prev");
        assert_eq!(block.nonce, INITIAL_NONCE);
        assert_eq!(block.hash, block.compute_hash());
        assert_eq!(block.hash.len(), 64);
    }

    #[test]
    fn test_pre_epoch_clock_does_not_wrap() {
        assert_eq!(unix_millis(-1), 0);
        assert_eq!(unix_millis(i64::MIN), 0);
        assert_eq!(unix_millis(GENESIS_TIMESTAMP as i64), GENESIS_TIMESTAMP);
    }

    #[test]
    fn test_compute_hash_is_idempotent() {
        let scheme = Secp256k1Scheme::new();
        let block = signed_block(&scheme);
        assert_eq!(block.compute_hash(), block.compute_hash());
    }

    #[test]
    fn test_genesis_is_reproducible() {
        let genesis = Block::genesis();
        assert_eq!(genesis, Block::genesis());
        assert!(genesis.previous_hash.is_empty());
        assert!(genesis.transactions.is_empty());
    }

    #[test]
    fn test_mine_meets_target_and_keeps_timestamp() {
        let scheme = Secp256k1Scheme::new();
        let mut block = signed_block(&scheme);
        let timestamp = block.timestamp;

        block.mine(2, &scheme).unwrap();

        assert!(block.hash.starts_with("00"));
        assert_eq!(block.hash, block.compute_hash());
        assert_eq!(block.timestamp, timestamp);
        assert!(block.is_sealed(2));
    }

    #[test]
    fn test_hash_changes_with_any_content() {
        let scheme = Secp256k1Scheme::new();
        let block = signed_block(&scheme);

        let mut nonce = block.clone();
        nonce.nonce += 1;
        assert_ne!(nonce.compute_hash(), block.hash);

        let mut previous = block.clone();
        previous.previous_hash.push('x');
        assert_ne!(previous.compute_hash(), block.hash);

        let mut reordered = block.clone();
        reordered.transactions.reverse();
        assert_ne!(reordered.compute_hash(), block.hash);

        let mut signature = block.clone();
        if let Transaction::Transfer(tx) = &mut signature.transactions[0] {
            tx.signature = Some("00".to_string());
        }
        assert_ne!(signature.compute_hash(), block.hash);
    }

    #[test]
    fn test_validate_transactions_detects_tampering() {
        let scheme = Secp256k1Scheme::new();
        let mut block = signed_block(&scheme);
        assert!(block.validate_transactions(&scheme));

        if let Transaction::Transfer(tx) = &mut block.transactions[0] {
            tx.amount = 1_000;
        }
        assert!(!block.validate_transactions(&scheme));
    }

    #[test]
    fn test_mine_aborts_on_invalid_transaction() {
        let scheme = Secp256k1Scheme::new();
        let unsigned = TransferDraft::new("alice", "bob", 1).into_unsigned();
        let mut block = Block::new(vec![unsigned.into()], "prev");
        let before = block.clone();

        let result = block.mine(1, &scheme);
        assert!(matches!(result, Err(ChainError::MiningAborted(_))));
        assert_eq!(block, before);
    }

    #[test]
    fn test_mine_rejects_zero_difficulty() {
        let scheme = Secp256k1Scheme::new();
        let mut block = Block::new(vec![], "prev");
        assert!(matches!(
            block.mine(0, &scheme),
            Err(ChainError::InvalidDifficulty(_))
        ));
    }

    #[test]
    fn test_cancelled_mining_leaves_block_unsealed() {
        let scheme = Secp256k1Scheme::new();
        let mut block = Block::new(vec![], "prev");
        let before = block.clone();

        let token = CancellationToken::new();
        token.cancel();
        let control = MiningControl::unbounded().with_cancellation(token);

        let result = block.mine_with(8, &scheme, &control);
        assert!(matches!(result, Err(ChainError::MiningInterrupted(_))));
        assert_eq!(block, before);
    }

    #[test]
    fn test_small_batches_find_same_nonce() {
        let scheme = Secp256k1Scheme::new();
        let mut whole = Block::new(vec![], "prev");
        let mut batched = whole.clone();

        whole.mine(2, &scheme).unwrap();
        batched
            .mine_with(2, &scheme, &MiningControl::unbounded().with_batch_size(3))
            .unwrap();
        assert_eq!(whole.nonce, batched.nonce);
        assert_eq!(whole.hash, batched.hash);
    }
}
