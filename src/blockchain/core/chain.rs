use crate::blockchain::core::block::Block;
use crate::blockchain::core::validation::{validate_chain, validate_submission};
use crate::config::ChainConfig;
use crate::crypto::{Secp256k1Scheme, SignatureScheme};
use crate::error::ChainError;
use crate::miner::{validate_difficulty, MiningControl};
use crate::transaction::{CoinbaseTx, Transaction};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Single-node ledger: the sealed blocks, the pending pool and the mining policy.
///
/// Calls are expected to be sequential. A caller sharing one chain between
/// threads must guard it with a single lock so pool intake and mining never
/// interleave.
#[derive(Clone)]
pub struct Blockchain {
    blocks: Vec<Block>,
    transaction_pool: Vec<Transaction>,
    miner_reward: u64,
    difficulty: u32,
    scheme: Arc<dyn SignatureScheme>,
}

impl fmt::Debug for Blockchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blockchain")
            .field("blocks", &self.blocks.len())
            .field("transaction_pool", &self.transaction_pool.len())
            .field("miner_reward", &self.miner_reward)
            .field("difficulty", &self.difficulty)
            .field("curve", &self.scheme.curve_name())
            .finish()
    }
}

impl Blockchain {
    /// Create a new `Blockchain` with the default reward and a secp256k1 scheme.
    pub fn new(difficulty: u32) -> Result<Self, ChainError> {
        let config = ChainConfig {
            difficulty,
            ..ChainConfig::default()
        };
        Self::with_config(&config, Arc::new(Secp256k1Scheme::new()))
    }

    pub fn with_config(
        config: &ChainConfig,
        scheme: Arc<dyn SignatureScheme>,
    ) -> Result<Self, ChainError> {
        validate_difficulty(config.difficulty)?;

        Ok(Blockchain {
            blocks: vec![Self::big_bang()],
            transaction_pool: Vec::new(),
            miner_reward: config.miner_reward,
            difficulty: config.difficulty,
            scheme,
        })
    }

    /// The fixed, unmined genesis block.
    pub fn big_bang() -> Block {
        Block::genesis()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn latest_block(&self) -> &Block {
        self.blocks
            .last()
            .expect("chain always holds the genesis block")
    }

    pub fn transaction_pool(&self) -> &[Transaction] {
        &self.transaction_pool
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn miner_reward(&self) -> u64 {
        self.miner_reward
    }

    pub fn scheme(&self) -> &dyn SignatureScheme {
        self.scheme.as_ref()
    }

    /// Takes effect from the next mining round; sealed blocks are untouched.
    pub fn set_difficulty(&mut self, difficulty: u32) -> Result<(), ChainError> {
        validate_difficulty(difficulty)?;
        self.difficulty = difficulty;
        Ok(())
    }

    /// Admits a signed transfer into the pool. No dedup and no balance checks.
    pub fn add_transaction(&mut self, transaction: Transaction) -> Result<(), ChainError> {
        if let Err(e) = validate_submission(&transaction, self.scheme()) {
            warn!("Rejected transaction {}: {}", transaction.hash_str(), e);
            return Err(e);
        }

        debug!(
            "Accepted transaction {} into pool ({} pending)",
            transaction.hash_str(),
            self.transaction_pool.len() + 1
        );
        self.transaction_pool.push(transaction);
        Ok(())
    }

    pub fn mine_transaction_pool(
        &mut self,
        miner_reward_address: &str,
    ) -> Result<&Block, ChainError> {
        self.mine_transaction_pool_with(miner_reward_address, &MiningControl::unbounded())
    }

    /// Seals the pool plus a reward transaction into a new block. The chain and
    /// the pool are only modified once the block has been mined.
    pub fn mine_transaction_pool_with(
        &mut self,
        miner_reward_address: &str,
        control: &MiningControl,
    ) -> Result<&Block, ChainError> {
        if miner_reward_address.is_empty() {
            return Err(ChainError::InvalidTransaction(
                "miner reward address cannot be empty".to_string(),
            ));
        }

        let mut transactions = self.transaction_pool.clone();
        transactions.push(CoinbaseTx::new(miner_reward_address, self.miner_reward).into());

        let mut block = Block::new(transactions, self.latest_block().hash.clone());
        block.mine_with(self.difficulty, self.scheme.as_ref(), control)?;

        info!(
            "Appended block {} with {} transactions (difficulty {})",
            self.blocks.len(),
            block.transactions.len(),
            self.difficulty
        );
        self.blocks.push(block);
        self.transaction_pool.clear();
        Ok(self.latest_block())
    }

    pub fn validate_chain(&self) -> bool {
        validate_chain(&self.blocks, self.scheme())
    }
}
