//! Proof-of-work search.
//!
//! The search itself ([`search_nonce`]) is a pure function over a nonce range.
//! Cancellation and deadlines live in [`MiningControl`] and are checked by the
//! block between ranges, never inside the search loop.

use crate::error::ChainError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Nonce every block starts its search from.
pub const INITIAL_NONCE: u64 = 1;

/// Hex characters in a SHA-256 digest; no difficulty above this can be met.
pub const MAX_DIFFICULTY: u32 = 64;

pub const DEFAULT_BATCH_SIZE: u64 = 10_000;

/// The `difficulty`-character run of zeros a sealed hash must start with.
pub fn difficulty_target(difficulty: u32) -> String {
    "0".repeat(difficulty as usize)
}

/// Exact prefix test against the hex-zero target, not a numeric comparison.
pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
    let difficulty = difficulty as usize;
    hash.len() >= difficulty && hash.bytes().take(difficulty).all(|b| b == b'0')
}

pub fn validate_difficulty(difficulty: u32) -> Result<(), ChainError> {
    if difficulty == 0 || difficulty > MAX_DIFFICULTY {
        return Err(ChainError::InvalidDifficulty(format!(
            "difficulty must be between 1 and {}, got {}",
            MAX_DIFFICULTY, difficulty
        )));
    }
    Ok(())
}

/// Everything in a block hash except the nonce.
#[derive(Clone)]
pub struct BlockTemplate {
    prefix: Sha256,
    timestamp: u64,
}

impl BlockTemplate {
    /// `prefix` must already contain the transactions and previous hash.
    pub fn new(prefix: Sha256, timestamp: u64) -> Self {
        BlockTemplate { prefix, timestamp }
    }

    pub fn hash_with_nonce(&self, nonce: u64) -> String {
        let mut hasher = self.prefix.clone();
        hasher.update(nonce.to_le_bytes());
        hasher.update(self.timestamp.to_le_bytes());
        hex::encode(hasher.finalize())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonceSolution {
    pub nonce: u64,
    pub hash: String,
}

/// Tries every nonce in `nonces` in order and returns the first one whose hash
/// meets `difficulty`. Restart by calling again with the next range.
pub fn search_nonce(
    template: &BlockTemplate,
    difficulty: u32,
    nonces: Range<u64>,
) -> Option<NonceSolution> {
    nonces
        .map(|nonce| NonceSolution {
            nonce,
            hash: template.hash_with_nonce(nonce),
        })
        .find(|solution| meets_difficulty(&solution.hash, difficulty))
}

/// Shared flag that lets another thread stop a running search.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// External bounds on a mining run.
#[derive(Debug, Clone)]
pub struct MiningControl {
    pub cancel: Option<CancellationToken>,
    pub deadline: Option<Instant>,
    /// Nonces tried between two checks of `cancel` and `deadline`.
    pub batch_size: u64,
}

impl Default for MiningControl {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl MiningControl {
    pub fn unbounded() -> Self {
        MiningControl {
            cancel: None,
            deadline: None,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    pub fn with_batch_size(mut self, batch_size: u64) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Reason to stop, if any.
    pub fn stop_reason(&self) -> Option<&'static str> {
        if self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
            return Some("cancelled");
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Some("deadline exceeded");
        }
        None
    }
}
