use crate::blockchain::core::block::Block;
use crate::crypto::SignatureScheme;
use crate::error::ChainError;
use crate::transaction::Transaction;
use tracing::warn;

/// Pool admission: field presence first, then the signature.
pub fn validate_submission(
    tx: &Transaction,
    scheme: &dyn SignatureScheme,
) -> Result<(), ChainError> {
    tx.validate_fields()?;
    if !tx.is_valid(scheme)? {
        return Err(ChainError::InvalidSignature(tx.hash_str()));
    }
    Ok(())
}

/// Full integrity check over an ordered block list, genesis first.
///
/// A lone genesis block only has to match its own hash. Otherwise every later
/// block must carry valid transactions, match its recomputed hash and point
/// at its predecessor's hash.
pub fn validate_chain(blocks: &[Block], scheme: &dyn SignatureScheme) -> bool {
    match blocks {
        [] => false,
        [genesis] => {
            let valid = genesis.hash == genesis.compute_hash();
            if !valid {
                warn!("Genesis hash mismatch");
            }
            valid
        }
        _ => blocks.windows(2).enumerate().all(|(i, pair)| {
            let (previous, block) = (&pair[0], &pair[1]);
            let height = i + 1;

            if !block.validate_transactions(scheme) {
                warn!("Block {} contains an invalid transaction", height);
                return false;
            }
            if block.hash != block.compute_hash() {
                warn!("Block {} hash does not match its content", height);
                return false;
            }
            if block.previous_hash != previous.hash {
                warn!("Block {} is not linked to block {}", height, height - 1);
                return false;
            }
            true
        }),
    }
}
