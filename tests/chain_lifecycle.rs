//! Integration tests for pool intake, mining rounds and chain validation

use ledgerchain::blockchain::Blockchain;
use ledgerchain::config::ChainConfig;
use ledgerchain::crypto::{KeyPair, Secp256k1Scheme, SignatureScheme};
use ledgerchain::error::ChainError;
use ledgerchain::transaction::{Transaction, TransferDraft};
use std::sync::Arc;

/// Helper to sign a transfer from `sender` to `recipient`
fn transfer(
    scheme: &Secp256k1Scheme,
    sender: &KeyPair,
    recipient: &KeyPair,
    amount: u64,
) -> Result<Transaction, ChainError> {
    Ok(TransferDraft::new(sender.public_key_hex(), recipient.public_key_hex(), amount)
        .sign(scheme, sender)?
        .into())
}

#[test]
fn test_single_round_scenario() -> Result<(), Box<dyn std::error::Error>> {
    let scheme = Secp256k1Scheme::new();
    let alice = scheme.generate_keypair();
    let bob = scheme.generate_keypair();
    let carol = scheme.generate_keypair();

    let mut chain = Blockchain::new(2)?;
    assert!(chain.validate_chain());

    chain.add_transaction(transfer(&scheme, &alice, &bob, 10)?)?;
    chain.mine_transaction_pool(&carol.public_key_hex())?;

    let blocks = chain.blocks();
    assert_eq!(blocks.len(), 2);
    assert!(blocks[1].hash.starts_with("00"));
    assert_eq!(blocks[1].previous_hash, blocks[0].hash);
    assert!(chain.transaction_pool().is_empty());
    assert!(chain.validate_chain());

    Ok(())
}

#[test]
fn test_reward_goes_last_in_insertion_order() -> Result<(), Box<dyn std::error::Error>> {
    let scheme = Secp256k1Scheme::new();
    let alice = scheme.generate_keypair();
    let bob = scheme.generate_keypair();
    let miner = scheme.generate_keypair();

    let mut chain = Blockchain::new(1)?;
    let first = transfer(&scheme, &alice, &bob, 1)?;
    let second = transfer(&scheme, &bob, &alice, 2)?;
    chain.add_transaction(first.clone())?;
    chain.add_transaction(second.clone())?;

    let block = chain.mine_transaction_pool(&miner.public_key_hex())?;
    assert_eq!(block.transactions.len(), 3);
    assert_eq!(block.transactions[0], first);
    assert_eq!(block.transactions[1], second);
    assert!(block.transactions[2].is_coinbase());
    assert_eq!(block.transactions[2].to(), miner.public_key_hex());
    assert_eq!(block.transactions[2].amount(), 50);

    Ok(())
}

#[test]
fn test_many_rounds_stay_valid() -> Result<(), Box<dyn std::error::Error>> {
    let scheme = Secp256k1Scheme::new();
    let alice = scheme.generate_keypair();
    let bob = scheme.generate_keypair();

    let mut chain = Blockchain::new(1)?;
    for round in 1..=5 {
        chain.add_transaction(transfer(&scheme, &alice, &bob, round)?)?;
        chain.mine_transaction_pool(&bob.public_key_hex())?;
        assert!(chain.validate_chain());
    }

    assert_eq!(chain.len(), 6);
    for pair in chain.blocks().windows(2) {
        assert_eq!(pair[1].previous_hash, pair[0].hash);
        assert!(pair[1].is_sealed(1));
    }

    Ok(())
}

#[test]
fn test_empty_recipient_leaves_pool_unchanged() -> Result<(), Box<dyn std::error::Error>> {
    let scheme = Secp256k1Scheme::new();
    let alice = scheme.generate_keypair();
    let bob = scheme.generate_keypair();

    let mut chain = Blockchain::new(1)?;
    chain.add_transaction(transfer(&scheme, &alice, &bob, 5)?)?;

    let bad = TransferDraft::new(alice.public_key_hex(), "", 5).sign(&scheme, &alice)?;
    let result = chain.add_transaction(bad.into());

    assert!(matches!(result, Err(ChainError::InvalidTransaction(_))));
    assert_eq!(chain.transaction_pool().len(), 1);

    Ok(())
}

#[test]
fn test_mismatched_keys_fail_validation_not_panic() -> Result<(), Box<dyn std::error::Error>> {
    let scheme = Secp256k1Scheme::new();
    let key_a = scheme.generate_keypair();
    let key_b = scheme.generate_keypair();

    // Signed with A but claims to come from B
    let tx: Transaction = TransferDraft::new(key_b.public_key_hex(), key_a.public_key_hex(), 7)
        .sign(&scheme, &key_a)?
        .into();
    assert!(!tx.is_valid(&scheme)?);

    let mut chain = Blockchain::new(1)?;
    assert!(matches!(
        chain.add_transaction(tx),
        Err(ChainError::InvalidSignature(_))
    ));

    Ok(())
}

/// A scheme that accepts nothing, to check that chains use the injected scheme.
struct RejectAll;

impl SignatureScheme for RejectAll {
    fn curve_name(&self) -> &'static str {
        "reject-all"
    }

    fn sign(&self, _digest: &[u8; 32], _keypair: &KeyPair) -> Result<String, ChainError> {
        Ok("00".to_string())
    }

    fn verify(&self, _digest: &[u8; 32], _signature_hex: &str, _public_key_hex: &str) -> bool {
        false
    }
}

#[test]
fn test_chains_use_their_own_scheme() -> Result<(), Box<dyn std::error::Error>> {
    let scheme = Secp256k1Scheme::new();
    let alice = scheme.generate_keypair();
    let bob = scheme.generate_keypair();
    let tx = transfer(&scheme, &alice, &bob, 3)?;

    let mut strict = Blockchain::with_config(&ChainConfig::default(), Arc::new(RejectAll))?;
    let mut normal =
        Blockchain::with_config(&ChainConfig::default(), Arc::new(Secp256k1Scheme::new()))?;

    assert!(matches!(
        strict.add_transaction(tx.clone()),
        Err(ChainError::InvalidSignature(_))
    ));
    normal.add_transaction(tx)?;

    // Coinbase-only blocks never consult the scheme
    strict.mine_transaction_pool("miner")?;
    assert!(strict.validate_chain());

    Ok(())
}

#[test]
fn test_custom_reward_from_config() -> Result<(), Box<dyn std::error::Error>> {
    let config = ChainConfig {
        difficulty: 1,
        miner_reward: 7,
    };
    let mut chain = Blockchain::with_config(&config, Arc::new(Secp256k1Scheme::new()))?;

    let block = chain.mine_transaction_pool("miner")?;
    assert_eq!(block.transactions.len(), 1);
    assert_eq!(block.transactions[0].amount(), 7);

    Ok(())
}
