//! Signature binding against a live chain

use coinledger::{Blockchain, ChainConfig, ChainError, Transaction, UtxoIndex, Wallet};

fn assert_rejected(result: coinledger::Result<bool>) {
    match result {
        Ok(accepted) => assert!(!accepted, "tampered transaction verified"),
        Err(_) => {}
    }
}

/// A chain where a2 holds 10 coins out of a two-output transaction, plus a
/// signed follow-up spend from a2.
fn chain_with_spend() -> (tempfile::TempDir, Blockchain, Transaction, Wallet, Wallet) {
    let dir = tempfile::tempdir().unwrap();
    let a1 = Wallet::generate();
    let a2 = Wallet::generate();
    let a3 = Wallet::generate();

    let mut chain = Blockchain::init(ChainConfig::new(dir.path()), &a1.address()).unwrap();
    let utxo = UtxoIndex::new(&chain);
    utxo.reindex(&chain).unwrap();

    let first = chain.new_transaction(&a1, &a2.address(), 10, &utxo).unwrap();
    let block = chain.add_block(vec![first]).unwrap();
    utxo.update(&block).unwrap();

    let spend = chain.new_transaction(&a2, &a3.address(), 4, &utxo).unwrap();
    (dir, chain, spend, a2, a3)
}

#[test]
fn test_signed_transaction_verifies() {
    let (_dir, chain, spend, _, _) = chain_with_spend();
    assert!(chain.verify_transaction(&spend).unwrap());
}

#[test]
fn test_mutated_output_value_rejected() {
    let (_dir, chain, mut spend, _, _) = chain_with_spend();
    // Lowering a value keeps conservation intact; only the signature can
    // catch it.
    spend.outputs[0].value -= 1;
    assert_rejected(chain.verify_transaction(&spend));
}

#[test]
fn test_inflated_output_value_breaks_conservation() {
    let (_dir, chain, mut spend, _, _) = chain_with_spend();
    spend.outputs[0].value += 100;
    assert!(matches!(
        chain.verify_transaction(&spend),
        Err(ChainError::ConservationViolation { .. })
    ));
}

#[test]
fn test_mutated_output_lock_rejected() {
    let (_dir, chain, mut spend, _, thief) = chain_with_spend();
    spend.outputs[1].pubkey_hash = thief.pubkey_hash();
    assert_rejected(chain.verify_transaction(&spend));
}

#[test]
fn test_mutated_out_index_rejected() {
    let (_dir, chain, mut spend, _, _) = chain_with_spend();
    // The spent transaction has a second output (the change); pointing the
    // input at it still resolves but no longer matches the signature or
    // the carried key.
    spend.inputs[0].out_index = (spend.inputs[0].out_index + 1) % 2;
    assert_rejected(chain.verify_transaction(&spend));
}

#[test]
fn test_mutated_prev_tx_id_rejected() {
    let (_dir, chain, mut spend, _, _) = chain_with_spend();
    // Redirect the input at the genesis coinbase, which exists on chain
    // but is locked to a different key.
    let mut iter = chain.iter();
    let mut genesis = None;
    while let Some(block) = iter.next_block().unwrap() {
        genesis = Some(block);
    }
    spend.inputs[0].prev_tx_id = genesis.unwrap().transactions[0].id.clone();
    assert_rejected(chain.verify_transaction(&spend));
}

#[test]
fn test_unknown_prev_tx_is_missing() {
    let (_dir, chain, mut spend, _, _) = chain_with_spend();
    spend.inputs[0].prev_tx_id = vec![0x42; 32];
    assert!(matches!(
        chain.verify_transaction(&spend),
        Err(ChainError::PrevTxMissing(_))
    ));
}

#[test]
fn test_stripped_signature_rejected() {
    let (_dir, chain, mut spend, _, _) = chain_with_spend();
    spend.inputs[0].signature = Vec::new();
    assert_rejected(chain.verify_transaction(&spend));
}

#[test]
fn test_foreign_signature_rejected() {
    let (_dir, chain, mut spend, sender, _) = chain_with_spend();
    // Re-sign with a fresh key while still carrying the sender's pubkey.
    let forger = Wallet::generate();
    let mut forged = spend.clone();
    forged.inputs[0].signature = Vec::new();
    chain.sign_transaction(&mut forged, forger.signing_key()).unwrap();
    forged.inputs[0].pubkey = sender.public_key().to_vec();
    spend.inputs[0].signature = forged.inputs[0].signature.clone();
    assert_rejected(chain.verify_transaction(&spend));
}

#[test]
fn test_signing_unknown_prev_tx_fails() {
    let (_dir, chain, _, sender, recipient) = chain_with_spend();
    let mut tx = Transaction {
        id: Vec::new(),
        inputs: vec![coinledger::TxInput {
            prev_tx_id: vec![0x99; 32],
            out_index: 0,
            signature: Vec::new(),
            pubkey: sender.public_key().to_vec(),
        }],
        outputs: vec![coinledger::transaction::new_output(1, &recipient.address()).unwrap()],
    };
    tx.id = coinledger::transaction::transaction_hash(&tx).unwrap();
    assert!(matches!(
        chain.sign_transaction(&mut tx, sender.signing_key()),
        Err(ChainError::PrevTxMissing(_))
    ));
}
