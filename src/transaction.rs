//! Coin transactions: construction, ids, signing, verification
//!
//! A transaction's id is the SHA-256 of its canonical encoding with the id
//! field cleared. Signatures cover a per-input digest of the trimmed
//! transaction (every input's signature and pubkey cleared) with the signed
//! input's pubkey slot temporarily holding the referenced output's
//! public-key hash, binding each signature to the exact outputs spent and
//! created.

use std::collections::HashMap;

use p256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use p256::ecdsa::{Signature, SigningKey};

use crate::codec;
use crate::constants::COINBASE_OUT_INDEX;
use crate::error::{ChainError, Result};
use crate::hashing::sha256;
use crate::types::{Hash, Transaction, TxInput, TxOutput};
use crate::wallet::decode_public_key;

/// A new output of `value` locked to `address`.
pub fn new_output(value: u64, address: &str) -> Result<TxOutput> {
    let mut output = TxOutput { value, pubkey_hash: Vec::new() };
    output.lock(address)?;
    Ok(output)
}

/// A coinbase transaction minting `reward` coins to `address`. The input
/// references nothing and carries `data` in place of a signature.
pub fn new_coinbase(address: &str, data: &str, reward: u64) -> Result<Transaction> {
    let payload = if data.is_empty() {
        format!("Coins to {address}")
    } else {
        data.to_string()
    };
    let input = TxInput {
        prev_tx_id: Vec::new(),
        out_index: COINBASE_OUT_INDEX,
        signature: payload.into_bytes(),
        pubkey: Vec::new(),
    };
    let mut tx = Transaction {
        id: Vec::new(),
        inputs: vec![input],
        outputs: vec![new_output(reward, address)?],
    };
    tx.id = transaction_hash(&tx)?;
    Ok(tx)
}

/// SHA-256 of the canonical encoding of the transaction with its id cleared.
pub fn transaction_hash(tx: &Transaction) -> Result<Hash> {
    let mut copy = tx.clone();
    copy.id = Vec::new();
    Ok(sha256(&codec::encode(&copy)?).to_vec())
}

/// Whether this transaction mints coins: one input, empty prev-tx-id,
/// out-index −1.
pub fn is_coinbase(tx: &Transaction) -> bool {
    tx.inputs.len() == 1
        && tx.inputs[0].prev_tx_id.is_empty()
        && tx.inputs[0].out_index == COINBASE_OUT_INDEX
}

/// A copy with every input's signature and pubkey cleared: the message
/// substrate for signing and verification.
pub fn trimmed_copy(tx: &Transaction) -> Transaction {
    let inputs = tx
        .inputs
        .iter()
        .map(|input| TxInput {
            prev_tx_id: input.prev_tx_id.clone(),
            out_index: input.out_index,
            signature: Vec::new(),
            pubkey: Vec::new(),
        })
        .collect();
    Transaction {
        id: tx.id.clone(),
        inputs,
        outputs: tx.outputs.clone(),
    }
}

/// Sign every input against the previous transactions it spends.
///
/// `prev_txs` maps transaction id to transaction and must cover every
/// input; a missing or id-less entry fails with `PrevTxMissing`.
pub fn sign(
    tx: &mut Transaction,
    key: &SigningKey,
    prev_txs: &HashMap<Hash, Transaction>,
) -> Result<()> {
    if is_coinbase(tx) {
        return Ok(());
    }

    let mut trimmed = trimmed_copy(tx);
    for i in 0..tx.inputs.len() {
        let prev_out = referenced_output(&tx.inputs[i], prev_txs)?;
        trimmed.inputs[i].pubkey = prev_out.pubkey_hash.clone();
        trimmed.id = transaction_hash(&trimmed)?;
        trimmed.inputs[i].pubkey = Vec::new();

        let signature: Signature = key
            .sign_prehash(&trimmed.id)
            .map_err(|e| ChainError::Signature(e.to_string()))?;
        tx.inputs[i].signature = signature.to_bytes().to_vec();
    }
    Ok(())
}

/// Check every input's signature against the previous transactions it
/// spends. Returns `Ok(false)` on the first failing input; a coinbase is
/// trivially valid. Outputs claiming more value than the inputs supply is
/// a `ConservationViolation`.
pub fn verify(tx: &Transaction, prev_txs: &HashMap<Hash, Transaction>) -> Result<bool> {
    if is_coinbase(tx) {
        return Ok(true);
    }

    let mut input_total: u64 = 0;
    for input in &tx.inputs {
        input_total = input_total.saturating_add(referenced_output(input, prev_txs)?.value);
    }
    let output_total: u64 = tx.outputs.iter().map(|out| out.value).sum();
    if input_total < output_total {
        return Err(ChainError::ConservationViolation {
            inputs: input_total,
            outputs: output_total,
        });
    }

    let mut trimmed = trimmed_copy(tx);
    for (i, input) in tx.inputs.iter().enumerate() {
        let prev_out = referenced_output(input, prev_txs)?;
        // The carried pubkey must be the one the spent output is locked to.
        if !input.uses_key(&prev_out.pubkey_hash) {
            return Ok(false);
        }
        trimmed.inputs[i].pubkey = prev_out.pubkey_hash.clone();
        trimmed.id = transaction_hash(&trimmed)?;
        trimmed.inputs[i].pubkey = Vec::new();

        let Ok(signature) = Signature::from_slice(&input.signature) else {
            return Ok(false);
        };
        let Ok(key) = decode_public_key(&input.pubkey) else {
            return Ok(false);
        };
        if key.verify_prehash(&trimmed.id, &signature).is_err() {
            return Ok(false);
        }
    }
    Ok(true)
}

/// The output an input spends, or `PrevTxMissing` when the transaction is
/// unknown, has no id, or the index is out of range.
fn referenced_output<'a>(
    input: &TxInput,
    prev_txs: &'a HashMap<Hash, Transaction>,
) -> Result<&'a TxOutput> {
    let missing = || ChainError::PrevTxMissing(hex::encode(&input.prev_tx_id));
    let prev = prev_txs
        .get(&input.prev_tx_id)
        .filter(|prev| !prev.id.is_empty())
        .ok_or_else(missing)?;
    let index = usize::try_from(input.out_index).map_err(|_| missing())?;
    prev.outputs.get(index).ok_or_else(missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::Wallet;

    /// A coinbase to `owner` and a transaction spending it: 60 to the
    /// recipient, 40 back as change.
    fn signed_spend(owner: &Wallet, to: &Wallet) -> (Transaction, HashMap<Hash, Transaction>) {
        let coinbase = new_coinbase(&owner.address(), "", 100).unwrap();
        let mut prev_txs = HashMap::new();
        prev_txs.insert(coinbase.id.clone(), coinbase.clone());

        let mut tx = Transaction {
            id: Vec::new(),
            inputs: vec![TxInput {
                prev_tx_id: coinbase.id.clone(),
                out_index: 0,
                signature: Vec::new(),
                pubkey: owner.public_key().to_vec(),
            }],
            outputs: vec![
                new_output(60, &to.address()).unwrap(),
                new_output(40, &owner.address()).unwrap(),
            ],
        };
        tx.id = transaction_hash(&tx).unwrap();
        sign(&mut tx, owner.signing_key(), &prev_txs).unwrap();
        (tx, prev_txs)
    }

    #[test]
    fn test_id_is_deterministic() {
        let tx = new_coinbase(&Wallet::generate().address(), "genesis", 100).unwrap();
        assert_eq!(transaction_hash(&tx).unwrap(), transaction_hash(&tx).unwrap());
        assert_eq!(tx.id, transaction_hash(&tx).unwrap());
    }

    #[test]
    fn test_id_ignores_stored_id() {
        let mut tx = new_coinbase(&Wallet::generate().address(), "genesis", 100).unwrap();
        let id = transaction_hash(&tx).unwrap();
        tx.id = vec![0xab; 32];
        assert_eq!(transaction_hash(&tx).unwrap(), id);
    }

    #[test]
    fn test_coinbase_predicate() {
        let owner = Wallet::generate();
        let coinbase = new_coinbase(&owner.address(), "", 100).unwrap();
        assert!(is_coinbase(&coinbase));

        let (spend, _) = signed_spend(&owner, &Wallet::generate());
        assert!(!is_coinbase(&spend));
    }

    #[test]
    fn test_trimmed_copy_clears_unlock_material() {
        let (tx, _) = signed_spend(&Wallet::generate(), &Wallet::generate());
        let trimmed = trimmed_copy(&tx);
        assert_eq!(trimmed.inputs.len(), tx.inputs.len());
        for input in &trimmed.inputs {
            assert!(input.signature.is_empty());
            assert!(input.pubkey.is_empty());
        }
        assert_eq!(trimmed.outputs, tx.outputs);
    }

    #[test]
    fn test_sign_verify_round_trip() {
        let (tx, prev_txs) = signed_spend(&Wallet::generate(), &Wallet::generate());
        assert!(verify(&tx, &prev_txs).unwrap());
    }

    #[test]
    fn test_verify_rejects_wrong_key() {
        let owner = Wallet::generate();
        let coinbase = new_coinbase(&owner.address(), "", 100).unwrap();
        let mut prev_txs = HashMap::new();
        prev_txs.insert(coinbase.id.clone(), coinbase.clone());

        let intruder = Wallet::generate();
        let mut tx = Transaction {
            id: Vec::new(),
            inputs: vec![TxInput {
                prev_tx_id: coinbase.id.clone(),
                out_index: 0,
                signature: Vec::new(),
                pubkey: intruder.public_key().to_vec(),
            }],
            outputs: vec![new_output(100, &intruder.address()).unwrap()],
        };
        tx.id = transaction_hash(&tx).unwrap();
        sign(&mut tx, intruder.signing_key(), &prev_txs).unwrap();
        // Internally consistent signature, but the carried pubkey does not
        // hash to the lock on the spent output.
        assert!(!verify(&tx, &prev_txs).unwrap());

        // Carrying the owner's pubkey without the owner's signature fails
        // on the signature itself.
        tx.inputs[0].pubkey = owner.public_key().to_vec();
        assert!(!verify(&tx, &prev_txs).unwrap());
    }

    #[test]
    fn test_sign_missing_prev_tx() {
        let owner = Wallet::generate();
        let mut tx = Transaction {
            id: Vec::new(),
            inputs: vec![TxInput {
                prev_tx_id: vec![5; 32],
                out_index: 0,
                signature: Vec::new(),
                pubkey: owner.public_key().to_vec(),
            }],
            outputs: vec![new_output(1, &owner.address()).unwrap()],
        };
        tx.id = transaction_hash(&tx).unwrap();
        let result = sign(&mut tx, owner.signing_key(), &HashMap::new());
        assert!(matches!(result, Err(ChainError::PrevTxMissing(_))));
    }

    #[test]
    fn test_verify_conservation_violation() {
        let owner = Wallet::generate();
        let (mut tx, prev_txs) = signed_spend(&owner, &Wallet::generate());
        tx.outputs[0].value = 1000; // more than the 100 the input supplies
        let result = verify(&tx, &prev_txs);
        assert!(matches!(result, Err(ChainError::ConservationViolation { .. })));
    }
}
