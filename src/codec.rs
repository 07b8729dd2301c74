//! Canonical byte encoding
//!
//! One deterministic encoding serves both roles the ledger needs: the
//! hashing substrate for transaction ids and signatures, and the on-disk
//! format for blocks and UTXO entries. bincode over the serde derives gives
//! a stable field order, fixed-width little-endian integers, and
//! length-prefixed byte strings, so identical logical values produce
//! identical bytes on every platform.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ChainError, Result};

/// Encode a value into its canonical bytes.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    bincode::serialize(value).map_err(|e| ChainError::Encode(e.to_string()))
}

/// Decode a value from canonical bytes. Failure means the stored bytes are
/// corrupt and the chain cannot continue.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    bincode::deserialize(bytes).map_err(|e| ChainError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Transaction, TxInput, TxOutput, TxOutputs};

    fn sample_transaction() -> Transaction {
        Transaction {
            id: vec![7; 32],
            inputs: vec![TxInput {
                prev_tx_id: vec![1; 32],
                out_index: 0,
                signature: vec![2; 64],
                pubkey: vec![3; 64],
            }],
            outputs: vec![TxOutput {
                value: 42,
                pubkey_hash: vec![4; 20],
            }],
        }
    }

    #[test]
    fn test_transaction_round_trip() {
        let tx = sample_transaction();
        let bytes = encode(&tx).unwrap();
        let decoded: Transaction = decode(&bytes).unwrap();
        assert_eq!(decoded, tx);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let tx = sample_transaction();
        assert_eq!(encode(&tx).unwrap(), encode(&tx.clone()).unwrap());
    }

    #[test]
    fn test_outputs_entry_round_trip() {
        let entry = TxOutputs {
            outputs: vec![
                (0, TxOutput { value: 10, pubkey_hash: vec![9; 20] }),
                (3, TxOutput { value: 90, pubkey_hash: vec![8; 20] }),
            ],
        };
        let bytes = encode(&entry).unwrap();
        let decoded: TxOutputs = decode(&bytes).unwrap();
        assert_eq!(decoded, entry);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let garbage = vec![0xff; 3];
        assert!(decode::<Transaction>(&garbage).is_err());
    }
}
