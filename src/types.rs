//! Core ledger types

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::wallet::{address_pubkey_hash, public_key_hash};

/// 32-byte digest, held as a byte vector so absence can be expressed as
/// emptiness (the genesis block's prev-hash, a coinbase input's prev-tx-id).
pub type Hash = Vec<u8>;

/// 20-byte RIPEMD-160 digest of a SHA-256'd public key.
pub type PubKeyHash = Vec<u8>;

/// Byte string type
pub type ByteString = Vec<u8>;

/// Transaction output: a value locked to a public-key hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    pub value: u64,
    pub pubkey_hash: PubKeyHash,
}

impl TxOutput {
    /// Lock this output to the public-key hash embedded in an address.
    pub fn lock(&mut self, address: &str) -> Result<()> {
        self.pubkey_hash = address_pubkey_hash(address)?;
        Ok(())
    }

    /// Whether this output is locked to the given public-key hash.
    pub fn is_locked_with(&self, pubkey_hash: &[u8]) -> bool {
        self.pubkey_hash == pubkey_hash
    }
}

/// Transaction input: a reference to a previous output plus the material
/// unlocking it. A coinbase input has an empty `prev_tx_id`, `out_index`
/// of −1, and arbitrary bytes in the signature slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    pub prev_tx_id: Hash,
    pub out_index: i64,
    pub signature: ByteString,
    pub pubkey: ByteString,
}

impl TxInput {
    /// Whether the stored public key hashes to the given public-key hash.
    pub fn uses_key(&self, pubkey_hash: &[u8]) -> bool {
        public_key_hash(&self.pubkey) == pubkey_hash
    }
}

/// Coin transaction: ordered inputs and outputs plus the content id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Hash,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
}

/// UTXO index entry value: the outputs of one transaction that remain
/// unspent. Each output keeps its original index so inputs can go on
/// referencing `out_index` after earlier outputs are spent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutputs {
    pub outputs: Vec<(u32, TxOutput)>,
}

/// Block: ordered transactions sealed by proof of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub transactions: Vec<Transaction>,
    pub prev_hash: Hash,
    pub hash: Hash,
    pub nonce: u64,
}
