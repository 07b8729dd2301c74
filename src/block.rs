//! Block construction and serialization

use crate::codec;
use crate::error::Result;
use crate::merkle::merkle_root;
use crate::pow::ProofOfWork;
use crate::types::{Block, Hash, Transaction};

/// Assemble a block on top of `prev_hash` and seal it with proof of work.
pub fn new_block(transactions: Vec<Transaction>, prev_hash: Hash, difficulty: u64) -> Result<Block> {
    let mut block = Block {
        transactions,
        prev_hash,
        hash: Vec::new(),
        nonce: 0,
    };
    let (nonce, hash) = ProofOfWork::new(&block, difficulty).run()?;
    block.nonce = nonce;
    block.hash = hash;
    Ok(block)
}

/// Merkle root over the canonical encodings of the block's transactions:
/// the transaction commitment bound into the proof-of-work preimage.
pub fn hash_transactions(block: &Block) -> Result<[u8; 32]> {
    let mut encoded = Vec::with_capacity(block.transactions.len());
    for tx in &block.transactions {
        encoded.push(codec::encode(tx)?);
    }
    merkle_root(&encoded)
}

/// Canonical bytes of a block, as persisted in the store.
pub fn encode_block(block: &Block) -> Result<Vec<u8>> {
    codec::encode(block)
}

/// Decode a block from its persisted bytes.
pub fn decode_block(bytes: &[u8]) -> Result<Block> {
    codec::decode(bytes)
}
