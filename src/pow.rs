//! Proof of work
//!
//! A block is sealed by finding a nonce whose inclusion in the block's
//! preimage yields a SHA-256 digest that, read as a big-endian 256-bit
//! integer, falls below `1 << (256 − difficulty)`.

use crate::block::hash_transactions;
use crate::error::{ChainError, Result};
use crate::hashing::sha256;
use crate::types::{Block, Hash};

/// Hash-puzzle search over a candidate block.
pub struct ProofOfWork<'a> {
    block: &'a Block,
    difficulty: u64,
    target: U256,
}

impl<'a> ProofOfWork<'a> {
    /// Set up the puzzle for a block at the given difficulty (1..=255).
    pub fn new(block: &'a Block, difficulty: u64) -> Self {
        debug_assert!((1..256).contains(&difficulty));
        let target = U256::one_shl(256 - difficulty as u32);
        Self { block, difficulty, target }
    }

    /// `prev_hash || merkle_root || be_u64(difficulty) || be_u64(nonce)`.
    fn preimage(&self, merkle_root: &[u8; 32], nonce: u64) -> Vec<u8> {
        let mut data =
            Vec::with_capacity(self.block.prev_hash.len() + merkle_root.len() + 16);
        data.extend_from_slice(&self.block.prev_hash);
        data.extend_from_slice(merkle_root);
        data.extend_from_slice(&self.difficulty.to_be_bytes());
        data.extend_from_slice(&nonce.to_be_bytes());
        data
    }

    /// Search nonces from zero until the digest beats the target.
    pub fn run(&self) -> Result<(u64, Hash)> {
        let merkle_root = hash_transactions(self.block)?;
        for nonce in 0..u64::MAX {
            let digest = sha256(&self.preimage(&merkle_root, nonce));
            if U256::from_be_bytes(&digest) < self.target {
                return Ok((nonce, digest.to_vec()));
            }
        }
        Err(ChainError::InvalidBlock(
            "exhausted nonce space without meeting the target".to_string(),
        ))
    }

    /// Recompute the digest with the stored nonce; the block holds iff the
    /// digest matches the stored hash and beats the target.
    pub fn validate(&self) -> Result<bool> {
        let merkle_root = hash_transactions(self.block)?;
        let digest = sha256(&self.preimage(&merkle_root, self.block.nonce));
        Ok(digest[..] == self.block.hash[..] && U256::from_be_bytes(&digest) < self.target)
    }
}

/// 256-bit unsigned integer for target comparisons, most significant limb
/// first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct U256([u64; 4]);

impl U256 {
    /// `1 << shift` for shift < 256.
    fn one_shl(shift: u32) -> Self {
        let mut limbs = [0u64; 4];
        let limb = 3 - (shift / 64) as usize;
        limbs[limb] = 1u64 << (shift % 64);
        U256(limbs)
    }

    fn from_be_bytes(bytes: &[u8; 32]) -> Self {
        let mut limbs = [0u64; 4];
        for (i, limb) in limbs.iter_mut().enumerate() {
            let start = i * 8;
            *limb = u64::from_be_bytes(bytes[start..start + 8].try_into().expect("8-byte chunk"));
        }
        U256(limbs)
    }
}

impl PartialOrd for U256 {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for U256 {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}
