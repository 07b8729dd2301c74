//! Merkle commitment over a block's transaction set

use crate::error::{ChainError, Result};
use crate::hashing::sha256;

/// Root of a balanced binary SHA-256 tree over the given serialized items.
///
/// Leaves are SHA-256 of each item. A level with an odd node count
/// duplicates its last node. A single item yields its leaf as the root.
pub fn merkle_root(items: &[Vec<u8>]) -> Result<[u8; 32]> {
    if items.is_empty() {
        return Err(ChainError::InvalidBlock(
            "cannot build a merkle tree over zero transactions".to_string(),
        ));
    }

    let mut level: Vec<[u8; 32]> = items.iter().map(|item| sha256(item)).collect();

    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len().div_ceil(2));
        for pair in level.chunks(2) {
            let left = &pair[0];
            let right = pair.get(1).unwrap_or(left);
            let mut combined = Vec::with_capacity(64);
            combined.extend_from_slice(left);
            combined.extend_from_slice(right);
            next.push(sha256(&combined));
        }
        level = next;
    }

    Ok(level[0])
}
