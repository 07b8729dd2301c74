//! Embedded block store
//!
//! A sled tree holds the whole ledger under one keyspace: `"lh"` points at
//! the chain tip, each 32-byte block hash maps to the block's canonical
//! bytes, and the UTXO index lives under its own key prefix. Every mutation
//! goes through an atomic batch followed by a flush, so a write is either
//! fully visible or absent.

use std::mem;
use std::path::Path;

use crate::block::{decode_block, encode_block};
use crate::constants::{DELETE_BATCH_SIZE, LAST_HASH_KEY};
use crate::error::{ChainError, Result};
use crate::types::{Block, Hash};

/// Handle to the on-disk store. Cloning shares the underlying database.
#[derive(Clone)]
pub struct BlockStore {
    db: sled::Db,
}

impl BlockStore {
    /// Open (or create) the store directory.
    pub fn open(path: &Path) -> Result<Self> {
        let db = sled::open(path)?;
        tracing::debug!(path = %path.display(), "opened block store");
        Ok(Self { db })
    }

    /// Whether a chain has been created in this store.
    pub fn is_initialized(&self) -> Result<bool> {
        Ok(self.db.contains_key(LAST_HASH_KEY)?)
    }

    /// Hash of the current chain tip, if any.
    pub fn tip(&self) -> Result<Option<Hash>> {
        Ok(self.db.get(LAST_HASH_KEY)?.map(|value| value.to_vec()))
    }

    /// Read and decode the block stored under `hash`. A missing block on a
    /// reachable hash means the store is corrupt.
    pub fn read_block(&self, hash: &[u8]) -> Result<Block> {
        let bytes = self.db.get(hash)?.ok_or_else(|| {
            ChainError::Decode(format!("missing block {}", hex::encode(hash)))
        })?;
        decode_block(&bytes)
    }

    /// Persist a block and move the tip to it, atomically.
    pub fn write_block(&self, block: &Block) -> Result<()> {
        let mut batch = sled::Batch::default();
        batch.insert(block.hash.clone(), encode_block(block)?);
        batch.insert(LAST_HASH_KEY, block.hash.clone());
        self.apply_batch(batch)
    }

    /// Raw value under `key`.
    pub fn get_raw(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.db.get(key)?.map(|value| value.to_vec()))
    }

    /// Apply a batch atomically and flush it to disk.
    pub fn apply_batch(&self, batch: sled::Batch) -> Result<()> {
        self.db.apply_batch(batch)?;
        self.db.flush()?;
        Ok(())
    }

    /// Key/value pairs under a key prefix, in key order.
    pub fn scan_prefix(
        &self,
        prefix: &[u8],
    ) -> impl Iterator<Item = Result<(Vec<u8>, Vec<u8>)>> {
        self.db.scan_prefix(prefix).map(|item| {
            let (key, value) = item?;
            Ok((key.to_vec(), value.to_vec()))
        })
    }

    /// Delete every key under a prefix, batching removals so no single
    /// atomic write grows unbounded. Returns the number of keys removed.
    pub fn delete_prefix(&self, prefix: &[u8]) -> Result<usize> {
        let mut batch = sled::Batch::default();
        let mut in_batch = 0;
        let mut deleted = 0;

        for item in self.db.scan_prefix(prefix) {
            let (key, _) = item?;
            batch.remove(key);
            in_batch += 1;
            deleted += 1;
            if in_batch == DELETE_BATCH_SIZE {
                self.db.apply_batch(mem::take(&mut batch))?;
                in_batch = 0;
            }
        }
        if in_batch > 0 {
            self.db.apply_batch(batch)?;
        }
        self.db.flush()?;
        Ok(deleted)
    }
}
