//! UTXO index
//!
//! A derived view over the canonical chain, persisted under a reserved key
//! prefix in the same store: `utxo_prefix || tx_id` maps to the outputs of
//! that transaction still unspent. Balance and spendability queries scan
//! the prefix instead of the chain; the index is rebuilt from scratch by
//! `reindex` and kept current by `update` as blocks land.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::chain::Blockchain;
use crate::codec;
use crate::error::{ChainError, Result};
use crate::store::BlockStore;
use crate::transaction::is_coinbase;
use crate::types::{Block, Hash, PubKeyHash, TxOutput, TxOutputs};

/// Handle to the persistent UTXO view. Shares the chain's store.
pub struct UtxoIndex {
    store: BlockStore,
    prefix: Vec<u8>,
}

impl UtxoIndex {
    pub fn new(chain: &Blockchain) -> Self {
        Self {
            store: chain.store().clone(),
            prefix: chain.config().utxo_prefix.clone(),
        }
    }

    fn entry_key(&self, tx_id: &[u8]) -> Vec<u8> {
        let mut key = self.prefix.clone();
        key.extend_from_slice(tx_id);
        key
    }

    /// Rebuild the index from the chain: clear the prefix, walk the chain
    /// once, and write one entry per transaction with unspent outputs.
    /// Returns the number of entries written.
    pub fn reindex(&self, chain: &Blockchain) -> Result<usize> {
        self.store.delete_prefix(&self.prefix)?;

        let utxo = chain.find_utxo()?;
        let mut batch = sled::Batch::default();
        for (tx_id, outputs) in &utxo {
            batch.insert(self.entry_key(tx_id), codec::encode(outputs)?);
        }
        self.store.apply_batch(batch)?;
        tracing::info!(entries = utxo.len(), "rebuilt UTXO index");
        Ok(utxo.len())
    }

    /// Fold a new block into the index: remove every output its inputs
    /// spend, drop entries that become empty, and record every transaction's
    /// outputs as fresh entries. All writes land in one atomic batch.
    pub fn update(&self, block: &Block) -> Result<()> {
        // Entries touched while processing the block. Spends and creations
        // within one block must observe each other before the batch lands,
        // so reads go through this overlay first.
        let mut pending: HashMap<Hash, TxOutputs> = HashMap::new();

        for tx in &block.transactions {
            if !is_coinbase(tx) {
                for input in &tx.inputs {
                    let entry = match pending.entry(input.prev_tx_id.clone()) {
                        Entry::Occupied(occupied) => occupied.into_mut(),
                        Entry::Vacant(vacant) => {
                            let bytes = self
                                .store
                                .get_raw(&self.entry_key(&input.prev_tx_id))?
                                .ok_or_else(|| {
                                    ChainError::PrevTxMissing(hex::encode(&input.prev_tx_id))
                                })?;
                            vacant.insert(codec::decode(&bytes)?)
                        }
                    };
                    entry
                        .outputs
                        .retain(|(index, _)| i64::from(*index) != input.out_index);
                }
            }

            let outputs = tx
                .outputs
                .iter()
                .enumerate()
                .map(|(index, output)| (index as u32, output.clone()))
                .collect();
            pending.insert(tx.id.clone(), TxOutputs { outputs });
        }

        let mut batch = sled::Batch::default();
        for (tx_id, entry) in pending {
            let key = self.entry_key(&tx_id);
            if entry.outputs.is_empty() {
                batch.remove(key);
            } else {
                batch.insert(key, codec::encode(&entry)?);
            }
        }
        self.store.apply_batch(batch)
    }

    /// All unspent outputs locked to a public-key hash.
    pub fn find_unspent(&self, pubkey_hash: &[u8]) -> Result<Vec<TxOutput>> {
        let mut unspent = Vec::new();
        for item in self.store.scan_prefix(&self.prefix) {
            let (_, value) = item?;
            let entry: TxOutputs = codec::decode(&value)?;
            for (_, output) in entry.outputs {
                if output.is_locked_with(pubkey_hash) {
                    unspent.push(output);
                }
            }
        }
        Ok(unspent)
    }

    /// Sum of all unspent outputs locked to a public-key hash.
    pub fn balance_of(&self, pubkey_hash: &[u8]) -> Result<u64> {
        Ok(self
            .find_unspent(pubkey_hash)?
            .iter()
            .map(|output| output.value)
            .sum())
    }

    /// Outputs to fund a spend of `amount`: scans entries in key order and
    /// stops as soon as enough value is collected. Returns the accumulated
    /// value and the selected output indices per transaction.
    pub fn find_spendable(
        &self,
        pubkey_hash: &PubKeyHash,
        amount: u64,
    ) -> Result<(u64, HashMap<Hash, Vec<u32>>)> {
        let mut accumulated: u64 = 0;
        let mut spendable: HashMap<Hash, Vec<u32>> = HashMap::new();

        'scan: for item in self.store.scan_prefix(&self.prefix) {
            let (key, value) = item?;
            let tx_id = key[self.prefix.len()..].to_vec();
            let entry: TxOutputs = codec::decode(&value)?;
            for (index, output) in entry.outputs {
                if output.is_locked_with(pubkey_hash) {
                    accumulated += output.value;
                    spendable.entry(tx_id.clone()).or_default().push(index);
                    if accumulated >= amount {
                        break 'scan;
                    }
                }
            }
        }
        Ok((accumulated, spendable))
    }

    /// Every index entry in key order: transaction id and its unspent
    /// outputs.
    pub fn entries(&self) -> Result<Vec<(Hash, TxOutputs)>> {
        let mut entries = Vec::new();
        for item in self.store.scan_prefix(&self.prefix) {
            let (key, value) = item?;
            let tx_id = key[self.prefix.len()..].to_vec();
            entries.push((tx_id, codec::decode(&value)?));
        }
        Ok(entries)
    }

    /// Number of transactions with at least one unspent output.
    pub fn count_transactions(&self) -> Result<usize> {
        let mut count = 0;
        for item in self.store.scan_prefix(&self.prefix) {
            item?;
            count += 1;
        }
        Ok(count)
    }
}
