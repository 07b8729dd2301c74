//! Chain facade
//!
//! `Blockchain` owns the store handle for its lifetime and exposes the
//! ledger's public operations: create or open a chain, mine and persist
//! blocks, walk the chain from tip to genesis, and locate, sign, and verify
//! transactions. All behaviour is driven by an explicit [`ChainConfig`];
//! there is no process-wide state.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use p256::ecdsa::SigningKey;

use crate::block::new_block;
use crate::constants::{DIFFICULTY, MINING_REWARD, UTXO_PREFIX, VERSION_BYTE};
use crate::error::{ChainError, Result};
use crate::store::BlockStore;
use crate::transaction::{self, is_coinbase, new_coinbase, new_output, transaction_hash};
use crate::types::{Block, Hash, Transaction, TxInput, TxOutputs};
use crate::utxo::UtxoIndex;
use crate::wallet::{validate_address, Wallet};

/// Payload bound into the genesis coinbase input.
const GENESIS_DATA: &str = "First transaction from Genesis";

/// Explicit chain configuration, passed into `init`/`open`.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// Directory holding the embedded store's files.
    pub store_path: PathBuf,
    /// Key prefix under which UTXO index entries live.
    pub utxo_prefix: Vec<u8>,
    /// Proof-of-work difficulty in leading zero bits.
    pub difficulty: u64,
    /// Coins minted per coinbase transaction.
    pub reward: u64,
    /// Version byte for addresses this chain produces.
    pub version_byte: u8,
}

impl ChainConfig {
    /// Configuration with protocol defaults rooted at `store_path`.
    pub fn new(store_path: impl Into<PathBuf>) -> Self {
        Self {
            store_path: store_path.into(),
            utxo_prefix: UTXO_PREFIX.to_vec(),
            difficulty: DIFFICULTY,
            reward: MINING_REWARD,
            version_byte: VERSION_BYTE,
        }
    }
}

/// The canonical chain: a store handle plus the cached tip hash.
pub struct Blockchain {
    store: BlockStore,
    tip: Hash,
    config: ChainConfig,
}

impl Blockchain {
    /// Create a new chain: mine a genesis block whose single transaction is
    /// a coinbase paying the reward to `address`. Refuses to run against a
    /// store that already holds a chain.
    pub fn init(config: ChainConfig, address: &str) -> Result<Self> {
        if !validate_address(address) {
            return Err(ChainError::InvalidAddress(address.to_string()));
        }
        let store = BlockStore::open(&config.store_path)?;
        if store.is_initialized()? {
            return Err(ChainError::AlreadyExists);
        }

        let coinbase = new_coinbase(address, GENESIS_DATA, config.reward)?;
        let genesis = new_block(vec![coinbase], Vec::new(), config.difficulty)?;
        store.write_block(&genesis)?;
        tracing::info!(hash = %hex::encode(&genesis.hash), "genesis block created");

        Ok(Self { store, tip: genesis.hash.clone(), config })
    }

    /// Open an existing chain.
    pub fn open(config: ChainConfig) -> Result<Self> {
        let store = BlockStore::open(&config.store_path)?;
        let tip = store.tip()?.ok_or(ChainError::NotInitialized)?;
        tracing::info!(tip = %hex::encode(&tip), "opened chain");
        Ok(Self { store, tip, config })
    }

    /// Verify, mine, and persist a block holding `transactions` on top of
    /// the current tip. The persisted tip and the cached tip both move to
    /// the new block's hash.
    pub fn add_block(&mut self, transactions: Vec<Transaction>) -> Result<Block> {
        for tx in &transactions {
            if !self.verify_transaction(tx)? {
                return Err(ChainError::InvalidBlock(format!(
                    "transaction {} failed verification",
                    hex::encode(&tx.id)
                )));
            }
        }

        let block = new_block(transactions, self.tip.clone(), self.config.difficulty)?;
        self.store.write_block(&block)?;
        self.tip = block.hash.clone();
        tracing::debug!(
            hash = %hex::encode(&block.hash),
            nonce = block.nonce,
            transactions = block.transactions.len(),
            "block added"
        );
        Ok(block)
    }

    /// Cursor over the chain from the tip back to genesis.
    pub fn iter(&self) -> ChainIterator {
        ChainIterator {
            store: self.store.clone(),
            current_hash: self.tip.clone(),
        }
    }

    /// Linear scan for a transaction by id, from tip to genesis.
    pub fn find_transaction(&self, id: &[u8]) -> Result<Transaction> {
        let mut iter = self.iter();
        while let Some(block) = iter.next_block()? {
            for tx in block.transactions {
                if tx.id == id {
                    return Ok(tx);
                }
            }
        }
        Err(ChainError::TxNotFound(hex::encode(id)))
    }

    /// Sign every input of `tx` with `key`, resolving the spent
    /// transactions from the chain.
    pub fn sign_transaction(&self, tx: &mut Transaction, key: &SigningKey) -> Result<()> {
        if is_coinbase(tx) {
            return Ok(());
        }
        let prev_txs = self.previous_transactions(tx)?;
        transaction::sign(tx, key, &prev_txs)
    }

    /// Verify `tx` against the transactions it spends.
    pub fn verify_transaction(&self, tx: &Transaction) -> Result<bool> {
        if is_coinbase(tx) {
            return Ok(true);
        }
        let prev_txs = self.previous_transactions(tx)?;
        transaction::verify(tx, &prev_txs)
    }

    /// Build and sign a transaction moving `amount` from the wallet's
    /// address to `to`, with change back to the sender. Spendable outputs
    /// come from the UTXO index.
    pub fn new_transaction(
        &self,
        from: &Wallet,
        to: &str,
        amount: u64,
        utxo: &UtxoIndex,
    ) -> Result<Transaction> {
        let pubkey_hash = from.pubkey_hash();
        let (accumulated, spendable) = utxo.find_spendable(&pubkey_hash, amount)?;
        if accumulated < amount {
            return Err(ChainError::InsufficientFunds {
                available: accumulated,
                requested: amount,
            });
        }

        let mut inputs = Vec::new();
        for (tx_id, out_indices) in spendable {
            for out_index in out_indices {
                inputs.push(TxInput {
                    prev_tx_id: tx_id.clone(),
                    out_index: i64::from(out_index),
                    signature: Vec::new(),
                    pubkey: from.public_key().to_vec(),
                });
            }
        }

        let mut outputs = vec![new_output(amount, to)?];
        if accumulated > amount {
            outputs.push(new_output(accumulated - amount, &from.address())?);
        }

        let mut tx = Transaction { id: Vec::new(), inputs, outputs };
        tx.id = transaction_hash(&tx)?;
        self.sign_transaction(&mut tx, from.signing_key())?;
        Ok(tx)
    }

    /// Every unspent output in the chain, grouped by transaction id with
    /// original output indices preserved. One full walk from tip to
    /// genesis; spends are seen before the outputs they consume.
    pub fn find_utxo(&self) -> Result<HashMap<Hash, TxOutputs>> {
        let mut utxo: HashMap<Hash, TxOutputs> = HashMap::new();
        let mut spent: HashMap<Hash, HashSet<i64>> = HashMap::new();

        let mut iter = self.iter();
        while let Some(block) = iter.next_block()? {
            for tx in &block.transactions {
                for (index, output) in tx.outputs.iter().enumerate() {
                    let spent_here = spent
                        .get(&tx.id)
                        .is_some_and(|indices| indices.contains(&(index as i64)));
                    if spent_here {
                        continue;
                    }
                    utxo.entry(tx.id.clone())
                        .or_default()
                        .outputs
                        .push((index as u32, output.clone()));
                }
                if !is_coinbase(tx) {
                    for input in &tx.inputs {
                        spent
                            .entry(input.prev_tx_id.clone())
                            .or_default()
                            .insert(input.out_index);
                    }
                }
            }
        }
        Ok(utxo)
    }

    /// Distance from genesis to the tip, computed by iteration.
    pub fn best_height(&self) -> Result<u64> {
        let mut height: u64 = 0;
        let mut iter = self.iter();
        while let Some(block) = iter.next_block()? {
            if !block.prev_hash.is_empty() {
                height += 1;
            }
        }
        Ok(height)
    }

    /// Hash of the current tip.
    pub fn tip(&self) -> &[u8] {
        &self.tip
    }

    /// The configuration this chain was opened with.
    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub(crate) fn store(&self) -> &BlockStore {
        &self.store
    }

    /// The transactions spent by `tx`'s inputs, keyed by id.
    fn previous_transactions(&self, tx: &Transaction) -> Result<HashMap<Hash, Transaction>> {
        let mut prev_txs = HashMap::new();
        for input in &tx.inputs {
            let prev = self.find_transaction(&input.prev_tx_id).map_err(|err| {
                match err {
                    ChainError::TxNotFound(id) => ChainError::PrevTxMissing(id),
                    other => other,
                }
            })?;
            prev_txs.insert(prev.id.clone(), prev);
        }
        Ok(prev_txs)
    }
}

/// Cursor walking the chain backwards via `prev_hash`. Yields the genesis
/// block last, then stops.
pub struct ChainIterator {
    store: BlockStore,
    current_hash: Hash,
}

impl ChainIterator {
    /// The block under the cursor, advancing the cursor to its parent.
    pub fn next_block(&mut self) -> Result<Option<Block>> {
        if self.current_hash.is_empty() {
            return Ok(None);
        }
        let block = self.store.read_block(&self.current_hash)?;
        self.current_hash = block.prev_hash.clone();
        Ok(Some(block))
    }
}
