//! # coinledger
//!
//! A proof-of-work secured UTXO ledger over an embedded key-value store.
//!
//! Blocks are content-addressed by the hash their proof of work produces
//! and chained through `prev_hash`, with the store key `"lh"` pointing at
//! the tip. Coin transactions carry ECDSA-signed inputs and outputs locked
//! to public-key hashes; each block commits to its transaction set through
//! a Merkle root bound into the proof-of-work preimage. A persistent UTXO
//! index under a reserved key prefix answers balance and spendability
//! queries without rescanning the chain.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use coinledger::{Blockchain, ChainConfig, UtxoIndex, Wallet};
//!
//! let miner = Wallet::generate();
//! let mut chain = Blockchain::init(ChainConfig::new("./ledger"), &miner.address())?;
//! let utxo = UtxoIndex::new(&chain);
//! utxo.reindex(&chain)?;
//!
//! let recipient = Wallet::generate();
//! let tx = chain.new_transaction(&miner, &recipient.address(), 10, &utxo)?;
//! let block = chain.add_block(vec![tx])?;
//! utxo.update(&block)?;
//!
//! assert_eq!(utxo.balance_of(&recipient.pubkey_hash())?, 10);
//! # Ok::<(), coinledger::ChainError>(())
//! ```

pub mod block;
pub mod chain;
pub mod codec;
pub mod constants;
pub mod error;
pub mod hashing;
pub mod merkle;
pub mod pow;
pub mod store;
pub mod transaction;
pub mod types;
pub mod utxo;
pub mod wallet;

pub use chain::{Blockchain, ChainConfig, ChainIterator};
pub use error::{ChainError, Result};
pub use pow::ProofOfWork;
pub use types::{Block, Hash, PubKeyHash, Transaction, TxInput, TxOutput, TxOutputs};
pub use utxo::UtxoIndex;
pub use wallet::Wallet;
