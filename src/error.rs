//! Error types for chain operations

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("no chain found in the store, create one first")]
    NotInitialized,

    #[error("chain already exists in the store")]
    AlreadyExists,

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("insufficient funds: {available} available, {requested} requested")]
    InsufficientFunds { available: u64, requested: u64 },

    #[error("previous transaction {0} is missing")]
    PrevTxMissing(String),

    #[error("no signing key available for {0}")]
    WalletMissing(String),

    #[error("transaction {0} not found in the chain")]
    TxNotFound(String),

    #[error("store error: {0}")]
    Store(#[from] sled::Error),

    #[error("failed to encode value: {0}")]
    Encode(String),

    #[error("corrupt bytes in the store: {0}")]
    Decode(String),

    #[error("invalid block: {0}")]
    InvalidBlock(String),

    #[error("inputs supply {inputs} but outputs claim {outputs}")]
    ConservationViolation { inputs: u64, outputs: u64 },

    #[error("signature operation failed: {0}")]
    Signature(String),
}

pub type Result<T> = std::result::Result<T, ChainError>;
