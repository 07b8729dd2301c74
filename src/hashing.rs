//! Hashing and encoding primitives

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

use crate::constants::CHECKSUM_LENGTH;
use crate::error::{ChainError, Result};

/// SHA-256 digest.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// RIPEMD-160 digest.
pub fn ripemd160(data: &[u8]) -> [u8; 20] {
    Ripemd160::digest(data).into()
}

/// First four bytes of the double SHA-256 of the payload.
pub fn checksum(payload: &[u8]) -> Vec<u8> {
    sha256(&sha256(payload))[..CHECKSUM_LENGTH].to_vec()
}

/// Base58 encoding with the Bitcoin alphabet.
pub fn base58_encode(data: &[u8]) -> String {
    bs58::encode(data).into_string()
}

/// Base58 decoding with the Bitcoin alphabet.
pub fn base58_decode(data: &str) -> Result<Vec<u8>> {
    bs58::decode(data)
        .into_vec()
        .map_err(|e| ChainError::Decode(format!("base58: {e}")))
}
