//! Key pairs and addresses
//!
//! A wallet is a NIST P-256 key pair. The public key travels as the raw
//! X and Y coordinates (32 fixed-width big-endian bytes each); an address
//! is the Base58 form of `version || ripemd160(sha256(pubkey)) || checksum`.

use p256::ecdsa::{SigningKey, VerifyingKey};
use p256::elliptic_curve::generic_array::GenericArray;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::EncodedPoint;
use rand_core::OsRng;

use crate::constants::{ADDRESS_LENGTH, CHECKSUM_LENGTH, PUBLIC_KEY_LENGTH, VERSION_BYTE};
use crate::error::{ChainError, Result};
use crate::hashing::{base58_decode, base58_encode, checksum, ripemd160, sha256};
use crate::types::{ByteString, PubKeyHash};

/// An in-memory key pair. Persistence of key material is left to callers.
#[derive(Clone)]
pub struct Wallet {
    signing_key: SigningKey,
    public_key: ByteString,
}

impl Wallet {
    /// Generate a fresh P-256 key pair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::random(&mut OsRng);
        let public_key = encode_public_key(signing_key.verifying_key());
        Self { signing_key, public_key }
    }

    /// The public key as X || Y bytes.
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// The private half, used to sign transaction inputs.
    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    /// RIPEMD-160(SHA-256(public key)).
    pub fn pubkey_hash(&self) -> PubKeyHash {
        public_key_hash(&self.public_key)
    }

    /// The Base58Check address of this wallet, version byte 0x00.
    pub fn address(&self) -> String {
        address_from_pubkey_hash(&self.pubkey_hash(), VERSION_BYTE)
    }
}

/// Serialize a verifying key as its X and Y coordinates.
pub fn encode_public_key(key: &VerifyingKey) -> ByteString {
    // Uncompressed SEC1 is 0x04 || X || Y; drop the tag byte.
    key.to_encoded_point(false).as_bytes()[1..].to_vec()
}

/// Rebuild a verifying key from X || Y bytes.
pub fn decode_public_key(bytes: &[u8]) -> Result<VerifyingKey> {
    if bytes.len() != PUBLIC_KEY_LENGTH {
        return Err(ChainError::Signature(format!(
            "public key must be {PUBLIC_KEY_LENGTH} bytes, got {}",
            bytes.len()
        )));
    }
    let point = EncodedPoint::from_untagged_bytes(GenericArray::from_slice(bytes));
    VerifyingKey::from_encoded_point(&point).map_err(|e| ChainError::Signature(e.to_string()))
}

/// RIPEMD-160 of the SHA-256 of a serialized public key.
pub fn public_key_hash(pubkey: &[u8]) -> PubKeyHash {
    ripemd160(&sha256(pubkey)).to_vec()
}

/// Base58Check address for a public-key hash.
pub fn address_from_pubkey_hash(pubkey_hash: &[u8], version: u8) -> String {
    let mut payload = Vec::with_capacity(ADDRESS_LENGTH);
    payload.push(version);
    payload.extend_from_slice(pubkey_hash);
    let check = checksum(&payload);
    payload.extend_from_slice(&check);
    base58_encode(&payload)
}

/// Whether an address decodes and its checksum matches.
pub fn validate_address(address: &str) -> bool {
    address_pubkey_hash(address).is_ok()
}

/// Decode an address and return the embedded public-key hash.
pub fn address_pubkey_hash(address: &str) -> Result<PubKeyHash> {
    let decoded = base58_decode(address)
        .map_err(|_| ChainError::InvalidAddress(address.to_string()))?;
    if decoded.len() != ADDRESS_LENGTH {
        return Err(ChainError::InvalidAddress(address.to_string()));
    }
    let (versioned, claimed) = decoded.split_at(decoded.len() - CHECKSUM_LENGTH);
    if checksum(versioned) != claimed {
        return Err(ChainError::InvalidAddress(address.to_string()));
    }
    Ok(versioned[1..].to_vec())
}
