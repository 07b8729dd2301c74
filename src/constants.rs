//! Protocol constants

/// Fixed proof-of-work difficulty: leading zero bits required of a block hash.
pub const DIFFICULTY: u64 = 12;

/// Coins minted by a coinbase transaction.
pub const MINING_REWARD: u64 = 100;

/// Version byte prepended to a public-key hash when forming an address.
pub const VERSION_BYTE: u8 = 0x00;

/// Bytes of double SHA-256 appended to a versioned payload as its checksum.
pub const CHECKSUM_LENGTH: usize = 4;

/// Decoded length of an address: version (1) + pubkey hash (20) + checksum (4).
pub const ADDRESS_LENGTH: usize = 25;

/// Length of a serialized public key: X and Y coordinates, 32 bytes each.
pub const PUBLIC_KEY_LENGTH: usize = 64;

/// Length of a serialized signature: r and s halves, 32 bytes each.
pub const SIGNATURE_LENGTH: usize = 64;

/// Store key holding the hash of the current chain tip.
pub const LAST_HASH_KEY: &[u8] = b"lh";

/// Store key prefix under which UTXO index entries live.
pub const UTXO_PREFIX: &[u8] = b"utxo-";

/// Output index marking a coinbase input.
pub const COINBASE_OUT_INDEX: i64 = -1;

/// Keys removed per atomic batch when clearing a key prefix.
pub const DELETE_BATCH_SIZE: usize = 100_000;
