//! Digital cash protocol constants

/// The one supported script format, on both inputs and outputs
pub const SCRIPT_TYPE: &str = "P2PKH";

/// Outpoint hash marking a coinbase input: base64url of 32 zero bytes
pub const COINBASE_HASH: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=";

/// Outpoint index used together with `COINBASE_HASH`
pub const COINBASE_INDEX: u32 = 0;

/// Version stamped on every built transaction
pub const TRANSACTION_VERSION: u32 = 1;

/// Lock time stamped on every built transaction
pub const TRANSACTION_LOCK_TIME: u64 = 0;

/// Number of SHA-256 bytes kept in a public key hash
pub const PUBLIC_KEY_HASH_LEN: usize = 20;

/// Default channel root of the pub-sub bus
pub const DEFAULT_ROOT_CHANNEL: &str = "/root";

/// Last path segment of an organization's coin channel
pub const COIN_CHANNEL_SUFFIX: &str = "coin";

/// `object` field of every coin message
pub const COIN_OBJECT: &str = "coin";

/// `action` field of a transaction broadcast
pub const POST_TRANSACTION_ACTION: &str = "post_transaction";
