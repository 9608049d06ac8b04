// src/params.rs
// ============================================================================
// FIXED PARAMETERS
// ============================================================================
// Constants shared by the cache, the classifier and the claim workflow.
// Anything a deployment may want to change lives in `config.rs` instead.
// ============================================================================

// ============================================================================
// PAGINATION
// ============================================================================

/// Drops fetched per page request
pub const DROP_ITEMS_PER_QUERY: u64 = 5;

/// Keys fetched per page request
pub const KEY_ITEMS_PER_QUERY: u64 = 30;

// ============================================================================
// DROP CONTENT
// ============================================================================

/// Name shown for drops whose metadata carries none
pub const DEFAULT_DROP_NAME: &str = "Untitled";

/// Entry point that marks a single-call function-call drop as an NFT drop
pub const NFT_MINT_METHOD: &str = "nft_mint";

/// Display width for drop names in summaries
pub const DROP_NAME_DISPLAY_LEN: usize = 48;

/// Shown when an NFT drop's media cannot be resolved
pub const MEDIA_NOT_FOUND: &str = "assets/image-not-found.png";

// ============================================================================
// ACCOUNTS AND AMOUNTS
// ============================================================================

pub const ACCOUNT_ID_MIN_LEN: usize = 2;
pub const ACCOUNT_ID_MAX_LEN: usize = 64;

/// Placeholder beneficiary for password-gated ticket scans. The claim only
/// consumes a key use; nothing is sent to this account.
pub const TICKET_SCAN_ACCOUNT: &str = "foo";

/// yoctoNEAR per NEAR
pub const YOCTO_PER_NEAR: u128 = 1_000_000_000_000_000_000_000_000;

/// Decimal places shown for NEAR amounts
pub const NEAR_DISPLAY_DECIMALS: u32 = 4;

// ============================================================================
// NETWORK DEFAULTS
// ============================================================================

pub const DEFAULT_NETWORK_ID: &str = "testnet";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_IPFS_GATEWAY: &str = "https://cloudflare-ipfs.com/ipfs";
