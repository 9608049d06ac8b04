//! src/lib.rs
//! # linkdrop-client
//!
//! Client-side data access for tokenized-link drops. A drop is a bundle of
//! single-use access keys; each key travels inside a shareable link and can
//! be claimed for the drop's payload (tokens, an NFT, or an event ticket).
//!
//! ## Components
//! - **Remote accessor** (`ledger`): typed read-only calls over an
//!   `invoke(contract, method, args) -> JSON` transport
//! - **Collection cache** (`cache`): sparse, page-aligned caches over an
//!   owner's drops, a drop's keys and the events deployment's collections
//! - **Metadata and classifier** (`drops`): metadata decoding, event/ticket
//!   validation and drop kind classification
//! - **Claim workflow** (`claim`): resolve a link's drop, check it, claim it
//!
//! [`DropClient`] ties them together and is the usual entry point:
//!
//! ```no_run
//! use linkdrop_client::{ClientConfig, DropClient};
//!
//! # async fn run() -> linkdrop_client::Result<()> {
//! let client = DropClient::builder(ClientConfig::from_env())
//!     .master_key("my-master-key")
//!     .build()?;
//! let first_page = client.paginated_keys_info("1700000000000", 0, 30).await?;
//! # let _ = first_page;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod claim;
pub mod client;
pub mod config;
pub mod drops;
pub mod error;
pub mod keys;
pub mod ledger;
pub mod params;
pub mod session;
pub mod utils;

pub use cache::{CollectionSource, PageCache};
pub use claim::{ClaimWorkflow, NftClaimInfo, TokenClaimInfo};
pub use client::{DropClient, DropClientBuilder, DropSummary, KeyCollection};
pub use config::{CacheConfig, ClientConfig};
pub use drops::{classify, decode_metadata, is_valid_event_ticket_drop, Drop, DropKind, DropMetadata, EventIndex};
pub use error::{DropError, Result};
pub use keys::{EntropyKeyDeriver, KeyDeriver, KeyPair, PublicKey, SecretKey};
pub use ledger::{ClaimRequest, ClaimSigner, JsonRpcClient, LedgerRpc, RemoteAccessor, RpcError};
pub use session::SessionStore;
