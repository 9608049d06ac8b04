// src/error.rs
// Error handling for every drop, key and claim operation

use crate::drops::DropKind;
use crate::ledger::RpcError;
use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, DropError>;

#[derive(Error, Debug)]
pub enum DropError {
    #[error("Failed to fetch {collection}: {source}")]
    CollectionFetch {
        collection: String,
        #[source]
        source: RpcError,
    },

    #[error("Drop not found: {0}")]
    DropNotFound(String),

    #[error("Unsupported drop contract {contract_id} on {network}")]
    UnsupportedDrop { network: String, contract_id: String },

    #[error("Expected {} drop but found {}", .expected.with_article(), .actual)]
    UnexpectedDropType { expected: DropKind, actual: DropKind },

    #[error("Incorrect password")]
    IncorrectPassword,

    #[error("Invalid account id: {0}")]
    InvalidAccountId(String),

    #[error("Key has already been used or deleted")]
    KeyAlreadyUsed,

    #[error("Drop {0} carries no usable function call")]
    MissingFunctionCall(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error(transparent)]
    Rpc(#[from] RpcError),
}

impl DropError {
    pub(crate) fn collection(collection: impl Into<String>, source: RpcError) -> Self {
        Self::CollectionFetch {
            collection: collection.into(),
            source,
        }
    }

    /// Transport failures are the only ones a caller may reasonably retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::CollectionFetch { source, .. } | Self::Rpc(source) => source.is_transport(),
            _ => false,
        }
    }

    /// Short message suitable for direct display
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::CollectionFetch { collection, .. } => format!("Failed to fetch {}.", collection),
            Self::DropNotFound(msg) => msg.clone(),
            Self::UnsupportedDrop { .. } => {
                "This link isn't issued by a supported drop contract.".to_string()
            }
            Self::UnexpectedDropType { expected, .. } => format!(
                "This drop is not {} drop. Please contact your drop creator.",
                expected.with_article()
            ),
            Self::IncorrectPassword => "Password is incorrect. Please try again.".to_string(),
            Self::InvalidAccountId(msg) => msg.clone(),
            Self::KeyAlreadyUsed => "Drop has been deleted or has already been claimed".to_string(),
            Self::MissingFunctionCall(_) => "Unable to retrieve function calls.".to_string(),
            Self::InvalidKey(_) => "This link is malformed.".to_string(),
            Self::Config(msg) => format!("Configuration error: {}", msg),
            Self::Session(msg) => format!("Session error: {}", msg),
            Self::Rpc(e) => format!("Network error: {}", e),
        }
    }
}
