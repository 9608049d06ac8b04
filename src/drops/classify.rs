// src/drops/classify.rs
// Drop kind decision tree

use super::types::Drop;
use crate::params::NFT_MINT_METHOD;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DropKind {
    Token,
    Ticket,
    #[serde(rename = "NFT", alias = "nft")]
    Nft,
    Other,
}

impl DropKind {
    pub fn with_article(self) -> String {
        match self {
            Self::Nft | Self::Other => format!("an {}", self),
            _ => format!("a {}", self),
        }
    }
}

impl fmt::Display for DropKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Token => "Token",
            Self::Ticket => "Ticket",
            Self::Nft => "NFT",
            Self::Other => "Other",
        };
        f.write_str(name)
    }
}

/// Classify a fetched drop. Pure; inspects only fields already on the drop.
///
/// - neither function-call nor NFT payload: `Token`
/// - function-call with exactly three method entries: `Ticket`
/// - function-call with exactly one entry whose first call mints: `Nft`
/// - anything else: `Other`
pub fn classify(drop: &Drop) -> DropKind {
    let Some(fc) = &drop.fc else {
        return if drop.nft.is_none() {
            DropKind::Token
        } else {
            DropKind::Other
        };
    };

    match fc.methods.len() {
        3 => DropKind::Ticket,
        1 if drop
            .function_call(0)
            .is_some_and(|call| call.method_name == NFT_MINT_METHOD) =>
        {
            DropKind::Nft
        }
        _ => DropKind::Other,
    }
}
