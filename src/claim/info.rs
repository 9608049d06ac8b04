// src/claim/info.rs
// What a claim page shows before the user commits

use crate::drops::DropKind;
use serde::Serialize;
use serde_json::Value;

/// Token payout of a drop
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaimInfo {
    pub drop_name: String,
    pub wallets: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    /// `ft_metadata` of the token contract, for FT drops
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ft_metadata: Option<Value>,
    /// Raw per-use token balance, for FT drops
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_tokens: Option<String>,
    /// Per-use deposit in NEAR
    pub amount_near: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NftMedia {
    /// Gateway URL of the series artwork
    pub media: String,
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Result of an NFT or ticket lookup. `kind` is `Nft` when the series was
/// found and `Token` when the lookup fell back to the token payout.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NftClaimInfo {
    #[serde(rename = "type")]
    pub kind: DropKind,
    pub drop_name: String,
    pub wallets: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nft: Option<NftMedia>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens: Option<TokenClaimInfo>,
}

impl NftMedia {
    /// Series info is `{ metadata: { media, title, description } }`
    pub(crate) fn from_series(series: &Value, ipfs_gateway: &str) -> Option<Self> {
        let metadata = series.get("metadata")?;
        let text = |field: &str| metadata.get(field).and_then(Value::as_str).map(str::to_string);
        let media = text("media")?;
        Some(Self {
            media: format!("{}/{}", ipfs_gateway.trim_end_matches('/'), media),
            title: text("title"),
            description: text("description"),
        })
    }
}
