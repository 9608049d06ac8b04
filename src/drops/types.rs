// src/drops/types.rs
//! Wire types returned by the drop contracts

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Drop {
    /// Empty when the record carries none; such drops never validate
    #[serde(default)]
    pub drop_id: String,
    /// The account that funded and owns the drop
    #[serde(alias = "funder_id", default)]
    pub owner_id: String,
    /// Total keys ever issued; key indices live in `[0, next_key_id)`
    #[serde(default)]
    pub next_key_id: u64,
    #[serde(default, with = "u128_dec")]
    pub deposit_per_use: u128,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drop_config: Option<DropConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simple: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ft: Option<FtData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fc: Option<FcData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nft: Option<Value>,
}

impl Drop {
    /// Raw metadata string, wherever the deployment keeps it
    pub fn metadata_str(&self) -> Option<&str> {
        self.metadata
            .as_deref()
            .or_else(|| self.drop_config.as_ref().and_then(|c| c.metadata.as_deref()))
    }

    /// First call of the `index`-th method entry, if that entry is populated
    pub fn function_call(&self, index: usize) -> Option<&MethodData> {
        self.fc
            .as_ref()?
            .methods
            .get(index)?
            .as_ref()?
            .first()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DropConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FtData {
    pub contract_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<String>,
    #[serde(default)]
    pub balance_per_use: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FcData {
    /// One entry per key use; `None` means that use calls nothing
    #[serde(default)]
    pub methods: Vec<Option<Vec<MethodData>>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MethodData {
    pub receiver_id: String,
    pub method_name: String,
    #[serde(default)]
    pub args: String,
    #[serde(default)]
    pub attached_deposit: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Key record as the drop contract reports it
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyInfo {
    #[serde(default)]
    pub pk: String,
    #[serde(default)]
    pub drop_id: String,
    pub remaining_uses: u32,
    #[serde(default)]
    pub cur_key_use: u32,
    #[serde(default)]
    pub last_used: u64,
    #[serde(default)]
    pub key_id: u64,
    #[serde(default, with = "u128_dec")]
    pub allowance: u128,
}

/// Key record on the events deployment
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttendeeKey {
    pub drop_id: String,
    pub pub_key: String,
    #[serde(default)]
    pub owner_id: String,
    #[serde(default)]
    pub metadata: String,
    #[serde(default)]
    pub uses_remaining: u32,
    #[serde(default)]
    pub message_nonce: u64,
}

/// One issued key of an owner's drop, with its shareable link
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DropKeyItem {
    pub id: u64,
    pub public_key: String,
    pub link: String,
    pub slug: String,
    /// The ledger no longer knows the key, so every use has been spent
    pub has_claimed: bool,
    pub key_info: Option<KeyInfo>,
}

/// Large integers come over the wire as decimal strings, occasionally as numbers.
pub(crate) mod u128_dec {
    use super::*;

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        use serde::de::Error;
        match Value::deserialize(deserializer)? {
            Value::String(s) => s.parse().map_err(D::Error::custom),
            Value::Number(n) => n
                .as_u64()
                .map(u128::from)
                .ok_or_else(|| D::Error::custom("expected an unsigned integer")),
            Value::Null => Ok(0),
            other => Err(D::Error::custom(format!("expected integer, got {}", other))),
        }
    }
}
