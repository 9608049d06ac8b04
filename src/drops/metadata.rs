// src/drops/metadata.rs
//! Drop metadata decoding and event/ticket validation
//!
//! Metadata is authored by whoever created the drop, so nothing here is
//! allowed to fail loudly: [`decode_metadata`] always returns something
//! usable, and the validators only decide whether a drop takes part in event
//! grouping.

use super::types::Drop;
use crate::params::DEFAULT_DROP_NAME;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetadataError {
    #[error("drop is missing `{0}`")]
    MissingField(&'static str),
    #[error("metadata is not a JSON object: {0}")]
    Malformed(String),
    #[error("eventInfo is invalid: {0}")]
    InvalidEventInfo(&'static str),
    #[error("ticketInfo is invalid: {0}")]
    InvalidTicketInfo(&'static str),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DropMetadata {
    pub drop_name: String,
    pub event_info: Option<Value>,
    pub ticket_info: Option<Value>,
    pub wallets: Vec<String>,
    pub redirect_url: Option<String>,
    /// Everything else the author put in the blob
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Best-effort decode. Unparseable or non-object input yields the defaults.
pub fn decode_metadata(raw: Option<&str>) -> DropMetadata {
    let mut fields = match raw.map(serde_json::from_str::<Value>) {
        Some(Ok(Value::Object(map))) => map,
        _ => Map::new(),
    };

    let drop_name = take_string(&mut fields, "dropName")
        .or_else(|| take_string(&mut fields, "drop_name"))
        .unwrap_or_else(|| DEFAULT_DROP_NAME.to_string());
    let event_info = fields.remove("eventInfo").filter(|v| !v.is_null());
    let ticket_info = fields.remove("ticketInfo").filter(|v| !v.is_null());
    let wallets = match fields.remove("wallets") {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|w| w.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    };
    let redirect_url = take_string(&mut fields, "redirectUrl");

    DropMetadata {
        drop_name,
        event_info,
        ticket_info,
        wallets,
        redirect_url,
        extra: fields,
    }
}

fn take_string(fields: &mut Map<String, Value>, key: &str) -> Option<String> {
    if !fields.get(key).is_some_and(Value::is_string) {
        return None;
    }
    match fields.remove(key) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EventInfo {
    pub id: String,
    pub name: String,
    pub location: String,
    pub date: Value,
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketInfo {
    pub event_id: String,
    pub name: String,
    pub price: String,
    pub description: Option<String>,
    pub max_supply: Option<u64>,
}

fn non_empty_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// An event must be identified, named, dated and located.
pub fn validate_event_info(value: &Value) -> Result<EventInfo, MetadataError> {
    if !value.is_object() {
        return Err(MetadataError::InvalidEventInfo("not an object"));
    }
    let id = non_empty_str(value, "id").ok_or(MetadataError::InvalidEventInfo("id"))?;
    let name = non_empty_str(value, "name").ok_or(MetadataError::InvalidEventInfo("name"))?;
    let location = non_empty_str(value, "location").ok_or(MetadataError::InvalidEventInfo("location"))?;
    let date = match value.get("date") {
        Some(Value::String(s)) if !s.trim().is_empty() => Value::String(s.clone()),
        Some(date @ Value::Object(_)) => date.clone(),
        _ => return Err(MetadataError::InvalidEventInfo("date")),
    };

    Ok(EventInfo {
        id: id.to_string(),
        name: name.to_string(),
        location: location.to_string(),
        date,
        description: non_empty_str(value, "description").map(str::to_string),
    })
}

/// A ticket type must name its event, itself, and a numeric price.
pub fn validate_ticket_info(value: &Value) -> Result<TicketInfo, MetadataError> {
    if !value.is_object() {
        return Err(MetadataError::InvalidTicketInfo("not an object"));
    }
    let event_id = non_empty_str(value, "eventId").ok_or(MetadataError::InvalidTicketInfo("eventId"))?;
    let name = non_empty_str(value, "name").ok_or(MetadataError::InvalidTicketInfo("name"))?;
    let price = match value.get("price") {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) if s.trim().parse::<f64>().is_ok() => s.trim().to_string(),
        _ => return Err(MetadataError::InvalidTicketInfo("price")),
    };

    Ok(TicketInfo {
        event_id: event_id.to_string(),
        name: name.to_string(),
        price,
        description: non_empty_str(value, "description").map(str::to_string),
        max_supply: value.get("maxSupply").and_then(Value::as_u64),
    })
}

/// A drop that passed validation, with its decoded event/ticket parts
#[derive(Clone, Debug, PartialEq)]
pub struct EventTicketDrop {
    pub drop_name: String,
    pub event_info: Option<EventInfo>,
    pub ticket_info: TicketInfo,
}

pub fn validate_event_ticket_drop(drop: &Drop) -> Result<EventTicketDrop, MetadataError> {
    if drop.drop_id.is_empty() {
        return Err(MetadataError::MissingField("drop_id"));
    }
    if drop.owner_id.is_empty() {
        return Err(MetadataError::MissingField("funder_id"));
    }
    let raw = drop
        .metadata_str()
        .filter(|m| !m.is_empty())
        .ok_or(MetadataError::MissingField("metadata"))?;

    let metadata = match serde_json::from_str::<Value>(raw) {
        Ok(value @ Value::Object(_)) => value,
        Ok(other) => return Err(MetadataError::Malformed(other.to_string())),
        Err(e) => return Err(MetadataError::Malformed(e.to_string())),
    };

    let drop_name = non_empty_str(&metadata, "dropName").ok_or(MetadataError::MissingField("dropName"))?;
    let ticket_info = metadata
        .get("ticketInfo")
        .filter(|v| !v.is_null())
        .ok_or(MetadataError::MissingField("ticketInfo"))?;

    let event_info = match metadata.get("eventInfo").filter(|v| !v.is_null()) {
        Some(info) => Some(validate_event_info(info)?),
        None => None,
    };
    let ticket_info = validate_ticket_info(ticket_info)?;

    Ok(EventTicketDrop {
        drop_name: drop_name.to_string(),
        event_info,
        ticket_info,
    })
}

pub fn is_valid_event_ticket_drop(drop: &Drop) -> bool {
    validate_event_ticket_drop(drop).is_ok()
}
