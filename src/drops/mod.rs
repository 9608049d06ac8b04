// src/drops/mod.rs
//! Drop model, metadata decoding, classification and event grouping.
//! Nothing in here performs I/O.

mod classify;
mod events;
pub mod metadata;
mod types;

pub use classify::{classify, DropKind};
pub use events::EventIndex;
pub use metadata::{decode_metadata, is_valid_event_ticket_drop, DropMetadata, MetadataError};
pub use types::{AttendeeKey, Drop, DropConfig, DropKeyItem, FcData, FtData, KeyInfo, MethodData};
