// src/drops/events.rs
// Groups an account's drops into events and their ticket types

use super::metadata::validate_event_ticket_drop;
use super::types::Drop;
use std::collections::HashMap;
use tracing::debug;

/// Event drops carry `eventInfo`; every valid drop (event drops included)
/// is grouped under the drop id of the event its `ticketInfo.eventId` names.
#[derive(Clone, Debug, Default)]
pub struct EventIndex {
    event_drops: Vec<Drop>,
    event_by_id: HashMap<String, String>,
    tickets_by_drop: HashMap<String, Vec<Drop>>,
}

impl EventIndex {
    /// Invalid drops are skipped silently; they never make it into the index.
    pub fn build(drops: impl IntoIterator<Item = Drop>) -> Self {
        let mut valid = Vec::new();
        for drop in drops {
            match validate_event_ticket_drop(&drop) {
                Ok(parsed) => valid.push((drop, parsed)),
                Err(reason) => debug!(drop_id = %drop.drop_id, %reason, "excluding drop from events"),
            }
        }

        let mut index = Self::default();
        for (drop, parsed) in &valid {
            if let Some(event) = &parsed.event_info {
                index
                    .event_by_id
                    .insert(event.id.clone(), drop.drop_id.clone());
                index.event_drops.push(drop.clone());
            }
        }

        for (drop, parsed) in valid {
            match index.event_by_id.get(&parsed.ticket_info.event_id) {
                Some(event_drop_id) => index
                    .tickets_by_drop
                    .entry(event_drop_id.clone())
                    .or_default()
                    .push(drop),
                None => debug!(
                    drop_id = %drop.drop_id,
                    event_id = %parsed.ticket_info.event_id,
                    "ticket references unknown event"
                ),
            }
        }

        index
    }

    pub fn is_empty(&self) -> bool {
        self.event_drops.is_empty()
    }

    pub fn event_drops(&self) -> &[Drop] {
        &self.event_drops
    }

    pub fn drop_id_for_event(&self, event_id: &str) -> Option<&str> {
        self.event_by_id.get(event_id).map(String::as_str)
    }

    /// Ticket-type drops grouped under the event's drop
    pub fn tickets_for_event(&self, event_id: &str) -> Option<&[Drop]> {
        let drop_id = self.drop_id_for_event(event_id)?;
        self.tickets_for_drop(drop_id)
    }

    pub fn tickets_for_drop(&self, event_drop_id: &str) -> Option<&[Drop]> {
        self.tickets_by_drop.get(event_drop_id).map(Vec::as_slice)
    }
}
