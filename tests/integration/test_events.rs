// tests/integration/test_events.rs
// ============================================================================
// EVENTS DEPLOYMENT: EVENT INDEX AND ATTENDEE KEYS
// ============================================================================

use crate::mock::{client_with, page_of, MockLedger, MockSigner, EVENTS_CONTRACT};
use linkdrop_client::{DropError, RpcError};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

const FUNDER: &str = "org.testnet";
const TICKET_DROP: &str = "501";

fn funder_drop(id: &str, metadata: Value) -> Value {
    json!({
        "drop_id": id,
        "funder_id": FUNDER,
        "next_key_id": 0,
        "drop_config": { "metadata": metadata.to_string() }
    })
}

fn funder_drops() -> Vec<Value> {
    vec![
        funder_drop(
            "500",
            json!({
                "dropName": "Summer Gig",
                "eventInfo": { "id": "ev1", "name": "Summer Gig", "location": "Pier 9", "date": { "date": "2024-07-01" } },
                "ticketInfo": { "eventId": "ev1", "name": "Host", "price": "0" }
            }),
        ),
        funder_drop(
            TICKET_DROP,
            json!({ "dropName": "GA", "ticketInfo": { "eventId": "ev1", "name": "GA", "price": "25" } }),
        ),
        funder_drop(
            "502",
            json!({ "dropName": "Bad price", "ticketInfo": { "eventId": "ev1", "name": "x", "price": "free" } }),
        ),
        funder_drop(
            "503",
            json!({ "dropName": "Orphan", "ticketInfo": { "eventId": "ev404", "name": "y", "price": 1 } }),
        ),
        json!({ "drop_id": "504", "funder_id": FUNDER, "next_key_id": 0 }),
        funder_drop(
            "505",
            json!({
                "dropName": "Winter Gig",
                "eventInfo": { "id": "ev2", "name": "Winter Gig", "location": "Dome", "date": "2024-12-01" },
                "ticketInfo": { "eventId": "ev2", "name": "Host", "price": 0 }
            }),
        ),
    ]
}

fn attendee_key(index: u64) -> Value {
    json!({
        "drop_id": TICKET_DROP,
        "pub_key": format!("ed25519:attendee{}", index),
        "owner_id": "",
        "metadata": "",
        "uses_remaining": 2,
        "message_nonce": index
    })
}

fn events_ledger(attendees: Arc<AtomicU64>) -> MockLedger {
    let drops = funder_drops();
    MockLedger::new(move |contract, method, args| {
        if contract != EVENTS_CONTRACT {
            return Err(RpcError::server(method, format!("wrong contract {}", contract)));
        }
        let issued = attendees.load(Ordering::SeqCst);
        match method {
            "get_drop_supply_for_funder" => Ok(json!(drops.len())),
            "get_drops_for_funder" => Ok(page_of(args, drops.len() as u64, |i| drops[i as usize].clone())),
            "get_drop_information" => {
                let mut drop = drops
                    .iter()
                    .find(|d| d["drop_id"] == args["drop_id"])
                    .cloned()
                    .ok_or_else(|| RpcError::server(method, "no such drop"))?;
                drop["next_key_id"] = json!(issued);
                Ok(drop)
            }
            "get_keys_for_drop" => Ok(page_of(args, issued, attendee_key)),
            "get_key_supply_for_drop" => Ok(json!(issued)),
            other => Err(RpcError::server(other, "unexpected method")),
        }
    })
}

fn setup(attendees: u64) -> (linkdrop_client::DropClient, Arc<MockLedger>, Arc<AtomicU64>) {
    let attendees = Arc::new(AtomicU64::new(attendees));
    let ledger = Arc::new(events_ledger(attendees.clone()));
    let client = client_with(ledger.clone(), Arc::new(MockSigner::accepting()));
    (client, ledger, attendees)
}

fn ids(drops: &[linkdrop_client::Drop]) -> Vec<&str> {
    drops.iter().map(|d| d.drop_id.as_str()).collect()
}

/// Test 1: only valid drops with eventInfo are events
#[tokio::test]
async fn test_all_event_drops() {
    let (client, ledger, _) = setup(0);

    let events = client.all_event_drops(FUNDER).await.unwrap();
    assert_eq!(ids(&events), vec!["500", "505"]);
    assert_eq!(ledger.count("get_drops_for_funder"), 2);

    ledger.clear();
    client.all_event_drops(FUNDER).await.unwrap();
    assert!(ledger.calls().is_empty());

    client.refresh_events(FUNDER).await;
    client.all_event_drops(FUNDER).await.unwrap();
    assert_eq!(ledger.count("get_drop_supply_for_funder"), 1);
}

/// Test 2: tickets are grouped under their event
#[tokio::test]
async fn test_tickets_for_event() {
    let (client, _, _) = setup(0);

    let tickets = client.tickets_for_event(FUNDER, "ev1").await.unwrap();
    assert_eq!(ids(&tickets), vec!["500", TICKET_DROP]);
    assert_eq!(ids(&client.tickets_for_event(FUNDER, "ev2").await.unwrap()), vec!["505"]);
    assert!(client.tickets_for_event(FUNDER, "ev404").await.unwrap().is_empty());
}

/// Test 3: the event drop is read fresh from the events deployment
#[tokio::test]
async fn test_event_drop() {
    let (client, ledger, _) = setup(0);

    let drop = client.event_drop(FUNDER, "ev2").await.unwrap();
    assert_eq!(drop.drop_id, "505");
    let read = ledger
        .calls()
        .into_iter()
        .find(|c| c.method == "get_drop_information")
        .unwrap();
    assert_eq!(read.contract, EVENTS_CONTRACT);

    let err = client.event_drop(FUNDER, "ev404").await.unwrap_err();
    assert!(matches!(err, DropError::DropNotFound(_)));
}

/// Test 4: attendee keys re-check the ticket total on every read
#[tokio::test]
async fn test_attendee_keys() {
    let (client, ledger, attendees) = setup(40);

    let page = client.paginated_keys_for_ticket(TICKET_DROP, 0, 10).await.unwrap();
    assert_eq!(page.len(), 10);
    assert_eq!(page[3].pub_key, "ed25519:attendee3");
    assert_eq!(ledger.page_starts("get_keys_for_drop"), vec![0]);

    ledger.clear();
    let all = client.all_keys_for_ticket(TICKET_DROP).await.unwrap();
    assert_eq!(all.drop_name, "GA");
    assert_eq!(all.total_keys, 40);
    assert_eq!(all.items.len(), 40);
    assert_eq!(ledger.count("get_drop_information"), 1);
    assert_eq!(ledger.page_starts("get_keys_for_drop"), vec![30]);

    attendees.store(41, Ordering::SeqCst);
    ledger.clear();
    let page = client.paginated_keys_for_ticket(TICKET_DROP, 0, 10).await.unwrap();
    assert_eq!(page.len(), 10);
    assert_eq!(ledger.page_starts("get_keys_for_drop"), vec![0]);

    assert_eq!(client.key_supply_for_ticket(TICKET_DROP).await.unwrap(), 41);
}

/// Test 5: a funder record without an id is left out, not fatal
#[tokio::test]
async fn test_funder_drop_without_id_is_skipped() {
    let mut drops = funder_drops();
    drops.insert(
        1,
        json!({
            "funder_id": FUNDER,
            "drop_config": { "metadata": json!({ "dropName": "No id", "ticketInfo": { "eventId": "ev1", "name": "z", "price": 1 } }).to_string() }
        }),
    );
    let ledger = Arc::new(MockLedger::new(move |_contract, method, args| match method {
        "get_drop_supply_for_funder" => Ok(json!(drops.len())),
        "get_drops_for_funder" => Ok(page_of(args, drops.len() as u64, |i| drops[i as usize].clone())),
        other => Err(RpcError::server(other, "unexpected method")),
    }));
    let client = client_with(ledger, Arc::new(MockSigner::accepting()));

    let events = client.all_event_drops(FUNDER).await.unwrap();
    assert_eq!(ids(&events), vec!["500", "505"]);
    let tickets = client.tickets_for_event(FUNDER, "ev1").await.unwrap();
    assert_eq!(ids(&tickets), vec!["500", TICKET_DROP]);
}
