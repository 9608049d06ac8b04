// tests/integration/test_drop_client.rs
// ============================================================================
// DROP CLIENT: KEYS, LISTINGS AND SESSIONS
// ============================================================================

use crate::mock::{client_with, owner_drop, page_of, MockLedger, MockSigner, CONTRACT, MASTER_KEY, ORIGIN};
use linkdrop_client::keys::claim_link;
use linkdrop_client::{
    DropClient, DropError, DropKind, EntropyKeyDeriver, KeyDeriver, PublicKey, RpcError, SessionStore,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

const DROP_ID: &str = "42";

fn key_drop(next_key_id: u64) -> Value {
    json!({
        "drop_id": DROP_ID,
        "owner_id": "alice.testnet",
        "next_key_id": next_key_id,
        "deposit_per_use": "0",
        "drop_config": { "metadata": json!({ "dropName": "Launch Party" }).to_string() },
        "simple": {}
    })
}

/// Serves a drop with `next_key` keys; the key at index 0 has been claimed.
fn keys_ledger(next_key: Arc<AtomicU64>) -> MockLedger {
    let claimed = EntropyKeyDeriver::new(MASTER_KEY)
        .derive(DROP_ID, 0)
        .unwrap()
        .public_key;
    MockLedger::new(move |_contract, method, args| match method {
        "get_drop_information" => Ok(key_drop(next_key.load(Ordering::SeqCst))),
        "get_key_information_batch" => {
            let keys: Vec<PublicKey> = serde_json::from_value(args["keys"].clone()).unwrap();
            Ok(Value::Array(
                keys.iter()
                    .map(|pk| {
                        if *pk == claimed {
                            Value::Null
                        } else {
                            json!({ "pk": pk, "drop_id": DROP_ID, "remaining_uses": 1, "cur_key_use": 1 })
                        }
                    })
                    .collect(),
            ))
        }
        other => Err(RpcError::server(other, "unexpected method")),
    })
}

fn keys_client(next_key: u64) -> (DropClient, Arc<MockLedger>, Arc<AtomicU64>) {
    let next_key = Arc::new(AtomicU64::new(next_key));
    let ledger = Arc::new(keys_ledger(next_key.clone()));
    let client = client_with(ledger.clone(), Arc::new(MockSigner::accepting()));
    (client, ledger, next_key)
}

/// Test 1: key pages are derived locally and checked in batches of 30
#[tokio::test]
async fn test_all_keys_info() {
    let (client, ledger, _) = keys_client(35);

    let keys = client.all_keys_info(DROP_ID).await.unwrap();
    assert_eq!(keys.drop_name, "Launch Party");
    assert_eq!(keys.total_keys, 35);
    assert_eq!(keys.items.len(), 35);
    assert_eq!(ledger.count("get_key_information_batch"), 2);

    let first = &keys.items[0];
    assert_eq!(first.id, 0);
    assert!(first.has_claimed);
    assert!(first.key_info.is_none());
    assert!(first.link.starts_with(&format!("{}/claim/{}#", ORIGIN, CONTRACT)));
    assert_eq!(first.slug.len(), 8);

    let last = &keys.items[34];
    assert_eq!(last.id, 34);
    assert!(!last.has_claimed);
    assert_eq!(last.key_info.as_ref().unwrap().remaining_uses, 1);

    // Unchanged drop: one drop read, no key reads
    ledger.clear();
    client.all_keys_info(DROP_ID).await.unwrap();
    assert_eq!(ledger.count("get_drop_information"), 1);
    assert_eq!(ledger.count("get_key_information_batch"), 0);
}

/// Test 2: new keys on the drop rebuild the key cache
#[tokio::test]
async fn test_all_keys_info_picks_up_new_keys() {
    let (client, ledger, next_key) = keys_client(10);
    assert_eq!(client.all_keys_info(DROP_ID).await.unwrap().items.len(), 10);

    next_key.store(12, Ordering::SeqCst);
    ledger.clear();
    let keys = client.all_keys_info(DROP_ID).await.unwrap();
    assert_eq!(keys.items.len(), 12);
    assert_eq!(ledger.count("get_key_information_batch"), 1);
}

/// Test 3: paginated keys read the drop once, then only missing pages
#[tokio::test]
async fn test_paginated_keys_info() {
    let (client, ledger, _) = keys_client(70);

    let page = client.paginated_keys_info(DROP_ID, 25, 10).await.unwrap();
    assert_eq!(page.iter().map(|k| k.id).collect::<Vec<_>>(), (25..35).collect::<Vec<_>>());
    assert_eq!(ledger.count("get_drop_information"), 1);
    assert_eq!(ledger.count("get_key_information_batch"), 2);

    ledger.clear();
    client.paginated_keys_info(DROP_ID, 30, 5).await.unwrap();
    assert!(ledger.calls().is_empty());
}

/// Test 4: exported links match the derived keys
#[tokio::test]
async fn test_links_to_export() {
    let (client, _, _) = keys_client(3);
    let links = client.links_to_export(DROP_ID).await.unwrap();

    let deriver = EntropyKeyDeriver::new(MASTER_KEY);
    let expected: Vec<String> = deriver
        .derive_range(DROP_ID, 0, 3)
        .unwrap()
        .iter()
        .map(|pair| claim_link(ORIGIN, CONTRACT, &pair.secret_key))
        .collect();
    assert_eq!(links, expected);
}

/// Test 5: keys need a master key
#[tokio::test]
async fn test_keys_without_master_key() {
    let ledger = Arc::new(keys_ledger(Arc::new(AtomicU64::new(3))));
    let client = DropClient::builder(crate::mock::test_config())
        .rpc(ledger)
        .build()
        .unwrap();

    let err = client.paginated_keys_info(DROP_ID, 0, 3).await.unwrap_err();
    assert!(matches!(err, DropError::Config(_)));
}

/// Test 6: listing rows for plain and NFT drops
#[tokio::test]
async fn test_drop_data() {
    let long_name = "A".repeat(60);
    let nft = json!({
        "drop_id": "77",
        "owner_id": "alice.testnet",
        "next_key_id": 10,
        "deposit_per_use": "0",
        "metadata": json!({ "dropName": long_name }).to_string(),
        "fc": { "methods": [[{ "receiver_id": "series.testnet", "method_name": "nft_mint", "args": "" }]] }
    });
    let series_found = Arc::new(Mutex::new(true));
    let found = series_found.clone();
    let ledger = Arc::new(MockLedger::new(move |_contract, method, args| match method {
        "get_drop_information" => Ok(if args["drop_id"] == json!("77") { nft.clone() } else { owner_drop(1) }),
        "get_key_supply_for_drop" => Ok(json!(3)),
        "get_series_info" if *found.lock() => Ok(json!({ "metadata": { "media": "bafynft" } })),
        "get_series_info" => Err(RpcError::server(method, "series not found")),
        other => Err(RpcError::server(other, "unexpected method")),
    }));
    let client = client_with(ledger, Arc::new(MockSigner::accepting()));

    let row = client.drop_data_by_id("77").await.unwrap();
    assert_eq!(row.kind, DropKind::Nft);
    assert_eq!(row.claimed, "7 / 10");
    assert_eq!(row.name, format!("{}...", "A".repeat(48)));
    assert_eq!(row.media.as_deref(), Some("https://cloudflare-ipfs.com/ipfs/bafynft"));
    assert_eq!(serde_json::to_value(&row).unwrap()["type"], json!("NFT"));

    *series_found.lock() = false;
    let row = client.drop_data_by_id("77").await.unwrap();
    assert_eq!(row.media.as_deref(), Some("assets/image-not-found.png"));

    let row = client.drop_data_by_id("1001").await.unwrap();
    assert_eq!(row.kind, DropKind::Token);
    assert_eq!(row.name, "Drop 1");
    assert_eq!(row.claimed, "0 / 1");
    assert!(row.media.is_none());
    assert_eq!(serde_json::to_value(&row).unwrap()["type"], json!("token"));
}

/// Test 7: owner drops go through the cache, supply always hits the ledger
#[tokio::test]
async fn test_owner_drops() {
    let ledger = Arc::new(MockLedger::new(|_contract, method, args| match method {
        "get_drop_supply_for_owner" => Ok(json!(7)),
        "get_drops_for_owner" => Ok(page_of(args, 7, owner_drop)),
        other => Err(RpcError::server(other, "unexpected method")),
    }));
    let client = client_with(ledger.clone(), Arc::new(MockSigner::accepting()));

    assert_eq!(client.paginated_drops("alice.testnet", 0, 5).await.unwrap().len(), 5);
    assert_eq!(client.all_drops("alice.testnet").await.unwrap().len(), 7);
    assert_eq!(ledger.count("get_drops_for_owner"), 2);

    assert_eq!(client.drop_supply_for_owner("alice.testnet").await.unwrap(), 7);
    assert_eq!(client.drop_supply_for_owner("alice.testnet").await.unwrap(), 7);
    assert_eq!(ledger.count("get_drop_supply_for_owner"), 3);
}

/// Test 8: sessions survive a reopen and can be forgotten
#[tokio::test]
async fn test_resolve_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session").join("account.json");
    let ledger = Arc::new(MockLedger::new(|_, method, _| Err(RpcError::server(method, "unused"))).with_account("alice.testnet"));
    let client = client_with(ledger, Arc::new(MockSigner::accepting()));

    let mut store = SessionStore::open(&path).unwrap();
    assert!(!store.is_active());

    let account = client.resolve_session(&mut store, "alice.testnet").await.unwrap();
    assert!(account.get("amount").is_some());
    assert_eq!(store.account_id(), Some("alice.testnet"));

    let reopened = SessionStore::open(&path).unwrap();
    assert!(reopened.is_active());
    assert_eq!(reopened.session().unwrap().account, account);

    assert!(client.resolve_session(&mut store, "ghost.testnet").await.is_err());
    assert_eq!(store.account_id(), Some("alice.testnet"));

    store.forget().unwrap();
    assert!(!store.is_active());
    assert!(!path.exists());
    assert!(!SessionStore::open(&path).unwrap().is_active());
}

/// Test 9: a changed drop supply shows up only after a refresh
#[tokio::test]
async fn test_refresh_drops() {
    let total = Arc::new(AtomicU64::new(7));
    let supply = total.clone();
    let ledger = Arc::new(MockLedger::new(move |_contract, method, args| {
        let total = supply.load(Ordering::SeqCst);
        match method {
            "get_drop_supply_for_owner" => Ok(json!(total)),
            "get_drops_for_owner" => Ok(page_of(args, total, owner_drop)),
            other => Err(RpcError::server(other, "unexpected method")),
        }
    }));
    let client = client_with(ledger.clone(), Arc::new(MockSigner::accepting()));

    assert_eq!(client.paginated_drops("alice.testnet", 5, 5).await.unwrap().len(), 2);
    total.store(9, Ordering::SeqCst);
    assert_eq!(client.paginated_drops("alice.testnet", 5, 5).await.unwrap().len(), 2);
    assert_eq!(ledger.count("get_drop_supply_for_owner"), 1);

    client.refresh_drops("alice.testnet");
    assert_eq!(client.paginated_drops("alice.testnet", 5, 5).await.unwrap().len(), 4);
    assert_eq!(ledger.count("get_drop_supply_for_owner"), 2);
}
