// tests/integration/test_page_cache.rs
// ============================================================================
// PAGINATED COLLECTION CACHE
// ============================================================================

use crate::mock::{owner_drop, page_of, MockLedger, CONTRACT};
use linkdrop_client::cache::OwnerDrops;
use linkdrop_client::{DropError, PageCache, RemoteAccessor, RpcError};
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

const OWNER: &str = "alice.testnet";

fn owner_ledger(total: Arc<AtomicU64>, failing_page: Arc<AtomicBool>) -> MockLedger {
    MockLedger::new(move |_contract, method, args| {
        let total = total.load(Ordering::SeqCst);
        match method {
            "get_drop_supply_for_owner" => Ok(json!(total)),
            "get_drops_for_owner" => {
                if failing_page.load(Ordering::SeqCst) && args["from_index"] == json!("5") {
                    return Err(RpcError::Transport("connection reset".to_string()));
                }
                Ok(page_of(args, total, owner_drop))
            }
            other => Err(RpcError::server(other, "unexpected method")),
        }
    })
}

fn setup(total: u64) -> (Arc<MockLedger>, Arc<AtomicU64>, Arc<AtomicBool>) {
    let total = Arc::new(AtomicU64::new(total));
    let failing = Arc::new(AtomicBool::new(false));
    let ledger = Arc::new(owner_ledger(total.clone(), failing.clone()));
    (ledger, total, failing)
}

fn cache_over(ledger: &Arc<MockLedger>) -> PageCache<OwnerDrops> {
    PageCache::new(OwnerDrops::new(RemoteAccessor::new(ledger.clone(), CONTRACT), 5))
}

fn ids(drops: &[linkdrop_client::Drop]) -> Vec<&str> {
    drops.iter().map(|d| d.drop_id.as_str()).collect()
}

/// Test 1: a repeated range is answered without touching the ledger
#[tokio::test]
async fn test_repeat_range_is_served_from_cache() {
    let (ledger, _, _) = setup(12);
    let cache = cache_over(&ledger);

    let first = cache.fetch_range(OWNER, 0, 5).await.unwrap();
    let calls_after_first = ledger.calls().len();
    assert_eq!(calls_after_first, 2);

    let second = cache.fetch_range(OWNER, 0, 5).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(ledger.calls().len(), calls_after_first);
}

/// Test 2: only the pages covering the range are requested
#[tokio::test]
async fn test_minimal_page_set() {
    let (ledger, _, _) = setup(12);
    let cache = cache_over(&ledger);

    let drops = cache.fetch_range(OWNER, 0, 3).await.unwrap();
    assert_eq!(ids(&drops), vec!["1000", "1001", "1002"]);
    assert_eq!(ledger.page_starts("get_drops_for_owner"), vec![0]);

    // [3, 7) spans pages 0 and 1; page 0 is already resident
    let drops = cache.fetch_range(OWNER, 3, 4).await.unwrap();
    assert_eq!(ids(&drops), vec!["1003", "1004", "1005", "1006"]);
    assert_eq!(ledger.page_starts("get_drops_for_owner"), vec![0, 5]);

    let (ledger, _, _) = setup(12);
    let cache = cache_over(&ledger);
    let drops = cache.fetch_range(OWNER, 7, 2).await.unwrap();
    assert_eq!(ids(&drops), vec!["1007", "1008"]);
    assert_eq!(ledger.page_starts("get_drops_for_owner"), vec![5]);
}

/// Test 3: the last page is requested with the remaining length only
#[tokio::test]
async fn test_range_is_clamped_to_total() {
    let (ledger, _, _) = setup(12);
    let cache = cache_over(&ledger);

    let drops = cache.fetch_range(OWNER, 8, 100).await.unwrap();
    assert_eq!(drops.len(), 4);
    let last_page = ledger
        .calls()
        .into_iter()
        .find(|c| c.method == "get_drops_for_owner" && c.args["from_index"] == json!("10"))
        .unwrap();
    assert_eq!(last_page.args["limit"], json!(2));

    ledger.clear();
    assert!(cache.fetch_range(OWNER, 20, 5).await.unwrap().is_empty());
    assert_eq!(ledger.count("get_drops_for_owner"), 0);
}

/// Test 4: a changed total throws the cached pages away
#[tokio::test]
async fn test_changed_total_discards_entry() {
    let (ledger, total, _) = setup(5);
    let cache = cache_over(&ledger).revalidating(true);

    assert_eq!(cache.fetch_range(OWNER, 0, 5).await.unwrap().len(), 5);
    total.store(10, Ordering::SeqCst);

    let drops = cache.fetch_range(OWNER, 0, 10).await.unwrap();
    assert_eq!(drops.len(), 10);
    assert_eq!(ledger.count("get_drop_supply_for_owner"), 2);
    assert_eq!(ledger.page_starts("get_drops_for_owner"), vec![0, 0, 5]);
    assert_eq!(cache.total(OWNER).await, Some(10));
}

/// Test 5: totals learned elsewhere invalidate only when they differ
#[tokio::test]
async fn test_observed_total() {
    let (ledger, _, _) = setup(12);
    let cache = cache_over(&ledger);

    cache.fetch_range(OWNER, 0, 5).await.unwrap();
    assert!(!cache.observe_total(OWNER, 12).await);
    assert_eq!(cache.cached_len(OWNER).await, 5);

    assert!(cache.observe_total(OWNER, 13).await);
    assert_eq!(cache.cached_len(OWNER).await, 0);
    assert_eq!(cache.total(OWNER).await, Some(13));

    cache.fetch_range(OWNER, 0, 5).await.unwrap();
    assert_eq!(ledger.count("get_drop_supply_for_owner"), 1);
    assert_eq!(ledger.page_starts("get_drops_for_owner"), vec![0, 0]);
}

/// Test 6: missing pages are requested together, not one after another
#[tokio::test]
async fn test_missing_pages_fetched_concurrently() {
    let total = Arc::new(AtomicU64::new(15));
    let ledger = Arc::new(
        owner_ledger(total, Arc::new(AtomicBool::new(false))).with_latency(Duration::from_millis(20)),
    );
    let cache = cache_over(&ledger);

    let drops = cache.fetch_range(OWNER, 0, 15).await.unwrap();
    assert_eq!(drops.len(), 15);
    assert_eq!(ledger.count("get_drops_for_owner"), 3);
    assert_eq!(ledger.max_in_flight(), 3);
}

/// Test 7: a failed page fails the call but keeps its siblings
#[tokio::test]
async fn test_failed_page_keeps_siblings() {
    let (ledger, _, failing) = setup(15);
    failing.store(true, Ordering::SeqCst);
    let cache = cache_over(&ledger);

    let err = cache.fetch_range(OWNER, 0, 15).await.unwrap_err();
    match &err {
        DropError::CollectionFetch { collection, source } => {
            assert_eq!(collection, "drops");
            assert!(source.is_transport());
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(err.is_retryable());
    assert_eq!(err.user_friendly_message(), "Failed to fetch drops.");
    assert_eq!(cache.cached_len(OWNER).await, 10);

    failing.store(false, Ordering::SeqCst);
    ledger.clear();
    let drops = cache.fetch_range(OWNER, 0, 15).await.unwrap();
    assert_eq!(drops.len(), 15);
    assert_eq!(ledger.page_starts("get_drops_for_owner"), vec![5]);
}

/// Test 8: fetch_all pulls every page once
#[tokio::test]
async fn test_fetch_all() {
    let (ledger, _, _) = setup(12);
    let cache = cache_over(&ledger);

    cache.fetch_range(OWNER, 5, 1).await.unwrap();
    let all = cache.fetch_all(OWNER).await.unwrap();
    assert_eq!(all.len(), 12);
    assert_eq!(all[11].drop_id, "1011");

    let mut starts = ledger.page_starts("get_drops_for_owner");
    starts.sort_unstable();
    assert_eq!(starts, vec![0, 5, 10]);

    ledger.clear();
    assert_eq!(cache.fetch_all(OWNER).await.unwrap().len(), 12);
    assert!(ledger.calls().is_empty());
}

/// Test 9: entries are kept per key and can be dropped explicitly
#[tokio::test]
async fn test_entries_are_per_key() {
    let (ledger, _, _) = setup(6);
    let cache = cache_over(&ledger);

    cache.fetch_range(OWNER, 0, 5).await.unwrap();
    cache.fetch_range("bob.testnet", 0, 5).await.unwrap();
    assert_eq!(ledger.count("get_drop_supply_for_owner"), 2);

    cache.invalidate(OWNER);
    assert_eq!(cache.total(OWNER).await, None);
    assert_eq!(cache.cached_len("bob.testnet").await, 5);
}

/// Test 10: a page longer than requested is cut at the requested length
#[tokio::test]
async fn test_oversized_last_page_is_clamped() {
    let ledger = Arc::new(MockLedger::new(|_contract, method, args| match method {
        "get_drop_supply_for_owner" => Ok(json!(12)),
        // Ignores `limit` and always answers with five drops
        "get_drops_for_owner" => Ok(page_of(&json!({ "from_index": args["from_index"], "limit": 5 }), 100, owner_drop)),
        other => Err(RpcError::server(other, "unexpected method")),
    }));
    let cache = cache_over(&ledger);

    let all = cache.fetch_all(OWNER).await.unwrap();
    assert_eq!(all.len(), 12);
    assert_eq!(all.last().unwrap().drop_id, "1011");
    assert_eq!(cache.cached_len(OWNER).await, 12);
    assert_eq!(cache.fetch_range(OWNER, 10, 5).await.unwrap().len(), 2);
}
