// src/cache/mod.rs
//! Paginated collection cache
//!
//! Holds, per collection key, a known total plus a sparse index-addressed view
//! of the collection. Range reads fetch only the fixed-size pages that are not
//! yet resident, scattering the page requests concurrently and gathering the
//! results before answering.
//!
//! Rules:
//! - a page is fetched with exactly one request and, once written, is never
//!   fetched again while the entry lives
//! - when the collection total is seen to change the entry is discarded and
//!   rebuilt from scratch; indices may have shifted upstream
//! - a failed page fails the whole call, but sibling pages that succeeded are
//!   still written (each page is replaced as a unit)
//!
//! Each entry sits behind its own async mutex so the invalidate-on-change step
//! and page writes are atomic with respect to concurrent reads of the same key.

mod sources;

pub use sources::{AttendeeKeys, DropKeys, FunderDrops, OwnerDrops};

use crate::error::DropError;
use async_trait::async_trait;
use futures::future::join_all;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Range;
use std::sync::Arc;
use tracing::{debug, info};

/// A remote, index-addressed collection that can be read a page at a time
#[async_trait]
pub trait CollectionSource: Send + Sync {
    type Item: Clone + Send + Sync;

    /// Used in logs and in `CollectionFetch` errors
    fn name(&self) -> &'static str;

    fn page_size(&self) -> u64;

    /// Current number of items in the collection
    async fn total(&self, key: &str) -> Result<u64, DropError>;

    /// Items `[start, start + limit)`; may return fewer if the ledger has fewer
    async fn fetch_page(&self, key: &str, start: u64, limit: u64) -> Result<Vec<Self::Item>, DropError>;
}

struct CacheEntry<T> {
    total: Option<u64>,
    items: BTreeMap<u64, T>,
    resident_pages: BTreeSet<u64>,
}

impl<T> CacheEntry<T> {
    fn new() -> Self {
        Self {
            total: None,
            items: BTreeMap::new(),
            resident_pages: BTreeSet::new(),
        }
    }

    fn reset(&mut self, total: u64) {
        self.total = Some(total);
        self.items.clear();
        self.resident_pages.clear();
    }
}

pub struct PageCache<S: CollectionSource> {
    source: S,
    revalidate_total: bool,
    entries: Mutex<HashMap<String, Arc<tokio::sync::Mutex<CacheEntry<S::Item>>>>>,
}

impl<S: CollectionSource> PageCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            revalidate_total: false,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Re-read the total on every call instead of only on first access
    pub fn revalidating(mut self, revalidate_total: bool) -> Self {
        self.revalidate_total = revalidate_total;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    fn entry(&self, key: &str) -> Arc<tokio::sync::Mutex<CacheEntry<S::Item>>> {
        self.entries
            .lock()
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(CacheEntry::new())))
            .clone()
    }

    /// Items `[start, min(start + limit, total))`
    pub async fn fetch_range(&self, key: &str, start: u64, limit: u64) -> Result<Vec<S::Item>, DropError> {
        let entry = self.entry(key);
        let mut entry = entry.lock().await;
        let total = self.sync_total(key, &mut entry, self.revalidate_total).await?;

        let end = start.saturating_add(limit).min(total);
        if start >= end {
            return Ok(Vec::new());
        }

        let size = self.source.page_size();
        let pages = (start / size)..((end - 1) / size + 1);
        self.fill_pages(key, &mut entry, pages, total).await?;

        Ok(entry.items.range(start..end).map(|(_, item)| item.clone()).collect())
    }

    /// Whole collection; every missing page is requested at once
    pub async fn fetch_all(&self, key: &str) -> Result<Vec<S::Item>, DropError> {
        let entry = self.entry(key);
        let mut entry = entry.lock().await;
        let total = self.sync_total(key, &mut entry, self.revalidate_total).await?;

        let size = self.source.page_size();
        self.fill_pages(key, &mut entry, 0..total.div_ceil(size), total).await?;

        Ok(entry.items.values().cloned().collect())
    }

    /// Record a total the caller learned elsewhere. A change discards the
    /// entry; returns whether it did.
    pub async fn observe_total(&self, key: &str, total: u64) -> bool {
        let entry = self.entry(key);
        let mut entry = entry.lock().await;
        Self::apply_total(key, &mut entry, total)
    }

    pub fn invalidate(&self, key: &str) {
        self.entries.lock().remove(key);
    }

    /// Cached total, without touching the network
    pub async fn total(&self, key: &str) -> Option<u64> {
        let entry = self.entries.lock().get(key).cloned()?;
        let total = entry.lock().await.total;
        total
    }

    /// Number of items currently held for `key`
    pub async fn cached_len(&self, key: &str) -> usize {
        let Some(entry) = self.entries.lock().get(key).cloned() else {
            return 0;
        };
        let len = entry.lock().await.items.len();
        len
    }

    async fn sync_total(&self, key: &str, entry: &mut CacheEntry<S::Item>, refresh: bool) -> Result<u64, DropError> {
        match entry.total {
            Some(total) if !refresh => Ok(total),
            _ => {
                let total = self
                    .source
                    .total(key)
                    .await
                    .map_err(|e| self.wrap(e))?;
                Self::apply_total(key, entry, total);
                Ok(total)
            }
        }
    }

    fn apply_total(key: &str, entry: &mut CacheEntry<S::Item>, total: u64) -> bool {
        match entry.total {
            Some(current) if current == total => false,
            Some(current) => {
                info!(%key, old = current, new = total, "collection total changed, discarding cached pages");
                entry.reset(total);
                true
            }
            None => {
                debug!(%key, total, "initialising cache entry");
                entry.reset(total);
                false
            }
        }
    }

    async fn fill_pages(
        &self,
        key: &str,
        entry: &mut CacheEntry<S::Item>,
        pages: Range<u64>,
        total: u64,
    ) -> Result<(), DropError> {
        let size = self.source.page_size();
        let missing: Vec<u64> = pages.filter(|p| !entry.resident_pages.contains(p)).collect();
        if missing.is_empty() {
            return Ok(());
        }

        debug!(collection = self.source.name(), %key, pages = ?missing, "cache miss");
        let requests = missing.iter().map(|&page| {
            let page_start = page * size;
            let limit = size.min(total - page_start);
            async move { (page, page_start, limit, self.source.fetch_page(key, page_start, limit).await) }
        });
        let results = join_all(requests).await;

        let mut first_error = None;
        for (page, page_start, limit, result) in results {
            match result {
                Ok(items) => {
                    let page_end = page_start + size;
                    let stale: Vec<u64> = entry.items.range(page_start..page_end).map(|(i, _)| *i).collect();
                    for index in stale {
                        entry.items.remove(&index);
                    }
                    // Never past the requested length, so nothing lands at or beyond `total`
                    for (offset, item) in items.into_iter().take(limit as usize).enumerate() {
                        entry.items.insert(page_start + offset as u64, item);
                    }
                    entry.resident_pages.insert(page);
                }
                Err(e) => {
                    debug!(collection = self.source.name(), %key, page, error = %e, "page fetch failed");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(self.wrap(e)),
            None => Ok(()),
        }
    }

    fn wrap(&self, error: DropError) -> DropError {
        match error {
            DropError::Rpc(source) => DropError::collection(self.source.name(), source),
            other => other,
        }
    }
}
