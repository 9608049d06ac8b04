// src/cache/sources.rs
// The four ledger collections the client pages through

use super::CollectionSource;
use crate::drops::{AttendeeKey, Drop, DropKeyItem};
use crate::error::DropError;
use crate::keys::{claim_link, KeyDeriver, PublicKey};
use crate::ledger::{DropLookup, RemoteAccessor};
use async_trait::async_trait;
use std::sync::Arc;

/// Drops owned by an account on the main contract
pub struct OwnerDrops {
    accessor: RemoteAccessor,
    page_size: u64,
}

impl OwnerDrops {
    pub fn new(accessor: RemoteAccessor, page_size: u64) -> Self {
        Self {
            accessor,
            page_size: page_size.max(1),
        }
    }
}

#[async_trait]
impl CollectionSource for OwnerDrops {
    type Item = Drop;

    fn name(&self) -> &'static str {
        "drops"
    }

    fn page_size(&self) -> u64 {
        self.page_size
    }

    async fn total(&self, account_id: &str) -> Result<u64, DropError> {
        Ok(self.accessor.drop_supply_for_owner(account_id).await?)
    }

    async fn fetch_page(&self, account_id: &str, start: u64, limit: u64) -> Result<Vec<Drop>, DropError> {
        Ok(self.accessor.drops_for_owner(account_id, start, limit).await?)
    }
}

/// Keys of one of the owner's drops. Key pairs are re-derived locally and the
/// ledger is asked only for their current state.
pub struct DropKeys {
    accessor: RemoteAccessor,
    deriver: Arc<dyn KeyDeriver>,
    origin: String,
    page_size: u64,
}

impl DropKeys {
    pub fn new(accessor: RemoteAccessor, deriver: Arc<dyn KeyDeriver>, origin: impl Into<String>, page_size: u64) -> Self {
        Self {
            accessor,
            deriver,
            origin: origin.into(),
            page_size: page_size.max(1),
        }
    }
}

#[async_trait]
impl CollectionSource for DropKeys {
    type Item = DropKeyItem;

    fn name(&self) -> &'static str {
        "keys"
    }

    fn page_size(&self) -> u64 {
        self.page_size
    }

    async fn total(&self, drop_id: &str) -> Result<u64, DropError> {
        let drop = self.accessor.drop_information(DropLookup::Id(drop_id)).await?;
        Ok(drop.next_key_id)
    }

    async fn fetch_page(&self, drop_id: &str, start: u64, limit: u64) -> Result<Vec<DropKeyItem>, DropError> {
        let pairs = self.deriver.derive_range(drop_id, start, limit)?;
        let public_keys: Vec<PublicKey> = pairs.iter().map(|p| p.public_key.clone()).collect();
        let infos = self.accessor.key_information_batch(&public_keys).await?;

        let items = pairs
            .into_iter()
            .zip(infos)
            .enumerate()
            .map(|(offset, (pair, info))| DropKeyItem {
                id: start + offset as u64,
                public_key: pair.public_key.to_string(),
                link: claim_link(&self.origin, self.accessor.contract_id(), &pair.secret_key),
                slug: pair.secret_key.slug(),
                has_claimed: info.is_none(),
                key_info: info,
            })
            .collect();
        Ok(items)
    }
}

/// Drops funded by an account on the events deployment
pub struct FunderDrops {
    accessor: RemoteAccessor,
    page_size: u64,
}

impl FunderDrops {
    pub fn new(accessor: RemoteAccessor, page_size: u64) -> Self {
        Self {
            accessor,
            page_size: page_size.max(1),
        }
    }
}

#[async_trait]
impl CollectionSource for FunderDrops {
    type Item = Drop;

    fn name(&self) -> &'static str {
        "event drops"
    }

    fn page_size(&self) -> u64 {
        self.page_size
    }

    async fn total(&self, account_id: &str) -> Result<u64, DropError> {
        Ok(self.accessor.drop_supply_for_funder(account_id).await?)
    }

    async fn fetch_page(&self, account_id: &str, start: u64, limit: u64) -> Result<Vec<Drop>, DropError> {
        Ok(self.accessor.drops_for_funder(account_id, start, limit).await?)
    }
}

/// Attendee keys of a ticket drop on the events deployment
pub struct AttendeeKeys {
    accessor: RemoteAccessor,
    page_size: u64,
}

impl AttendeeKeys {
    pub fn new(accessor: RemoteAccessor, page_size: u64) -> Self {
        Self {
            accessor,
            page_size: page_size.max(1),
        }
    }
}

#[async_trait]
impl CollectionSource for AttendeeKeys {
    type Item = AttendeeKey;

    fn name(&self) -> &'static str {
        "ticket keys"
    }

    fn page_size(&self) -> u64 {
        self.page_size
    }

    async fn total(&self, drop_id: &str) -> Result<u64, DropError> {
        let drop = self.accessor.drop_information(DropLookup::Id(drop_id)).await?;
        Ok(drop.next_key_id)
    }

    async fn fetch_page(&self, drop_id: &str, start: u64, limit: u64) -> Result<Vec<AttendeeKey>, DropError> {
        Ok(self.accessor.keys_for_drop(drop_id, start, limit).await?)
    }
}
