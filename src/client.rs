// src/client.rs
// ============================================================================
// DROP CLIENT
// ============================================================================
// One per session. Owns the ledger accessors, the four collection caches, the
// per-funder event index and the claim workflow. Nothing here is global;
// build as many clients as there are configurations.
// ============================================================================

use crate::cache::{AttendeeKeys, DropKeys, FunderDrops, OwnerDrops, PageCache};
use crate::claim::{ClaimWorkflow, NftMedia};
use crate::config::ClientConfig;
use crate::drops::{classify, decode_metadata, AttendeeKey, Drop, DropKeyItem, DropKind, EventIndex};
use crate::error::DropError;
use crate::keys::{claim_link, EntropyKeyDeriver, KeyDeriver, KeyPair, SecretKey};
use crate::ledger::{ClaimRequest, ClaimSigner, DropLookup, JsonRpcClient, LedgerRpc, RemoteAccessor, RpcError};
use crate::params::{DROP_NAME_DISPLAY_LEN, MEDIA_NOT_FOUND};
use crate::session::SessionStore;
use crate::utils::{truncate_text, TruncateAt};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Every key of a drop with the drop's display name
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyCollection<T> {
    pub drop_name: String,
    pub total_keys: u64,
    #[serde(rename = "dropKeyItems")]
    pub items: Vec<T>,
}

/// One row of a drop listing
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DropSummary {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: DropKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
    /// `"<used> / <total>"`
    pub claimed: String,
}

pub struct DropClientBuilder {
    config: ClientConfig,
    rpc: Option<Arc<dyn LedgerRpc>>,
    signer: Option<Arc<dyn ClaimSigner>>,
    deriver: Option<Arc<dyn KeyDeriver>>,
}

impl DropClientBuilder {
    pub fn rpc(mut self, rpc: Arc<dyn LedgerRpc>) -> Self {
        self.rpc = Some(rpc);
        self
    }

    pub fn signer(mut self, signer: Arc<dyn ClaimSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn key_deriver(mut self, deriver: Arc<dyn KeyDeriver>) -> Self {
        self.deriver = Some(deriver);
        self
    }

    /// Derive drop keys from the account's master key
    pub fn master_key(self, master_key: impl Into<String>) -> Self {
        self.key_deriver(Arc::new(EntropyKeyDeriver::new(master_key)))
    }

    /// Without an explicit transport a JSON-RPC client is built against
    /// `config.node_url`.
    pub fn build(self) -> Result<DropClient, DropError> {
        let config = Arc::new(self.config);
        let rpc: Arc<dyn LedgerRpc> = match self.rpc {
            Some(rpc) => rpc,
            None => Arc::new(JsonRpcClient::new(&config.node_url, config.request_timeout())?),
        };
        let signer = self.signer.unwrap_or_else(|| Arc::new(Unconfigured) as Arc<dyn ClaimSigner>);
        let deriver = self.deriver.unwrap_or_else(|| Arc::new(Unconfigured) as Arc<dyn KeyDeriver>);

        let accessor = RemoteAccessor::new(rpc, config.contract_id.clone());
        let events = accessor.with_contract(config.events_contract_id.clone());
        let cache = config.cache;

        info!(
            network = %config.network_id,
            contract = %config.contract_id,
            events_contract = %config.events_contract_id,
            "drop client ready"
        );

        Ok(DropClient {
            owner_drops: PageCache::new(OwnerDrops::new(accessor.clone(), cache.drop_page_size))
                .revalidating(cache.revalidate_total),
            drop_keys: PageCache::new(DropKeys::new(
                accessor.clone(),
                deriver.clone(),
                config.origin.clone(),
                cache.key_page_size,
            ))
            .revalidating(cache.revalidate_total),
            funder_drops: PageCache::new(FunderDrops::new(events.clone(), cache.drop_page_size))
                .revalidating(cache.revalidate_total),
            attendee_keys: PageCache::new(AttendeeKeys::new(events.clone(), cache.key_page_size)),
            event_index: RwLock::new(HashMap::new()),
            claims: ClaimWorkflow::new(accessor.clone(), signer, config.clone()),
            deriver,
            accessor,
            events,
            config,
        })
    }
}

pub struct DropClient {
    config: Arc<ClientConfig>,
    accessor: RemoteAccessor,
    events: RemoteAccessor,
    deriver: Arc<dyn KeyDeriver>,
    owner_drops: PageCache<OwnerDrops>,
    drop_keys: PageCache<DropKeys>,
    funder_drops: PageCache<FunderDrops>,
    attendee_keys: PageCache<AttendeeKeys>,
    event_index: RwLock<HashMap<String, Arc<EventIndex>>>,
    claims: ClaimWorkflow,
}

impl DropClient {
    pub fn builder(config: ClientConfig) -> DropClientBuilder {
        DropClientBuilder {
            config,
            rpc: None,
            signer: None,
            deriver: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Accessor bound to the main drop contract
    pub fn accessor(&self) -> &RemoteAccessor {
        &self.accessor
    }

    pub fn claims(&self) -> &ClaimWorkflow {
        &self.claims
    }

    // ------------------------------------------------------------------
    // Owner drops
    // ------------------------------------------------------------------

    /// Cached page read.
    ///
    /// The owner's drop supply is read once per cache entry. Unless the client
    /// was configured with `revalidate_total`, drops created or deleted after
    /// that read stay invisible until [`DropClient::refresh_drops`] is called.
    pub async fn paginated_drops(&self, owner_id: &str, start: u64, limit: u64) -> Result<Vec<Drop>, DropError> {
        self.owner_drops.fetch_range(owner_id, start, limit).await
    }

    pub async fn all_drops(&self, owner_id: &str) -> Result<Vec<Drop>, DropError> {
        self.owner_drops.fetch_all(owner_id).await
    }

    /// Forget the owner's cached drops; the next read starts from a fresh supply
    pub fn refresh_drops(&self, owner_id: &str) {
        self.owner_drops.invalidate(owner_id);
    }

    /// Always asks the ledger
    pub async fn drop_supply_for_owner(&self, owner_id: &str) -> Result<u64, DropError> {
        Ok(self.accessor.drop_supply_for_owner(owner_id).await?)
    }

    // ------------------------------------------------------------------
    // Keys of an owner's drop
    // ------------------------------------------------------------------

    /// Cached page read. Like [`DropClient::paginated_drops`], the key total is
    /// not re-read here; [`DropClient::all_keys_info`] or
    /// [`DropClient::refresh_keys`] pick up newly issued keys.
    pub async fn paginated_keys_info(&self, drop_id: &str, start: u64, limit: u64) -> Result<Vec<DropKeyItem>, DropError> {
        self.drop_keys.fetch_range(drop_id, start, limit).await
    }

    pub fn refresh_keys(&self, drop_id: &str) {
        self.drop_keys.invalidate(drop_id);
    }

    /// Re-reads the drop first so keys issued since the last call are picked up.
    pub async fn all_keys_info(&self, drop_id: &str) -> Result<KeyCollection<DropKeyItem>, DropError> {
        let drop = self
            .accessor
            .drop_information(DropLookup::Id(drop_id))
            .await
            .map_err(|e| DropError::collection("keys", e))?;
        self.drop_keys.observe_total(drop_id, drop.next_key_id).await;
        let items = self.drop_keys.fetch_all(drop_id).await?;
        Ok(KeyCollection {
            drop_name: decode_metadata(drop.metadata_str()).drop_name,
            total_keys: drop.next_key_id,
            items,
        })
    }

    /// Every claim link ever issued for the drop
    pub async fn links_to_export(&self, drop_id: &str) -> Result<Vec<String>, DropError> {
        let drop = self.accessor.drop_information(DropLookup::Id(drop_id)).await?;
        let pairs = self.deriver.derive_range(drop_id, 0, drop.next_key_id)?;
        Ok(pairs
            .iter()
            .map(|pair| claim_link(&self.config.origin, self.accessor.contract_id(), &pair.secret_key))
            .collect())
    }

    // ------------------------------------------------------------------
    // Events deployment
    // ------------------------------------------------------------------

    pub async fn paginated_keys_for_ticket(&self, drop_id: &str, start: u64, limit: u64) -> Result<Vec<AttendeeKey>, DropError> {
        self.refresh_ticket_total(drop_id).await?;
        self.attendee_keys.fetch_range(drop_id, start, limit).await
    }

    pub async fn all_keys_for_ticket(&self, drop_id: &str) -> Result<KeyCollection<AttendeeKey>, DropError> {
        let drop = self.refresh_ticket_total(drop_id).await?;
        let items = self.attendee_keys.fetch_all(drop_id).await?;
        Ok(KeyCollection {
            drop_name: decode_metadata(drop.metadata_str()).drop_name,
            total_keys: drop.next_key_id,
            items,
        })
    }

    /// Ticket keys are handed out continuously, so every read re-checks the total.
    async fn refresh_ticket_total(&self, drop_id: &str) -> Result<Drop, DropError> {
        let drop = self
            .events
            .drop_information(DropLookup::Id(drop_id))
            .await
            .map_err(|e| DropError::collection("ticket keys", e))?;
        self.attendee_keys.observe_total(drop_id, drop.next_key_id).await;
        Ok(drop)
    }

    pub async fn key_supply_for_ticket(&self, drop_id: &str) -> Result<u64, DropError> {
        Ok(self.events.key_supply_for_drop(drop_id).await?)
    }

    /// Drops of `funder_id` that describe an event
    pub async fn all_event_drops(&self, funder_id: &str) -> Result<Vec<Drop>, DropError> {
        let index = self.event_index(funder_id).await?;
        Ok(index.event_drops().to_vec())
    }

    /// Ticket drops grouped under the event; empty when the event is unknown
    pub async fn tickets_for_event(&self, funder_id: &str, event_id: &str) -> Result<Vec<Drop>, DropError> {
        let index = self.event_index(funder_id).await?;
        Ok(index
            .tickets_for_event(event_id)
            .map(<[Drop]>::to_vec)
            .unwrap_or_default())
    }

    /// Fresh copy of the drop that describes the event
    pub async fn event_drop(&self, funder_id: &str, event_id: &str) -> Result<Drop, DropError> {
        let index = self.event_index(funder_id).await?;
        let drop_id = index
            .drop_id_for_event(event_id)
            .ok_or_else(|| DropError::DropNotFound(format!("No event {} funded by {}", event_id, funder_id)))?;
        Ok(self.events.drop_information(DropLookup::Id(drop_id)).await?)
    }

    /// Drop the funder's event index and cached drops
    pub async fn refresh_events(&self, funder_id: &str) {
        self.event_index.write().await.remove(funder_id);
        self.funder_drops.invalidate(funder_id);
    }

    async fn event_index(&self, funder_id: &str) -> Result<Arc<EventIndex>, DropError> {
        if let Some(index) = self.event_index.read().await.get(funder_id) {
            return Ok(index.clone());
        }

        debug!(funder = %funder_id, "building event index");
        let drops = self.funder_drops.fetch_all(funder_id).await?;
        let index = Arc::new(EventIndex::build(drops));
        info!(funder = %funder_id, events = index.event_drops().len(), "event index built");
        self.event_index
            .write()
            .await
            .insert(funder_id.to_string(), index.clone());
        Ok(index)
    }

    // ------------------------------------------------------------------
    // Listing rows
    // ------------------------------------------------------------------

    pub async fn drop_data_by_id(&self, drop_id: &str) -> Result<DropSummary, DropError> {
        let drop = self.accessor.drop_information(DropLookup::Id(drop_id)).await?;
        self.drop_data(&drop).await
    }

    pub async fn drop_data(&self, drop: &Drop) -> Result<DropSummary, DropError> {
        let available = self.accessor.key_supply_for_drop(&drop.drop_id).await?;
        let total = drop.next_key_id;
        let kind = classify(drop);
        let name = decode_metadata(drop.metadata_str()).drop_name;

        let media = match kind {
            DropKind::Nft => Some(
                self.nft_media(drop)
                    .await
                    .unwrap_or_else(|| MEDIA_NOT_FOUND.to_string()),
            ),
            _ => None,
        };

        Ok(DropSummary {
            id: drop.drop_id.clone(),
            name: truncate_text(&name, TruncateAt::End, DROP_NAME_DISPLAY_LEN),
            kind,
            media,
            claimed: format!("{} / {}", total.saturating_sub(available), total),
        })
    }

    async fn nft_media(&self, drop: &Drop) -> Option<String> {
        let call = drop.function_call(0)?;
        match self.accessor.series_info(&call.receiver_id, &drop.drop_id).await {
            Ok(series) => NftMedia::from_series(&series, &self.config.ipfs_gateway).map(|nft| nft.media),
            Err(e) => {
                warn!(drop_id = %drop.drop_id, error = %e, "failed to get nft metadata");
                None
            }
        }
    }

    // ------------------------------------------------------------------
    // Session
    // ------------------------------------------------------------------

    /// Look the account up and remember it as the active session
    pub async fn resolve_session(&self, store: &mut SessionStore, account_id: &str) -> Result<Value, DropError> {
        let account = self.accessor.view_account(account_id).await?;
        store.remember(account_id, account.clone())?;
        Ok(account)
    }
}

/// Stand-in for collaborators the builder was not given
struct Unconfigured;

#[async_trait]
impl ClaimSigner for Unconfigured {
    async fn claim(&self, _contract_id: &str, _secret_key: &SecretKey, _request: &ClaimRequest) -> Result<Value, RpcError> {
        Err(RpcError::Unsupported("no claim signer configured".to_string()))
    }
}

impl KeyDeriver for Unconfigured {
    fn derive(&self, _drop_id: &str, _index: u64) -> Result<KeyPair, DropError> {
        Err(DropError::Config("no master key configured".to_string()))
    }
}
