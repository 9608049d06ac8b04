// src/config.rs
// ============================================================================
// CLIENT CONFIGURATION
// ============================================================================
// Network endpoints, the contract allow-list, cache tuning and logging.
// Defaults come from the network id; `from_env` and `load` layer on top.
// ============================================================================

use crate::error::DropError;
use crate::params::{
    DEFAULT_IPFS_GATEWAY, DEFAULT_NETWORK_ID, DEFAULT_REQUEST_TIMEOUT_SECS, DROP_ITEMS_PER_QUERY,
    KEY_ITEMS_PER_QUERY,
};
use crate::utils::logging::{logging_config_from_env, LoggingConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// `{network: {contract_id: true}}`
pub type SupportedContracts = HashMap<String, HashMap<String, bool>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub network_id: String,
    /// Main drop contract; claim links point here
    pub contract_id: String,
    /// Deployment holding event and ticket drops
    pub events_contract_id: String,
    pub node_url: String,
    pub wallet_url: String,
    pub helper_url: String,
    pub explorer_url: String,
    /// Origin that claim links are built against
    pub origin: String,
    pub ipfs_gateway: String,
    pub supported_contracts: SupportedContracts,
    /// Wallet name to claim page template; `CONTRACT_ID` and `SECRET_KEY`
    /// are substituted
    pub claim_pages: HashMap<String, String>,
    pub cache: CacheConfig,
    pub request_timeout_secs: u64,
    pub logging: LoggingConfig,
}

/// Cache tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub drop_page_size: u64,
    pub key_page_size: u64,
    /// Re-read the collection total on every range read instead of only on
    /// first access
    pub revalidate_total: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            drop_page_size: DROP_ITEMS_PER_QUERY,
            key_page_size: KEY_ITEMS_PER_QUERY,
            revalidate_total: false,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::for_network(DEFAULT_NETWORK_ID)
    }
}

impl ClientConfig {
    pub fn for_network(network_id: &str) -> Self {
        let mainnet = network_id == "mainnet";
        let (contract_id, events_contract_id, node, wallet, helper, explorer, mnw) = if mainnet {
            (
                "v2.keypom.near",
                "1709145182592-kp-ticketing.near",
                "https://rpc.mainnet.near.org",
                "https://wallet.near.org",
                "https://helper.mainnet.near.org",
                "https://nearblocks.io",
                "https://app.mynearwallet.com",
            )
        } else {
            (
                "v2.keypom.testnet",
                "1709145182592-kp-ticketing.testnet",
                "https://rpc.testnet.near.org",
                "https://testnet.mynearwallet.com",
                "https://helper.testnet.near.org",
                "https://testnet.nearblocks.io",
                "https://testnet.mynearwallet.com",
            )
        };

        let supported_contracts = HashMap::from([(
            network_id.to_string(),
            HashMap::from([
                (contract_id.to_string(), true),
                (events_contract_id.to_string(), true),
            ]),
        )]);
        let claim_pages = HashMap::from([(
            "mynearwallet".to_string(),
            format!("{}/linkdrop/CONTRACT_ID/SECRET_KEY", mnw),
        )]);

        Self {
            network_id: network_id.to_string(),
            contract_id: contract_id.to_string(),
            events_contract_id: events_contract_id.to_string(),
            node_url: node.to_string(),
            wallet_url: wallet.to_string(),
            helper_url: helper.to_string(),
            explorer_url: explorer.to_string(),
            origin: "http://localhost:3000".to_string(),
            ipfs_gateway: DEFAULT_IPFS_GATEWAY.to_string(),
            supported_contracts,
            claim_pages,
            cache: CacheConfig::default(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            logging: LoggingConfig::default(),
        }
    }

    /// Defaults for `LINKDROP_NETWORK_ID`, overridden by the other
    /// `LINKDROP_*` variables that are set.
    pub fn from_env() -> Self {
        let network = std::env::var("LINKDROP_NETWORK_ID").unwrap_or_else(|_| DEFAULT_NETWORK_ID.to_string());
        Self::for_network(&network).with_env_overrides()
    }

    pub fn with_env_overrides(mut self) -> Self {
        let vars = [
            ("LINKDROP_NODE_URL", &mut self.node_url),
            ("LINKDROP_CONTRACT_ID", &mut self.contract_id),
            ("LINKDROP_EVENTS_CONTRACT_ID", &mut self.events_contract_id),
            ("LINKDROP_ORIGIN", &mut self.origin),
        ];
        for (name, slot) in vars {
            if let Ok(value) = std::env::var(name) {
                *slot = value;
            }
        }
        self.logging = logging_config_from_env(self.logging);
        self
    }

    /// Load a TOML or JSON file, chosen by extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DropError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| DropError::Config(format!("{}: {}", path.display(), e)))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content).map_err(|e| DropError::Config(e.to_string())),
            Some("toml") | None => toml::from_str(&content).map_err(|e| DropError::Config(e.to_string())),
            Some(other) => Err(DropError::Config(format!("unsupported config format: {}", other))),
        }
    }

    pub fn is_supported(&self, contract_id: &str) -> bool {
        self.supported_contracts
            .get(&self.network_id)
            .and_then(|contracts| contracts.get(contract_id))
            .copied()
            .unwrap_or(false)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
