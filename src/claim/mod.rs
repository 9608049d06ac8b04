// src/claim/mod.rs
//! Claim workflow
//!
//! A claim starts from the secret key carried in a link:
//! 1. resolve the drop the key belongs to
//! 2. check the issuing contract is on the allow-list for this network
//! 3. classify the drop and compare with what the page expects
//! 4. claim, either as a password-gated ticket scan or as a plain claim to
//!    a destination account
//!
//! Signing is not done here. Claims are handed to the injected
//! [`ClaimSigner`]; everything else is read-only.

mod account;
mod info;

pub use account::{is_valid_account_id, validate_account_id};
pub use info::{NftClaimInfo, NftMedia, TokenClaimInfo};

use crate::config::ClientConfig;
use crate::drops::{classify, decode_metadata, Drop, DropKind};
use crate::error::DropError;
use crate::keys::{claim_password, SecretKey};
use crate::ledger::{ClaimRequest, ClaimSigner, DropLookup, RemoteAccessor};
use crate::params::TICKET_SCAN_ACCOUNT;
use crate::utils::format_near_amount;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Function-call entry holding the ticket's NFT mint
const TICKET_MINT_CALL: usize = 2;

pub struct ClaimWorkflow {
    accessor: RemoteAccessor,
    signer: Arc<dyn ClaimSigner>,
    config: Arc<ClientConfig>,
}

impl ClaimWorkflow {
    pub fn new(accessor: RemoteAccessor, signer: Arc<dyn ClaimSigner>, config: Arc<ClientConfig>) -> Self {
        Self {
            accessor,
            signer,
            config,
        }
    }

    // ------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------

    /// Drop the key belongs to. Any ledger failure means the key is gone.
    pub async fn resolve(&self, contract_id: &str, secret: &SecretKey) -> Result<Drop, DropError> {
        let public_key = secret.public_key();
        self.accessor
            .with_contract(contract_id)
            .drop_information(DropLookup::Key(&public_key))
            .await
            .map_err(|e| {
                debug!(contract = %contract_id, key = %public_key, error = %e, "drop lookup failed");
                DropError::DropNotFound("Unable to claim. This drop may have been claimed before.".to_string())
            })
    }

    pub fn verify_support(&self, contract_id: &str) -> Result<(), DropError> {
        if self.config.is_supported(contract_id) {
            Ok(())
        } else {
            Err(DropError::UnsupportedDrop {
                network: self.config.network_id.clone(),
                contract_id: contract_id.to_string(),
            })
        }
    }

    /// Verify support, then classify
    pub fn linkdrop_kind(&self, drop: &Drop, contract_id: &str) -> Result<DropKind, DropError> {
        self.verify_support(contract_id)?;
        Ok(classify(drop))
    }

    fn expect_kind(&self, drop: &Drop, contract_id: &str, expected: DropKind) -> Result<(), DropError> {
        let actual = self.linkdrop_kind(drop, contract_id)?;
        if actual != expected {
            return Err(DropError::UnexpectedDropType { expected, actual });
        }
        Ok(())
    }

    /// Resolves against the main contract; errors read as "no".
    pub async fn drop_exists(&self, secret: &SecretKey) -> bool {
        self.resolve(self.accessor.contract_id(), secret).await.is_ok()
    }

    pub async fn current_key_use(&self, contract_id: &str, secret: &SecretKey) -> Result<u32, DropError> {
        self.verify_support(contract_id)?;
        let info = self
            .accessor
            .with_contract(contract_id)
            .key_information(&secret.public_key())
            .await?
            .ok_or(DropError::KeyAlreadyUsed)?;
        Ok(info.cur_key_use)
    }

    // ------------------------------------------------------------------
    // Claims
    // ------------------------------------------------------------------

    /// Password-gated ticket scan.
    ///
    /// The contract rejects a wrong password by failing the call, so a failed
    /// submission is not an error here; the outcome is read back from the
    /// key's remaining uses. Unchanged uses mean the password was wrong.
    pub async fn claim_ticket(&self, contract_id: &str, secret: &SecretKey, password: &str) -> Result<(), DropError> {
        let drop = self.resolve(contract_id, secret).await?;
        self.expect_kind(&drop, contract_id, DropKind::Ticket)?;
        let accessor = self.accessor.with_contract(contract_id);
        let public_key = secret.public_key();

        let before = accessor
            .key_information(&public_key)
            .await?
            .ok_or(DropError::KeyAlreadyUsed)?;

        let request = ClaimRequest {
            account_id: TICKET_SCAN_ACCOUNT.to_string(),
            password: Some(claim_password(password, &public_key, before.cur_key_use)),
        };
        if let Err(e) = self.signer.claim(contract_id, secret, &request).await {
            warn!(contract = %contract_id, key = %public_key, error = %e, "ticket claim submission failed");
        }

        let after = accessor.key_information(&public_key).await?;
        match after {
            Some(info) if info.remaining_uses == before.remaining_uses => {
                info!(key = %public_key, remaining_uses = info.remaining_uses, "ticket claim rejected");
                Err(DropError::IncorrectPassword)
            }
            _ => {
                info!(key = %public_key, "ticket claimed");
                Ok(())
            }
        }
    }

    /// Plain claim to `account_id`. The key must still resolve to a drop on a
    /// supported contract; any kind of drop can be claimed this way.
    pub async fn claim(
        &self,
        contract_id: &str,
        secret: &SecretKey,
        account_id: &str,
        skip_validation: bool,
    ) -> Result<(), DropError> {
        let drop = self.resolve(contract_id, secret).await?;
        self.verify_support(contract_id)?;
        if !skip_validation {
            validate_account_id(&self.accessor, account_id).await?;
        }
        let request = ClaimRequest {
            account_id: account_id.to_string(),
            password: None,
        };
        self.signer.claim(contract_id, secret, &request).await?;
        info!(contract = %contract_id, drop_id = %drop.drop_id, %account_id, "drop claimed");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Claim page information
    // ------------------------------------------------------------------

    pub async fn token_claim_info(&self, contract_id: &str, secret: &SecretKey) -> Result<TokenClaimInfo, DropError> {
        let drop = self.resolve(contract_id, secret).await?;
        self.linkdrop_kind(&drop, contract_id)?;
        self.token_info_for(&drop).await
    }

    pub async fn nft_claim_info(&self, contract_id: &str, secret: &SecretKey) -> Result<NftClaimInfo, DropError> {
        self.series_claim_info(contract_id, secret, DropKind::Nft, 0).await
    }

    pub async fn ticket_claim_info(&self, contract_id: &str, secret: &SecretKey) -> Result<NftClaimInfo, DropError> {
        self.series_claim_info(contract_id, secret, DropKind::Ticket, TICKET_MINT_CALL)
            .await
    }

    /// Claim link on an external wallet's own claim page
    pub async fn external_wallet_link(&self, wallet: &str, contract_id: &str, secret: &SecretKey) -> Result<String, DropError> {
        if let Err(e) = self.resolve(contract_id, secret).await {
            debug!(error = %e, "drop gone before building wallet link");
            return Err(DropError::DropNotFound("This drop has been claimed.".to_string()));
        }
        let template = self
            .config
            .claim_pages
            .get(wallet)
            .ok_or_else(|| DropError::Config(format!("no claim page configured for wallet {}", wallet)))?;
        Ok(template
            .replace("CONTRACT_ID", contract_id)
            .replace("SECRET_KEY", secret.without_prefix()))
    }

    async fn series_claim_info(
        &self,
        contract_id: &str,
        secret: &SecretKey,
        expected: DropKind,
        call_index: usize,
    ) -> Result<NftClaimInfo, DropError> {
        let drop = self.resolve(contract_id, secret).await?;
        self.expect_kind(&drop, contract_id, expected)?;

        let call = drop
            .function_call(call_index)
            .ok_or_else(|| DropError::MissingFunctionCall(drop.drop_id.clone()))?;
        let metadata = decode_metadata(drop.metadata_str());

        let nft = match self.accessor.series_info(&call.receiver_id, &drop.drop_id).await {
            Ok(series) => NftMedia::from_series(&series, &self.config.ipfs_gateway),
            Err(e) => {
                warn!(receiver = %call.receiver_id, drop_id = %drop.drop_id, error = %e, "NFT series not found");
                None
            }
        };
        let tokens = match nft {
            Some(_) => None,
            None => Some(self.token_info_for(&drop).await?),
        };

        Ok(NftClaimInfo {
            kind: if nft.is_some() { DropKind::Nft } else { DropKind::Token },
            drop_name: metadata.drop_name,
            wallets: metadata.wallets,
            redirect_url: metadata.redirect_url,
            nft,
            tokens,
        })
    }

    async fn token_info_for(&self, drop: &Drop) -> Result<TokenClaimInfo, DropError> {
        let metadata = decode_metadata(drop.metadata_str());
        let (ft_metadata, amount_tokens) = match &drop.ft {
            Some(ft) => (
                Some(self.accessor.ft_metadata(&ft.contract_id).await?),
                Some(ft.balance_per_use.clone()),
            ),
            None => (None, None),
        };
        Ok(TokenClaimInfo {
            drop_name: metadata.drop_name,
            wallets: metadata.wallets,
            redirect_url: metadata.redirect_url,
            ft_metadata,
            amount_tokens,
            amount_near: format_near_amount(drop.deposit_per_use),
        })
    }
}
