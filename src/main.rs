//! src/main.rs
//! # linkdrop CLI
//!
//! Read-only command line front end over [`DropClient`]:
//! - `drops`: an owner's drops, one page or all of them
//! - `keys`: the keys (and claim links) of an owner's drop
//! - `events`: event drops, their ticket types and attendee keys
//! - `inspect`: what a claim link points at
//! - `config`: print the effective configuration
//!
//! Results are printed as JSON on stdout; logs go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use linkdrop_client::{
    utils::{init_logging, LogLevel},
    ClientConfig, DropClient, DropKind, SecretKey,
};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "linkdrop", version = env!("CARGO_PKG_VERSION"), about = "Browse and inspect tokenized-link drops")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML or JSON)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Network id (testnet, mainnet); ignored when a config file is given
    #[arg(short, long)]
    network: Option<String>,

    /// Root entropy the drop keys were generated from
    #[arg(long, env = "LINKDROP_MASTER_KEY", hide_env_values = true)]
    master_key: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List drops owned by an account
    Drops {
        owner: String,
        #[arg(long, default_value = "0")]
        start: u64,
        #[arg(long, default_value = "5")]
        limit: u64,
        /// Fetch every drop instead of one range
        #[arg(long)]
        all: bool,
        /// Print listing rows instead of raw drops
        #[arg(long)]
        summary: bool,
    },

    /// List the keys of a drop (needs the master key)
    Keys {
        drop_id: String,
        #[arg(long, default_value = "0")]
        start: u64,
        #[arg(long, default_value = "30")]
        limit: u64,
        #[arg(long)]
        all: bool,
        /// Print only the claim links
        #[arg(long)]
        links: bool,
    },

    /// Event drops on the events deployment
    Events {
        #[command(subcommand)]
        command: EventCommands,
    },

    /// Describe the drop behind a claim link's secret key
    Inspect {
        secret_key: String,
        /// Contract that issued the link; defaults to the configured one
        #[arg(long)]
        contract: Option<String>,
    },

    /// Print the effective configuration
    Config,
}

#[derive(Subcommand, Debug)]
enum EventCommands {
    /// Events funded by an account
    List { funder: String },

    /// Ticket types of one event
    Tickets { funder: String, event_id: String },

    /// Attendee keys of a ticket drop
    Keys {
        drop_id: String,
        #[arg(long)]
        start: Option<u64>,
        #[arg(long, default_value = "30")]
        limit: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?
            .with_env_overrides(),
        None => match &cli.network {
            Some(network) => ClientConfig::for_network(network).with_env_overrides(),
            None => ClientConfig::from_env(),
        },
    };
    if cli.verbose {
        config.logging.level = LogLevel::Debug;
    }
    let _guard = init_logging(&config.logging)?;

    if let Commands::Config = cli.command {
        return print_json(&config);
    }

    let mut builder = DropClient::builder(config);
    if let Some(master_key) = cli.master_key {
        builder = builder.master_key(master_key);
    }
    let client = builder.build()?;
    info!(network = %client.config().network_id, "linkdrop client started");

    match cli.command {
        Commands::Drops {
            owner,
            start,
            limit,
            all,
            summary,
        } => {
            let drops = if all {
                client.all_drops(&owner).await?
            } else {
                client.paginated_drops(&owner, start, limit).await?
            };
            if summary {
                let mut rows = Vec::with_capacity(drops.len());
                for drop in &drops {
                    rows.push(client.drop_data(drop).await?);
                }
                print_json(&rows)
            } else {
                print_json(&drops)
            }
        }

        Commands::Keys {
            drop_id,
            start,
            limit,
            all,
            links,
        } => {
            if links {
                print_json(&client.links_to_export(&drop_id).await?)
            } else if all {
                print_json(&client.all_keys_info(&drop_id).await?)
            } else {
                print_json(&client.paginated_keys_info(&drop_id, start, limit).await?)
            }
        }

        Commands::Events { command } => match command {
            EventCommands::List { funder } => print_json(&client.all_event_drops(&funder).await?),
            EventCommands::Tickets { funder, event_id } => {
                print_json(&client.tickets_for_event(&funder, &event_id).await?)
            }
            EventCommands::Keys {
                drop_id,
                start,
                limit,
            } => match start {
                Some(start) => print_json(&client.paginated_keys_for_ticket(&drop_id, start, limit).await?),
                None => print_json(&client.all_keys_for_ticket(&drop_id).await?),
            },
        },

        Commands::Inspect {
            secret_key,
            contract,
        } => {
            let secret = SecretKey::parse(&secret_key)?;
            let contract = contract.unwrap_or_else(|| client.config().contract_id.clone());
            inspect(&client, &contract, &secret).await
        }

        Commands::Config => Ok(()),
    }
}

async fn inspect(client: &DropClient, contract_id: &str, secret: &SecretKey) -> Result<()> {
    let claims = client.claims();
    let drop = claims
        .resolve(contract_id, secret)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_friendly_message()))?;
    let kind = claims.linkdrop_kind(&drop, contract_id)?;
    debug!(drop_id = %drop.drop_id, %kind, "inspecting drop");

    let details = match kind {
        DropKind::Nft => serde_json::to_value(claims.nft_claim_info(contract_id, secret).await?)?,
        DropKind::Ticket => serde_json::to_value(claims.ticket_claim_info(contract_id, secret).await?)?,
        _ => serde_json::to_value(claims.token_claim_info(contract_id, secret).await?)?,
    };
    let current_key_use = claims.current_key_use(contract_id, secret).await?;

    print_json(&json!({
        "dropId": drop.drop_id,
        "publicKey": secret.public_key(),
        "type": kind,
        "currentKeyUse": current_key_use,
        "details": details,
    }))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
