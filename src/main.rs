//! # Staking Outputs CLI
//!
//! Fetches the current staking parameters and prints the Taproot outputs a
//! staker would create: the staking output with its three spending paths, the
//! unbonding output and the slashing change output.
//!
//! ## Usage
//!
//! ```bash
//! # Outputs for a 1,000,000 sat stake at the network's minimum staking time
//! staking-outputs outputs --staker-pk <hex> --fp-pk <hex> --amount 1000000
//!
//! # Testnet addresses, explicit staking time, machine-readable output
//! staking-outputs outputs --staker-pk <hex> --fp-pk <hex> --amount 1000000 \
//!     --time 64000 --testnet --json
//!
//! # Pick a finality provider
//! staking-outputs providers --active-only --search guru
//! ```
//!
//! ## Configuration
//!
//! API endpoints resolve in order: command-line flag, environment variable
//! (`STAKING_PARAMS_API_URL`, `STAKING_PROVIDERS_API_URL`, also read from `.env`),
//! built-in default. Set `RUST_LOG` or pass `--verbose` for construction logs.

use anyhow::{Context, Result};
use bitcoin::{Amount, Network};
use btc_staking_taproot::{
    keys::parse_public_key,
    providers::FinalityProvider,
    report::{render_provider_details, render_providers_table, OutputsReport, StakeRequest},
    services::{ParamsClient, ProviderClient},
    TaprootOutputBuilder,
};
use clap::{Parser, Subcommand};
use std::env;

#[derive(Parser)]
#[command(name = "staking-outputs")]
#[command(about = "Build and inspect Taproot outputs for covenant-secured BTC staking")]
#[command(version)]
struct Cli {
    /// Display construction logs (debug level)
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the staking, unbonding and slashing change outputs for a stake
    Outputs {
        /// Staker public key (hex: 64 chars x-only or 66 chars compressed)
        #[arg(long)]
        staker_pk: String,
        /// Finality provider public key (hex: 64 chars x-only or 66 chars compressed)
        #[arg(long)]
        fp_pk: String,
        /// Staking amount in satoshis
        #[arg(long)]
        amount: u64,
        /// Staking time in blocks (default: network minimum)
        #[arg(long)]
        time: Option<u32>,
        /// Encode addresses for testnet instead of mainnet
        #[arg(long)]
        testnet: bool,
        /// Staking parameters API endpoint
        #[arg(long)]
        api: Option<String>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// List registered finality providers
    Providers {
        /// Finality provider API endpoint
        #[arg(long)]
        api: Option<String>,
        /// Only show providers that are currently active
        #[arg(long)]
        active_only: bool,
        /// Only show providers whose moniker contains this text
        #[arg(short, long)]
        search: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Outputs {
            staker_pk,
            fp_pk,
            amount,
            time,
            testnet,
            api,
            json,
        } => {
            let network = if testnet { Network::Testnet } else { Network::Bitcoin };
            outputs(&staker_pk, &fp_pk, amount, time, network, api.as_deref(), json).await?;
        }
        Commands::Providers {
            api,
            active_only,
            search,
        } => {
            providers(api.as_deref(), active_only, search.as_deref()).await?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    if verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else if env::var_os("RUST_LOG").is_some() {
        env_logger::init();
    }
}

async fn outputs(
    staker_pk: &str,
    fp_pk: &str,
    amount: u64,
    time: Option<u32>,
    network: Network,
    api: Option<&str>,
    json: bool,
) -> Result<()> {
    let staker_key = parse_public_key(staker_pk).context("Failed to parse staker public key")?;
    let fp_key = parse_public_key(fp_pk).context("Failed to parse finality provider public key")?;

    let client = ParamsClient::with_url(api)?;
    if !json {
        println!("Fetching parameters from staking API: {}", client.url());
    }
    let params = client
        .fetch_latest_params()
        .await
        .context("Failed to fetch staking parameters")?;
    if !json {
        println!(
            "✓ Successfully fetched parameters (Version: {}, Covenant quorum: {}/{})",
            params.version,
            params.covenant_quorum,
            params.covenant_pks.len()
        );
        println!();
    }

    let request = StakeRequest {
        staker_key,
        fp_key,
        amount: Amount::from_sat(amount),
        staking_time_blocks: time,
        network,
    };
    let builder = TaprootOutputBuilder::new()?;
    let report = OutputsReport::build(&builder, &params, &request)?;

    if json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report.render_text());
    }
    Ok(())
}

async fn providers(api: Option<&str>, active_only: bool, search: Option<&str>) -> Result<()> {
    let client = ProviderClient::with_url(api)?;
    println!("Fetching finality providers from {}", client.url());

    let all = client
        .fetch_providers()
        .await
        .context("Failed to fetch finality providers")?;

    // Registry numbering is kept so a filtered listing still matches the full one
    let selected: Vec<(usize, &FinalityProvider)> = all
        .iter()
        .enumerate()
        .map(|(i, provider)| (i + 1, provider))
        .filter(|(_, provider)| !active_only || provider.is_active())
        .filter(|(_, provider)| search.map_or(true, |term| provider.matches(term)))
        .collect();

    if selected.is_empty() {
        println!("No finality providers found.");
        return Ok(());
    }

    print!("{}", render_providers_table(&selected));

    if let [(_, provider)] = selected.as_slice() {
        println!();
        print!("{}", render_provider_details(provider));
    }
    Ok(())
}
