//! # Output Reports
//!
//! Hex/bech32m snapshot of the staking, unbonding and slashing change outputs
//! for one stake, rendered as plain text or JSON.

use crate::config::protocol::BLOCK_INTERVAL_MINUTES;
use crate::error::StakingResult;
use crate::keys::to_hex;
use crate::outputs::{SpendInfo, TaprootOutputBuilder};
use crate::params::VersionedParams;
use crate::providers::FinalityProvider;
use bitcoin::{
    key::TweakedPublicKey, secp256k1::XOnlyPublicKey, Address, Amount, Network, Script,
};
use serde::Serialize;
use std::fmt::Write;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Inputs for one stake, before network bounds are applied
#[derive(Debug, Clone)]
pub struct StakeRequest {
    pub staker_key: XOnlyPublicKey,
    pub fp_key: XOnlyPublicKey,
    pub amount: Amount,
    /// `None` selects the network minimum
    pub staking_time_blocks: Option<u32>,
    pub network: Network,
}

/// A spending path: the leaf script and its control block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathReport {
    pub name: String,
    pub description: String,
    pub script: String,
    pub control_block: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputReport {
    /// Absent for the slashing change output, whose value is set by the slashing rate
    pub value_sat: Option<u64>,
    pub address: String,
    pub pk_script: String,
    pub pk_script_len: usize,
    pub output_key: String,
    pub lock_blocks: u32,
    pub paths: Vec<PathReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StakeSummary {
    pub network: String,
    pub params_version: u32,
    pub amount_sat: u64,
    pub staking_time_blocks: u32,
    pub lock_duration: String,
    pub staker_pk: String,
    pub finality_provider_pk: String,
    pub covenant_pks: Vec<String>,
    pub covenant_quorum: u32,
}

/// Everything a wallet needs to fund the stake and pre-sign its spending paths
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputsReport {
    pub summary: StakeSummary,
    pub staking: OutputReport,
    pub unbonding: OutputReport,
    pub slashing_change: OutputReport,
}

impl OutputsReport {
    /// Validate the request against `params` and build all three outputs.
    pub fn build(
        builder: &TaprootOutputBuilder,
        params: &VersionedParams,
        request: &StakeRequest,
    ) -> StakingResult<Self> {
        let staking_time = params.resolve_staking_time(request.staking_time_blocks);
        params.validate_stake(request.amount, staking_time)?;

        let covenant_keys = params.covenant_keys()?;
        let fp_keys = [request.fp_key];

        let staking = builder.build_staking_info(
            &request.staker_key,
            &fp_keys,
            &covenant_keys,
            params.covenant_quorum,
            staking_time,
            request.amount,
        )?;
        let unbonding = builder.build_unbonding_info(
            &request.staker_key,
            &fp_keys,
            &covenant_keys,
            params.covenant_quorum,
            params.unbonding_time_blocks,
            params.unbonding_amount(request.amount)?,
        )?;
        let change =
            builder.build_slashing_change_output(&request.staker_key, params.unbonding_time_blocks)?;

        let summary = StakeSummary {
            network: network_label(request.network).to_string(),
            params_version: params.version,
            amount_sat: request.amount.to_sat(),
            staking_time_blocks: staking_time,
            lock_duration: describe_lock_duration(staking_time),
            staker_pk: to_hex(&request.staker_key),
            finality_provider_pk: to_hex(&request.fp_key),
            covenant_pks: covenant_keys.iter().map(to_hex).collect(),
            covenant_quorum: params.covenant_quorum,
        };

        Ok(Self {
            summary,
            staking: OutputReport {
                value_sat: Some(staking.value().to_sat()),
                address: taproot_address(staking.output_key(), request.network),
                pk_script: hex::encode(staking.pk_script().as_bytes()),
                pk_script_len: staking.pk_script().len(),
                output_key: to_hex(&staking.output_key()),
                lock_blocks: staking_time,
                paths: vec![
                    path_report(
                        "timelock",
                        "normal unbonding after the staking time",
                        &staking.time_lock_path_spend_info()?,
                    ),
                    path_report(
                        "unbonding",
                        "early unbonding with covenant cooperation",
                        &staking.unbonding_path_spend_info()?,
                    ),
                    path_report(
                        "slashing",
                        "slashing with finality provider and covenant cooperation",
                        &staking.slashing_path_spend_info()?,
                    ),
                ],
            },
            unbonding: OutputReport {
                value_sat: Some(unbonding.value().to_sat()),
                address: taproot_address(unbonding.output_key(), request.network),
                pk_script: hex::encode(unbonding.pk_script().as_bytes()),
                pk_script_len: unbonding.pk_script().len(),
                output_key: to_hex(&unbonding.output_key()),
                lock_blocks: params.unbonding_time_blocks,
                paths: vec![
                    path_report(
                        "timelock",
                        "withdrawal after the unbonding time",
                        &unbonding.time_lock_path_spend_info()?,
                    ),
                    path_report(
                        "slashing",
                        "slashing with finality provider and covenant cooperation",
                        &unbonding.slashing_path_spend_info()?,
                    ),
                ],
            },
            slashing_change: OutputReport {
                value_sat: None,
                address: taproot_address(change.output_key(), request.network),
                pk_script: hex::encode(change.pk_script().as_bytes()),
                pk_script_len: change.pk_script().len(),
                output_key: to_hex(&change.output_key()),
                lock_blocks: u32::from(change.lock_blocks()),
                paths: vec![path_report(
                    "timelock",
                    "staker change after the unbonding time",
                    change.spend_info(),
                )],
            },
        })
    }

    pub fn to_json(&self) -> StakingResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Human-readable rendering for the console
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let summary = &self.summary;

        let _ = writeln!(out, "Staking Amount: {} satoshis", summary.amount_sat);
        let _ = writeln!(
            out,
            "Staking Time: {} blocks ({})",
            summary.staking_time_blocks, summary.lock_duration
        );
        let _ = writeln!(out, "Network: {}", summary.network);
        let _ = writeln!(out, "Parameters Version: {}", summary.params_version);
        let _ = writeln!(out);

        let _ = writeln!(out, "Keys Summary:");
        let _ = writeln!(out, "  Staker PK: {}", summary.staker_pk);
        let _ = writeln!(out, "  Finality Provider PK: {}", summary.finality_provider_pk);
        let _ = writeln!(
            out,
            "  Covenant Committee: {} keys (quorum: {})",
            summary.covenant_pks.len(),
            summary.covenant_quorum
        );
        for (i, key) in summary.covenant_pks.iter().enumerate() {
            let _ = writeln!(out, "    [{}] {}", i + 1, key);
        }
        let _ = writeln!(out);

        render_output(&mut out, "Staking Output", &self.staking);
        render_output(&mut out, "Unbonding Output", &self.unbonding);
        render_output(&mut out, "Slashing Change Output", &self.slashing_change);
        out
    }
}

fn render_output(out: &mut String, title: &str, output: &OutputReport) {
    let _ = writeln!(out, "{}:", title);
    match output.value_sat {
        Some(value) => {
            let _ = writeln!(out, "  Value: {} satoshis", value);
        }
        None => {
            let _ = writeln!(out, "  Value: set by the slashing transaction");
        }
    }
    let _ = writeln!(out, "  Taproot Address: {}", output.address);
    let _ = writeln!(out, "  PkScript (hex): {}", output.pk_script);
    let _ = writeln!(out, "  PkScript Length: {} bytes", output.pk_script_len);
    let _ = writeln!(out, "  Timelock: {} blocks", output.lock_blocks);
    let _ = writeln!(out, "  Spending Paths:");
    for (i, path) in output.paths.iter().enumerate() {
        let _ = writeln!(out, "    {}. {} ({}):", i + 1, path.name, path.description);
        let _ = writeln!(out, "       Script: {}", path.script);
        let _ = writeln!(out, "       Control Block: {}", path.control_block);
    }
    let _ = writeln!(out);
}

fn path_report(name: &str, description: &str, info: &SpendInfo) -> PathReport {
    PathReport {
        name: name.to_string(),
        description: description.to_string(),
        script: script_hex(info.script()),
        control_block: hex::encode(info.control_block().to_bytes()),
    }
}

fn script_hex(script: &Script) -> String {
    hex::encode(script.as_bytes())
}

/// Bech32m address of a script-path-only output key.
pub fn taproot_address(output_key: XOnlyPublicKey, network: Network) -> String {
    Address::p2tr_tweaked(TweakedPublicKey::dangerous_assume_tweaked(output_key), network)
        .to_string()
}

fn network_label(network: Network) -> &'static str {
    match network {
        Network::Bitcoin => "Mainnet",
        Network::Testnet => "Testnet",
        Network::Signet => "Signet",
        Network::Regtest => "Regtest",
        _ => "Unknown",
    }
}

/// `"≈ 444.4 days / 63.5 weeks / 14.6 months"` at one block per ten minutes
pub fn describe_lock_duration(blocks: u32) -> String {
    let days = f64::from(blocks) * BLOCK_INTERVAL_MINUTES / 60.0 / 24.0;
    format!(
        "≈ {:.1} days / {:.1} weeks / {:.1} months",
        days,
        days / 7.0,
        days / 30.44
    )
}

/// Keep the first ten characters of a key. The key is unchecked API data, so the
/// cut is made on a character boundary.
fn abbreviate(key: &str) -> String {
    match key.char_indices().nth(10) {
        Some((cut, _)) => format!("{}...", &key[..cut]),
        None => key.to_string(),
    }
}

/// Truncate to fewer than `width` terminal columns, marking the cut with `...`.
fn truncate_to_width(text: &str, width: usize) -> String {
    if text.width() < width {
        return text.to_string();
    }

    let budget = width.saturating_sub(4);
    let mut used = 0;
    let mut kept = String::new();
    for ch in text.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if used + ch_width > budget {
            break;
        }
        used += ch_width;
        kept.push(ch);
    }
    format!("{}...", kept)
}

/// Left-align in `width` terminal columns. `{:<N}` counts chars, which misaligns
/// wide glyphs such as CJK and emoji.
fn pad_to_width(text: &str, width: usize) -> String {
    let padding = width.saturating_sub(text.width());
    format!("{}{}", text, " ".repeat(padding))
}

/// Numbered provider table. Each entry carries its registry number so filtered
/// listings keep the original numbering.
pub fn render_providers_table(providers: &[(usize, &FinalityProvider)]) -> String {
    const NUM: usize = 5;
    const DESC: usize = 35;
    const STATUS: usize = 10;
    const COMMISSION: usize = 10;
    const PK: usize = 13;
    let total = NUM + DESC + STATUS + COMMISSION + PK + 6;

    let mut out = String::new();
    let _ = writeln!(out, "{}", "=".repeat(total));
    let _ = writeln!(
        out,
        "{:<NUM$} {:<DESC$} {:<STATUS$} {:>COMMISSION$}   {:<PK$}",
        "#", "Description", "Status", "Commission", "BTC PubKey"
    );
    let _ = writeln!(out, "{}", "=".repeat(total));

    for (index, provider) in providers {
        let commission = provider
            .commission_percent()
            .map(|pct| format!("{:.2}%", pct))
            .unwrap_or_else(|| "N/A".to_string());
        let moniker = truncate_to_width(&provider.description.moniker, DESC);
        let _ = writeln!(
            out,
            "{:<NUM$} {} {:<STATUS$} {:>COMMISSION$}   {}",
            index,
            pad_to_width(&moniker, DESC),
            provider.status().to_string(),
            commission,
            abbreviate(&provider.btc_pk)
        );
    }

    let _ = writeln!(out, "{}", "=".repeat(total));
    let _ = writeln!(out, "Total finality providers: {}", providers.len());
    out
}

/// Full registry entry for a single selected provider
pub fn render_provider_details(provider: &FinalityProvider) -> String {
    let description = &provider.description;
    let or_na = |value: &str| {
        if value.trim().is_empty() {
            "N/A".to_string()
        } else {
            value.to_string()
        }
    };

    let mut out = String::new();
    let rule = "=".repeat(80);
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "SELECTED FINALITY PROVIDER");
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "Moniker:        {}", or_na(&description.moniker));
    let _ = writeln!(out, "Identity:       {}", or_na(&description.identity));
    let _ = writeln!(out, "Website:        {}", or_na(&description.website));
    let _ = writeln!(out, "Security:       {}", or_na(&description.security_contact));
    let _ = writeln!(out, "Details:        {}", or_na(&description.details));
    let _ = writeln!(out, "{}", "-".repeat(80));
    let _ = writeln!(
        out,
        "Commission:     {}",
        or_na(provider.commission.as_deref().unwrap_or_default())
    );
    let _ = writeln!(out, "Address:        {}", or_na(&provider.addr));
    let _ = writeln!(out, "Status:         {}", provider.status());
    let _ = writeln!(out, "Jailed:         {}", provider.jailed);
    let _ = writeln!(out, "Slashed BBN:    {}", provider.slashed_babylon_height);
    let _ = writeln!(out, "Slashed BTC:    {}", provider.slashed_btc_height);
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "BTC PUBLIC KEY (hex):");
    let _ = writeln!(out, "{}", provider.btc_pk);
    let _ = writeln!(out, "{}", rule);
    out
}
