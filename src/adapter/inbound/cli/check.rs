//! Handler for the `check` command.

use std::path::Path;

use crate::adapter::inbound::cli::output;
use crate::adapter::outbound::signer::SignerBackend;
use crate::application::state::SizingMode;
use crate::error::Result;
use crate::infrastructure::bootstrap::{build_kill_switch, signer_backend};
use crate::infrastructure::config::Config;

/// Validate the configuration file without starting the engine.
pub fn execute<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let path = config_path.as_ref();
    let config = Config::load(path)?;

    output::section("Configuration Check");
    output::field("Config", path.display());
    output::success("Configuration is valid");

    output::section("Trading");
    output::field("Mode", config.trading_mode);
    output::field("Venue", &config.venue.api_url);
    if config.markets.allowlist.is_empty() {
        output::field("Markets", format!("top {} by volume", config.markets.top_n));
    } else {
        output::field("Markets", config.markets.allowlist.join(", "));
    }
    output::field("Poll", format!("{}s", config.markets.poll_interval_secs));

    let limits = config.risk_limits();
    output::section("Risk Limits");
    output::field("Per market", limits.max_position_per_market);
    output::field("Exposure", limits.max_global_exposure);
    output::field("Daily loss", limits.max_daily_loss);
    output::field("Orders/min", limits.max_orders_per_minute);
    match limits.sizing {
        SizingMode::Fixed => output::field("Sizing", format!("fixed {}", limits.order_size_default)),
        SizingMode::PercentOfBalance { fraction, balance } => {
            output::field("Sizing", format!("{fraction} of {balance}"));
        }
    }

    output::section("Signing");
    match signer_backend(&config)? {
        SignerBackend::Local { private_key: Some(_) } => {
            output::field("Signer", "local (WALLET_PRIVATE_KEY)");
        }
        SignerBackend::Local { private_key: None } => {
            output::field("Signer", "local");
            output::warning("No signing key configured (set WALLET_PRIVATE_KEY)");
        }
        SignerBackend::Keystore { path, .. } => {
            output::field("Signer", format!("local keystore {path}"));
        }
        SignerBackend::Remote { url, .. } => output::field("Signer", format!("remote {url}")),
    }

    output::section("Safety");
    let kill_switch = build_kill_switch(&config);
    output::field("Kill switch", &config.kill_switch.file);
    if kill_switch.is_active() {
        output::warning("Kill switch is active - new entries will be refused");
    }
    match &config.alerts.webhook_url {
        Some(_) => output::field("Alerts", "webhook"),
        None => output::field("Alerts", "log only"),
    }

    output::success("Configuration check complete");
    Ok(())
}
