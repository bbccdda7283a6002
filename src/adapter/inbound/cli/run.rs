//! Handler for the `run` command.

use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::adapter::inbound::cli::command::RunArgs;
use crate::adapter::inbound::cli::output;
use crate::error::Result;
use crate::infrastructure::config::logging::LogFormat;
use crate::infrastructure::config::{Config, TradingMode};
use crate::infrastructure::runtime::run_with_shutdown;

/// Execute the run command.
pub async fn execute(args: &RunArgs) -> Result<()> {
    let mut config = Config::load(&args.config)?;
    apply_overrides(&mut config, args, output::is_json());
    config.init_logging();
    print_startup(&config);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received, shutting down");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                warn!(error = %e, "Cannot listen for interrupts; stop the process externally");
                // Dropping the sender would read as a shutdown request.
                std::future::pending::<()>().await;
            }
        }
    });

    run_with_shutdown(config, shutdown_rx).await
}

fn apply_overrides(config: &mut Config, args: &RunArgs, force_json_logs: bool) {
    if let Some(level) = &args.log_level {
        config.logging.level.clone_from(level);
    }
    if args.json_logs || force_json_logs {
        config.logging.format = LogFormat::Json;
    }
    if args.simulate {
        config.trading_mode = TradingMode::Simulation;
    }
}

fn print_startup(config: &Config) {
    output::header(env!("CARGO_PKG_VERSION"));
    output::field("Mode", config.trading_mode);
    output::field("Venue", &config.venue.api_url);
    if config.markets.allowlist.is_empty() {
        output::field("Markets", format!("top {} by volume", config.markets.top_n));
    } else {
        output::field("Markets", config.markets.allowlist.join(", "));
    }
    if config.is_live() {
        output::warning("Live trading enabled - orders will reach the venue");
    }
}
