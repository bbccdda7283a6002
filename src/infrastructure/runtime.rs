//! Runtime lifecycle.

use tokio::sync::watch;
use tracing::{info, warn};

use super::bootstrap::build_runtime;
use super::config::Config;
use crate::error::Result;

/// Build everything from `config` and run until `shutdown` turns true.
///
/// # Errors
///
/// Returns an error if startup wiring fails. Once the engine is running,
/// per-market and per-order failures are contained and never end the run.
pub async fn run_with_shutdown(config: Config, shutdown: watch::Receiver<bool>) -> Result<()> {
    info!(mode = %config.trading_mode, "Starting fadebot");

    let runtime = build_runtime(&config).await?;
    if runtime.markets.is_empty() {
        warn!("No markets to monitor");
    }
    runtime
        .engine
        .run(runtime.feed, runtime.markets, shutdown)
        .await;

    let state = &runtime.engine.context().state;
    info!(
        open_positions = state.open_positions().len(),
        exposure = %state.total_exposure(),
        daily_pnl = %state.daily_realized_pnl(),
        "fadebot stopped"
    );
    Ok(())
}
