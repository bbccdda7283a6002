//! Composition root: builds adapters and the engine from [`Config`].

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use url::Url;

use crate::adapter::outbound::feed::RestSnapshotFeed;
use crate::adapter::outbound::http::ApiCredentials;
use crate::adapter::outbound::kill_switch::FileKillSwitch;
use crate::adapter::outbound::notifier::{WebhookConfig, WebhookNotifier};
use crate::adapter::outbound::signer::{build_signer, SignerBackend};
use crate::adapter::outbound::venue::{PaperVenue, RestVenue};
use crate::application::execution::ExecutionSubmitter;
use crate::application::orchestration::{Engine, PipelineContext};
use crate::application::risk::RiskGatekeeper;
use crate::application::state::AppState;
use crate::application::strategy::{FadeStrategy, StrategySettings};
use crate::domain::Market;
use crate::error::{ConfigError, Result};
use crate::infrastructure::config::wallet::SignerKind;
use crate::infrastructure::config::Config;
use crate::port::outbound::feed::SnapshotFeed;
use crate::port::outbound::kill_switch::KillSwitch;
use crate::port::outbound::notifier::{LogNotifier, NotifierRegistry};
use crate::port::outbound::signer::OrderSigner;
use crate::port::outbound::venue::OrderVenue;

/// Venue API credentials from the resolved config.
#[must_use]
pub fn build_credentials(config: &Config) -> ApiCredentials {
    ApiCredentials {
        api_key: config.venue.api_key.clone(),
        api_passphrase: config.venue.api_passphrase.clone(),
    }
}

/// Resolve the signer selection.
///
/// # Errors
///
/// Returns a config error if the remote URL does not parse.
pub fn signer_backend(config: &Config) -> Result<SignerBackend> {
    match config.signer.backend {
        SignerKind::Remote => {
            let raw = config.signer.remote_url.as_deref().unwrap_or_default();
            let url = Url::parse(raw).map_err(|e| ConfigError::InvalidValue {
                field: "signer.remote_url",
                reason: e.to_string(),
            })?;
            Ok(SignerBackend::Remote {
                url,
                timeout: Duration::from_millis(config.signer.timeout_ms),
            })
        }
        SignerKind::Local => match (
            &config.wallet.private_key,
            &config.wallet.keystore_path,
            &config.wallet.keystore_password,
        ) {
            (Some(key), _, _) => Ok(SignerBackend::Local {
                private_key: Some(key.clone()),
            }),
            (None, Some(path), Some(password)) => Ok(SignerBackend::Keystore {
                path: path.clone(),
                password: password.clone(),
            }),
            _ => Ok(SignerBackend::Local { private_key: None }),
        },
    }
}

/// Build the order signer.
///
/// # Errors
///
/// Returns an error if the backend cannot be constructed.
pub fn init_signer(config: &Config) -> Result<Arc<dyn OrderSigner>> {
    let backend = signer_backend(config)?;
    if matches!(backend, SignerBackend::Local { private_key: None }) {
        warn!("No signing key configured; every order will fail to sign");
    }
    Ok(build_signer(backend)?)
}

/// Paper venue in simulation mode, the REST venue in live mode.
#[must_use]
pub fn build_venue(config: &Config) -> Arc<dyn OrderVenue> {
    if config.is_live() {
        info!(api_url = %config.venue.api_url, "Live trading: orders go to the venue");
        Arc::new(RestVenue::new(
            config.venue.api_url.clone(),
            build_credentials(config),
            config.venue.timeout(),
            config.venue.connect_timeout(),
        ))
    } else {
        info!("Simulation mode: orders fill against the paper venue");
        Arc::new(PaperVenue::new())
    }
}

#[must_use]
pub fn build_feed(config: &Config) -> Arc<RestSnapshotFeed> {
    Arc::new(RestSnapshotFeed::new(
        config.venue.api_url.clone(),
        build_credentials(config),
        config.venue.market_defaults(),
        config.venue.timeout(),
        config.venue.connect_timeout(),
    ))
}

#[must_use]
pub fn build_kill_switch(config: &Config) -> Arc<dyn KillSwitch> {
    let switch = FileKillSwitch::new(&config.kill_switch.file);
    info!(source = %switch.describe(), "Kill switch configured");
    Arc::new(switch)
}

/// Log notifier always; the webhook when a URL is configured.
///
/// Must be called from within a Tokio runtime when the webhook is enabled.
#[must_use]
pub fn build_notifier_registry(config: &Config) -> NotifierRegistry {
    let mut registry = NotifierRegistry::new();
    registry.register(Box::new(LogNotifier));

    if let Some(url) = &config.alerts.webhook_url {
        registry.register(Box::new(WebhookNotifier::new(WebhookConfig {
            url: url.clone(),
            batch_size: config.alerts.batch_size,
            throttle: config.alerts.throttle(),
            min_level: config.alerts.min_level,
            timeout: config.alerts.timeout(),
        })));
        info!("Webhook alerts enabled");
    }
    registry
}

/// Markets to monitor: the allowlist, or the top markets by volume.
///
/// # Errors
///
/// Returns an error if market discovery fails.
pub async fn select_markets(config: &Config, feed: &RestSnapshotFeed) -> Result<Vec<Market>> {
    if !config.markets.allowlist.is_empty() {
        let markets: Vec<Market> = config
            .markets
            .allowlist
            .iter()
            .map(|id| feed.market_from_id(id))
            .collect();
        info!(count = markets.len(), "Using market allowlist");
        return Ok(markets);
    }
    let markets = feed.list_markets(config.markets.top_n).await?;
    info!(count = markets.len(), top_n = config.markets.top_n, "Discovered markets by volume");
    Ok(markets)
}

/// Wire state, strategy, gatekeeper and submitter into an engine.
#[must_use]
pub fn build_engine(
    config: &Config,
    signer: Arc<dyn OrderSigner>,
    venue: Arc<dyn OrderVenue>,
    kill_switch: Arc<dyn KillSwitch>,
    notifiers: NotifierRegistry,
) -> Engine {
    let state = Arc::new(AppState::new(config.risk_limits()));
    let notifiers = Arc::new(notifiers);
    let gatekeeper = Arc::new(RiskGatekeeper::new(
        Arc::clone(&state),
        Arc::clone(&kill_switch),
    ));
    let strategy = Arc::new(FadeStrategy::new(StrategySettings::from(&config.strategy)));
    let submitter = Arc::new(ExecutionSubmitter::new(
        Arc::clone(&state),
        signer,
        venue,
        kill_switch,
        Arc::clone(&notifiers),
        config.execution.retry_policy(),
    ));
    let context = PipelineContext {
        state,
        strategy,
        gatekeeper,
        notifiers,
    };
    Engine::new(config.engine_settings(), context, submitter)
}

/// Everything `run` needs, built from config.
pub struct Runtime {
    pub engine: Engine,
    pub feed: Arc<dyn SnapshotFeed>,
    pub markets: Vec<Market>,
}

/// Build the full runtime, discovering markets if needed.
///
/// # Errors
///
/// Returns an error if the signer cannot be built or market discovery fails.
pub async fn build_runtime(config: &Config) -> Result<Runtime> {
    let feed = build_feed(config);
    let markets = select_markets(config, &feed).await?;
    let engine = build_engine(
        config,
        init_signer(config)?,
        build_venue(config),
        build_kill_switch(config),
        build_notifier_registry(config),
    );
    Ok(Runtime {
        engine,
        feed,
        markets,
    })
}
