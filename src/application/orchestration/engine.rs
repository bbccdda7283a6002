//! Engine lifecycle: market tasks, exit monitor, execution dispatch and
//! graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tracing::{info, warn};

use super::context::PipelineContext;
use super::exit::ProtectiveExitMonitor;
use super::market::MarketPipeline;
use crate::application::aggregator::AggregatorSettings;
use crate::application::detector::DetectorSettings;
use crate::application::execution::ExecutionSubmitter;
use crate::domain::Market;
use crate::port::inbound::risk::Approval;
use crate::port::outbound::feed::SnapshotFeed;
use crate::port::outbound::notifier::Event;

/// Timing and per-market settings for the engine.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Feed poll period per market.
    pub poll_interval: Duration,
    /// Protective-exit scan period.
    pub exit_scan_interval: Duration,
    /// How long in-flight executions may run after shutdown starts.
    pub drain_timeout: Duration,
    pub aggregator: AggregatorSettings,
    pub detector: DetectorSettings,
    /// Label for startup alerts, e.g. `simulation` or `live`.
    pub mode: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            exit_scan_interval: Duration::from_secs(1),
            drain_timeout: Duration::from_secs(30),
            aggregator: AggregatorSettings::default(),
            detector: DetectorSettings::default(),
            mode: "simulation".to_string(),
        }
    }
}

/// Runs one pipeline per market plus the exit monitor, all feeding a single
/// execution dispatcher.
pub struct Engine {
    settings: EngineSettings,
    context: PipelineContext,
    submitter: Arc<ExecutionSubmitter>,
}

impl Engine {
    #[must_use]
    pub fn new(
        settings: EngineSettings,
        context: PipelineContext,
        submitter: Arc<ExecutionSubmitter>,
    ) -> Self {
        Self {
            settings,
            context,
            submitter,
        }
    }

    #[must_use]
    pub const fn context(&self) -> &PipelineContext {
        &self.context
    }

    #[must_use]
    pub const fn submitter(&self) -> &Arc<ExecutionSubmitter> {
        &self.submitter
    }

    /// Build the pipeline for one market.
    #[must_use]
    pub fn pipeline(&self, market: Market) -> MarketPipeline {
        MarketPipeline::new(
            market,
            self.settings.aggregator.clone(),
            self.settings.detector.clone(),
            self.context.clone(),
        )
    }

    #[must_use]
    pub fn exit_monitor(&self) -> ProtectiveExitMonitor {
        ProtectiveExitMonitor::new(self.context.clone())
    }

    /// Run until `shutdown` turns true.
    ///
    /// On shutdown no new signals are admitted; executions already submitted
    /// get up to `drain_timeout` to finish.
    pub async fn run(
        &self,
        feed: Arc<dyn SnapshotFeed>,
        markets: Vec<Market>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!(markets = markets.len(), mode = %self.settings.mode, "Starting engine");
        self.context.notifiers.notify_all(Event::Startup {
            markets: markets.len(),
            mode: self.settings.mode.clone(),
        });

        let (tx, rx) = mpsc::unbounded_channel();
        let mut producers = JoinSet::new();
        for market in markets {
            producers.spawn(self.pipeline(market).run(
                Arc::clone(&feed),
                self.settings.poll_interval,
                tx.clone(),
                shutdown.clone(),
            ));
        }
        producers.spawn(self.exit_monitor().run(
            self.settings.exit_scan_interval,
            tx.clone(),
            shutdown.clone(),
        ));
        drop(tx);

        let mut dispatcher = tokio::spawn(dispatch(Arc::clone(&self.submitter), rx));

        while !*shutdown.borrow() {
            if shutdown.changed().await.is_err() {
                break;
            }
        }
        info!("Shutdown signal received");

        self.submitter.close();
        while producers.join_next().await.is_some() {}

        match tokio::time::timeout(self.settings.drain_timeout, &mut dispatcher).await {
            Ok(_) => info!("In-flight executions drained"),
            Err(_) => {
                warn!(
                    timeout_secs = self.settings.drain_timeout.as_secs(),
                    "In-flight executions did not finish, aborting"
                );
                dispatcher.abort();
            }
        }
    }
}

/// Execute approvals concurrently as they arrive. Returns once every
/// producer is gone and all executions have finished.
pub async fn dispatch(
    submitter: Arc<ExecutionSubmitter>,
    mut approvals: mpsc::UnboundedReceiver<Approval>,
) {
    let mut inflight = JoinSet::new();
    loop {
        tokio::select! {
            Some(approval) = approvals.recv() => {
                let submitter = Arc::clone(&submitter);
                inflight.spawn(async move {
                    // Failures are settled and alerted inside `execute`.
                    let _ = submitter.execute(approval).await;
                });
            }
            Some(_) = inflight.join_next(), if !inflight.is_empty() => {}
            else => break,
        }
    }
}
