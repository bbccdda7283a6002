//! Per-market pipeline: aggregation, detection, strategy and gating.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::context::PipelineContext;
use crate::application::aggregator::{AggregatorSettings, FeatureAggregator};
use crate::application::detector::{AnomalyDetector, DetectorSettings};
use crate::domain::{AnomalyEvent, Market, Snapshot};
use crate::error::FeedError;
use crate::port::inbound::risk::{Approval, RiskDecision};
use crate::port::outbound::feed::SnapshotFeed;
use crate::port::outbound::notifier::{AnomalyNotice, DecisionEvent, Event, RiskEvent};

/// What one snapshot produced.
#[derive(Debug)]
pub enum TickOutcome {
    /// Snapshot dropped; state unchanged.
    Dropped(FeedError),
    /// Statistics updated, nothing fired.
    Quiet,
    /// An anomaly fired but no signal came of it.
    NoSignal(AnomalyEvent),
    /// The signal was refused by the gatekeeper.
    Rejected(AnomalyEvent),
    /// The signal was approved and must be executed.
    Approved(AnomalyEvent, Approval),
}

impl TickOutcome {
    #[must_use]
    pub fn approval(self) -> Option<Approval> {
        match self {
            Self::Approved(_, approval) => Some(approval),
            _ => None,
        }
    }

    #[must_use]
    pub const fn anomaly(&self) -> Option<&AnomalyEvent> {
        match self {
            Self::NoSignal(event) | Self::Rejected(event) | Self::Approved(event, _) => {
                Some(event)
            }
            Self::Dropped(_) | Self::Quiet => None,
        }
    }
}

/// Processing state for one market.
///
/// Snapshots are handled strictly in arrival order; only the gatekeeper and
/// ledger behind [`PipelineContext`] are shared with other markets.
pub struct MarketPipeline {
    market: Market,
    aggregator: FeatureAggregator,
    detector: AnomalyDetector,
    context: PipelineContext,
}

impl MarketPipeline {
    #[must_use]
    pub fn new(
        market: Market,
        aggregator: AggregatorSettings,
        detector: DetectorSettings,
        context: PipelineContext,
    ) -> Self {
        Self {
            aggregator: FeatureAggregator::new(market.id().clone(), aggregator),
            detector: AnomalyDetector::new(detector),
            market,
            context,
        }
    }

    #[must_use]
    pub const fn market(&self) -> &Market {
        &self.market
    }

    /// Run one snapshot through aggregation, detection, strategy and gating.
    pub fn on_snapshot(&mut self, snapshot: &Snapshot) -> TickOutcome {
        let stats = match self.aggregator.ingest(snapshot) {
            Ok(stats) => stats,
            Err(err) => {
                self.on_feed_error(&err);
                return TickOutcome::Dropped(err);
            }
        };
        self.context
            .state
            .mark_to_market(self.market.id(), stats.mid);

        let Some(event) = self.detector.evaluate(&stats) else {
            return TickOutcome::Quiet;
        };
        self.context
            .notifiers
            .notify_all(Event::AnomalyDetected(AnomalyNotice::from(&event)));

        let limits = self.context.state.limits();
        let Some(signal) = self.context.strategy.decide(&event, &self.market, limits) else {
            debug!(market_id = %self.market.id(), "Anomaly produced no signal");
            return TickOutcome::NoSignal(event);
        };

        match self.context.gatekeeper.check(signal) {
            RiskDecision::Approved(approval) => {
                self.context
                    .notifiers
                    .notify_all(Event::SignalApproved(DecisionEvent::from(&approval)));
                TickOutcome::Approved(event, approval)
            }
            RiskDecision::Rejected { signal, reason } => {
                self.context
                    .notifiers
                    .notify_all(Event::SignalRejected(RiskEvent::new(&signal, reason)));
                TickOutcome::Rejected(event)
            }
        }
    }

    /// Record a feed failure. The aggregator is untouched.
    pub fn on_feed_error(&self, err: &FeedError) {
        warn!(market_id = %self.market.id(), error = %err, "Snapshot dropped");
        self.context.notifiers.notify_all(Event::FeedRejected {
            market_id: err.market_id().to_string(),
            reason: err.to_string(),
        });
    }

    /// Poll the feed until shutdown, forwarding approvals for execution.
    pub async fn run(
        mut self,
        feed: Arc<dyn SnapshotFeed>,
        poll_interval: Duration,
        approvals: mpsc::UnboundedSender<Approval>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!(market_id = %self.market.id(), feed = feed.name(), "Market pipeline started");
        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        while !*shutdown.borrow() {
            tokio::select! {
                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    let outcome = match feed.get_snapshot(&self.market).await {
                        Ok(snapshot) => self.on_snapshot(&snapshot),
                        Err(err) => {
                            self.on_feed_error(&err);
                            TickOutcome::Dropped(err)
                        }
                    };
                    if let Some(approval) = outcome.approval() {
                        if let Err(err) = approvals.send(approval) {
                            // Dispatcher gone: release what we reserved.
                            if let Some(id) = err.0.reservation {
                                self.context.state.release_reservation(id);
                            }
                            break;
                        }
                    }
                }
            }
        }
        info!(market_id = %self.market.id(), "Market pipeline stopped");
    }
}
