//! Notifier port for alerts.
//!
//! This module defines the trait for sending notifications about pipeline
//! events such as anomalies, risk decisions, fills and protective exits.
//! Delivery is fire-and-forget and must never block the pipeline.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{AnomalyEvent, ExitReason, Fill, Side, Signal, SignalIntent};
use crate::port::inbound::risk::{Approval, RejectReason};

/// Alert severity, used by adapters to filter and format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    /// Degraded input, e.g. a dropped snapshot.
    Low,
    /// Normal decision flow.
    Info,
    /// Failures and loss-taking exits.
    Warning,
}

/// Events that can trigger notifications.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    /// Anomaly detected on a market.
    AnomalyDetected(AnomalyNotice),
    /// Signal passed risk checks.
    SignalApproved(DecisionEvent),
    /// Signal refused by the gatekeeper.
    SignalRejected(RiskEvent),
    /// Order confirmed filled.
    OrderFilled(ExecutionEvent),
    /// Order attempt failed terminally; any reservation was released.
    ExecutionFailed(FailureEvent),
    /// Position fully closed by a protective exit.
    PositionClosed(CloseEvent),
    /// Snapshot dropped because of a feed error.
    FeedRejected { market_id: String, reason: String },
    /// Daily loss counters reset.
    DailyReset { date: NaiveDate, realized_pnl: Decimal },
    /// Engine started.
    Startup { markets: usize, mode: String },
}

impl Event {
    /// Severity of this event.
    #[must_use]
    pub fn level(&self) -> AlertLevel {
        match self {
            Self::FeedRejected { .. } => AlertLevel::Low,
            Self::ExecutionFailed(_) => AlertLevel::Warning,
            Self::PositionClosed(e) if e.reason == ExitReason::StopLoss => AlertLevel::Warning,
            _ => AlertLevel::Info,
        }
    }

    /// Short tag for compact formats.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::AnomalyDetected(_) => "ANOMALY",
            Self::SignalApproved(_) => "SIGNAL",
            Self::SignalRejected(_) => "RISK",
            Self::OrderFilled(_) => "FILL",
            Self::ExecutionFailed(_) => "EXEC_FAIL",
            Self::PositionClosed(_) => "EXIT",
            Self::FeedRejected { .. } => "FEED",
            Self::DailyReset { .. } => "RESET",
            Self::Startup { .. } => "HEALTH",
        }
    }
}

/// Anomaly detection event.
#[derive(Debug, Clone, Serialize)]
pub struct AnomalyNotice {
    pub market_id: String,
    pub metric: String,
    pub z_score: f64,
    pub severity: String,
    pub reference_price: Decimal,
}

impl From<&AnomalyEvent> for AnomalyNotice {
    fn from(event: &AnomalyEvent) -> Self {
        Self {
            market_id: event.market_id.to_string(),
            metric: event.metric.to_string(),
            z_score: event.z_score,
            severity: event.severity.as_str().to_string(),
            reference_price: event.reference_price,
        }
    }
}

/// Approved signal event.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionEvent {
    pub market_id: String,
    pub side: Side,
    pub size: Decimal,
    pub requested_size: Decimal,
    pub limit_price: Decimal,
    pub closing: bool,
}

impl From<&Approval> for DecisionEvent {
    fn from(approval: &Approval) -> Self {
        let signal = &approval.signal;
        Self {
            market_id: signal.market_id.to_string(),
            side: signal.side,
            size: signal.size,
            requested_size: approval.requested_size,
            limit_price: signal.limit_price,
            closing: !signal.is_exposure_increasing(),
        }
    }
}

/// Risk rejection event.
#[derive(Debug, Clone, Serialize)]
pub struct RiskEvent {
    pub market_id: String,
    pub side: Side,
    pub size: Decimal,
    pub reason: String,
}

impl RiskEvent {
    /// Create a new risk event from a signal and rejection reason.
    #[must_use]
    pub fn new(signal: &Signal, reason: RejectReason) -> Self {
        Self {
            market_id: signal.market_id.to_string(),
            side: signal.side,
            size: signal.size,
            reason: reason.as_str().to_string(),
        }
    }
}

/// Fill event.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionEvent {
    pub market_id: String,
    pub order_id: String,
    pub side: Side,
    pub quantity: Decimal,
    pub price: Decimal,
    pub closing: bool,
}

impl From<&Fill> for ExecutionEvent {
    fn from(fill: &Fill) -> Self {
        Self {
            market_id: fill.market_id.to_string(),
            order_id: fill.order_id.to_string(),
            side: fill.side,
            quantity: fill.quantity,
            price: fill.price,
            closing: matches!(fill.intent, SignalIntent::Close { .. }),
        }
    }
}

/// Execution failure event.
#[derive(Debug, Clone, Serialize)]
pub struct FailureEvent {
    pub market_id: String,
    pub side: Side,
    pub size: Decimal,
    pub reason: String,
}

/// Protective exit completion event.
#[derive(Debug, Clone, Serialize)]
pub struct CloseEvent {
    pub market_id: String,
    pub position_id: String,
    pub reason: ExitReason,
    pub realized_pnl: Decimal,
}

/// Trait for notification handlers.
///
/// # Implementation Notes
///
/// - Implementations must be thread-safe (`Send + Sync`)
/// - `notify` must return quickly; slow delivery belongs on a spawned task
pub trait Notifier: Send + Sync {
    /// Handle an event.
    fn notify(&self, event: Event);
}

/// Registry of notifiers (composite pattern).
///
/// Broadcasts events to all registered notifiers.
pub struct NotifierRegistry {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl NotifierRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { notifiers: vec![] }
    }

    /// Register a notifier.
    pub fn register(&mut self, notifier: Box<dyn Notifier>) {
        self.notifiers.push(notifier);
    }

    /// Notify all registered notifiers.
    pub fn notify_all(&self, event: Event) {
        for notifier in &self.notifiers {
            notifier.notify(event.clone());
        }
    }

    /// Number of registered notifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    /// Check if registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

impl Default for NotifierRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A no-op notifier for when alerts are disabled.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _event: Event) {}
}

/// A logging notifier that logs events via tracing.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: Event) {
        use tracing::{debug, info, warn};
        match event {
            Event::AnomalyDetected(e) => {
                info!(
                    market_id = %e.market_id,
                    metric = %e.metric,
                    z_score = e.z_score,
                    severity = %e.severity,
                    "Anomaly detected"
                );
            }
            Event::SignalApproved(e) => {
                info!(
                    market_id = %e.market_id,
                    side = %e.side,
                    size = %e.size,
                    requested = %e.requested_size,
                    price = %e.limit_price,
                    closing = e.closing,
                    "Signal approved"
                );
            }
            Event::SignalRejected(e) => {
                info!(market_id = %e.market_id, reason = %e.reason, "Signal rejected");
            }
            Event::OrderFilled(e) => {
                info!(
                    market_id = %e.market_id,
                    order_id = %e.order_id,
                    side = %e.side,
                    quantity = %e.quantity,
                    price = %e.price,
                    "Order filled"
                );
            }
            Event::ExecutionFailed(e) => {
                warn!(market_id = %e.market_id, reason = %e.reason, "Execution failed");
            }
            Event::PositionClosed(e) => {
                info!(
                    market_id = %e.market_id,
                    position_id = %e.position_id,
                    reason = %e.reason,
                    pnl = %e.realized_pnl,
                    "Position closed"
                );
            }
            Event::FeedRejected { market_id, reason } => {
                debug!(market_id = %market_id, reason = %reason, "Snapshot dropped");
            }
            Event::DailyReset { date, realized_pnl } => {
                info!(date = %date, pnl = %realized_pnl, "Daily loss counters reset");
            }
            Event::Startup { markets, mode } => {
                info!(markets, mode = %mode, "Engine started");
            }
        }
    }
}
