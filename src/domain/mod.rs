//! Exchange-agnostic domain types.
//!
//! Everything here is plain data plus pure helpers; no I/O and no shared
//! state. The pipeline's stages pass these values downstream.

pub mod anomaly;
pub mod id;
pub mod market;
pub mod money;
pub mod order;
pub mod position;
pub mod signal;
pub mod snapshot;
pub mod stats;

pub use anomaly::{AnomalyEvent, AnomalyMetric, Severity};
pub use id::{EventId, MarketId, OrderId, PositionId, ReservationId, SignalId};
pub use market::Market;
pub use money::{Price, Volume};
pub use order::{Fill, OrderRequest, OrderSignature, OrderType, SignedOrder};
pub use position::{Position, PositionStatus};
pub use signal::{ExitReason, ProtectiveParams, Side, Signal, SignalIntent};
pub use snapshot::Snapshot;
pub use stats::{MetricStats, RollingStats};
