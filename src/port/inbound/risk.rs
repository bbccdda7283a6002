//! Risk decision types for signal gating.
//!
//! A rejection is a normal outcome, not an error; it is logged and alerted
//! at informational severity.

use std::fmt;

use crate::domain::{ReservationId, Signal, Volume};

/// Why the gatekeeper refused a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Kill switch active.
    Halted,
    /// The signal was already approved once.
    Duplicate,
    /// Cumulative daily loss reached the configured maximum.
    DailyLossLimit,
    /// No headroom left under the per-market cap.
    PositionCap,
    /// No headroom left under the global exposure cap.
    ExposureCap,
    /// Order-rate limit for the current minute reached.
    RateLimited,
    /// Closing signal for a position that is not open.
    NoPosition,
}

impl RejectReason {
    /// Stable reason string used in logs and alerts.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Halted => "halted",
            Self::Duplicate => "duplicate",
            Self::DailyLossLimit => "daily-loss-limit",
            Self::PositionCap => "position-cap",
            Self::ExposureCap => "exposure-cap",
            Self::RateLimited => "rate-limited",
            Self::NoPosition => "no-position",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An approved, possibly shrunk, signal.
///
/// Holding an `Approval` means exposure has been reserved in the ledger; the
/// reservation must be committed on fill or released on failure.
#[derive(Debug, Clone, PartialEq)]
pub struct Approval {
    pub signal: Signal,
    /// Size the signal asked for before any resize.
    pub requested_size: Volume,
    /// Reservation backing an exposure-increasing signal.
    pub reservation: Option<ReservationId>,
}

impl Approval {
    /// True when the gatekeeper shrank the signal.
    #[must_use]
    pub fn was_resized(&self) -> bool {
        self.signal.size != self.requested_size
    }
}

/// Result of a risk check for a candidate signal.
#[derive(Debug, Clone, PartialEq)]
pub enum RiskDecision {
    /// Signal may proceed, possibly with a smaller size.
    Approved(Approval),
    /// Signal is refused.
    Rejected { signal: Signal, reason: RejectReason },
}

impl RiskDecision {
    /// Return `true` if the signal is approved.
    #[must_use]
    pub const fn is_approved(&self) -> bool {
        matches!(self, Self::Approved(_))
    }

    /// Return the rejection reason, if rejected.
    #[must_use]
    pub const fn rejection_reason(&self) -> Option<RejectReason> {
        match self {
            Self::Rejected { reason, .. } => Some(*reason),
            Self::Approved(_) => None,
        }
    }

    /// Return the approval, if approved.
    #[must_use]
    pub const fn approval(&self) -> Option<&Approval> {
        match self {
            Self::Approved(approval) => Some(approval),
            Self::Rejected { .. } => None,
        }
    }
}
