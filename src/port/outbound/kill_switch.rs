//! Kill switch port.

/// Externally controlled halt signal.
///
/// Implementations must read their source on every call; callers never
/// cache the answer across signals.
pub trait KillSwitch: Send + Sync {
    /// True while new exposure-increasing trading is halted.
    fn is_active(&self) -> bool;

    /// Human-readable description of the source, for logs.
    fn describe(&self) -> String;
}
