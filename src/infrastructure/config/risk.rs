//! Risk limits and order sizing configuration.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::application::state::{RiskLimits, SizingMode};

/// Hard risk limits enforced by the gatekeeper.
#[derive(Debug, Clone, Deserialize)]
pub struct RiskConfig {
    /// Maximum open quantity per market, in shares.
    #[serde(default = "default_max_position_per_market")]
    pub max_position_per_market: Decimal,
    /// Maximum entry notional across all positions.
    #[serde(default = "default_max_global_exposure")]
    pub max_global_exposure: Decimal,
    /// Realized loss for the UTC day that halts new exposure.
    #[serde(default = "default_max_daily_loss")]
    pub max_daily_loss: Decimal,
    #[serde(default = "default_max_orders_per_minute")]
    pub max_orders_per_minute: u32,
}

fn default_max_position_per_market() -> Decimal {
    Decimal::from(100)
}

fn default_max_global_exposure() -> Decimal {
    Decimal::from(500)
}

fn default_max_daily_loss() -> Decimal {
    Decimal::from(50)
}

const fn default_max_orders_per_minute() -> u32 {
    20
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_position_per_market: default_max_position_per_market(),
            max_global_exposure: default_max_global_exposure(),
            max_daily_loss: default_max_daily_loss(),
            max_orders_per_minute: default_max_orders_per_minute(),
        }
    }
}

/// How entry orders are sized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizingKind {
    #[default]
    Fixed,
    Percent,
}

/// Order sizing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SizingConfig {
    #[serde(default)]
    pub mode: SizingKind,
    /// Shares per entry in fixed mode.
    #[serde(default = "default_order_size")]
    pub order_size_default: Decimal,
    /// Fraction of the balance per entry in percent mode, e.g. `0.05`.
    #[serde(default)]
    pub percent_of_balance: Option<Decimal>,
    /// Balance figure used by percent mode. Required when percent mode is on.
    #[serde(default)]
    pub balance_override: Option<Decimal>,
}

fn default_order_size() -> Decimal {
    Decimal::from(10)
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            mode: SizingKind::Fixed,
            order_size_default: default_order_size(),
            percent_of_balance: None,
            balance_override: None,
        }
    }
}

impl SizingConfig {
    /// Resolve to a sizing mode. Callers validate first; incomplete percent
    /// settings fall back to fixed sizing here.
    #[must_use]
    pub fn mode(&self) -> SizingMode {
        match (self.mode, self.percent_of_balance, self.balance_override) {
            (SizingKind::Percent, Some(fraction), Some(balance)) => {
                SizingMode::PercentOfBalance { fraction, balance }
            }
            _ => SizingMode::Fixed,
        }
    }
}

/// Combine both sections into the limits held by the shared state.
#[must_use]
pub fn risk_limits(risk: &RiskConfig, sizing: &SizingConfig) -> RiskLimits {
    RiskLimits {
        max_position_per_market: risk.max_position_per_market,
        max_global_exposure: risk.max_global_exposure,
        max_daily_loss: risk.max_daily_loss,
        max_orders_per_minute: risk.max_orders_per_minute,
        order_size_default: sizing.order_size_default,
        sizing: sizing.mode(),
    }
}
