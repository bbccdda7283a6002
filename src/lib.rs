//! Fadebot - anomaly fading on prediction markets.
//!
//! Polls market snapshots, flags abnormal volume or trade churn against a
//! rolling baseline, and takes the contrarian side of the accompanying price
//! move under hard risk limits. Every order is signed before it leaves the
//! process and every open position carries take-profit, stop-loss and
//! time-stop exits.
//!
//! # Architecture
//!
//! Snapshots flow through one pipeline per market:
//!
//! ```text
//! feed -> aggregator -> detector -> fade strategy -> risk gatekeeper
//!      -> signer -> execution submitter -> venue -> position ledger
//! ```
//!
//! The protective-exit monitor scans the ledger on its own cadence and
//! feeds closing signals through the same gatekeeper and execution path.
//!
//! # Modules
//!
//! - [`domain`] - Snapshots, statistics, anomalies, signals, orders, positions
//! - [`port`] - Trait seams: feed, signer, venue, kill switch, notifier
//! - [`application`] - Aggregation, detection, strategy, risk, execution, engine
//! - [`adapter`] - REST feed and venue, signers, webhook alerts, CLI
//! - [`infrastructure`] - Configuration, bootstrap and the run loop
//! - [`error`] - Error types for the crate
//!
//! # Example
//!
//! ```no_run
//! use fadebot::infrastructure::config::Config;
//!
//! let config = Config::load("config.toml").expect("valid config");
//! println!("trading mode: {}", config.trading_mode);
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
