//! End-to-end flows through aggregation, detection, strategy, gating,
//! signing, execution and the position ledger.

mod harness;

use std::sync::Arc;
use std::time::Duration;

use fadebot::application::orchestration::engine::dispatch;
use fadebot::application::orchestration::TickOutcome;
use fadebot::application::state::RiskLimits;
use fadebot::domain::{AnomalyMetric, ExitReason, MarketId, Severity, Side, SignalIntent};
use fadebot::port::inbound::risk::{RejectReason, RiskDecision};
use fadebot::port::outbound::notifier::Event;
use fadebot::testkit::domain::{at, baseline, market, signal, snapshot};
use fadebot::testkit::feed::ScriptedFeed;
use harness::rig::{fast_engine_settings, Rig};
use rust_decimal_macros::dec;
use tokio::sync::{mpsc, watch};

/// Ten calm samples, then volume at five times the baseline mean with
/// trade churn unchanged and the mid up two cents.
fn spike_series(market_id: &str) -> Vec<fadebot::domain::Snapshot> {
    let mut series = baseline(market_id, 10);
    series.push(snapshot(market_id, at(50), dec!(500), 10, dec!(0.52)));
    series
}

#[tokio::test]
async fn volume_spike_is_faded_at_default_size() {
    let rig = Rig::new(RiskLimits::default());
    let engine = rig.engine(fast_engine_settings());
    let mut pipeline = engine.pipeline(market("M1"));

    let mut outcomes: Vec<TickOutcome> = spike_series("M1")
        .iter()
        .map(|s| pipeline.on_snapshot(s))
        .collect();

    let last = outcomes.pop().unwrap();
    assert!(outcomes.iter().all(|o| matches!(o, TickOutcome::Quiet)));

    let event = last.anomaly().cloned().expect("spike should fire");
    assert_eq!(event.metric, AnomalyMetric::Volume);
    assert!(event.churn_z.map_or(true, |z| z < 3.0));
    assert!(event.price_move > dec!(0));

    let approval = last.approval().expect("signal should be approved");
    assert_eq!(approval.signal.side, Side::Sell);
    assert_eq!(approval.signal.size, RiskLimits::default().order_size_default);
    assert_eq!(rig.notifier.count("ANOMALY"), 1);

    let fill = rig.submitter.execute(approval).await.unwrap();
    assert_eq!(fill.side, Side::Sell);

    let position = rig.state.position(&MarketId::from("M1")).unwrap();
    assert_eq!(position.quantity(), dec!(10));
    assert_eq!(position.side(), Side::Sell);
    assert_eq!(rig.state.reservation_count(), 0);
    assert_eq!(rig.venue.orders().len(), 1);
}

#[tokio::test]
async fn spike_over_a_perfectly_flat_baseline_fires() {
    let rig = Rig::new(RiskLimits::default());
    let engine = rig.engine(fast_engine_settings());
    let mut pipeline = engine.pipeline(market("M1"));

    let calm: Vec<TickOutcome> = (0..10)
        .map(|i| pipeline.on_snapshot(&snapshot("M1", at(i * 5), dec!(100), 10, dec!(0.50))))
        .collect();
    assert!(calm.iter().all(|o| matches!(o, TickOutcome::Quiet)));

    let spike = pipeline.on_snapshot(&snapshot("M1", at(50), dec!(500), 10, dec!(0.52)));

    let event = spike.anomaly().expect("flat baseline spike should fire");
    assert_eq!(event.metric, AnomalyMetric::Volume);
    assert_eq!(event.volume_z, Some(f64::INFINITY));
    assert_eq!(event.churn_z, Some(0.0));
    assert_eq!(event.severity, Severity::Extreme);
    assert_eq!(spike.approval().expect("signal should be approved").signal.side, Side::Sell);
}

#[tokio::test]
async fn thin_book_spike_is_detected_but_not_faded() {
    let rig = Rig::new(RiskLimits::default());
    let engine = rig.engine(fast_engine_settings());
    let mut pipeline = engine.pipeline(market("M1"));

    for i in 0..10 {
        pipeline.on_snapshot(&snapshot("M1", at(i * 5), dec!(1), 1, dec!(0.50)));
    }
    // ten cents on fifteen shares traded
    let spike = pipeline.on_snapshot(&snapshot("M1", at(50), dec!(5), 1, dec!(0.60)));

    assert!(matches!(spike, TickOutcome::NoSignal(_)));
    let event = spike.anomaly().unwrap();
    assert!(event.impact_per_volume > 0.002);
    assert_eq!(rig.notifier.count("ANOMALY"), 1);
    assert!(rig.venue.orders().is_empty());
}

#[tokio::test]
async fn second_spike_inside_cooldown_is_suppressed() {
    let rig = Rig::new(RiskLimits::default());
    let engine = rig.engine(fast_engine_settings());
    let mut pipeline = engine.pipeline(market("M1"));

    for s in spike_series("M1") {
        pipeline.on_snapshot(&s);
    }
    let again = pipeline.on_snapshot(&snapshot("M1", at(55), dec!(900), 10, dec!(0.53)));

    assert!(again.anomaly().is_none());
    assert_eq!(rig.notifier.count("ANOMALY"), 1);
}

#[tokio::test]
async fn malformed_snapshot_is_dropped_without_disturbing_the_window() {
    let rig = Rig::new(RiskLimits::default());
    let engine = rig.engine(fast_engine_settings());
    let mut pipeline = engine.pipeline(market("M1"));

    let mut series = spike_series("M1");
    let spike = series.pop().unwrap();
    for s in &series {
        pipeline.on_snapshot(s);
    }

    let mut crossed = snapshot("M1", at(48), dec!(100), 10, dec!(0.50));
    crossed.best_bid = dec!(0.60);
    assert!(matches!(pipeline.on_snapshot(&crossed), TickOutcome::Dropped(_)));
    assert_eq!(rig.notifier.count("FEED"), 1);

    // The window is intact, so the spike still fires against the same baseline.
    assert!(pipeline.on_snapshot(&spike).anomaly().is_some());
}

#[tokio::test]
async fn same_direction_signal_at_market_cap_is_rejected() {
    let rig = Rig::new(RiskLimits {
        max_position_per_market: dec!(10),
        ..RiskLimits::default()
    });

    let first = rig.context.gatekeeper.check(signal("M1", Side::Buy, dec!(10), dec!(0.40)));
    let RiskDecision::Approved(approval) = first else {
        panic!("first entry should be approved");
    };
    rig.submitter.execute(approval).await.unwrap();
    let orders_before = rig.venue.calls();

    let decision = rig.context.gatekeeper.check(signal("M1", Side::Buy, dec!(5), dec!(0.40)));

    assert_eq!(decision.rejection_reason(), Some(RejectReason::PositionCap));
    assert_eq!(rig.venue.calls(), orders_before);
    assert_eq!(
        rig.state.position(&MarketId::from("M1")).unwrap().quantity(),
        dec!(10)
    );
}

#[tokio::test]
async fn stop_loss_exit_bypasses_active_kill_switch() {
    let rig = Rig::new(RiskLimits::default());
    let RiskDecision::Approved(approval) =
        rig.context.gatekeeper.check(signal("M1", Side::Sell, dec!(10), dec!(0.50)))
    else {
        panic!("entry should be approved");
    };
    rig.submitter.execute(approval).await.unwrap();

    rig.kill_switch.activate();
    // 0.50 -> 0.52 is 400 bps against a short; the stop is 25 bps.
    rig.state.mark_to_market(&MarketId::from("M1"), dec!(0.52));

    let engine = rig.engine(fast_engine_settings());
    let approvals = engine.exit_monitor().tick(chrono::Utc::now());
    assert_eq!(approvals.len(), 1);
    let exit = approvals.into_iter().next().unwrap();
    assert_eq!(exit.signal.side, Side::Buy);
    assert!(matches!(
        exit.signal.intent,
        SignalIntent::Close {
            reason: ExitReason::StopLoss,
            ..
        }
    ));

    let fill = rig.submitter.execute(exit).await.unwrap();
    assert_eq!(fill.quantity, dec!(10));
    assert!(rig.state.position(&MarketId::from("M1")).is_none());

    let closed = rig.state.closed_positions();
    assert_eq!(closed.len(), 1);
    assert_eq!(closed[0].exit_reason(), Some(ExitReason::StopLoss));
    assert_eq!(rig.state.daily_realized_pnl(), dec!(-0.20));
    assert!(rig
        .notifier
        .events()
        .iter()
        .any(|e| matches!(e, Event::PositionClosed(c) if c.reason == ExitReason::StopLoss)));
}

#[tokio::test]
async fn kill_switch_blocks_every_entry_order() {
    let rig = Rig::new(RiskLimits::default());
    let engine = rig.engine(fast_engine_settings());
    let mut pipeline = engine.pipeline(market("M1"));
    rig.kill_switch.activate();

    let outcomes: Vec<TickOutcome> = spike_series("M1")
        .iter()
        .map(|s| pipeline.on_snapshot(s))
        .collect();

    // Upstream still detects and proposes; the gatekeeper refuses.
    assert!(matches!(outcomes.last(), Some(TickOutcome::Rejected(_))));
    assert_eq!(rig.venue.calls(), 0);
    assert_eq!(rig.notifier.count("RISK"), 1);
}

#[tokio::test]
async fn kill_switch_raised_after_approval_stops_submission() {
    let rig = Rig::new(RiskLimits::default());
    let RiskDecision::Approved(approval) =
        rig.context.gatekeeper.check(signal("M1", Side::Buy, dec!(10), dec!(0.40)))
    else {
        panic!("entry should be approved");
    };
    assert_eq!(rig.state.reservation_count(), 1);

    rig.kill_switch.activate();
    let err = rig.submitter.execute(approval).await.unwrap_err();

    assert_eq!(err, fadebot::error::ExecutionFailure::Halted);
    assert_eq!(rig.venue.calls(), 0);
    assert_eq!(rig.state.reservation_count(), 0);
    assert_eq!(rig.notifier.count("EXEC_FAIL"), 1);
}

#[tokio::test]
async fn daily_loss_halts_entries_but_not_exits() {
    let rig = Rig::new(RiskLimits {
        max_daily_loss: dec!(5),
        ..RiskLimits::default()
    });
    for id in ["M1", "M2"] {
        let RiskDecision::Approved(approval) =
            rig.context.gatekeeper.check(signal(id, Side::Buy, dec!(100), dec!(0.50)))
        else {
            panic!("entry should be approved");
        };
        rig.submitter.execute(approval).await.unwrap();
    }

    // M1 drops 12%: a 6.00 loss when closed.
    rig.state.mark_to_market(&MarketId::from("M1"), dec!(0.44));
    let monitor = rig.engine(fast_engine_settings()).exit_monitor();
    let now = chrono::Utc::now();
    for exit in monitor.tick(now) {
        rig.submitter.execute(exit).await.unwrap();
    }
    assert_eq!(rig.state.daily_realized_pnl(), dec!(-6.00));

    let entry = rig.context.gatekeeper.check(signal("M3", Side::Buy, dec!(1), dec!(0.50)));
    assert_eq!(entry.rejection_reason(), Some(RejectReason::DailyLossLimit));

    // M2's exit is still allowed through.
    rig.state.mark_to_market(&MarketId::from("M2"), dec!(0.49));
    let exits = monitor.tick(now);
    assert_eq!(exits.len(), 1);
    rig.submitter.execute(exits.into_iter().next().unwrap()).await.unwrap();
    assert!(rig.state.open_positions().is_empty());

    rig.state.reset_daily(now);
    let after_reset = rig.context.gatekeeper.check(signal("M3", Side::Buy, dec!(1), dec!(0.50)));
    assert!(after_reset.is_approved());
}

#[tokio::test]
async fn dispatch_drains_queued_approvals_before_returning() {
    let rig = Rig::new(RiskLimits::default());
    let (tx, rx) = mpsc::unbounded_channel();
    for id in ["M1", "M2", "M3"] {
        if let RiskDecision::Approved(approval) =
            rig.context.gatekeeper.check(signal(id, Side::Buy, dec!(5), dec!(0.30)))
        {
            tx.send(approval).unwrap();
        }
    }
    drop(tx);

    dispatch(Arc::clone(&rig.submitter), rx).await;

    assert_eq!(rig.venue.calls(), 3);
    assert_eq!(rig.state.open_positions().len(), 3);
    assert_eq!(rig.state.reservation_count(), 0);
}

#[tokio::test]
async fn engine_trades_a_spike_and_shuts_down_cleanly() {
    let rig = Rig::new(RiskLimits::default());
    let engine = rig.engine(fast_engine_settings());
    let feed = Arc::new(ScriptedFeed::new(vec![market("M1")]));
    feed.push_snapshots(spike_series("M1"));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let notifier = rig.notifier.clone();
    let watcher = tokio::spawn(async move {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while notifier.count("FILL") == 0 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        let _ = shutdown_tx.send(true);
    });

    tokio::time::timeout(
        Duration::from_secs(10),
        engine.run(feed.clone(), vec![market("M1")], shutdown_rx),
    )
    .await
    .expect("engine should stop after shutdown");
    watcher.await.unwrap();

    assert!(rig.submitter.is_closed());
    assert_eq!(feed.remaining(&MarketId::from("M1")), 0);
    let tags = rig.notifier.tags();
    assert_eq!(tags.first(), Some(&"HEALTH"));
    assert_eq!(rig.notifier.count("ANOMALY"), 1);
    assert_eq!(rig.notifier.count("FILL"), 1);
    assert_eq!(rig.venue.orders()[0].order().side, Side::Sell);
    assert_eq!(rig.state.reservation_count(), 0);
}

#[tokio::test]
async fn approvals_after_shutdown_are_refused() {
    let rig = Rig::new(RiskLimits::default());
    let RiskDecision::Approved(approval) =
        rig.context.gatekeeper.check(signal("M1", Side::Buy, dec!(10), dec!(0.40)))
    else {
        panic!("entry should be approved");
    };

    rig.submitter.close();
    let err = rig.submitter.execute(approval).await.unwrap_err();

    assert_eq!(err, fadebot::error::ExecutionFailure::ShuttingDown);
    assert_eq!(rig.venue.calls(), 0);
    assert_eq!(rig.state.reservation_count(), 0);
}
