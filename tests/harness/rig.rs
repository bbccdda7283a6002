//! A fully wired pipeline over test doubles.

use std::sync::Arc;
use std::time::Duration;

use fadebot::adapter::outbound::kill_switch::ManualKillSwitch;
use fadebot::application::aggregator::AggregatorSettings;
use fadebot::application::detector::DetectorSettings;
use fadebot::application::execution::{ExecutionSubmitter, RetryPolicy};
use fadebot::application::orchestration::{Engine, EngineSettings, PipelineContext};
use fadebot::application::risk::RiskGatekeeper;
use fadebot::application::state::{AppState, RiskLimits};
use fadebot::application::strategy::{FadeStrategy, StrategySettings};
use fadebot::port::outbound::notifier::NotifierRegistry;
use fadebot::port::outbound::signer::OrderSigner;
use fadebot::testkit::notifier::RecordingNotifier;
use fadebot::testkit::signer::StaticSigner;
use fadebot::testkit::venue::ScriptedVenue;

/// Retry policy with millisecond backoff so failure paths finish quickly.
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(5),
        jitter: 0.0,
        deadline: Duration::from_secs(2),
    }
}

/// Engine timings scaled down for tests.
pub fn fast_engine_settings() -> EngineSettings {
    EngineSettings {
        poll_interval: Duration::from_millis(5),
        exit_scan_interval: Duration::from_millis(5),
        drain_timeout: Duration::from_secs(2),
        aggregator: AggregatorSettings::default(),
        detector: DetectorSettings::default(),
        mode: "simulation".to_string(),
    }
}

pub struct Rig {
    pub state: Arc<AppState>,
    pub kill_switch: Arc<ManualKillSwitch>,
    pub venue: Arc<ScriptedVenue>,
    pub notifier: RecordingNotifier,
    pub context: PipelineContext,
    pub submitter: Arc<ExecutionSubmitter>,
}

impl Rig {
    pub fn new(limits: RiskLimits) -> Self {
        Self::with_parts(limits, ScriptedVenue::new(), Arc::new(StaticSigner::new()), fast_retry())
    }

    pub fn with_venue(limits: RiskLimits, venue: ScriptedVenue) -> Self {
        Self::with_parts(limits, venue, Arc::new(StaticSigner::new()), fast_retry())
    }

    pub fn with_parts(
        limits: RiskLimits,
        venue: ScriptedVenue,
        signer: Arc<dyn OrderSigner>,
        retry: RetryPolicy,
    ) -> Self {
        let state = Arc::new(AppState::new(limits));
        let kill_switch = Arc::new(ManualKillSwitch::new());
        let venue = Arc::new(venue);

        let notifier = RecordingNotifier::new();
        let mut registry = NotifierRegistry::new();
        registry.register(Box::new(notifier.clone()));
        let notifiers = Arc::new(registry);

        let context = PipelineContext {
            state: Arc::clone(&state),
            strategy: Arc::new(FadeStrategy::new(StrategySettings::default())),
            gatekeeper: Arc::new(RiskGatekeeper::new(
                Arc::clone(&state),
                kill_switch.clone(),
            )),
            notifiers: Arc::clone(&notifiers),
        };
        let submitter = Arc::new(ExecutionSubmitter::new(
            Arc::clone(&state),
            signer,
            venue.clone(),
            kill_switch.clone(),
            notifiers,
            retry,
        ));

        Self {
            state,
            kill_switch,
            venue,
            notifier,
            context,
            submitter,
        }
    }

    pub fn engine(&self, settings: EngineSettings) -> Engine {
        Engine::new(settings, self.context.clone(), Arc::clone(&self.submitter))
    }
}
