//! Shared handles passed to every pipeline task.

use std::sync::Arc;

use crate::application::risk::RiskGatekeeper;
use crate::application::state::AppState;
use crate::application::strategy::FadeStrategy;
use crate::port::outbound::notifier::NotifierRegistry;

/// Cross-market collaborators of the per-market pipelines.
///
/// Cheap to clone; every field is reference counted.
#[derive(Clone)]
pub struct PipelineContext {
    pub state: Arc<AppState>,
    pub strategy: Arc<FadeStrategy>,
    pub gatekeeper: Arc<RiskGatekeeper>,
    pub notifiers: Arc<NotifierRegistry>,
}
