//! Notifier that records events for later assertions.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::port::outbound::notifier::{Event, Notifier};

/// Keeps every event it is handed. Clones share the same record.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// Tags of the recorded events, in order.
    pub fn tags(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(Event::tag).collect()
    }

    /// How many recorded events carry `tag`.
    pub fn count(&self, tag: &str) -> usize {
        self.events.lock().iter().filter(|e| e.tag() == tag).count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, event: Event) {
        self.events.lock().push(event);
    }
}
