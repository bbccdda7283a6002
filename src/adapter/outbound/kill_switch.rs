//! Kill switch sources.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::warn;

use crate::port::outbound::kill_switch::KillSwitch;

/// Active while a sentinel file exists.
///
/// The filesystem is checked on every call.
#[derive(Debug, Clone)]
pub struct FileKillSwitch {
    path: PathBuf,
}

impl FileKillSwitch {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KillSwitch for FileKillSwitch {
    fn is_active(&self) -> bool {
        match self.path.try_exists() {
            Ok(exists) => exists,
            Err(err) => {
                // Unknown state halts entries.
                warn!(path = %self.path.display(), error = %err, "Kill switch unreadable");
                true
            }
        }
    }

    fn describe(&self) -> String {
        format!("sentinel file {}", self.path.display())
    }
}

/// In-process flag for operator control and tests.
#[derive(Debug, Default)]
pub struct ManualKillSwitch {
    active: AtomicBool,
}

impl ManualKillSwitch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn activate(&self) {
        self.active.store(true, Ordering::SeqCst);
    }

    pub fn deactivate(&self) {
        self.active.store(false, Ordering::SeqCst);
    }
}

impl KillSwitch for ManualKillSwitch {
    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn describe(&self) -> String {
        "manual flag".to_string()
    }
}
