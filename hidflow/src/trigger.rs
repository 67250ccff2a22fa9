//! Boot-time re-selection trigger.

use std::fs;
use std::path::PathBuf;

use tracing::debug;

/// A single digital input sampled once at boot; asserted means "prompt
/// for a new workflow selection this boot".
pub trait Trigger: Send + Sync {
    fn is_asserted(&self) -> bool;
}

/// Active-low GPIO line read through a sysfs value file. An unreadable
/// line is treated as deasserted so a missing pin never blocks the boot
/// on a prompt.
pub struct GpioTrigger {
    value_path: PathBuf,
}

impl GpioTrigger {
    pub fn new(value_path: impl Into<PathBuf>) -> Self {
        Self {
            value_path: value_path.into(),
        }
    }
}

impl Trigger for GpioTrigger {
    fn is_asserted(&self) -> bool {
        match fs::read_to_string(&self.value_path) {
            Ok(contents) => contents.trim() == "0",
            Err(e) => {
                debug!(path = %self.value_path.display(), error = %e, "trigger read failed, treating as deasserted");
                false
            }
        }
    }
}

/// Fixed trigger for tests and for headless deployments that never
/// re-prompt.
pub struct FixedTrigger(pub bool);

impl Trigger for FixedTrigger {
    fn is_asserted(&self) -> bool {
        self.0
    }
}
