//! Device configuration.
//!
//! Everything the workflows type at the host is tunable here; defaults
//! reproduce the command lines and timings the device shipped with.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::query::QueryConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub query: QueryConfig,
    pub apps: AppLaunchConfig,
    pub dual_boot: DualBootConfig,
    pub programming: ProgrammingConfig,
    pub sys_admin: SysAdminConfig,
}

/// Timings around the host's application menu.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppLaunchConfig {
    /// Settle after tapping the menu key, before typing the name.
    pub menu_settle_ms: u64,
    /// Settle between launching two applications back to back.
    pub launch_settle_ms: u64,
}

impl Default for AppLaunchConfig {
    fn default() -> Self {
        Self {
            menu_settle_ms: 100,
            launch_settle_ms: 500,
        }
    }
}

impl AppLaunchConfig {
    pub fn menu_settle(&self) -> Duration {
        Duration::from_millis(self.menu_settle_ms)
    }

    pub fn launch_settle(&self) -> Duration {
        Duration::from_millis(self.launch_settle_ms)
    }
}

/// Host commands for the dual-boot toggle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DualBootConfig {
    /// Typed into the Win+R dialog when Windows is the running OS.
    pub windows_restart_command: String,
    /// Settle after Win+R before the dialog accepts input.
    pub run_dialog_settle_ms: u64,
    /// EFI boot entry selected before rebooting out of Linux.
    pub windows_boot_entry: String,
}

impl Default for DualBootConfig {
    fn default() -> Self {
        Self {
            windows_restart_command: "shutdown /r /t 0".to_string(),
            run_dialog_settle_ms: 300,
            windows_boot_entry: "0000".to_string(),
        }
    }
}

impl DualBootConfig {
    pub fn run_dialog_settle(&self) -> Duration {
        Duration::from_millis(self.run_dialog_settle_ms)
    }
}

/// The programming workflow's git sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgrammingConfig {
    /// Directory holding the checkouts to sweep.
    pub repos_dir: String,
    /// Status command run inside that directory.
    pub status_command: String,
}

impl Default for ProgrammingConfig {
    fn default() -> Self {
        Self {
            repos_dir: "./Documents/GitHub".to_string(),
            status_command: "mgitstatus".to_string(),
        }
    }
}

/// The sys-admin workflow's backup kick-off.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SysAdminConfig {
    /// Command typed into a terminal to start the backup run; when
    /// absent the workflow logs and does nothing.
    pub backup_command: Option<String>,
}
