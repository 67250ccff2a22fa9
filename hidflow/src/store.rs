//! Durable key-value state.
//!
//! Values are fixed-size 4-byte little-endian integers, one file per key
//! under the mount directory. A key that was never written reads as 0,
//! so first-boot behavior is deterministic. Writes go through a temp
//! file and an atomic rename; a crash mid-write leaves the previous
//! value intact.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, instrument, warn};

use crate::errors::DeviceError;

/// Key for the persisted workflow selection.
pub const WORKFLOW_ID_KEY: &str = "workflowId";
/// Key for the dual-boot order bit.
pub const BOOT_ORDER_KEY: &str = "bootOrder";

pub trait StateStore: Send + Sync {
    /// Reads a value; a missing or wrong-size entry yields 0.
    fn get_u32(&self, key: &str) -> Result<u32, DeviceError>;

    /// Writes a value atomically.
    fn set_u32(&self, key: &str, value: u32) -> Result<(), DeviceError>;
}

/// Directory-backed store.
pub struct FlashStore {
    root: PathBuf,
}

impl FlashStore {
    /// Mounts the store, reformatting once on failure.
    ///
    /// The reformat is destructive: all persisted state is lost and
    /// every key reverts to its default. A mount that fails even after
    /// the reformat is fatal for persistence; callers degrade to an
    /// [`EphemeralStore`] for the rest of the boot.
    #[instrument]
    pub fn mount(root: impl Into<PathBuf> + std::fmt::Debug) -> Result<Self, DeviceError> {
        let root = root.into();
        if let Err(first) = Self::prepare(&root) {
            warn!(root = %root.display(), error = %first, "store mount failed, reformatting");
            Self::reformat(&root).map_err(|e| {
                DeviceError::MountFailed(format!("reformat of {} failed: {e}", root.display()))
            })?;
            Self::prepare(&root).map_err(|e| {
                DeviceError::MountFailed(format!(
                    "remount of {} failed after reformat: {e}",
                    root.display()
                ))
            })?;
        }
        debug!(root = %root.display(), "store mounted");
        Ok(Self { root })
    }

    fn prepare(root: &Path) -> io::Result<()> {
        fs::create_dir_all(root)?;
        // probe writability; a read-only or corrupt mount fails here
        let probe = tempfile::NamedTempFile::new_in(root)?;
        probe.close()
    }

    fn reformat(root: &Path) -> io::Result<()> {
        if root.is_dir() {
            fs::remove_dir_all(root)?;
        } else if root.exists() {
            fs::remove_file(root)?;
        }
        fs::create_dir_all(root)
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

impl StateStore for FlashStore {
    fn get_u32(&self, key: &str) -> Result<u32, DeviceError> {
        match fs::read(self.key_path(key)) {
            Ok(bytes) => match <[u8; 4]>::try_from(bytes.as_slice()) {
                Ok(raw) => Ok(u32::from_le_bytes(raw)),
                Err(_) => {
                    warn!(key, len = bytes.len(), "stored value has wrong size, treating as unset");
                    Ok(0)
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(DeviceError::StorageUnavailable(format!(
                "read of {key:?} failed: {e}"
            ))),
        }
    }

    fn set_u32(&self, key: &str, value: u32) -> Result<(), DeviceError> {
        let mut tmp = tempfile::NamedTempFile::new_in(&self.root).map_err(|e| {
            DeviceError::StorageUnavailable(format!("temp file for {key:?} failed: {e}"))
        })?;
        tmp.write_all(&value.to_le_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| {
                DeviceError::StorageUnavailable(format!("write of {key:?} failed: {e}"))
            })?;
        tmp.persist(self.key_path(key)).map_err(|e| {
            DeviceError::StorageUnavailable(format!("rename into {key:?} failed: {e}"))
        })?;
        debug!(key, value, "persisted");
        Ok(())
    }
}

/// In-memory store for the degraded boot after a failed mount, and for
/// tests.
#[derive(Default)]
pub struct EphemeralStore {
    values: Mutex<HashMap<String, u32>>,
}

impl EphemeralStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for EphemeralStore {
    fn get_u32(&self, key: &str) -> Result<u32, DeviceError> {
        let values = self.values.lock().expect("store mutex poisoned");
        Ok(values.get(key).copied().unwrap_or(0))
    }

    fn set_u32(&self, key: &str, value: u32) -> Result<(), DeviceError> {
        let mut values = self.values.lock().expect("store mutex poisoned");
        values.insert(key.to_string(), value);
        Ok(())
    }
}
