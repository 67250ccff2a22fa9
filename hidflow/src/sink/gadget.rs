//! Linux USB HID gadget implementation of the keystroke sink.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::errors::DeviceError;
use crate::keys::Chord;
use crate::sink::KeystrokeSink;

const REPORT_LEN: usize = 8;
const RELEASE_REPORT: [u8; REPORT_LEN] = [0; REPORT_LEN];

/// Writes 8-byte boot keyboard reports (modifier byte, reserved byte,
/// six usage slots) to a HID gadget node such as `/dev/hidg0`. Each
/// chord is a press report followed by an all-zero release report.
pub struct GadgetSink {
    path: PathBuf,
    device: Mutex<File>,
}

impl GadgetSink {
    #[instrument]
    pub async fn open(path: impl AsRef<Path> + std::fmt::Debug) -> Result<Self, DeviceError> {
        let path = path.as_ref().to_path_buf();
        let device = OpenOptions::new()
            .write(true)
            .open(&path)
            .await
            .map_err(|e| {
                DeviceError::InjectionFailed(format!(
                    "failed to open HID gadget {}: {e}",
                    path.display()
                ))
            })?;
        debug!(path = %path.display(), "HID gadget opened");
        Ok(Self {
            path,
            device: Mutex::new(device),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write_report(&self, report: &[u8; REPORT_LEN]) -> Result<(), DeviceError> {
        let mut device = self.device.lock().await;
        device.write_all(report).await.map_err(|e| {
            DeviceError::InjectionFailed(format!(
                "report write to {} failed: {e}",
                self.path.display()
            ))
        })?;
        device.flush().await.map_err(|e| {
            DeviceError::InjectionFailed(format!(
                "report flush to {} failed: {e}",
                self.path.display()
            ))
        })
    }
}

#[async_trait]
impl KeystrokeSink for GadgetSink {
    async fn send_chord(&self, chord: Chord) -> Result<(), DeviceError> {
        let mut report = [0u8; REPORT_LEN];
        report[0] = chord.modifiers.bits();
        report[2] = chord.usage;
        self.write_report(&report).await?;
        self.write_report(&RELEASE_REPORT).await
    }
}
