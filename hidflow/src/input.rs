//! Line-oriented reply input.
//!
//! The query channel polls a [`LineSource`] instead of blocking on the
//! serial device directly; the real source keeps a background reader
//! task feeding a channel so `try_next_line` never waits.

use std::path::Path;
use std::sync::Mutex;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use crate::errors::DeviceError;

pub trait LineSource: Send + Sync {
    /// Non-blocking poll: one buffered line, if any.
    fn try_next_line(&self) -> Option<String>;

    /// Discards everything currently buffered.
    fn drain(&self) {
        let mut discarded = 0usize;
        while self.try_next_line().is_some() {
            discarded += 1;
        }
        if discarded > 0 {
            debug!(discarded, "drained stale input lines");
        }
    }
}

/// Reads the serial reply device (e.g. the CDC ACM gadget port) line by
/// line on a background task.
pub struct SerialLineSource {
    rx: Mutex<mpsc::UnboundedReceiver<String>>,
    reader: JoinHandle<()>,
}

impl SerialLineSource {
    #[instrument]
    pub async fn open(path: impl AsRef<Path> + std::fmt::Debug) -> Result<Self, DeviceError> {
        let path = path.as_ref().to_path_buf();
        let device = tokio::fs::File::open(&path).await.map_err(|e| {
            DeviceError::Io(std::io::Error::new(
                e.kind(),
                format!("failed to open serial input {}: {e}", path.display()),
            ))
        })?;

        let (tx, rx) = mpsc::unbounded_channel();
        let reader = tokio::spawn(async move {
            let mut lines = BufReader::new(device).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "serial read failed, stopping reader");
                        break;
                    }
                }
            }
        });

        Ok(Self {
            rx: Mutex::new(rx),
            reader,
        })
    }
}

impl LineSource for SerialLineSource {
    fn try_next_line(&self) -> Option<String> {
        let mut rx = self.rx.lock().expect("input mutex poisoned");
        rx.try_recv().ok()
    }
}

impl Drop for SerialLineSource {
    fn drop(&mut self) {
        self.reader.abort();
    }
}
