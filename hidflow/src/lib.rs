//! Keystroke-workflow automation over a USB HID gadget
//!
//! This crate emulates a human operator at the keyboard of the host it
//! is plugged into: it types keystrokes through a HID gadget endpoint
//! to open applications, launch a terminal, and run shell snippets, and
//! it reads one line of text back over a serial channel as if an
//! operator had answered a prompt. A persisted integer selects which
//! canned workflow runs at boot.

use std::sync::Arc;
use std::time::Duration;

use tracing::instrument;

pub mod clock;
pub mod config;
pub mod engine;
pub mod errors;
pub mod input;
pub mod keys;
pub mod query;
pub mod sink;
pub mod store;
pub mod trigger;
pub mod workflows;

pub use clock::{Clock, SystemClock};
pub use config::DeviceConfig;
pub use engine::{parse_selection, selection_prompt, BootSelector, SelectorState, WorkflowId};
pub use errors::DeviceError;
pub use input::{LineSource, SerialLineSource};
pub use keys::{Chord, Modifiers};
pub use query::{QueryChannel, QueryConfig, ReplyDevice};
pub use sink::{GadgetSink, KeystrokeSink};
pub use store::{EphemeralStore, FlashStore, StateStore};
pub use trigger::{FixedTrigger, GpioTrigger, Trigger};
pub use workflows::{default_registry, Workflow, WorkflowRegistry};

/// The main entry point: every hardware seam as an explicit handle,
/// constructed once at process start and passed into the engine. No
/// ambient globals anywhere — tests substitute fakes for all four
/// handles.
pub struct Device {
    sink: Arc<dyn KeystrokeSink>,
    store: Arc<dyn StateStore>,
    input: Arc<dyn LineSource>,
    clock: Arc<dyn Clock>,
    config: DeviceConfig,
}

impl Device {
    pub fn new(
        sink: Arc<dyn KeystrokeSink>,
        store: Arc<dyn StateStore>,
        input: Arc<dyn LineSource>,
        clock: Arc<dyn Clock>,
        config: DeviceConfig,
    ) -> Self {
        Self {
            sink,
            store,
            input,
            clock,
            config,
        }
    }

    pub fn sink(&self) -> &Arc<dyn KeystrokeSink> {
        &self.sink
    }

    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// A query channel over this device's sink, input, and clock.
    pub fn query_channel(&self) -> QueryChannel {
        QueryChannel::new(
            self.sink.clone(),
            self.input.clone(),
            self.clock.clone(),
            self.config.query.clone(),
        )
    }

    /// Prompts the operator and waits for one line, with the configured
    /// default deadline. `None` means no reply arrived in time.
    #[instrument(skip(self))]
    pub async fn query(&self, prompt: &str) -> Result<Option<String>, DeviceError> {
        self.query_channel().query(prompt).await
    }

    #[instrument(skip(self))]
    pub async fn query_with_deadline(
        &self,
        prompt: &str,
        deadline: Duration,
    ) -> Result<Option<String>, DeviceError> {
        self.query_channel()
            .query_with_deadline(prompt, deadline)
            .await
    }

    /// Types text one character at a time with the configured pacing,
    /// the way a person would.
    pub async fn type_animation(&self, text: &str) -> Result<(), DeviceError> {
        let pacing = self.config.query.keystroke_pacing();
        for ch in text.chars() {
            self.sink.send_char(ch).await?;
            self.clock.sleep(pacing).await;
        }
        self.clock.sleep(pacing).await;
        Ok(())
    }

    /// Types a line and presses Enter.
    pub async fn type_line(&self, line: &str) -> Result<(), DeviceError> {
        self.type_animation(line).await?;
        self.sink.send_usage(keys::usage::ENTER).await
    }

    /// Opens an application through the host's application menu: tap
    /// the menu key, type the name, press Enter.
    #[instrument(skip(self))]
    pub async fn open_application(&self, name: &str) -> Result<(), DeviceError> {
        self.sink
            .send_chord(Chord::modifier_tap(Modifiers::GUI))
            .await?;
        self.clock.sleep(self.config.apps.menu_settle()).await;
        self.type_animation(name).await?;
        self.sink.send_usage(keys::usage::ENTER).await
    }

    /// Opens or focuses a terminal and waits for it to settle.
    #[instrument(skip(self))]
    pub async fn open_terminal(&self) -> Result<(), DeviceError> {
        self.sink.send_chord(self.config.query.terminal_chord).await?;
        self.clock.sleep(self.config.query.terminal_settle()).await;
        Ok(())
    }

    /// Opens the browser's bookmark menu and selects the n-th folder.
    #[instrument(skip(self))]
    pub async fn open_bookmark_folder(&self, folder: usize) -> Result<(), DeviceError> {
        self.sink
            .send_chord(Chord::new(Modifiers::CTRL, keys::usage::B))
            .await?;
        self.clock.sleep(self.config.apps.menu_settle()).await;
        let pacing = self.config.query.keystroke_pacing();
        for _ in 0..folder {
            self.sink.send_usage(keys::usage::ARROW_DOWN).await?;
            self.clock.sleep(pacing).await;
        }
        self.sink.send_usage(keys::usage::ENTER).await
    }
}

impl Clone for Device {
    fn clone(&self) -> Self {
        Self {
            sink: self.sink.clone(),
            store: self.store.clone(),
            input: self.input.clone(),
            clock: self.clock.clone(),
            config: self.config.clone(),
        }
    }
}
