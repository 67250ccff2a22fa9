//! Interactive query channel.
//!
//! Presents a textual prompt to the human at the desk by typing a shell
//! one-liner into a freshly opened terminal, then polls the serial reply
//! device for one line, bounded by a deadline. The channel always
//! terminates within the sum of its fixed settle delays plus the
//! deadline and consumes at most one accepted line per call; anything
//! still buffered is discarded by the next call's drain.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::clock::Clock;
use crate::errors::DeviceError;
use crate::input::LineSource;
use crate::keys::{usage, Chord, Modifiers};
use crate::sink::KeystrokeSink;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Where the reply script sends the captured line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyDevice {
    /// A concrete device node.
    Fixed(String),
    /// A shell glob resolved at reply time; the last match wins.
    Wildcard(String),
}

impl ReplyDevice {
    /// Builds the shell one-liner that shows the prompt, blocks on
    /// `read`, and forwards the answer to the reply device.
    pub fn capture_script(&self, prompt: &str) -> String {
        match self {
            ReplyDevice::Fixed(path) => format!(
                "bash -c 'clear; echo \"{prompt}\"; read r; printf \"%s\\n\" \"$r\" > {path}'"
            ),
            ReplyDevice::Wildcard(glob) => format!(
                "bash -c 'P=$(ls {glob} | tail -1); stty -F \"$P\" raw -echo; \
                 clear; echo \"{prompt}\"; read r; printf \"%s\\n\" \"$r\" > \"$P\"'"
            ),
        }
    }
}

impl Default for ReplyDevice {
    fn default() -> Self {
        ReplyDevice::Wildcard("/dev/ttyACM*".to_string())
    }
}

/// Timings and key bindings of the query protocol. Defaults match the
/// behavior the device was tuned against.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Chord that opens or focuses a terminal on the host.
    pub terminal_chord: Chord,
    /// Settle after opening the terminal, in milliseconds.
    pub terminal_settle_ms: u64,
    /// Settle after typing the capture script, for the shell to reach
    /// its `read`.
    pub shell_settle_ms: u64,
    /// Overall reply deadline from the start of polling.
    pub response_deadline_ms: u64,
    /// Settle before and after the closing `exit`.
    pub exit_settle_ms: u64,
    /// Per-character typing delay.
    pub keystroke_pacing_ms: u64,
    pub reply_device: ReplyDevice,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            terminal_chord: Chord::new(Modifiers::CTRL | Modifiers::ALT, usage::T),
            terminal_settle_ms: 750,
            shell_settle_ms: 1000,
            response_deadline_ms: 5000,
            exit_settle_ms: 200,
            keystroke_pacing_ms: 50,
            reply_device: ReplyDevice::default(),
        }
    }
}

impl QueryConfig {
    pub fn terminal_settle(&self) -> Duration {
        Duration::from_millis(self.terminal_settle_ms)
    }

    pub fn shell_settle(&self) -> Duration {
        Duration::from_millis(self.shell_settle_ms)
    }

    pub fn response_deadline(&self) -> Duration {
        Duration::from_millis(self.response_deadline_ms)
    }

    pub fn exit_settle(&self) -> Duration {
        Duration::from_millis(self.exit_settle_ms)
    }

    pub fn keystroke_pacing(&self) -> Duration {
        Duration::from_millis(self.keystroke_pacing_ms)
    }
}

/// Half-duplex request/response over the keystroke sink and the serial
/// reply device.
pub struct QueryChannel {
    sink: Arc<dyn KeystrokeSink>,
    input: Arc<dyn LineSource>,
    clock: Arc<dyn Clock>,
    config: QueryConfig,
}

impl QueryChannel {
    pub fn new(
        sink: Arc<dyn KeystrokeSink>,
        input: Arc<dyn LineSource>,
        clock: Arc<dyn Clock>,
        config: QueryConfig,
    ) -> Self {
        Self {
            sink,
            input,
            clock,
            config,
        }
    }

    /// Queries with the configured default deadline.
    pub async fn query(&self, prompt: &str) -> Result<Option<String>, DeviceError> {
        self.query_with_deadline(prompt, self.config.response_deadline())
            .await
    }

    /// Runs the full prompt/reply protocol once.
    ///
    /// `None` is the no-reply sentinel: the deadline expired without a
    /// non-empty line arriving.
    #[instrument(skip(self))]
    pub async fn query_with_deadline(
        &self,
        prompt: &str,
        deadline: Duration,
    ) -> Result<Option<String>, DeviceError> {
        // a line left over from a previous exchange must never be taken
        // as the answer to this prompt
        self.input.drain();

        self.sink.send_chord(self.config.terminal_chord).await?;
        self.clock.sleep(self.config.terminal_settle()).await;

        let script = self.config.reply_device.capture_script(prompt);
        self.type_line(&script).await?;
        self.clock.sleep(self.config.shell_settle()).await;

        let reply = self.poll_reply(deadline).await;

        self.clock.sleep(self.config.exit_settle()).await;
        self.type_line("exit").await?;
        self.clock.sleep(self.config.exit_settle()).await;

        Ok(reply)
    }

    async fn poll_reply(&self, deadline: Duration) -> Option<String> {
        let deadline = self.clock.now() + deadline;
        while self.clock.now() < deadline {
            if let Some(raw) = self.input.try_next_line() {
                let line = sanitize_line(&raw);
                if !line.is_empty() {
                    debug!(reply = %line, "reply accepted");
                    return Some(line);
                }
                // whitespace or terminal noise: keep waiting
                continue;
            }
            self.clock.sleep(POLL_INTERVAL).await;
        }
        debug!("reply deadline expired");
        None
    }

    async fn type_line(&self, line: &str) -> Result<(), DeviceError> {
        for ch in line.chars() {
            self.sink.send_char(ch).await?;
            self.clock.sleep(self.config.keystroke_pacing()).await;
        }
        self.sink.send_usage(usage::ENTER).await
    }
}

#[derive(Clone, Copy)]
enum EscapeState {
    Text,
    /// Just saw ESC.
    Escape,
    /// Inside a CSI sequence; ends on a final byte (0x40..=0x7e).
    Csi,
    /// Inside an OSC sequence; ends on BEL or ESC-backslash.
    Osc,
}

/// Strips ANSI escape sequences and control characters from a captured
/// line and trims it. The reply travels through a live terminal, so
/// cursor-movement noise around the payload is normal.
pub fn sanitize_line(raw: &str) -> String {
    use EscapeState::*;

    let mut out = String::with_capacity(raw.len());
    let mut state = Text;
    for ch in raw.chars() {
        state = match state {
            Text => {
                if ch == '\u{1b}' {
                    Escape
                } else {
                    if ch as u32 >= 0x20 {
                        out.push(ch);
                    }
                    Text
                }
            }
            Escape => match ch {
                '[' => Csi,
                ']' => Osc,
                // two-character sequence, e.g. ESC c
                _ => Text,
            },
            Csi => {
                if ('\u{40}'..='\u{7e}').contains(&ch) {
                    Text
                } else {
                    Csi
                }
            }
            Osc => match ch {
                '\u{7}' => Text,
                '\u{1b}' => Escape,
                _ => Osc,
            },
        };
    }
    out.trim().to_string()
}
