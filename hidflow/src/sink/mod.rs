//! Keystroke sink seam.
//!
//! The engine never reads anything back from the sink; injection is
//! fire-and-forget, exactly like a keyboard. Everything funnels through
//! [`KeystrokeSink::send_chord`] so a fake sink only has to record
//! chords to observe the full output of the engine.

use async_trait::async_trait;
use tracing::warn;

use crate::errors::DeviceError;
use crate::keys::{char_to_usage, Chord, Modifiers};

mod gadget;

pub use gadget::GadgetSink;

#[async_trait]
pub trait KeystrokeSink: Send + Sync {
    /// Press and release one chord.
    async fn send_chord(&self, chord: Chord) -> Result<(), DeviceError>;

    /// Type a single character through the US layout mapping.
    async fn send_char(&self, ch: char) -> Result<(), DeviceError> {
        self.send_char_with(ch, Modifiers::NONE).await
    }

    /// Type a single character with extra modifiers held.
    ///
    /// Characters the layout cannot produce are skipped, not errors; the
    /// host would simply never have seen them from a real keyboard.
    async fn send_char_with(&self, ch: char, modifiers: Modifiers) -> Result<(), DeviceError> {
        match char_to_usage(ch) {
            Some((usage, shifted)) => {
                let modifiers = if shifted {
                    modifiers | Modifiers::SHIFT
                } else {
                    modifiers
                };
                self.send_chord(Chord::new(modifiers, usage)).await
            }
            None => {
                warn!(character = ?ch, "character not typeable on US layout, skipping");
                Ok(())
            }
        }
    }

    /// Tap a raw usage id with no modifiers.
    async fn send_usage(&self, usage: u8) -> Result<(), DeviceError> {
        self.send_chord(Chord::bare(usage)).await
    }

    /// Type a whole string with no inter-key pacing.
    ///
    /// Pacing lives in [`crate::Device::type_animation`] where the clock
    /// is available.
    async fn send_text(&self, text: &str) -> Result<(), DeviceError> {
        for ch in text.chars() {
            self.send_char(ch).await?;
        }
        Ok(())
    }
}
