//! Shared fixtures: fake hardware handles and a journal that records
//! the interleaving of store writes and injected chords, so tests can
//! assert ordering guarantees.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use hidflow::clock::Clock;
use hidflow::engine::WorkflowId;
use hidflow::errors::DeviceError;
use hidflow::input::LineSource;
use hidflow::keys::{char_to_usage, Chord, Modifiers};
use hidflow::sink::KeystrokeSink;
use hidflow::store::{EphemeralStore, StateStore};
use hidflow::workflows::Workflow;
use hidflow::{Device, DeviceConfig};

#[derive(Debug, Clone, PartialEq)]
pub enum JournalEntry {
    Chord(Chord),
    StoreSet { key: String, value: u32 },
}

pub type Journal = Arc<Mutex<Vec<JournalEntry>>>;

pub struct RecordingSink {
    journal: Journal,
}

#[async_trait]
impl KeystrokeSink for RecordingSink {
    async fn send_chord(&self, chord: Chord) -> Result<(), DeviceError> {
        self.journal
            .lock()
            .unwrap()
            .push(JournalEntry::Chord(chord));
        Ok(())
    }
}

/// In-memory store that mirrors every write into the journal.
pub struct JournalStore {
    inner: EphemeralStore,
    journal: Journal,
}

impl StateStore for JournalStore {
    fn get_u32(&self, key: &str) -> Result<u32, DeviceError> {
        self.inner.get_u32(key)
    }

    fn set_u32(&self, key: &str, value: u32) -> Result<(), DeviceError> {
        self.journal.lock().unwrap().push(JournalEntry::StoreSet {
            key: key.to_string(),
            value,
        });
        self.inner.set_u32(key, value)
    }
}

/// Clock whose `sleep` just advances an internal counter, so deadline
/// loops run instantly and deterministically.
pub struct ManualClock {
    now: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Duration::ZERO),
        }
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock().unwrap()
    }

    async fn sleep(&self, duration: Duration) {
        *self.now.lock().unwrap() += duration;
    }
}

/// Line source whose entries become visible once the manual clock
/// reaches their timestamp. Entries must be pushed in timestamp order.
pub struct ScriptedLines {
    clock: Arc<ManualClock>,
    entries: Mutex<VecDeque<(Duration, String)>>,
}

impl ScriptedLines {
    pub fn new(clock: Arc<ManualClock>) -> Self {
        Self {
            clock,
            entries: Mutex::new(VecDeque::new()),
        }
    }

    pub fn push_at(&self, at: Duration, line: &str) {
        self.entries
            .lock()
            .unwrap()
            .push_back((at, line.to_string()));
    }

    /// A line already sitting in the buffer before the exchange starts.
    pub fn push_stale(&self, line: &str) {
        self.push_at(Duration::ZERO, line);
    }

    /// A line that arrives shortly after the exchange starts — visible
    /// to the reply poll but not to the initial drain.
    pub fn push_reply(&self, line: &str) {
        self.push_at(Duration::from_millis(1), line);
    }

    pub fn remaining(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

impl LineSource for ScriptedLines {
    fn try_next_line(&self) -> Option<String> {
        let mut entries = self.entries.lock().unwrap();
        if let Some((at, _)) = entries.front() {
            if *at <= self.clock.now() {
                return entries.pop_front().map(|(_, line)| line);
            }
        }
        None
    }
}

/// Handler that only records that it ran.
pub struct ProbeWorkflow {
    id: WorkflowId,
    runs: Arc<Mutex<Vec<WorkflowId>>>,
}

impl ProbeWorkflow {
    pub fn new(id: WorkflowId, runs: Arc<Mutex<Vec<WorkflowId>>>) -> Self {
        Self { id, runs }
    }
}

#[async_trait]
impl Workflow for ProbeWorkflow {
    fn id(&self) -> WorkflowId {
        self.id
    }

    async fn run(&self, _device: &Device) -> Result<(), DeviceError> {
        self.runs.lock().unwrap().push(self.id);
        Ok(())
    }
}

pub struct Fixture {
    pub device: Device,
    pub journal: Journal,
    pub clock: Arc<ManualClock>,
    pub lines: Arc<ScriptedLines>,
    pub store: Arc<JournalStore>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(DeviceConfig::default())
    }

    pub fn with_config(config: DeviceConfig) -> Self {
        let journal: Journal = Arc::new(Mutex::new(Vec::new()));
        let clock = Arc::new(ManualClock::new());
        let lines = Arc::new(ScriptedLines::new(clock.clone()));
        let store = Arc::new(JournalStore {
            inner: EphemeralStore::new(),
            journal: journal.clone(),
        });
        let sink = Arc::new(RecordingSink {
            journal: journal.clone(),
        });
        let device = Device::new(
            sink,
            store.clone(),
            lines.clone(),
            clock.clone(),
            config,
        );
        Self {
            device,
            journal,
            clock,
            lines,
            store,
        }
    }

    pub fn clear_journal(&self) {
        self.journal.lock().unwrap().clear();
    }

    /// Reconstructs the plain text typed through the sink, ignoring
    /// chords that carry non-shift modifiers (shortcuts, menu taps).
    pub fn typed_text(&self) -> String {
        let mut reverse: HashMap<(u8, bool), char> = HashMap::new();
        for ch in (' '..='~').chain(['\n', '\t']) {
            if let Some((mapped, shifted)) = char_to_usage(ch) {
                reverse.insert((mapped, shifted), ch);
            }
        }

        self.journal
            .lock()
            .unwrap()
            .iter()
            .filter_map(|entry| match entry {
                JournalEntry::Chord(chord)
                    if chord.modifiers == Modifiers::NONE
                        || chord.modifiers == Modifiers::SHIFT =>
                {
                    let shifted = chord.modifiers == Modifiers::SHIFT;
                    reverse.get(&(chord.usage, shifted)).copied()
                }
                _ => None,
            })
            .collect()
    }

    pub fn chords(&self) -> Vec<Chord> {
        self.journal
            .lock()
            .unwrap()
            .iter()
            .filter_map(|entry| match entry {
                JournalEntry::Chord(chord) => Some(*chord),
                _ => None,
            })
            .collect()
    }

    /// Index of the first store write for `key`, and of the first chord
    /// injected at or after journal position 0.
    pub fn first_set_index(&self, key: &str) -> Option<usize> {
        self.journal
            .lock()
            .unwrap()
            .iter()
            .position(|entry| matches!(entry, JournalEntry::StoreSet { key: k, .. } if k == key))
    }

    pub fn first_chord_index(&self) -> Option<usize> {
        self.journal
            .lock()
            .unwrap()
            .iter()
            .position(|entry| matches!(entry, JournalEntry::Chord(_)))
    }
}
