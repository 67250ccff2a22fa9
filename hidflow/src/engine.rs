//! Boot-time workflow selection.
//!
//! Runs exactly once per power cycle: load the persisted selection,
//! optionally re-prompt the operator, validate, persist any change, and
//! dispatch exactly one workflow handler.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::errors::DeviceError;
use crate::store::WORKFLOW_ID_KEY;
use crate::trigger::Trigger;
use crate::workflows::WorkflowRegistry;
use crate::Device;

/// Identifies one of the canned workflows.
///
/// Persisted as its integer id; an out-of-range persisted value is
/// corrupt and is replaced by the default before dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
#[repr(u32)]
pub enum WorkflowId {
    Programming = 0,
    DualBoot = 1,
    Circuits = 2,
    SysAdmin = 3,
}

impl WorkflowId {
    pub const ALL: [WorkflowId; 4] = [
        WorkflowId::Programming,
        WorkflowId::DualBoot,
        WorkflowId::Circuits,
        WorkflowId::SysAdmin,
    ];

    pub fn from_raw(raw: u32) -> Option<WorkflowId> {
        match raw {
            0 => Some(WorkflowId::Programming),
            1 => Some(WorkflowId::DualBoot),
            2 => Some(WorkflowId::Circuits),
            3 => Some(WorkflowId::SysAdmin),
            _ => None,
        }
    }

    pub fn raw(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        match self {
            WorkflowId::Programming => "Programming",
            WorkflowId::DualBoot => "Dual Boot",
            WorkflowId::Circuits => "Circuits",
            WorkflowId::SysAdmin => "Sys-Admin",
        }
    }
}

impl Default for WorkflowId {
    fn default() -> Self {
        WorkflowId::Programming
    }
}

impl std::fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u32> for WorkflowId {
    type Error = String;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        WorkflowId::from_raw(raw).ok_or_else(|| format!("workflow id {raw} out of range"))
    }
}

impl From<WorkflowId> for u32 {
    fn from(id: WorkflowId) -> u32 {
        id.raw()
    }
}

/// Validates an operator reply against the current selection.
///
/// Returns the parsed id iff the reply parses as an integer in range and
/// differs from `current`; everything else (malformed, out of range,
/// duplicate, no reply) keeps the current selection.
pub fn parse_selection(reply: Option<&str>, current: WorkflowId) -> WorkflowId {
    let Some(reply) = reply else {
        return current;
    };
    match reply.trim().parse::<u32>() {
        Ok(raw) => match WorkflowId::from_raw(raw) {
            Some(id) if id != current => id,
            _ => current,
        },
        Err(_) => current,
    }
}

/// The selection prompt, tagging the remembered entry.
pub fn selection_prompt(current: WorkflowId) -> String {
    let entries: Vec<String> = WorkflowId::ALL
        .iter()
        .map(|id| {
            if *id == current {
                format!("[{}:MEM-SEL] {}", id.raw(), id.name())
            } else {
                format!("[{}] {}", id.raw(), id.name())
            }
        })
        .collect();
    format!("Select ID: {}", entries.join(", "))
}

/// Phases of one boot-time selection pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorState {
    Idle,
    LoadPersisted,
    MaybeRePrompt,
    Validate,
    Persist,
    Dispatch,
    Done,
}

const REPROMPT_DEADLINE: Duration = Duration::from_millis(10_000);

/// Drives the selection state machine over a [`Device`].
pub struct BootSelector {
    device: Device,
    registry: WorkflowRegistry,
    trigger: Arc<dyn Trigger>,
    reprompt_deadline: Duration,
}

impl BootSelector {
    pub fn new(device: Device, registry: WorkflowRegistry, trigger: Arc<dyn Trigger>) -> Self {
        Self {
            device,
            registry,
            trigger,
            reprompt_deadline: REPROMPT_DEADLINE,
        }
    }

    /// Overrides the longer deadline used for the selection prompt.
    pub fn with_reprompt_deadline(mut self, deadline: Duration) -> Self {
        self.reprompt_deadline = deadline;
        self
    }

    /// Runs the machine to completion and returns the dispatched id.
    ///
    /// Reply-shaped failures (no reply, malformed reply, failed query
    /// injection, failed persistence) never abort the boot; only an
    /// error from the dispatched workflow body itself propagates.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<WorkflowId, DeviceError> {
        let mut state = SelectorState::LoadPersisted;
        let mut current = WorkflowId::default();
        let mut reply: Option<String> = None;
        let mut selected = current;

        loop {
            debug!(?state, "selector state");
            match state {
                SelectorState::Idle => {
                    state = SelectorState::LoadPersisted;
                }
                SelectorState::LoadPersisted => {
                    let raw = self
                        .device
                        .store()
                        .get_u32(WORKFLOW_ID_KEY)
                        .unwrap_or_else(|e| {
                            warn!(error = %e, "workflow id unreadable, using default");
                            0
                        });
                    current = WorkflowId::from_raw(raw).unwrap_or_else(|| {
                        warn!(raw, "persisted workflow id out of range, using default");
                        WorkflowId::default()
                    });
                    selected = current;
                    state = SelectorState::MaybeRePrompt;
                }
                SelectorState::MaybeRePrompt => {
                    if self.trigger.is_asserted() {
                        info!(%current, "re-selection trigger asserted, prompting");
                        reply = match self
                            .device
                            .query_with_deadline(&selection_prompt(current), self.reprompt_deadline)
                            .await
                        {
                            Ok(reply) => reply,
                            Err(e) => {
                                warn!(error = %e, "selection query failed, keeping current selection");
                                None
                            }
                        };
                    }
                    state = SelectorState::Validate;
                }
                SelectorState::Validate => {
                    selected = parse_selection(reply.as_deref(), current);
                    state = if selected != current {
                        SelectorState::Persist
                    } else {
                        SelectorState::Dispatch
                    };
                }
                SelectorState::Persist => {
                    // write-back happens before dispatch so the change
                    // survives whatever the workflow does to the host
                    if let Err(e) = self.device.store().set_u32(WORKFLOW_ID_KEY, selected.raw()) {
                        warn!(error = %e, "selection not persisted, continuing in memory");
                    }
                    state = SelectorState::Dispatch;
                }
                SelectorState::Dispatch => {
                    match self.registry.get(selected) {
                        Some(workflow) => {
                            info!(workflow = workflow.name(), "dispatching");
                            workflow.run(&self.device).await?;
                        }
                        None => {
                            warn!(%selected, "no handler registered, skipping dispatch");
                        }
                    }
                    state = SelectorState::Done;
                }
                SelectorState::Done => {
                    info!(workflow = %selected, "boot selection complete");
                    return Ok(selected);
                }
            }
        }
    }
}
