//! Workflow handlers and the dispatch table.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::engine::WorkflowId;
use crate::errors::DeviceError;
use crate::Device;

mod circuits;
mod dual_boot;
mod programming;
mod sys_admin;

pub use circuits::Circuits;
pub use dual_boot::{BootTarget, DualBoot};
pub use programming::Programming;
pub use sys_admin::SysAdmin;

/// One canned keystroke workflow, selected at boot and run exactly once.
#[async_trait]
pub trait Workflow: Send + Sync {
    fn id(&self) -> WorkflowId;

    fn name(&self) -> &'static str {
        self.id().name()
    }

    async fn run(&self, device: &Device) -> Result<(), DeviceError>;
}

/// Table-driven dispatch from id to handler.
#[derive(Default)]
pub struct WorkflowRegistry {
    handlers: HashMap<WorkflowId, Arc<dyn Workflow>>,
}

impl WorkflowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler under its own id, replacing any previous one.
    pub fn register(&mut self, workflow: Arc<dyn Workflow>) {
        self.handlers.insert(workflow.id(), workflow);
    }

    pub fn get(&self, id: WorkflowId) -> Option<&Arc<dyn Workflow>> {
        self.handlers.get(&id)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// The registry with all four built-in workflows installed.
pub fn default_registry() -> WorkflowRegistry {
    let mut registry = WorkflowRegistry::new();
    registry.register(Arc::new(Programming));
    registry.register(Arc::new(DualBoot));
    registry.register(Arc::new(Circuits));
    registry.register(Arc::new(SysAdmin));
    registry
}
