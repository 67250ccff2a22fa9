//! Backup kick-off.

use async_trait::async_trait;
use tracing::info;

use crate::engine::WorkflowId;
use crate::errors::DeviceError;
use crate::workflows::Workflow;
use crate::Device;

pub struct SysAdmin;

#[async_trait]
impl Workflow for SysAdmin {
    fn id(&self) -> WorkflowId {
        WorkflowId::SysAdmin
    }

    async fn run(&self, device: &Device) -> Result<(), DeviceError> {
        let Some(command) = device.config().sys_admin.backup_command.clone() else {
            info!("no backup command configured, nothing to start");
            return Ok(());
        };
        device.open_terminal().await?;
        device.type_line(&command).await
    }
}
