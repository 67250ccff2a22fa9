//! Circuit design bring-up: editor plus schematic capture.

use async_trait::async_trait;

use crate::engine::WorkflowId;
use crate::errors::DeviceError;
use crate::workflows::Workflow;
use crate::Device;

pub struct Circuits;

#[async_trait]
impl Workflow for Circuits {
    fn id(&self) -> WorkflowId {
        WorkflowId::Circuits
    }

    async fn run(&self, device: &Device) -> Result<(), DeviceError> {
        device.open_application("vscode").await?;
        device
            .clock()
            .sleep(device.config().apps.launch_settle())
            .await;
        device.open_application("kicad").await
    }
}
