//! Programming environment bring-up.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::engine::WorkflowId;
use crate::errors::DeviceError;
use crate::workflows::Workflow;
use crate::Device;

const SUBWORKFLOW_PROMPT: &str = "Enter subworkflow? [minecraft], [research], [other] ... 5s";

/// Bookmark folder positions in the browser's bookmark menu.
const DEV_BOOKMARK_FOLDER: usize = 4;
const RESEARCH_BOOKMARK_FOLDER: usize = 3;

pub struct Programming;

impl Programming {
    fn is_dev_subject(reply: &str) -> bool {
        matches!(
            reply.to_lowercase().as_str(),
            "minecraft" | "java" | "spigot"
        )
    }

    fn is_research_subject(reply: &str) -> bool {
        matches!(reply.to_lowercase().as_str(), "research" | "uni")
    }

    /// Sweeps the local checkouts for pending pushes, pulls, and
    /// uncommitted changes.
    async fn git_status_sweep(&self, device: &Device) -> Result<(), DeviceError> {
        let config = &device.config().programming;
        device.open_terminal().await?;
        device.type_line(&format!("cd {}", config.repos_dir)).await?;
        device.type_line(&config.status_command).await
    }
}

#[async_trait]
impl Workflow for Programming {
    fn id(&self) -> WorkflowId {
        WorkflowId::Programming
    }

    async fn run(&self, device: &Device) -> Result<(), DeviceError> {
        let reply = device.query(SUBWORKFLOW_PROMPT).await?;
        debug!(?reply, "subworkflow reply");

        device.open_application("firefox").await?;
        match reply.as_deref() {
            Some(r) if Self::is_dev_subject(r) => {
                info!("opening dev bookmarks");
                device.open_bookmark_folder(DEV_BOOKMARK_FOLDER).await?;
            }
            Some(r) if Self::is_research_subject(r) => {
                info!("opening research bookmarks");
                device
                    .open_bookmark_folder(RESEARCH_BOOKMARK_FOLDER)
                    .await?;
            }
            _ => {}
        }

        let settle = device.config().apps.launch_settle();
        device.clock().sleep(settle).await;
        device.open_application("intellij").await?;
        device.clock().sleep(settle).await;
        device.open_application("github desktop").await?;
        device.clock().sleep(settle).await;

        self.git_status_sweep(device).await
    }
}
