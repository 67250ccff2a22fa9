//! Dual-boot toggle.
//!
//! The persisted flag records which OS is currently booted. Every
//! invocation flips it and reboots the machine into the other OS. The
//! flip is persisted BEFORE any reboot keystroke goes out, so a power
//! loss mid-injection leaves the flag describing the intended next
//! state rather than the stale one.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::engine::WorkflowId;
use crate::errors::DeviceError;
use crate::keys::{usage, Chord, Modifiers};
use crate::store::BOOT_ORDER_KEY;
use crate::workflows::Workflow;
use crate::Device;

/// The OS currently booted, as recorded in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BootTarget {
    Linux,
    Windows,
}

impl BootTarget {
    pub fn from_flag(raw: u32) -> BootTarget {
        if raw == 1 {
            BootTarget::Windows
        } else {
            BootTarget::Linux
        }
    }

    pub fn flag(self) -> u32 {
        match self {
            BootTarget::Linux => 0,
            BootTarget::Windows => 1,
        }
    }

    pub fn other(self) -> BootTarget {
        match self {
            BootTarget::Linux => BootTarget::Windows,
            BootTarget::Windows => BootTarget::Linux,
        }
    }
}

pub struct DualBoot;

#[async_trait]
impl Workflow for DualBoot {
    fn id(&self) -> WorkflowId {
        WorkflowId::DualBoot
    }

    async fn run(&self, device: &Device) -> Result<(), DeviceError> {
        let raw = device.store().get_u32(BOOT_ORDER_KEY).unwrap_or_else(|e| {
            warn!(error = %e, "boot order unreadable, assuming Linux");
            0
        });
        let booted = BootTarget::from_flag(raw);
        info!(?booted, next = ?booted.other(), "toggling boot order");

        // the flip must be durable before the host is told to reboot
        if let Err(e) = device
            .store()
            .set_u32(BOOT_ORDER_KEY, booted.other().flag())
        {
            warn!(error = %e, "boot order flip not persisted");
        }

        let config = &device.config().dual_boot;
        match booted {
            BootTarget::Windows => {
                device
                    .sink()
                    .send_chord(Chord::new(Modifiers::GUI, usage::R))
                    .await?;
                device.clock().sleep(config.run_dialog_settle()).await;
                device.type_line(&config.windows_restart_command).await?;
            }
            BootTarget::Linux => {
                device.open_terminal().await?;
                device
                    .type_line(&format!(
                        "bash -c 'sudo efibootmgr -n {};reboot'",
                        config.windows_boot_entry
                    ))
                    .await?;
            }
        }
        Ok(())
    }
}
