//! Wires real hardware handles and runs one boot sequence.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use hidflow::{
    default_registry, BootSelector, Device, DeviceConfig, EphemeralStore, FixedTrigger,
    FlashStore, GadgetSink, GpioTrigger, SerialLineSource, StateStore, SystemClock, Trigger,
};

#[derive(Parser, Debug)]
#[command(
    name = "hidflow-agent",
    about = "Runs one hidflow boot sequence against real hardware"
)]
struct Args {
    /// JSON device configuration; built-in defaults apply when absent.
    #[arg(long, env = "HIDFLOW_CONFIG")]
    config: Option<PathBuf>,

    /// HID gadget node keystrokes are written to.
    #[arg(long, default_value = "/dev/hidg0")]
    gadget: PathBuf,

    /// Serial device carrying operator replies.
    #[arg(long, default_value = "/dev/ttyGS0")]
    serial: PathBuf,

    /// Directory backing the persistent key-value store.
    #[arg(long, default_value = "/var/lib/hidflow")]
    state_dir: PathBuf,

    /// sysfs GPIO value file of the re-selection trigger (active low).
    /// Without it the agent never re-prompts.
    #[arg(long)]
    trigger: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str::<DeviceConfig>(&raw)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        }
        None => DeviceConfig::default(),
    };

    let sink = Arc::new(
        GadgetSink::open(&args.gadget)
            .await
            .context("HID gadget unavailable")?,
    );
    let input = Arc::new(
        SerialLineSource::open(&args.serial)
            .await
            .context("serial input unavailable")?,
    );

    // persistence degrades to an in-memory default run rather than
    // aborting the boot
    let store: Arc<dyn StateStore> = match FlashStore::mount(&args.state_dir) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!(error = %e, "store unavailable, running with in-memory defaults");
            Arc::new(EphemeralStore::new())
        }
    };

    let trigger: Arc<dyn Trigger> = match &args.trigger {
        Some(path) => Arc::new(GpioTrigger::new(path.clone())),
        None => Arc::new(FixedTrigger(false)),
    };

    let device = Device::new(sink, store, input, Arc::new(SystemClock::new()), config);
    let selector = BootSelector::new(device, default_registry(), trigger);

    let dispatched = selector.run().await.context("boot sequence failed")?;
    info!(workflow = %dispatched, "workflow completed");
    Ok(())
}
