use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("Store mount failed: {0}")]
    MountFailed(String),

    #[error("Persistent storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Keystroke injection failed: {0}")]
    InjectionFailed(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
