//! Error types for sable_app

use thiserror::Error;

use crate::driver::DriverState;

/// Frame driver errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration could not be parsed
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// GPU context, surface or device failure
    #[error("GPU error: {0}")]
    Gpu(#[from] sable_gpu::GpuError),

    /// Window or event loop failure
    #[error("Platform error: {0}")]
    Platform(#[from] sable_platform::PlatformError),

    /// Driver operation called in the wrong state
    #[error("Cannot {operation} while the driver is {state}")]
    InvalidState {
        operation: &'static str,
        state: DriverState,
    },

    #[error("Failed to spawn render thread: {0}")]
    ThreadSpawn(String),
}

/// Result type for sable_app operations
pub type Result<T> = std::result::Result<T, AppError>;
