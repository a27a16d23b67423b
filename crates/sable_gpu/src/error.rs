//! GPU error types

use thiserror::Error;

/// Errors raised while acquiring or driving the GPU
#[derive(Error, Debug)]
pub enum GpuError {
    /// No adapter matched the requested backends
    #[error("No suitable GPU adapter found")]
    AdapterNotFound,

    /// Failed to request a device from the adapter
    #[error("Failed to request GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    /// Failed to create a window surface
    #[error("Failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    /// WGSL source failed to parse or validate
    #[error("Shader error: {0}")]
    Shader(String),

    /// The window surface was lost or is out of date
    #[error("Surface lost")]
    SurfaceLost,
}

/// Result type for GPU operations
pub type Result<T> = std::result::Result<T, GpuError>;
