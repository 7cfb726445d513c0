//! Rendering error types.

use thiserror::Error;

/// Errors that can occur during rendering operations.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Failed to create wgpu adapter.
    #[error("failed to create graphics adapter")]
    AdapterCreationFailed,

    /// Failed to create wgpu device.
    #[error("failed to create graphics device: {0}")]
    DeviceCreationFailed(#[from] wgpu::RequestDeviceError),

    /// Render target dimensions are unusable.
    #[error("invalid target size {width}x{height}")]
    InvalidTargetSize { width: u32, height: u32 },

    /// The target handle does not refer to a live target.
    #[error("unknown render target {0}")]
    UnknownTarget(u32),

    /// The requested readback region falls outside the target.
    #[error("readback region out of bounds for {width}x{height} target")]
    RegionOutOfBounds { width: u32, height: u32 },

    /// The staging buffer could not be mapped for reading.
    #[error("GPU buffer mapping failed")]
    BufferMapFailed,

    /// A wgpu validation or out-of-memory error was raised.
    #[error("GPU error: {0}")]
    Gpu(String),

    /// Timeout waiting for GPU.
    #[error("timeout waiting for GPU")]
    Timeout,

    /// Image encoding error.
    #[error("image encoding error: {0}")]
    ImageError(#[from] image::ImageError),

    /// Pixel data does not match the declared dimensions.
    #[error("invalid image data")]
    InvalidImageData,
}

/// A specialized Result type for rendering operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;
