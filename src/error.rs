//! Error types for plasma-lab.
//!
//! GPU initialization, instance buffer capacity, configuration loading and
//! the application run loop each get their own enum; [`AppError`] wraps the
//! ones that can end a run.

use thiserror::Error;

/// Errors that can occur during GPU initialization.
#[derive(Debug, Error)]
pub enum GpuError {
    #[error("failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    #[error("no compatible GPU adapter found; a WebGPU/Vulkan/Metal/DX12 capable GPU is required")]
    NoAdapter,
    #[error("failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
}

/// Errors raised while staging instances for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InstanceBufferError {
    /// A fixed-capacity buffer was asked to hold more instances than it has room for.
    #[error("instance buffer too small: need {needed} but only have {capacity}")]
    CapacityExceeded { needed: usize, capacity: usize },
}

/// Errors that can occur while loading or saving a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown scene '{0}' (expected plasma, plasma-field, mouse-explosions or jellyfish-rockets)")]
    UnknownScene(String),
    #[error("missing value after '{0}'")]
    MissingValue(String),
    #[error("{field} is {count} but the GPU limits allow at most {max}")]
    TooManyParticles {
        field: &'static str,
        count: u32,
        max: u32,
    },
}

/// Per-frame failures. None of them end the run on their own; surface
/// errors are handled inline by the frame loop.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error(transparent)]
    InstanceBuffer(#[from] InstanceBufferError),
}

/// Errors that can end an application run.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_exceeded_message() {
        let err = InstanceBufferError::CapacityExceeded {
            needed: 250,
            capacity: 200,
        };
        assert_eq!(
            err.to_string(),
            "instance buffer too small: need 250 but only have 200"
        );
    }

    #[test]
    fn test_frame_error_is_transparent_for_buffers() {
        let err: FrameError = InstanceBufferError::CapacityExceeded {
            needed: 2,
            capacity: 1,
        }
        .into();
        assert_eq!(err.to_string(), "instance buffer too small: need 2 but only have 1");
    }
}
