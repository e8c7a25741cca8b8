//! # plasma-lab
//!
//! Interactive GPU particle experiments: spawners feeding particle streams,
//! point masses bending them, plasma fields, mouse explosions and
//! "jellyfish rockets".
//!
//! Each experiment is a [`scenes::Scene`] that pairs a small entity-component
//! world (`bevy_ecs`) with a wgpu pipeline. Particles live in flat instance
//! buffers that a compute kernel updates every frame; the same buffers are
//! then drawn as instanced, velocity-aligned quads.
//!
//! ## Quick Start
//!
//! ```ignore
//! use plasma_lab::prelude::*;
//!
//! fn main() -> Result<(), AppError> {
//!     let config = LabConfig {
//!         scene: SceneKind::Plasma,
//!         ..LabConfig::default()
//!     };
//!     plasma_lab::app::run(config)
//! }
//! ```
//!
//! ## The Update Kernel
//!
//! | Step | Behavior |
//! |------|----------|
//! | Attraction | `vel += diff * G / |diff|^1.3 * mass * dt` for every active mass |
//! | Bounce | outward velocity flips with 0.7 damping, position reflects into [-1, 1] |
//! | Integrate | `pos += vel * dt` |
//! | Lifecycle | pending particles count up to birth, expired ones respawn at their spawner |
//!
//! [`kernel`] holds the CPU reference of these steps and [`shaders`] the
//! WGSL that runs them on the GPU.
//!
//! ## Instance Layouts
//!
//! Per-instance GPU records are plain structs deriving [`GpuInstance`]:
//!
//! ```ignore
//! #[derive(GpuInstance, Clone, Copy, Debug, Default)]
//! pub struct MassInstance {
//!     pub pos: Vec2,
//!     pub mass: f32,
//! }
//! ```

extern crate self as plasma_lab;

pub mod app;
pub mod components;
pub mod config;
#[cfg(feature = "egui")]
pub mod controls;
mod error;
pub mod gpu;
pub mod input;
pub mod instance_buffer;
pub mod kernel;
pub mod mass;
pub mod math;
pub mod scenes;
pub mod shader_utils;
pub mod shaders;
pub mod spawner;
pub mod systems;
pub mod time;

pub use bytemuck;
pub use error::{AppError, ConfigError, FrameError, GpuError, InstanceBufferError};
pub use glam::{Vec2, Vec4};
pub use plasma_derive::GpuInstance;

/// Trait implemented by `#[derive(GpuInstance)]`.
///
/// Bridges a Rust instance struct to a GPU record that can be bound both as
/// a storage array (compute kernels) and as a per-instance vertex buffer
/// (quad rendering).
///
/// # Do Not Implement Manually
///
/// The derive macro keeps `Gpu`, `WGSL_STRUCT` and `ATTRIBUTES` in sync;
/// hand-written impls drift.
pub trait GpuInstance: Clone + Send + Sync {
    /// `#[repr(C)]` representation with explicit padding.
    type Gpu: Copy + Clone + bytemuck::Pod + bytemuck::Zeroable + Send + Sync;

    /// Name of the WGSL struct (same as the Rust struct).
    const WGSL_NAME: &'static str;

    /// WGSL struct declaration matching `Gpu` byte for byte.
    const WGSL_STRUCT: &'static str;

    /// Size of one record in bytes, a multiple of 16.
    const SIZE: u32;

    /// One entry per declared field, in declaration order.
    const ATTRIBUTES: &'static [InstanceAttribute];

    fn to_gpu(&self) -> Self::Gpu;

    fn from_gpu(gpu: &Self::Gpu) -> Self;
}

/// Vertex format of a derived instance field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeFormat {
    Float32,
    Float32x2,
    Float32x4,
    Uint32,
}

impl AttributeFormat {
    /// WGSL type used for the matching `@location` input.
    pub fn wgsl_type(self) -> &'static str {
        match self {
            AttributeFormat::Float32 => "f32",
            AttributeFormat::Float32x2 => "vec2<f32>",
            AttributeFormat::Float32x4 => "vec4<f32>",
            AttributeFormat::Uint32 => "u32",
        }
    }

    pub fn to_wgpu(self) -> wgpu::VertexFormat {
        match self {
            AttributeFormat::Float32 => wgpu::VertexFormat::Float32,
            AttributeFormat::Float32x2 => wgpu::VertexFormat::Float32x2,
            AttributeFormat::Float32x4 => wgpu::VertexFormat::Float32x4,
            AttributeFormat::Uint32 => wgpu::VertexFormat::Uint32,
        }
    }
}

/// A single per-instance vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceAttribute {
    pub name: &'static str,
    pub offset: u32,
    pub format: AttributeFormat,
}

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use plasma_lab::prelude::*;
/// ```
pub mod prelude {
    pub use crate::components::{
        Cell, CellState, Drag, Lifetime, Position, Radius, Selected, TrailParticle, Velocity,
    };
    pub use crate::config::LabConfig;
    pub use crate::input::{Input, KeyCode, MouseButton};
    pub use crate::kernel::{DriftInstance, MassInstance, ParticleInstance};
    pub use crate::mass::{Mass, MassTable, MouseForce};
    pub use crate::scenes::{Scene, SceneKind};
    pub use crate::spawner::{InitialVelocity, Spawner};
    pub use crate::time::Time;
    pub use crate::{AppError, GpuInstance, Vec2, Vec4};
    pub use bevy_ecs::prelude::{Entity, World};
    #[cfg(feature = "egui")]
    pub use egui;
}
