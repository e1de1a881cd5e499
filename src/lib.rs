use thiserror::Error;

pub mod app;
pub mod config;
pub mod display;
pub mod frame;
#[cfg(not(target_arch = "wasm32"))]
pub mod headless;
pub mod render;
pub mod scene;
pub mod shader;
pub mod transform;
pub mod uniform;
pub mod vertex;

#[derive(Clone, Debug, Error)]
pub enum GraphicsInitError {
    #[error("failed to find adapter for WGPU instance")]
    NoAdapter,
    #[error("WGPU failed to request device: {0}")]
    NoDevice(#[from] wgpu::RequestDeviceError),
    #[error("WGPU failed to create surface: {0}")]
    NoSurface(#[from] wgpu::CreateSurfaceError),
    #[error("surface reports no supported texture formats for this adapter")]
    IncompatibleSurface,
}

#[cfg(not(target_arch = "wasm32"))]
mod cli;

pub mod prelude {
    pub use crate::config::SceneConfig;
    pub use crate::render::{ClearValues, Renderer};
    pub use crate::scene::{Scene, SceneError};
    pub use crate::shader::{
        compile_shader, link_program, Program, ProgramBuilder, Shader, ShaderError, ShaderStage,
    };
    pub use crate::transform::{compute_transform, orbit_position, Motion, Orbit};
    pub use crate::uniform::Uniform;
    pub use crate::vertex::{
        create_buffer, create_vao, BufferTarget, GpuBuffer, Vertex, VertexArray, VertexDataError,
    };

    pub use bytemuck;
    pub use glam::{Mat4, Vec2};
    pub use wgpu::{self, RenderPass, ShaderStages};
}

#[cfg(not(target_arch = "wasm32"))]
mod linux;
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::*;

#[cfg(not(target_arch = "wasm32"))]
pub use linux::*;
