use crate::render::Renderer;
use bytemuck::{Pod, Zeroable};
use std::ops::Range;
use thiserror::Error;
use wgpu::util::DeviceExt;
use wgpu::RenderPass;

pub const POSITION_COMPONENTS: usize = 2;
pub const COLOR_COMPONENTS: usize = 3;
pub const FLOATS_PER_VERTEX: usize = POSITION_COMPONENTS + COLOR_COMPONENTS;

/// Byte distance between consecutive vertices
pub const VERTEX_STRIDE: wgpu::BufferAddress =
    (FLOATS_PER_VERTEX * std::mem::size_of::<f32>()) as wgpu::BufferAddress;
pub const POSITION_OFFSET: wgpu::BufferAddress = 0;
pub const COLOR_OFFSET: wgpu::BufferAddress =
    (POSITION_COMPONENTS * std::mem::size_of::<f32>()) as wgpu::BufferAddress;

/// One interleaved vertex record: (x, y) in NDC then (r, g, b) in [0, 1]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 3],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    Vertex,
    Index,
    Uniform,
}

impl BufferTarget {
    pub fn usage(self) -> wgpu::BufferUsages {
        match self {
            Self::Vertex => wgpu::BufferUsages::VERTEX,
            Self::Index => wgpu::BufferUsages::INDEX,
            Self::Uniform => wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum VertexDataError {
    #[error("vertex data holds {0} floats, which is not a multiple of {FLOATS_PER_VERTEX}")]
    Ragged(usize),
    #[error("vertex arrays need a vertex buffer, got a {0:?} buffer")]
    WrongTarget(BufferTarget),
    #[error("position and color cannot share shader location {0}")]
    SlotCollision(u32),
    #[error("vertex data holds too many vertices to draw: {0}")]
    TooLarge(usize),
}

/// Number of vertices in a flat interleaved float sequence
pub fn vertex_count(data: &[f32]) -> Result<u32, VertexDataError> {
    vertex_count_for_len(data.len())
}

fn vertex_count_for_len(len: usize) -> Result<u32, VertexDataError> {
    if len % FLOATS_PER_VERTEX != 0 {
        return Err(VertexDataError::Ragged(len));
    }

    let count = len / FLOATS_PER_VERTEX;
    u32::try_from(count).map_err(|_| VertexDataError::TooLarge(count))
}

/// Attribute layout for interleaved position/color data
pub fn vertex_attributes(position_slot: u32, color_slot: u32) -> [wgpu::VertexAttribute; 2] {
    [
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x2,
            offset: POSITION_OFFSET,
            shader_location: position_slot,
        },
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x3,
            offset: COLOR_OFFSET,
            shader_location: color_slot,
        },
    ]
}

/// GPU copy of a float sequence. Immutable once created.
#[derive(Debug)]
pub struct GpuBuffer {
    buffer: wgpu::Buffer,
    target: BufferTarget,
    len: usize,
}

/// Allocates a buffer for `target` and uploads `data` into it.
/// This includes calls to the GPU
pub fn create_buffer(
    renderer: &Renderer,
    target: BufferTarget,
    label: Option<&str>,
    data: &[f32],
) -> GpuBuffer {
    log::debug!(
        "orbitgraphs::vertex::create_buffer: uploading {} floats to {target:?} buffer {label:?}",
        data.len()
    );

    let buffer = renderer
        .device
        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label,
            contents: bytemuck::cast_slice(data),
            usage: target.usage(),
        });

    GpuBuffer {
        buffer,
        target,
        len: data.len(),
    }
}

/// A vertex buffer together with the layout describing its bytes
#[derive(Debug)]
pub struct VertexArray {
    buffer: GpuBuffer,
    attributes: [wgpu::VertexAttribute; 2],
    vertex_count: u32,
}

/// Builds a vertex array reading 2 position floats at byte 0 and
/// 3 color floats at byte 8 of every 20-byte record in `buffer`.
pub fn create_vao(
    position_slot: u32,
    color_slot: u32,
    buffer: GpuBuffer,
) -> Result<VertexArray, VertexDataError> {
    if buffer.target != BufferTarget::Vertex {
        return Err(VertexDataError::WrongTarget(buffer.target));
    }

    if position_slot == color_slot {
        return Err(VertexDataError::SlotCollision(position_slot));
    }

    let vertex_count = vertex_count_for_len(buffer.len)?;

    Ok(VertexArray {
        buffer,
        attributes: vertex_attributes(position_slot, color_slot),
        vertex_count,
    })
}

impl VertexArray {
    pub fn layout(&self) -> wgpu::VertexBufferLayout<'_> {
        wgpu::VertexBufferLayout {
            array_stride: VERTEX_STRIDE,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: self.attributes.as_slice(),
        }
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn range(&self) -> Range<u32> {
        0..self.vertex_count
    }

    pub fn bind(&self, render_pass: &mut RenderPass<'_>, slot: u32) {
        render_pass.set_vertex_buffer(slot, self.buffer.buffer.slice(..));
    }
}
