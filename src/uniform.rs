use crate::render::Renderer;
use bytemuck::NoUninit;
use std::ops::Deref;
use wgpu::util::{BufferInitDescriptor, DeviceExt};
use wgpu::RenderPass;

/// A single shader constant bound at binding 0 of its own bind group.
/// The layout and bind group are built once; only the buffer contents change.
pub struct Uniform<T: NoUninit> {
    buffer: wgpu::Buffer,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    data: T,
}

impl<T: NoUninit> Uniform<T> {
    /// Creates the buffer, layout and bind group and uploads `data`.
    /// This includes calls to the GPU
    pub fn new(
        renderer: &Renderer,
        label: Option<&str>,
        visibility: wgpu::ShaderStages,
        data: T,
    ) -> Self {
        let bind_group_layout =
            renderer
                .device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label,
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    }],
                });

        let buffer = renderer.device.create_buffer_init(&BufferInitDescriptor {
            label,
            contents: bytemuck::bytes_of(&data),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = renderer
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label,
                layout: &bind_group_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            });

        Self {
            buffer,
            bind_group_layout,
            bind_group,
            data,
        }
    }

    /// Get the bind group layout (useful for linking programs)
    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    pub fn bind(&self, render_pass: &mut RenderPass<'_>, index: u32) {
        render_pass.set_bind_group(index, &self.bind_group, &[]);
    }
}

impl<T: NoUninit + PartialEq> Uniform<T> {
    /// Update the uniform value
    /// Buffers data to the GPU only when the value changed
    pub fn update(&mut self, renderer: &Renderer, value: T) {
        if value == self.data {
            return;
        }

        self.data = value;
        renderer
            .queue
            .write_buffer(&self.buffer, 0, bytemuck::bytes_of(&self.data));
    }
}

impl<T: NoUninit> AsRef<T> for Uniform<T> {
    fn as_ref(&self) -> &T {
        &self.data
    }
}

impl<T: NoUninit> Deref for Uniform<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.as_ref()
    }
}
