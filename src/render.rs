use crate::config::DisplayConfig;
use crate::scene::Scene;
use thiserror::Error;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Values the color and depth attachments are cleared to every frame
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClearValues {
    pub color: wgpu::Color,
    pub depth: f32,
}

impl Default for ClearValues {
    fn default() -> Self {
        Self {
            color: wgpu::Color::BLACK,
            depth: 1.0,
        }
    }
}

impl From<&DisplayConfig> for ClearValues {
    fn from(config: &DisplayConfig) -> Self {
        let [r, g, b, a] = config.clear_color;
        Self {
            color: wgpu::Color { r, g, b, a },
            depth: config.clear_depth,
        }
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("renderer has no surface to present to")]
    NoSurface,
    #[error("renderer has no offscreen target")]
    NoOffscreenTarget,
    #[error("failed to acquire next frame: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    #[error("failed to map readback buffer: {0}")]
    Readback(#[from] wgpu::BufferAsyncError),
    #[error("readback channel closed before the buffer was mapped")]
    ReadbackChannel,
}

#[derive(Debug)]
pub(crate) struct DepthTarget {
    pub(crate) _texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
}

impl DepthTarget {
    pub(crate) fn new(device: &wgpu::Device, (width, height): (u32, u32)) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("orbitgraphs::render::DepthTarget"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            _texture: texture,
            view,
        }
    }
}

/// Color target and readback buffer used instead of a surface
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug)]
pub(crate) struct Offscreen {
    pub(crate) texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub(crate) buffer: wgpu::Buffer,
    pub(crate) padded_bytes_per_row: u32,
}

/// Owns the GPU context and whatever the frames are drawn into
#[derive(Debug)]
pub struct Renderer {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub surface: Option<wgpu::Surface<'static>>,
    pub config: Option<wgpu::SurfaceConfiguration>,
    pub format: wgpu::TextureFormat,
    pub clear: ClearValues,
    pub(crate) size: (u32, u32),
    pub(crate) depth: DepthTarget,
    #[cfg(not(target_arch = "wasm32"))]
    pub(crate) offscreen: Option<Offscreen>,
}

/// Routes wgpu errors nobody captured in an error scope to the log
pub(crate) fn install_error_handler(device: &wgpu::Device) {
    fn unhandled_error(error: wgpu::Error) {
        log::error!("orbitgraphs::render: wgpu unhandled error: {error}");
    }
    device.on_uncaptured_error(Box::new(unhandled_error));
}

impl Renderer {
    /// Physical size of the render target in pixels
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Reconfigures the surface and depth target for a new physical size.
    /// Zero-sized requests (e.g. a minimized window) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            log::debug!("orbitgraphs::render::Renderer::resize: ignoring {width}x{height}");
            return;
        }

        // wgpu minimum surface size is 4x4
        let size = (width.max(4), height.max(4));
        log::info!(
            "orbitgraphs::render::Renderer::resize: resizing to {}x{}",
            size.0,
            size.1
        );

        self.size = size;
        if let Some(config) = self.config.as_mut() {
            config.width = size.0;
            config.height = size.1;
        }
        self.reconfigure();
        self.depth = DepthTarget::new(&self.device, size);
    }

    fn reconfigure(&self) {
        if let (Some(surface), Some(config)) = (self.surface.as_ref(), self.config.as_ref()) {
            surface.configure(&self.device, config);
        }
    }

    /// Records one frame: clears color and depth, sets the viewport to the
    /// whole target and lets the scene issue its draw calls.
    pub(crate) fn encode_frame<S: Scene>(
        &self,
        scene: &mut S,
        view: &wgpu::TextureView,
        label: &str,
    ) -> wgpu::CommandBuffer {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(label),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear.color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear.depth),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let (width, height) = self.size;
            render_pass.set_viewport(0.0, 0.0, width as f32, height as f32, 0.0, 1.0);
            scene.draw(self, &mut render_pass);
        }

        encoder.finish()
    }

    /// Draws one frame of `scene` to the surface and presents it.
    /// A lost or outdated surface is reconfigured and the frame skipped.
    pub fn render<S: Scene>(&mut self, scene: &mut S) -> Result<(), RenderError> {
        let surface = self.surface.as_ref().ok_or(RenderError::NoSurface)?;

        let frame = match surface.get_current_texture() {
            Ok(frame) => frame,
            Err(error @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                log::warn!("orbitgraphs::render::Renderer::render: {error}, reconfiguring surface");
                self.reconfigure();
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("orbitgraphs::render::Renderer::render: frame timed out, skipping");
                return Ok(());
            }
            Err(error) => return Err(error.into()),
        };

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let commands = self.encode_frame(scene, &view, "orbitgraphs::render::Renderer::render");

        self.queue.submit(Some(commands));
        frame.present();
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn clear_values_from_config() {
        let config = DisplayConfig {
            clear_color: [0.1, 0.2, 0.3, 1.0],
            clear_depth: 0.5,
            ..Default::default()
        };

        assert_eq!(
            ClearValues {
                color: wgpu::Color {
                    r: 0.1,
                    g: 0.2,
                    b: 0.3,
                    a: 1.0,
                },
                depth: 0.5,
            },
            ClearValues::from(&config)
        );
    }

    #[test]
    fn default_clear_is_opaque_black() {
        let clear = ClearValues::from(&DisplayConfig::default());
        assert_eq!(ClearValues::default(), clear);
    }
}
