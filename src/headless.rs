use crate::config::SceneConfig;
use crate::frame::{FrameLoop, Termination};
use crate::render::{install_error_handler, ClearValues, DepthTarget, Offscreen, RenderError, Renderer};
use crate::scene::{Scene, SceneError};
use crate::GraphicsInitError;
use std::num::NonZeroU64;
use std::path::Path;
use thiserror::Error;

pub const HEADLESS_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
const BYTES_PER_PIXEL: u32 = 4;

#[derive(Debug, Error)]
pub enum HeadlessError {
    #[error("failed to initialize headless renderer: {0}")]
    Init(#[from] GraphicsInitError),
    #[error("failed to build scene: {0}")]
    Scene(#[from] SceneError),
    #[error("failed to render frame: {0}")]
    Render(#[from] RenderError),
}

/// Row pitch of the readback buffer; wgpu requires rows copied out of a
/// texture to be aligned to COPY_BYTES_PER_ROW_ALIGNMENT
pub fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * BYTES_PER_PIXEL;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Creates a renderer that draws into an offscreen RGBA texture
pub async fn init(mut size: (u32, u32), clear: ClearValues) -> Result<Renderer, GraphicsInitError> {
    use GraphicsInitError as HIE;

    log::debug!("orbitgraphs::headless::init: Initializing renderer");

    size.0 = size.0.max(1);
    size.1 = size.1.max(1);

    let instance = wgpu::Instance::default();
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            force_fallback_adapter: false,
            compatible_surface: None,
        })
        .await
        .ok_or(HIE::NoAdapter)?;

    log::debug!("orbitgraphs::headless::init: Requesting rendering device");
    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some("orbitgraphs::headless"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                ..Default::default()
            },
            None,
        )
        .await?;

    log::debug!("orbitgraphs::headless::init: Adding wgpu error handler");
    install_error_handler(&device);

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        size: wgpu::Extent3d {
            width: size.0,
            height: size.1,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: HEADLESS_FORMAT,
        label: Some("orbitgraphs::headless::target"),
        usage: wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    let padded_bytes_per_row = padded_bytes_per_row(size.0);
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        size: padded_bytes_per_row as wgpu::BufferAddress * size.1 as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        label: Some("orbitgraphs::headless::readback"),
        mapped_at_creation: false,
    });

    let depth = DepthTarget::new(&device, size);

    Ok(Renderer {
        instance,
        adapter,
        device,
        queue,
        surface: None,
        config: None,
        format: HEADLESS_FORMAT,
        clear,
        size,
        depth,
        offscreen: Some(Offscreen {
            texture,
            view,
            buffer,
            padded_bytes_per_row,
        }),
    })
}

impl Renderer {
    /// Draws one frame of `scene` into the offscreen texture
    pub fn render_offscreen<S: Scene>(&mut self, scene: &mut S) -> Result<(), RenderError> {
        let offscreen = self
            .offscreen
            .as_ref()
            .ok_or(RenderError::NoOffscreenTarget)?;

        let commands = self.encode_frame(
            scene,
            &offscreen.view,
            "orbitgraphs::headless::Renderer::render_offscreen",
        );
        self.queue.submit(Some(commands));
        Ok(())
    }

    /// Copies the offscreen texture back to the CPU.
    /// Returns tightly packed RGBA8 rows, top row first.
    pub async fn read_frame(&self) -> Result<Vec<u8>, RenderError> {
        let offscreen = self
            .offscreen
            .as_ref()
            .ok_or(RenderError::NoOffscreenTarget)?;
        let (width, height) = self.size;

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("orbitgraphs::headless::Renderer::read_frame"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                aspect: wgpu::TextureAspect::All,
                texture: &offscreen.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            wgpu::ImageCopyBuffer {
                buffer: &offscreen.buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(offscreen.padded_bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(Some(encoder.finish()));

        let buffer_slice = offscreen.buffer.slice(..);
        let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            // the receiver only disappears if read_frame was dropped mid-await
            let _ = tx.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);
        rx.receive().await.ok_or(RenderError::ReadbackChannel)??;

        let row_bytes = (width * BYTES_PER_PIXEL) as usize;
        let mut pixels = Vec::with_capacity(row_bytes * height as usize);
        {
            let data = buffer_slice.get_mapped_range();
            for row in data.chunks(offscreen.padded_bytes_per_row as usize) {
                pixels.extend_from_slice(&row[..row_bytes]);
            }
        }
        offscreen.buffer.unmap();

        Ok(pixels)
    }
}

/// Final frame of a headless run
#[derive(Clone, Debug, PartialEq)]
pub struct HeadlessOutput {
    pub size: (u32, u32),
    pub frames: u64,
    /// RGBA8, row-major, top row first
    pub pixels: Vec<u8>,
}

impl HeadlessOutput {
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.size.0 || y >= self.size.1 {
            return None;
        }

        let start = ((y * self.size.0 + x) * BYTES_PER_PIXEL) as usize;
        let pixel = self.pixels.get(start..start + BYTES_PER_PIXEL as usize)?;
        Some([pixel[0], pixel[1], pixel[2], pixel[3]])
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), image::ImageError> {
        image::save_buffer(
            path,
            &self.pixels,
            self.size.0,
            self.size.1,
            image::ColorType::Rgba8,
        )
    }
}

/// Renders `frames` frames of `T` at the configured logical size without a
/// window and returns the last one.
pub async fn run_headless<T: Scene>(
    config: &SceneConfig,
    frames: NonZeroU64,
) -> Result<HeadlessOutput, HeadlessError> {
    let size = (config.display.width, config.display.height);
    log::info!(
        "orbitgraphs::headless::run_headless: rendering {frames} frames of {} at {}x{}",
        config.simulation.name,
        size.0,
        size.1
    );

    let mut renderer = init(size, ClearValues::from(&config.display)).await?;
    let mut scene = T::new(&renderer, config).await?;

    let mut frame_loop = FrameLoop::new(Termination::AfterFrames(frames));
    let frames = frame_loop.run(|_| renderer.render_offscreen(&mut scene))?;
    let pixels = renderer.read_frame().await?;

    Ok(HeadlessOutput {
        size: renderer.size(),
        frames,
        pixels,
    })
}

/// Small offscreen renderer for tests; `None` when the machine has no adapter
#[cfg(test)]
pub(crate) fn test_renderer() -> Option<Renderer> {
    match pollster::block_on(init((16, 16), ClearValues::default())) {
        Ok(renderer) => Some(renderer),
        Err(GraphicsInitError::NoAdapter) => {
            eprintln!("no GPU adapter available, skipping");
            None
        }
        Err(error) => panic!("failed to create test renderer: {error}"),
    }
}
