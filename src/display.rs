use crate::{
    config::SceneConfig,
    render::{install_error_handler, ClearValues, DepthTarget, Renderer},
    GraphicsInitError,
};
use std::sync::Arc;
use winit::window::Window;

/// Creates a renderer presenting to `window`.
/// The surface takes the window's physical size, which is the configured
/// logical size scaled by the display's pixel ratio.
pub async fn init(window: Arc<Window>, config: &SceneConfig) -> Result<Renderer, GraphicsInitError> {
    log::debug!("orbitgraphs::display::init: Initializing display");

    let mut size = window.inner_size();
    // wgpu minimum surface size is 4x4
    size.width = size.width.max(4);
    size.height = size.height.max(4);

    log::debug!(
        "orbitgraphs::display::init: Creating {}x{} surface (scale factor {})",
        size.width,
        size.height,
        window.scale_factor()
    );
    let instance = wgpu::Instance::default();
    let surface = instance.create_surface(window.clone())?;
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            force_fallback_adapter: false,
            compatible_surface: Some(&surface),
        })
        .await
        .ok_or(GraphicsInitError::NoAdapter)?;

    log::debug!("orbitgraphs::display::init: Requesting rendering device");
    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some("orbitgraphs::display"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                ..Default::default()
            },
            None,
        )
        .await?;

    log::debug!("orbitgraphs::display::init: Adding wgpu error handler");
    install_error_handler(&device);

    let capabilities = surface.get_capabilities(&adapter);
    let format = capabilities
        .formats
        .iter()
        .copied()
        .find(wgpu::TextureFormat::is_srgb)
        .or_else(|| capabilities.formats.first().copied())
        .ok_or(GraphicsInitError::IncompatibleSurface)?;
    let alpha_mode = capabilities
        .alpha_modes
        .first()
        .copied()
        .unwrap_or(wgpu::CompositeAlphaMode::Auto);

    let surface_config = wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width: size.width,
        height: size.height,
        present_mode: wgpu::PresentMode::Fifo,
        alpha_mode,
        view_formats: vec![],
        desired_maximum_frame_latency: 2,
    };

    log::debug!("orbitgraphs::display::init: configuring surface");
    surface.configure(&device, &surface_config);

    log::info!(
        "orbitgraphs::display::init: surface configured: {}x{} {format:?}",
        size.width,
        size.height
    );

    let depth = DepthTarget::new(&device, (size.width, size.height));

    Ok(Renderer {
        instance,
        adapter,
        device,
        queue,
        surface: Some(surface),
        config: Some(surface_config),
        format,
        clear: ClearValues::from(&config.display),
        size: (size.width, size.height),
        depth,
        #[cfg(not(target_arch = "wasm32"))]
        offscreen: None,
    })
}
