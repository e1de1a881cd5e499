use crate::{
    block_on,
    config::SceneConfig,
    frame::{FrameLoop, FrameStats, LoopControl, Termination},
    render::{RenderError, Renderer},
    scene::{Scene, SceneError},
    GraphicsInitError,
};
use std::sync::Arc;
use thiserror::Error;
use web_time::Instant;
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    error::{EventLoopError, OsError},
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::{Window, WindowAttributes, WindowId},
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("event loop failed: {0}")]
    EventLoop(#[from] EventLoopError),
    #[error("failed to create window: {0}")]
    Window(#[from] OsError),
    #[error("failed to initialize graphics: {0}")]
    Graphics(#[from] GraphicsInitError),
    #[error("failed to build scene: {0}")]
    Scene(#[from] SceneError),
    #[error("failed to render frame: {0}")]
    Render(#[from] RenderError),
}

/// Everything that exists once the window has a renderer and a scene
pub struct AppWindow<T: Scene> {
    window: Arc<Window>,
    renderer: Renderer,
    scene: T,
}

impl<T: Scene> AppWindow<T> {
    async fn new(window: Arc<Window>, config: &SceneConfig) -> Result<Self, AppError> {
        let renderer = crate::display::init(window.clone(), config).await?;

        log::debug!("orbitgraphs::app::AppWindow::new: Building scene");
        let scene = T::new(&renderer, config).await?;

        Ok(Self {
            window,
            renderer,
            scene,
        })
    }
}

/// Results of asynchronous initialization, delivered through the event loop
pub enum AppEvent<T: Scene> {
    Ready(Box<AppWindow<T>>),
    Failed(AppError),
}

/// Driver state that outlives any single window
#[derive(Debug)]
pub struct AppContext {
    pub config: SceneConfig,
    pub frame_loop: FrameLoop,
    pub stats: FrameStats,
}

impl AppContext {
    pub fn new(config: SceneConfig, termination: Termination) -> Self {
        Self {
            config,
            frame_loop: FrameLoop::new(termination),
            stats: FrameStats::default(),
        }
    }
}

pub struct App<T: Scene> {
    context: AppContext,
    proxy: EventLoopProxy<AppEvent<T>>,
    window: Option<AppWindow<T>>,
    initializing: bool,
    failure: Option<AppError>,
}

impl<T: Scene> App<T> {
    pub fn new(context: AppContext, proxy: EventLoopProxy<AppEvent<T>>) -> Self {
        Self {
            context,
            proxy,
            window: None,
            initializing: false,
            failure: None,
        }
    }

    /// The error that ended the loop, if any
    pub fn into_failure(self) -> Option<AppError> {
        self.failure
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: AppError) {
        log::error!("orbitgraphs::app::App: {error}");
        self.context.frame_loop.terminate();
        self.failure = Some(error);
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(AppWindow {
            window,
            renderer,
            scene,
        }) = self.window.as_mut()
        else {
            return;
        };

        if self.context.frame_loop.is_terminated() {
            return;
        }

        if let Err(error) = renderer.render(scene) {
            self.fail(event_loop, error.into());
            return;
        }

        if let Some(fps) = self.context.stats.record(Instant::now()) {
            log::debug!("orbitgraphs::app::App::redraw: {fps:.1} frames per second");
        }

        match self.context.frame_loop.advance() {
            LoopControl::Continue => window.request_redraw(),
            LoopControl::Exit => {
                log::info!(
                    "orbitgraphs::app::App::redraw: Finished after {} frames",
                    self.context.frame_loop.frames()
                );
                event_loop.exit();
            }
        }
    }
}

fn base_window_attributes(config: &SceneConfig) -> WindowAttributes {
    Window::default_attributes()
        .with_title(config.simulation.name.as_str())
        .with_inner_size(LogicalSize::new(config.display.width, config.display.height))
        .with_resizable(false)
}

#[cfg(target_arch = "wasm32")]
fn make_window_attributes(config: &SceneConfig) -> WindowAttributes {
    use winit::platform::web::WindowAttributesExtWebSys;

    match crate::wasm::find_canvas() {
        Some(canvas) => base_window_attributes(config).with_canvas(Some(canvas)),
        None => base_window_attributes(config).with_append(true),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn make_window_attributes(config: &SceneConfig) -> WindowAttributes {
    base_window_attributes(config)
}

impl<T: Scene> ApplicationHandler<AppEvent<T>> for App<T> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.initializing {
            return;
        }

        log::debug!("orbitgraphs::app::App::resumed: Creating window");
        let window = match event_loop.create_window(make_window_attributes(&self.context.config)) {
            Ok(window) => Arc::new(window),
            Err(error) => {
                self.fail(event_loop, error.into());
                return;
            }
        };

        #[cfg(target_arch = "wasm32")]
        {
            use winit::platform::web::WindowExtWebSys;
            if let Some(canvas) = window.canvas() {
                canvas.set_id(crate::wasm::CANVAS_ID);
            }
        }

        self.initializing = true;
        let proxy = self.proxy.clone();
        let config = self.context.config.clone();

        block_on(async move {
            let event = match AppWindow::new(window, &config).await {
                Ok(app_window) => AppEvent::Ready(Box::new(app_window)),
                Err(error) => AppEvent::Failed(error),
            };

            if proxy.send_event(event).is_err() {
                log::warn!("orbitgraphs::app::App::resumed: event loop closed during initialization");
            }
        });
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: AppEvent<T>) {
        self.initializing = false;

        match event {
            AppEvent::Ready(app_window) => {
                log::info!(
                    "orbitgraphs::app::App::user_event: {} ready",
                    self.context.config.simulation.name
                );
                app_window.window.request_redraw();
                self.window = Some(*app_window);
            }
            AppEvent::Failed(error) => self.fail(event_loop, error),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                log::info!("orbitgraphs::app::App::window_event: Handling window resize event");

                if let Some(app_window) = self.window.as_mut() {
                    app_window.renderer.resize(width, height);
                    app_window.window.request_redraw();
                }
            }
            WindowEvent::CloseRequested => {
                log::info!("orbitgraphs::app::App::window_event: Exit requested");
                self.context.frame_loop.terminate();
                event_loop.exit();
            }
            _ => (),
        }
    }
}

/// Opens a window and draws `T` every display refresh until the window is
/// closed or `termination` says otherwise.
/// In the browser this returns immediately and the loop keeps running.
pub fn run_app<T: Scene>(config: SceneConfig, termination: Termination) -> Result<(), AppError> {
    let event_loop = EventLoop::<AppEvent<T>>::with_user_event().build()?;
    let app = App::new(
        AppContext::new(config, termination),
        event_loop.create_proxy(),
    );

    #[cfg(not(target_arch = "wasm32"))]
    {
        let mut app = app;
        event_loop.run_app(&mut app)?;
        app.into_failure().map_or(Ok(()), Err)
    }

    #[cfg(target_arch = "wasm32")]
    {
        use winit::platform::web::EventLoopExtWebSys;
        event_loop.spawn_app(app);
        Ok(())
    }
}
