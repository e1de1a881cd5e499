use core::future::Future;
use wasm_bindgen::JsCast;

use crate::{app::run_app, config::SceneConfig, frame::Termination, scene::Scene};

/// Id of the page canvas the scene draws into; created if missing
pub const CANVAS_ID: &str = "glcanvas";

fn init_platform() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        log::warn!("orbitgraphs::wasm::init_platform: logger already initialized");
    }
}

pub fn block_on<F: Future<Output = ()> + 'static>(fut: F) {
    wasm_bindgen_futures::spawn_local(fut);
}

pub(crate) fn find_canvas() -> Option<web_sys::HtmlCanvasElement> {
    web_sys::window()?
        .document()?
        .get_element_by_id(CANVAS_ID)?
        .dyn_into()
        .ok()
}

/// Browser entry point. Runs until the page goes away.
pub fn scene_main<T: Scene>(embedded_config: &str) {
    init_platform();

    let config = match SceneConfig::new(embedded_config) {
        Ok(config) => config,
        Err(error) => {
            log::error!("orbitgraphs::scene_main: built-in scene configuration is invalid: {error}");
            return;
        }
    };

    if let Err(error) = run_app::<T>(config, Termination::Never) {
        log::error!("orbitgraphs::scene_main: {error}");
    }
}
