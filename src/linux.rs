use anyhow::Context;
use core::future::Future;

use crate::{
    app::run_app, cli::parse_cli, config::SceneConfig, headless::run_headless, scene::Scene,
};

fn init_platform() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

pub fn block_on<F: Future<Output = ()> + 'static>(fut: F) {
    pollster::block_on(fut);
}

/// Native entry point: parses the command line, then either opens a window
/// or renders headless to a PNG.
/// `embedded_config` is the scene's built-in TOML configuration.
pub fn scene_main<T: Scene>(embedded_config: &str) -> anyhow::Result<()> {
    init_platform();

    let embedded =
        SceneConfig::new(embedded_config).context("built-in scene configuration is invalid")?;
    let args = parse_cli(
        &embedded.simulation.name,
        embedded.simulation.description.as_deref(),
    );

    let config = match args.config.as_ref() {
        Some(path) => SceneConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => embedded,
    };

    if let Some(headless) = args.headless {
        let output = pollster::block_on(run_headless::<T>(&config, headless.frames))?;
        output
            .save(&headless.out_file)
            .with_context(|| format!("failed to write {}", headless.out_file.display()))?;

        log::info!(
            "orbitgraphs::scene_main: wrote frame {} to {}",
            output.frames,
            headless.out_file.display()
        );
        return Ok(());
    }

    run_app::<T>(config, args.termination())?;
    Ok(())
}
