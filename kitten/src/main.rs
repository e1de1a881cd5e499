#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    kitten::scene_main()
}

// the browser build starts from `sceneMain` in the generated bindings
#[cfg(target_arch = "wasm32")]
fn main() {}
