use crate::config::SceneConfig;
use crate::render::Renderer;
use crate::shader::ShaderError;
use crate::vertex::VertexDataError;
use thiserror::Error;

#[derive(Clone, Debug, Error)]
pub enum SceneError {
    #[error(transparent)]
    Shader(#[from] ShaderError),
    #[error(transparent)]
    VertexData(#[from] VertexDataError),
}

/// Something the driver can build once and then draw every frame
pub trait Scene: Sized + 'static {
    /// Creates every GPU resource the scene needs.
    /// Called once, after the renderer exists.
    #[allow(async_fn_in_trait)]
    async fn new(renderer: &Renderer, config: &SceneConfig) -> Result<Self, SceneError>;

    /// Issues this frame's draw calls into an already-cleared render pass
    fn draw(&mut self, renderer: &Renderer, render_pass: &mut wgpu::RenderPass<'_>);
}
