use orbitgraphs::prelude::*;
use orbitgraphs_macros::scene_main;

const VERTEX_SHADER: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/res/kitten.vert.wgsl"));
const FRAGMENT_SHADER: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/res/kitten.frag.wgsl"));

/// Shader locations of the vertex attributes, matching kitten.vert.wgsl
const POSITION_LOCATION: u32 = 0;
const COLOR_LOCATION: u32 = 1;

/// Interleaved (x, y, r, g, b) records, three per triangle
#[rustfmt::skip]
const MODEL: [f32; 105] = [
    // red
    0.1, 0.8,   1.0, 0.0, 0.0,
    0.1, 0.9,   1.0, 0.0, 0.0,
    0.25, 0.8,  1.0, 0.0, 0.0,

    // green
    0.25, 0.8,  0.0, 1.0, 0.0,
    0.4, 0.9,   0.0, 1.0, 0.0,
    0.4, 0.8,   0.0, 1.0, 0.0,

    // blue
    0.1, 0.5,   0.0, 0.0, 1.0,
    0.4, 0.8,   0.0, 0.0, 1.0,
    0.1, 0.8,   0.0, 0.0, 1.0,

    0.1, 0.5,   0.0, 0.0, 1.0,
    0.4, 0.5,   0.0, 0.0, 1.0,
    0.4, 0.8,   0.0, 0.0, 1.0,

    // magenta
    0.4, 0.1,   1.0, 0.0, 1.0,
    0.8, 0.5,   1.0, 0.0, 1.0,
    0.4, 0.5,   1.0, 0.0, 1.0,

    0.4, 0.1,   1.0, 0.0, 1.0,
    0.8, 0.1,   1.0, 0.0, 1.0,
    0.8, 0.5,   1.0, 0.0, 1.0,

    // cyan
    0.8, 0.1,   0.0, 1.0, 1.0,
    0.9, 0.1,   0.0, 1.0, 1.0,
    0.8, 0.3,   0.0, 1.0, 1.0,
];

/// The figure's geometry
pub fn load_model() -> &'static [f32] {
    &MODEL
}

pub struct KittenScene {
    program: Program,
    vertices: VertexArray,
    transform: Uniform<Mat4>,
    motion: Motion,
}

impl KittenScene {
    /// Advances the orbit by one frame and returns the new model matrix
    pub fn object_transformation(&mut self) -> Mat4 {
        self.motion.next_transform()
    }
}

impl Scene for KittenScene {
    async fn new(renderer: &Renderer, config: &SceneConfig) -> Result<Self, SceneError> {
        let vertex_shader = compile_shader(
            renderer,
            ShaderStage::Vertex,
            Some("kitten::KittenScene::vertex"),
            VERTEX_SHADER,
        )
        .await?;
        let fragment_shader = compile_shader(
            renderer,
            ShaderStage::Fragment,
            Some("kitten::KittenScene::fragment"),
            FRAGMENT_SHADER,
        )
        .await?;

        let model = load_model();
        let buffer = create_buffer(
            renderer,
            BufferTarget::Vertex,
            Some("kitten::KittenScene::model"),
            model,
        );
        let vertices = create_vao(POSITION_LOCATION, COLOR_LOCATION, buffer)?;

        let transform = Uniform::new(
            renderer,
            Some("kitten::KittenScene::transform"),
            ShaderStages::VERTEX,
            Mat4::IDENTITY,
        );

        let program = link_program(
            renderer,
            Some("kitten::KittenScene"),
            &vertex_shader,
            &fragment_shader,
            &vertices,
            &[transform.bind_group_layout()],
        )
        .await?;

        log::info!(
            "kitten::KittenScene::new: {} vertices, {} triangles",
            vertices.vertex_count(),
            vertices.vertex_count() / 3
        );

        Ok(Self {
            program,
            vertices,
            transform,
            motion: Motion::new(config.orbit),
        })
    }

    fn draw(&mut self, renderer: &Renderer, render_pass: &mut RenderPass<'_>) {
        self.program.bind(render_pass);
        self.vertices.bind(render_pass, 0);

        let transform = self.object_transformation();
        self.transform.update(renderer, transform);
        self.transform.bind(render_pass, 0);

        render_pass.draw(self.vertices.range(), 0..1);
    }
}

scene_main! { "/res/kitten.toml", KittenScene }
