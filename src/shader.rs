//! Shader compilation and program linking.
//!
//! wgpu reports invalid WGSL and mismatched stage interfaces as validation
//! errors rather than return values, so both operations run inside a
//! validation error scope and turn whatever it captured into a [`ShaderError`].

use crate::render::{Renderer, DEPTH_FORMAT};
use crate::vertex::VertexArray;
use std::fmt;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    /// Entry point every shader of this stage must define
    pub fn entry_point(self) -> &'static str {
        match self {
            Self::Vertex => "vs_main",
            Self::Fragment => "fs_main",
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => write!(f, "vertex"),
            Self::Fragment => write!(f, "fragment"),
        }
    }
}

#[derive(Clone, Debug, Error)]
pub enum ShaderError {
    #[error("failed to compile {stage} shader {label:?}:\n{diagnostics}")]
    Compile {
        stage: ShaderStage,
        label: Option<String>,
        diagnostics: String,
    },
    #[error("expected a {expected} shader but got a {found} shader")]
    StageMismatch {
        expected: ShaderStage,
        found: ShaderStage,
    },
    #[error("failed to link program {label:?}: {diagnostics}")]
    Link {
        label: Option<String>,
        diagnostics: String,
    },
}

/// A compiled shader for a single pipeline stage
#[derive(Debug)]
pub struct Shader {
    module: wgpu::ShaderModule,
    stage: ShaderStage,
    label: Option<String>,
}

impl Shader {
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn expect_stage(&self, expected: ShaderStage) -> Result<(), ShaderError> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(ShaderError::StageMismatch {
                expected,
                found: self.stage,
            })
        }
    }
}

fn format_message(message: &wgpu::CompilationMessage) -> String {
    match &message.location {
        Some(location) => format!(
            "{}:{}: {}",
            location.line_number, location.line_position, message.message
        ),
        None => message.message.clone(),
    }
}

/// Compiles WGSL `source` for `stage`.
/// Fails with the compiler diagnostics if the source is invalid.
pub async fn compile_shader(
    renderer: &Renderer,
    stage: ShaderStage,
    label: Option<&str>,
    source: &str,
) -> Result<Shader, ShaderError> {
    log::debug!("orbitgraphs::shader::compile_shader: compiling {stage} shader {label:?}");

    renderer
        .device
        .push_error_scope(wgpu::ErrorFilter::Validation);
    let module = renderer
        .device
        .create_shader_module(wgpu::ShaderModuleDescriptor {
            label,
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
    let info = module.get_compilation_info().await;
    let scope = renderer.device.pop_error_scope().await;

    let errors: Vec<String> = info
        .messages
        .iter()
        .filter(|message| matches!(message.message_type, wgpu::CompilationMessageType::Error))
        .map(format_message)
        .collect();

    let diagnostics = if !errors.is_empty() {
        Some(errors.join("\n"))
    } else {
        scope.map(|error| error.to_string())
    };

    if let Some(diagnostics) = diagnostics {
        let error = ShaderError::Compile {
            stage,
            label: label.map(ToOwned::to_owned),
            diagnostics,
        };
        log::error!("orbitgraphs::shader::compile_shader: {error}");
        return Err(error);
    }

    Ok(Shader {
        module,
        stage,
        label: label.map(ToOwned::to_owned),
    })
}

/// A linked vertex + fragment pipeline
#[derive(Debug)]
pub struct Program {
    pipeline: wgpu::RenderPipeline,
}

impl Program {
    pub fn bind(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_pipeline(&self.pipeline);
    }
}

// Builder for a Program
// Draws a triangle list with no culling; no vertex buffers by default
pub struct ProgramBuilder<'a> {
    label: Option<&'a str>,
    vertex_buffers: Vec<wgpu::VertexBufferLayout<'a>>,
    bind_group_layouts: Vec<&'a wgpu::BindGroupLayout>,
}

impl Default for ProgramBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> ProgramBuilder<'a> {
    pub fn new() -> Self {
        Self {
            label: None,
            vertex_buffers: vec![],
            bind_group_layouts: vec![],
        }
    }

    pub fn with_label(mut self, label: Option<&'a str>) -> Self {
        self.label = label;
        self
    }

    /// Append a vertex buffer layout; its index is the slot passed to set_vertex_buffer
    pub fn with_vertex_buffer(mut self, layout: wgpu::VertexBufferLayout<'a>) -> Self {
        self.vertex_buffers.push(layout);
        self
    }

    /// Append BindGroupLayouts; each one's index is its group index in the shader
    pub fn with_bind_group_layouts(mut self, layouts: &[&'a wgpu::BindGroupLayout]) -> Self {
        self.bind_group_layouts.extend_from_slice(layouts);
        self
    }

    /// Links `vertex` and `fragment` into a pipeline that renders into the
    /// renderer's color format and depth target.
    pub async fn link(
        self,
        renderer: &Renderer,
        vertex: &Shader,
        fragment: &Shader,
    ) -> Result<Program, ShaderError> {
        let Self {
            label,
            vertex_buffers,
            bind_group_layouts,
        } = self;

        vertex.expect_stage(ShaderStage::Vertex)?;
        fragment.expect_stage(ShaderStage::Fragment)?;

        log::debug!(
            "orbitgraphs::shader::ProgramBuilder::link: linking {:?} with {:?}",
            vertex.label(),
            fragment.label()
        );

        renderer
            .device
            .push_error_scope(wgpu::ErrorFilter::Validation);

        let layout = renderer
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label,
                bind_group_layouts: bind_group_layouts.as_slice(),
                push_constant_ranges: &[],
            });

        let targets = [Some(wgpu::ColorTargetState {
            format: renderer.format,
            blend: Some(wgpu::BlendState::REPLACE),
            write_mask: wgpu::ColorWrites::ALL,
        })];

        let pipeline = renderer
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label,
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &vertex.module,
                    entry_point: Some(ShaderStage::Vertex.entry_point()),
                    compilation_options: Default::default(),
                    buffers: vertex_buffers.as_slice(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &fragment.module,
                    entry_point: Some(ShaderStage::Fragment.entry_point()),
                    compilation_options: Default::default(),
                    targets: &targets,
                }),
                primitive: wgpu::PrimitiveState::default(),
                // cleared every frame but never tested against
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: false,
                    depth_compare: wgpu::CompareFunction::Always,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });

        if let Some(error) = renderer.device.pop_error_scope().await {
            let error = ShaderError::Link {
                label: label.map(ToOwned::to_owned),
                diagnostics: error.to_string(),
            };
            log::error!("orbitgraphs::shader::ProgramBuilder::link: {error}");
            return Err(error);
        }

        Ok(Program { pipeline })
    }
}

/// Links a program whose single vertex buffer is `vertex_array` and whose
/// bind groups are `bind_group_layouts`, in order.
pub async fn link_program(
    renderer: &Renderer,
    label: Option<&str>,
    vertex: &Shader,
    fragment: &Shader,
    vertex_array: &VertexArray,
    bind_group_layouts: &[&wgpu::BindGroupLayout],
) -> Result<Program, ShaderError> {
    ProgramBuilder::new()
        .with_label(label)
        .with_vertex_buffer(vertex_array.layout())
        .with_bind_group_layouts(bind_group_layouts)
        .link(renderer, vertex, fragment)
        .await
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::headless::test_renderer;
    use crate::vertex::{vertex_attributes, VERTEX_STRIDE};

    const VERTEX: &str = r#"
        struct VertexOutput {
            @builtin(position) clip_position: vec4<f32>,
            @location(0) color: vec3<f32>,
        }

        @vertex
        fn vs_main(@location(0) position: vec2<f32>, @location(1) color: vec3<f32>) -> VertexOutput {
            var out: VertexOutput;
            out.clip_position = vec4<f32>(position, 0.0, 1.0);
            out.color = color;
            return out;
        }
    "#;

    const FRAGMENT: &str = r#"
        @fragment
        fn fs_main(@location(0) color: vec3<f32>) -> @location(0) vec4<f32> {
            return vec4<f32>(color, 1.0);
        }
    "#;

    // reads a location the vertex stage above never writes
    const FRAGMENT_UNMATCHED: &str = r#"
        @fragment
        fn fs_main(@location(3) normal: vec3<f32>) -> @location(0) vec4<f32> {
            return vec4<f32>(normal, 1.0);
        }
    "#;

    fn compile(renderer: &Renderer, stage: ShaderStage, source: &str) -> Result<Shader, ShaderError> {
        pollster::block_on(compile_shader(renderer, stage, Some("test"), source))
    }

    fn link(renderer: &Renderer, vertex: &Shader, fragment: &Shader) -> Result<Program, ShaderError> {
        let attributes = vertex_attributes(0, 1);
        let layout = wgpu::VertexBufferLayout {
            array_stride: VERTEX_STRIDE,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &attributes,
        };

        pollster::block_on(
            ProgramBuilder::new()
                .with_label(Some("test"))
                .with_vertex_buffer(layout)
                .link(renderer, vertex, fragment),
        )
    }

    #[test]
    fn valid_pair_links() {
        let Some(renderer) = test_renderer() else {
            return;
        };

        let vertex = compile(&renderer, ShaderStage::Vertex, VERTEX).unwrap();
        let fragment = compile(&renderer, ShaderStage::Fragment, FRAGMENT).unwrap();

        assert_eq!(ShaderStage::Vertex, vertex.stage());
        assert_eq!(Some("test"), vertex.label());
        assert!(link(&renderer, &vertex, &fragment).is_ok());
    }

    #[test]
    fn invalid_source_fails_to_compile() {
        let Some(renderer) = test_renderer() else {
            return;
        };

        match compile(&renderer, ShaderStage::Vertex, "@vertex fn vs_main( -> {") {
            Err(ShaderError::Compile {
                stage,
                label,
                diagnostics,
            }) => {
                assert_eq!(ShaderStage::Vertex, stage);
                assert_eq!(Some("test".to_owned()), label);
                assert!(!diagnostics.is_empty());
            }
            other => panic!("expected a compile error, got {other:?}"),
        }
    }

    #[test]
    fn unmatched_interface_fails_to_link() {
        let Some(renderer) = test_renderer() else {
            return;
        };

        let vertex = compile(&renderer, ShaderStage::Vertex, VERTEX).unwrap();
        let fragment = compile(&renderer, ShaderStage::Fragment, FRAGMENT_UNMATCHED).unwrap();

        match link(&renderer, &vertex, &fragment) {
            Err(ShaderError::Link { label, diagnostics }) => {
                assert_eq!(Some("test".to_owned()), label);
                assert!(!diagnostics.is_empty());
            }
            other => panic!("expected a link error, got {other:?}"),
        }
    }

    #[test]
    fn swapped_stages_fail_to_link() {
        let Some(renderer) = test_renderer() else {
            return;
        };

        let vertex = compile(&renderer, ShaderStage::Vertex, VERTEX).unwrap();
        let fragment = compile(&renderer, ShaderStage::Fragment, FRAGMENT).unwrap();

        assert!(matches!(
            link(&renderer, &fragment, &vertex),
            Err(ShaderError::StageMismatch {
                expected: ShaderStage::Vertex,
                found: ShaderStage::Fragment,
            })
        ));
    }

    #[test]
    fn entry_points() {
        assert_eq!("vs_main", ShaderStage::Vertex.entry_point());
        assert_eq!("fs_main", ShaderStage::Fragment.entry_point());
    }

    #[test]
    fn compile_error_names_stage() {
        let error = ShaderError::Compile {
            stage: ShaderStage::Fragment,
            label: Some("kitten".to_owned()),
            diagnostics: "3:5: unknown type".to_owned(),
        };

        let message = error.to_string();
        assert!(message.starts_with("failed to compile fragment shader"));
        assert!(message.ends_with("3:5: unknown type"));
    }

    #[test]
    fn stage_mismatch_message() {
        let error = ShaderError::StageMismatch {
            expected: ShaderStage::Vertex,
            found: ShaderStage::Fragment,
        };

        assert_eq!(
            "expected a vertex shader but got a fragment shader",
            error.to_string()
        );
    }
}
