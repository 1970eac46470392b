//! Render pipelines built lazily from shader program pairs.
//!
//! Programs carry their own bind group layouts, so a pipeline is fully
//! determined by which programs it combines and which [`PipelineKind`] of
//! fixed-function state it uses. The cache keys pipelines by program id.

use std::collections::HashMap;

use log::debug;

use crate::gpu::GpuContext;
use crate::mesh::Vertex3d;
use crate::render_graph::render_target::DEPTH_FORMAT;
use crate::shader::{ProgramId, ShaderProgram};

/// Fixed-function state for one kind of pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PipelineKind {
    /// Lit geometry: back faces culled, depth tested and written.
    Main,
    /// Depth-only shadow rendering with slope-scaled bias.
    Shadow { bias: i32, slope: f32 },
    /// Inside-out cube at the far plane.
    Sky,
}

impl PipelineKind {
    pub fn primitive_state(self) -> wgpu::PrimitiveState {
        let cull_mode = match self {
            PipelineKind::Main | PipelineKind::Shadow { .. } => wgpu::Face::Back,
            // The camera sits inside the sky cube.
            PipelineKind::Sky => wgpu::Face::Front,
        };
        wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Cw,
            cull_mode: Some(cull_mode),
            ..Default::default()
        }
    }

    pub fn depth_stencil_state(self) -> wgpu::DepthStencilState {
        let (depth_write_enabled, depth_compare, bias) = match self {
            PipelineKind::Main => (
                true,
                wgpu::CompareFunction::Less,
                wgpu::DepthBiasState::default(),
            ),
            PipelineKind::Shadow { bias, slope } => (
                true,
                wgpu::CompareFunction::Less,
                wgpu::DepthBiasState {
                    constant: bias,
                    slope_scale: slope,
                    clamp: 0.0,
                },
            ),
            // Sky depth is exactly 1.0, so it only passes where nothing was drawn.
            PipelineKind::Sky => (
                false,
                wgpu::CompareFunction::LessEqual,
                wgpu::DepthBiasState::default(),
            ),
        };
        wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled,
            depth_compare,
            stencil: wgpu::StencilState::default(),
            bias,
        }
    }
}

/// Pipelines created on first use and reused for the rest of the run.
#[derive(Default)]
pub struct PipelineCache {
    main: HashMap<(ProgramId, ProgramId), wgpu::RenderPipeline>,
    shadow: HashMap<ProgramId, wgpu::RenderPipeline>,
    sky: HashMap<(ProgramId, ProgramId), wgpu::RenderPipeline>,
    shadow_bias: (i32, f32),
}

impl PipelineCache {
    pub fn new(shadow_bias: i32, shadow_slope: f32) -> Self {
        Self {
            shadow_bias: (shadow_bias, shadow_slope),
            ..Default::default()
        }
    }

    pub fn main_pipeline(
        &mut self,
        gpu: &GpuContext,
        vs: &ShaderProgram,
        ps: &ShaderProgram,
    ) -> &wgpu::RenderPipeline {
        self.main
            .entry((vs.id(), ps.id()))
            .or_insert_with(|| build(gpu, "Main Pipeline", vs, Some(ps), PipelineKind::Main))
    }

    pub fn sky_pipeline(
        &mut self,
        gpu: &GpuContext,
        vs: &ShaderProgram,
        ps: &ShaderProgram,
    ) -> &wgpu::RenderPipeline {
        self.sky
            .entry((vs.id(), ps.id()))
            .or_insert_with(|| build(gpu, "Sky Pipeline", vs, Some(ps), PipelineKind::Sky))
    }

    pub fn shadow_pipeline(&mut self, gpu: &GpuContext, vs: &ShaderProgram) -> &wgpu::RenderPipeline {
        let (bias, slope) = self.shadow_bias;
        self.shadow.entry(vs.id()).or_insert_with(|| {
            build(
                gpu,
                "Shadow Pipeline",
                vs,
                None,
                PipelineKind::Shadow { bias, slope },
            )
        })
    }
}

fn build(
    gpu: &GpuContext,
    label: &str,
    vs: &ShaderProgram,
    ps: Option<&ShaderProgram>,
    kind: PipelineKind,
) -> wgpu::RenderPipeline {
    debug!(
        "Creating {label} for {} + {}",
        vs.label(),
        ps.map_or("(depth only)", |ps| ps.label())
    );

    let mut bind_group_layouts = vec![vs.bind_group_layout()];
    if let Some(ps) = ps {
        bind_group_layouts.push(ps.bind_group_layout());
    }
    let layout = gpu
        .device
        .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &bind_group_layouts,
            push_constant_ranges: &[],
        });

    let targets = [Some(wgpu::ColorTargetState {
        format: gpu.config.format,
        blend: Some(wgpu::BlendState::REPLACE),
        write_mask: wgpu::ColorWrites::ALL,
    })];

    gpu.device
        .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: vs.module(),
                entry_point: Some(vs.stage().entry_point()),
                buffers: &[Vertex3d::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: ps.map(|ps| wgpu::FragmentState {
                module: ps.module(),
                entry_point: Some(ps.stage().entry_point()),
                targets: &targets,
                compilation_options: Default::default(),
            }),
            primitive: kind.primitive_state(),
            depth_stencil: Some(kind.depth_stencil_state()),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
}
