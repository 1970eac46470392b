//! Lit geometry and sky into the surface.

use std::rc::Rc;

use glam::Mat4;
use log::debug;

use crate::error::RenderError;
use crate::gpu::GpuContext;
use crate::light::MAX_LIGHTS;
use crate::render_graph::{DepthBuffer, FrameSequencer, RenderContext, ShadowMap};
use crate::scene::Scene;
use crate::texture;

/// Pixel program slot the shadow map is sampled from.
pub const SHADOW_MAP_SLOT: &str = "ShadowMap";

pub struct MainPass {
    depth: DepthBuffer,
    shadow_sampler: wgpu::Sampler,
    clear_color: wgpu::Color,
}

impl MainPass {
    pub fn new(gpu: &GpuContext) -> Self {
        Self {
            depth: DepthBuffer::new(gpu),
            shadow_sampler: texture::create_shadow_sampler(gpu),
            clear_color: wgpu::Color::BLACK,
        }
    }

    pub fn depth(&self) -> &DepthBuffer {
        &self.depth
    }

    pub fn ensure_size(&mut self, gpu: &GpuContext) {
        self.depth.ensure_size(gpu);
    }

    /// Stage lights and shadow inputs on each entity's programs, draw it,
    /// then draw the sky.
    #[allow(clippy::too_many_arguments)]
    pub fn record(
        &self,
        ctx: &mut RenderContext<'_>,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        sequencer: &mut FrameSequencer,
        scene: &mut Scene,
        shadow_map: &ShadowMap,
        light_view: Mat4,
        light_projection: Mat4,
    ) -> Result<(), RenderError> {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Main Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear_color),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: self.depth.view(),
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        let light_count = scene.lights.len().min(MAX_LIGHTS);
        if scene.lights.len() > MAX_LIGHTS {
            debug!(
                "{} lights in scene, only the first {MAX_LIGHTS} are shaded",
                scene.lights.len()
            );
        }
        let lights = bytemuck::cast_slice(&scene.lights[..light_count]);

        let ambient = scene.ambient();
        for entity in scene.entities.iter_mut() {
            let material = Rc::clone(entity.material());
            let vs = material.vertex_shader();
            let ps = material.pixel_shader();

            vs.set_matrix4x4("light_view", light_view);
            vs.set_matrix4x4("light_projection", light_projection);

            sequencer.stage_shader_input(
                ps.as_ref(),
                SHADOW_MAP_SLOT,
                shadow_map.view(),
                shadow_map.id(),
            )?;
            ps.set_sampler_state("ShadowSampler", &self.shadow_sampler);
            ps.set_data("lights", lights);
            ps.set_int("light_count", light_count as i32);
            ps.set_float3("ambient_color", ambient);

            entity.draw(ctx, &mut pass, &scene.camera)?;
        }

        if let Some(sky) = &scene.sky {
            sky.draw(ctx, &mut pass, &scene.camera)?;
        }
        Ok(())
    }
}
