//! The per-frame driver: shadow pass, main pass, present.

use glam::Mat4;
use log::{debug, info};

use crate::error::RenderError;
use crate::gpu::GpuContext;
use crate::render_graph::pipelines::PipelineCache;
use crate::render_graph::shadow_pass::{ShadowPass, ShadowSettings, light_matrices};
use crate::render_graph::{FrameSequencer, MainPass, RenderContext, SHADOW_MAP_SLOT};
use crate::scene::Scene;
use crate::uniform_arena::{DEFAULT_ARENA_SIZE, UniformArena};

/// Owns every per-frame GPU resource and records a whole frame.
///
/// ```text
/// Idle ──▶ ShadowPass ──▶ MainPass ──▶ Present ──▶ Idle
///            writes          samples
///          shadow map      shadow map
/// ```
///
/// A [`FrameSequencer`] checks each step, so the shadow map is never a
/// depth target and a shader input at the same time.
pub struct FrameGraph {
    shadow_pass: ShadowPass,
    main_pass: MainPass,
    sequencer: FrameSequencer,
    arena: UniformArena,
    pipelines: PipelineCache,
}

impl FrameGraph {
    pub fn new(gpu: &GpuContext, settings: ShadowSettings) -> Self {
        info!(
            "Frame graph: {0}x{0} shadow map, {1} KiB uniform arena",
            settings.resolution,
            DEFAULT_ARENA_SIZE / 1024
        );
        let pipelines = PipelineCache::new(settings.depth_bias, settings.slope_scale);
        Self {
            shadow_pass: ShadowPass::new(gpu, settings),
            main_pass: MainPass::new(gpu),
            sequencer: FrameSequencer::new(),
            arena: UniformArena::new(gpu, DEFAULT_ARENA_SIZE),
            pipelines,
        }
    }

    /// Match the depth buffer to the surface. Call after the surface resized.
    pub fn resize(&mut self, gpu: &GpuContext) {
        debug!("Frame graph resize to {}x{}", gpu.width(), gpu.height());
        self.main_pass.ensure_size(gpu);
    }

    /// Record, submit and present one frame.
    pub fn render(&mut self, gpu: &GpuContext, scene: &mut Scene) -> Result<(), RenderError> {
        let output = gpu.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.arena.reset();
        self.main_pass.ensure_size(gpu);

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        if let Err(err) = self.record(gpu, &mut encoder, &view, scene) {
            self.release_shadow_map(scene);
            self.sequencer.abort_frame();
            return Err(err);
        }

        let presenting = self.sequencer.begin_present();
        self.release_shadow_map(scene);
        self.sequencer.abort_on_error(presenting)?;

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        let ended = self.sequencer.end_frame();
        self.sequencer.abort_on_error(ended)?;
        Ok(())
    }

    fn record(
        &mut self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        scene: &mut Scene,
    ) -> Result<(), RenderError> {
        let light = scene
            .shadow_caster()
            .map(|caster| light_matrices(caster.direction(), self.shadow_pass.settings()));

        let mut ctx = RenderContext {
            gpu,
            arena: &mut self.arena,
            pipelines: &mut self.pipelines,
        };

        let shadow_map = self.shadow_pass.shadow_map();
        self.sequencer.begin_shadow_pass(shadow_map.id())?;
        self.shadow_pass
            .record(&mut ctx, encoder, &mut scene.entities, light)?;

        self.sequencer.begin_main_pass(self.main_pass.depth().id())?;
        let (light_view, light_projection) = light.unwrap_or((Mat4::IDENTITY, Mat4::IDENTITY));
        self.main_pass.record(
            &mut ctx,
            encoder,
            target,
            &mut self.sequencer,
            scene,
            shadow_map,
            light_view,
            light_projection,
        )
    }

    /// Take the shadow map off every pixel program so the next shadow pass
    /// may write it.
    fn release_shadow_map(&mut self, scene: &Scene) {
        let programs = scene
            .entities
            .iter()
            .map(|entity| entity.material().pixel_shader().as_ref());
        self.sequencer.release_shader_input(
            programs,
            SHADOW_MAP_SLOT,
            self.shadow_pass.shadow_map().id(),
        );
    }
}
