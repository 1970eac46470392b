//! Depth targets and the per-pass execution context.

use crate::gpu::GpuContext;
use crate::render_graph::ResourceId;
use crate::render_graph::pipelines::PipelineCache;
use crate::uniform_arena::UniformArena;

/// Depth format shared by the shadow map and the main depth buffer.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

fn create_depth_texture(
    gpu: &GpuContext,
    label: &str,
    width: u32,
    height: u32,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

/// Square depth texture written by the shadow pass and sampled by the main
/// pass.
pub struct ShadowMap {
    #[allow(dead_code)]
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    id: ResourceId,
}

impl ShadowMap {
    pub fn new(gpu: &GpuContext, resolution: u32) -> Self {
        let (texture, view) = create_depth_texture(gpu, "Shadow Map", resolution, resolution);
        Self {
            texture,
            view,
            id: ResourceId::next(),
        }
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }
}

/// Screen-sized depth buffer for the main pass.
pub struct DepthBuffer {
    #[allow(dead_code)]
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    size: (u32, u32),
    id: ResourceId,
}

impl DepthBuffer {
    pub fn new(gpu: &GpuContext) -> Self {
        let (texture, view) = create_depth_texture(gpu, "Depth Buffer", gpu.width(), gpu.height());
        Self {
            texture,
            view,
            size: (gpu.width(), gpu.height()),
            id: ResourceId::next(),
        }
    }

    /// Recreate the buffer if the surface size changed. The resource id is
    /// kept so the sequencer sees one logical depth buffer.
    pub fn ensure_size(&mut self, gpu: &GpuContext) {
        if self.size != (gpu.width(), gpu.height()) {
            let (texture, view) =
                create_depth_texture(gpu, "Depth Buffer", gpu.width(), gpu.height());
            self.texture = texture;
            self.view = view;
            self.size = (gpu.width(), gpu.height());
        }
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }
}

/// What a pass needs while recording draws.
///
/// Borrowed for the duration of one pass; programs flush into `arena` and
/// pipelines are created on demand in `pipelines`.
pub struct RenderContext<'a> {
    pub gpu: &'a GpuContext,
    pub arena: &'a mut UniformArena,
    pub pipelines: &'a mut PipelineCache,
}
