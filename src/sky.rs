//! Cube-mapped sky drawn after the opaque geometry.

use glam::{Vec3, Vec4};

use crate::camera::Camera;
use crate::error::RenderError;
use crate::gpu::GpuContext;
use crate::mesh::Mesh;
use crate::programs;
use crate::render_graph::RenderContext;
use crate::shader::ShaderProgram;
use crate::texture::{self, CubeMap};

pub struct Sky {
    mesh: Mesh,
    cube_map: CubeMap,
    sampler: wgpu::Sampler,
    vs: ShaderProgram,
    ps: ShaderProgram,
}

impl Sky {
    pub fn new(gpu: &GpuContext, cube_map: CubeMap) -> Self {
        Self {
            mesh: Mesh::cube(gpu),
            cube_map,
            sampler: texture::create_sky_sampler(gpu),
            vs: programs::sky_vertex_program(gpu),
            ps: programs::sky_pixel_program(gpu),
        }
    }

    /// A procedural blue-to-grey gradient, used when no sky faces are found.
    pub fn gradient(gpu: &GpuContext) -> Self {
        let cube_map = CubeMap::gradient(
            gpu,
            64,
            Vec3::new(0.18, 0.32, 0.62),
            Vec3::new(0.62, 0.70, 0.80),
            Vec3::new(0.12, 0.12, 0.14),
        );
        Self::new(gpu, cube_map)
    }

    /// Draw the sky cube around the camera. Must run after opaque geometry
    /// in the same pass so depth testing hides the covered parts.
    pub fn draw(
        &self,
        ctx: &mut RenderContext<'_>,
        pass: &mut wgpu::RenderPass<'_>,
        camera: &Camera,
    ) -> Result<(), RenderError> {
        self.vs.set_matrix4x4("view", camera.view());
        self.vs.set_matrix4x4("projection", camera.projection());
        self.ps.set_float4("color_tint", Vec4::ONE);
        self.ps.set_shader_resource_view("CubeMap", self.cube_map.view());
        self.ps.set_sampler_state("BasicSampler", &self.sampler);

        self.vs.copy_all_buffer_data(ctx.gpu, ctx.arena)?;
        self.ps.copy_all_buffer_data(ctx.gpu, ctx.arena)?;

        pass.set_pipeline(ctx.pipelines.sky_pipeline(ctx.gpu, &self.vs, &self.ps));
        self.vs.set_shader(ctx.gpu, pass, 0, ctx.arena)?;
        self.ps.set_shader(ctx.gpu, pass, 1, ctx.arena)?;
        self.mesh.draw(pass);
        Ok(())
    }
}
