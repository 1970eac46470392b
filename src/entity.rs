//! A mesh placed in the world with a material.

use std::rc::Rc;

use crate::camera::Camera;
use crate::error::RenderError;
use crate::material::Material;
use crate::mesh::Mesh;
use crate::render_graph::RenderContext;
use crate::shader::ShaderProgram;
use crate::transform::Transform;

/// One drawable object: its own transform plus shared mesh and material.
pub struct Entity {
    transform: Transform,
    mesh: Rc<Mesh>,
    material: Rc<Material>,
}

impl Entity {
    pub fn new(mesh: Rc<Mesh>, material: Rc<Material>) -> Self {
        Self {
            transform: Transform::new(),
            mesh,
            material,
        }
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    pub fn material(&self) -> &Rc<Material> {
        &self.material
    }

    /// Stage per-object and camera data, flush both programs and draw.
    ///
    /// Lights and shadow resources are not staged here; the pass that calls
    /// this has already put them on the material's programs.
    pub fn draw(
        &mut self,
        ctx: &mut RenderContext<'_>,
        pass: &mut wgpu::RenderPass<'_>,
        camera: &Camera,
    ) -> Result<(), RenderError> {
        let vs = self.material.vertex_shader();
        let ps = self.material.pixel_shader();

        vs.set_matrix4x4("world", self.transform.world_matrix());
        vs.set_matrix4x4(
            "world_inverse_transpose",
            self.transform.world_inverse_transpose_matrix(),
        );
        vs.set_matrix4x4("view", camera.view());
        vs.set_matrix4x4("projection", camera.projection());

        ps.set_float4("color_tint", self.material.color_tint());
        ps.set_float("roughness", self.material.roughness());
        ps.set_float3("camera_position", camera.position());
        self.material.prepare_material();

        vs.copy_all_buffer_data(ctx.gpu, ctx.arena)?;
        ps.copy_all_buffer_data(ctx.gpu, ctx.arena)?;

        pass.set_pipeline(ctx.pipelines.main_pipeline(ctx.gpu, vs, ps));
        vs.set_shader(ctx.gpu, pass, 0, ctx.arena)?;
        ps.set_shader(ctx.gpu, pass, 1, ctx.arena)?;

        self.mesh.draw(pass);
        Ok(())
    }

    /// Depth-only draw with the shadow pass's own vertex program.
    pub(crate) fn draw_depth(
        &mut self,
        ctx: &mut RenderContext<'_>,
        pass: &mut wgpu::RenderPass<'_>,
        shadow_vs: &ShaderProgram,
    ) -> Result<(), RenderError> {
        shadow_vs.set_matrix4x4("world", self.transform.world_matrix());
        shadow_vs.copy_all_buffer_data(ctx.gpu, ctx.arena)?;
        shadow_vs.set_shader(ctx.gpu, pass, 0, ctx.arena)?;
        self.mesh.draw(pass);
        Ok(())
    }
}
