//! Depth-only rendering from the shadow-casting directional light.

use glam::{Mat4, Vec3};
use log::trace;
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::error::RenderError;
use crate::gpu::GpuContext;
use crate::programs;
use crate::render_graph::{RenderContext, ShadowMap};
use crate::shader::ShaderProgram;

const SHADOW_NEAR: f32 = 0.1;
const SHADOW_FAR: f32 = 100.0;

/// Shadow map size and the light's orthographic frustum.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowSettings {
    /// Width and height of the square shadow map in texels.
    pub resolution: u32,
    /// Side length of the orthographic frustum in world units.
    pub projection_size: f32,
    /// How far back along its direction the light is placed.
    pub light_distance: f32,
    /// Constant depth bias, in depth-buffer units.
    pub depth_bias: i32,
    pub slope_scale: f32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            resolution: 2048,
            projection_size: 20.0,
            light_distance: 20.0,
            depth_bias: 1000,
            slope_scale: 1.0,
        }
    }
}

/// View and projection of a directional light looking along `direction`
/// at the origin.
pub fn light_matrices(direction: Vec3, settings: &ShadowSettings) -> (Mat4, Mat4) {
    let dir = direction.normalize_or(Vec3::NEG_Y);
    let up = if dir.y.abs() > 0.99 { Vec3::Z } else { Vec3::Y };
    let view = Mat4::look_to_lh(-dir * settings.light_distance, dir, up);
    let half = settings.projection_size / 2.0;
    let projection = Mat4::orthographic_lh(-half, half, -half, half, SHADOW_NEAR, SHADOW_FAR);
    (view, projection)
}

pub struct ShadowPass {
    program: ShaderProgram,
    shadow_map: ShadowMap,
    settings: ShadowSettings,
}

impl ShadowPass {
    pub fn new(gpu: &GpuContext, settings: ShadowSettings) -> Self {
        Self {
            program: programs::shadow_vertex_program(gpu),
            shadow_map: ShadowMap::new(gpu, settings.resolution),
            settings,
        }
    }

    pub fn shadow_map(&self) -> &ShadowMap {
        &self.shadow_map
    }

    pub fn settings(&self) -> &ShadowSettings {
        &self.settings
    }

    /// Clear the shadow map and, if there is a light, render every entity's
    /// depth into it.
    pub fn record(
        &self,
        ctx: &mut RenderContext<'_>,
        encoder: &mut wgpu::CommandEncoder,
        entities: &mut [Entity],
        light: Option<(Mat4, Mat4)>,
    ) -> Result<(), RenderError> {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Shadow Pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: self.shadow_map.view(),
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        let Some((view, projection)) = light else {
            trace!("No shadow caster, shadow map left cleared");
            return Ok(());
        };

        self.program.set_matrix4x4("view", view);
        self.program.set_matrix4x4("projection", projection);
        pass.set_pipeline(ctx.pipelines.shadow_pipeline(ctx.gpu, &self.program));
        for entity in entities.iter_mut() {
            entity.draw_depth(ctx, &mut pass, &self.program)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_origin_is_centred_in_light_space() {
        let settings = ShadowSettings::default();
        let (view, projection) = light_matrices(Vec3::new(1.0, -1.0, 1.0), &settings);
        let clip = projection * view * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert_abs_diff_eq!(clip.x, 0.0, epsilon = 1e-4);
        assert_abs_diff_eq!(clip.y, 0.0, epsilon = 1e-4);
        let expected = (settings.light_distance - SHADOW_NEAR) / (SHADOW_FAR - SHADOW_NEAR);
        assert_abs_diff_eq!(clip.z, expected, epsilon = 1e-4);
    }

    #[test]
    fn test_closer_to_light_is_shallower() {
        let settings = ShadowSettings::default();
        let dir = Vec3::new(0.3, -1.0, 0.2).normalize();
        let (view, projection) = light_matrices(dir, &settings);
        let depth = |p: Vec3| (projection * view * p.extend(1.0)).z;
        assert!(depth(-dir * 2.0) < depth(Vec3::ZERO));
    }

    #[test]
    fn test_straight_down_light_is_finite() {
        let (view, projection) = light_matrices(Vec3::NEG_Y, &ShadowSettings::default());
        assert!(view.is_finite());
        assert!(projection.is_finite());
    }
}
