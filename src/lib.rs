//! # Penumbra
//!
//! **A shadow-mapped PBR scene renderer on wgpu.**
//!
//! Entities pair a shared [`Mesh`] with a shared [`Material`]; materials feed
//! WGSL programs through a named-parameter interface; a [`FrameGraph`] renders
//! each frame as a depth-only shadow pass followed by a lit main pass and a
//! cube-mapped sky.
//!
//! ## Quick Start
//!
//! ```no_run
//! use penumbra::*;
//!
//! fn main() -> Result<(), RunError> {
//!     env_logger::init();
//!     run(DemoConfig::default())
//! }
//! ```
//!
//! ## Controls
//!
//! - **W / S** move forward and back, **A / D** strafe
//! - **Space / X** move up and down, **Left Shift** doubles speed
//! - **Left mouse drag** looks around
//! - **Escape** quits
//!
//! ## Shader parameters
//!
//! Programs are addressed by parameter name, so the frame driver and
//! entities never depend on a specific uniform struct:
//!
//! ```ignore
//! ps.set_float3("ambient_color", Vec3::new(0.05, 0.05, 0.15));
//! ps.set_shader_resource_view("ShadowMap", shadow_map.view());
//! ```

mod app;
mod camera;
mod config;
mod entity;
mod error;
mod geometry;
mod gpu;
mod input;
mod light;
mod material;
mod mesh;
pub mod programs;
mod render_graph;
pub mod scene;
mod shader;
mod sky;
mod texture;
mod transform;
mod uniform_arena;

pub use app::{FrameStats, run};
pub use camera::{Camera, FAR_PLANE, NEAR_PLANE};
pub use config::{CameraConfig, DemoConfig, WindowConfig};
pub use entity::Entity;
pub use error::{
    ConfigError, FrameError, GeometryError, GpuError, RenderError, RunError, ShaderError,
    TextureError,
};
pub use geometry::RawGeometry;
pub use gpu::GpuContext;
pub use input::Input;
pub use light::{Light, LightKind, MAX_LIGHTS};
pub use material::Material;
pub use mesh::{Mesh, Vertex3d};
pub use render_graph::{
    DEPTH_FORMAT, DepthBuffer, FrameGraph, FramePhase, FrameSequencer, InputSlots, MainPass,
    PipelineCache, PipelineKind, RenderContext, ResourceId, SHADOW_MAP_SLOT, ShadowMap,
    ShadowPass, ShadowSettings, light_matrices,
};
pub use scene::{EntityId, MaterialId, MeshId, Scene, build_demo_scene};
pub use shader::{
    ParameterBlock, ParameterLayout, ProgramId, ResourceSlots, ShaderProgram, ShaderStage,
    TextureKind, UniformField,
};
pub use sky::Sky;
pub use texture::{
    ColorSpace, CubeMap, Texture, create_material_sampler, create_shadow_sampler,
    create_sky_sampler, cube_face_direction, gradient_faces, stack_faces,
};
pub use transform::Transform;
pub use uniform_arena::{ArenaCursor, DEFAULT_ARENA_SIZE, UniformArena, align_up};

// Re-export glam math types for convenience
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

// Re-export commonly used winit types for convenience
pub use winit::event::MouseButton;
pub use winit::keyboard::KeyCode;
