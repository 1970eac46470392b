//! Scene contents for penumbra.
//!
//! A [`Scene`] owns the meshes, materials, entities, lights, camera and sky
//! that one [`FrameGraph`](crate::FrameGraph) renders. Meshes and materials
//! are registered once and shared by handle:
//!
//! ```ignore
//! use penumbra::*;
//!
//! let mut scene = Scene::new(Camera::with_defaults(Vec3::new(0.0, 0.0, -5.0), gpu.aspect()));
//! let sphere = scene.add_mesh(Mesh::sphere(&gpu, 32, 16));
//! let metal = scene.add_material(material);
//! let id = scene.add_entity(sphere, metal);
//! scene.add_light(Light::directional(Vec3::new(0.4, -1.0, 0.3), Vec3::ONE, 1.0).with_shadows());
//!
//! // Each frame:
//! scene.update(dt, &input);
//! graph.render(&gpu, &mut scene)?;
//! ```
//!
//! [`build_demo_scene`] assembles the default scene from an asset directory.

mod demo;
pub mod scene;

pub use demo::{MATERIAL_NAMES, SPHERE_OFFSETS, build_demo_scene, demo_lights, texture_path};
pub use scene::{EntityId, MaterialId, MeshId, Scene};
