//! The default scene: five PBR spheres over a floor, lit by three
//! directional and two point lights.

use std::path::Path;
use std::rc::Rc;

use glam::{Vec3, Vec4};
use log::{debug, info, warn};

use crate::camera::Camera;
use crate::config::DemoConfig;
use crate::geometry::RawGeometry;
use crate::gpu::GpuContext;
use crate::light::Light;
use crate::material::Material;
use crate::mesh::Mesh;
use crate::programs;
use crate::scene::Scene;
use crate::shader::ShaderProgram;
use crate::sky::Sky;
use crate::texture::{self, ColorSpace, CubeMap, Texture};

/// Materials in the order their spheres are placed.
pub const MATERIAL_NAMES: [&str; 5] = ["bronze", "cobblestone", "floor", "paint", "scratched"];

/// Offsets of the five spheres: centre, below, above, left, right.
pub const SPHERE_OFFSETS: [Vec3; 5] = [
    Vec3::ZERO,
    Vec3::new(0.0, -4.0, 0.0),
    Vec3::new(0.0, 4.0, 0.0),
    Vec3::new(-4.0, 0.0, 0.0),
    Vec3::new(4.0, 0.0, 0.0),
];

/// Cube map faces in +X, -X, +Y, -Y, +Z, -Z order.
const SKY_FACES: [&str; 6] = ["right", "left", "up", "down", "front", "back"];

const ALBEDO_FALLBACK: [u8; 4] = [180, 180, 180, 255];
const ROUGHNESS_FALLBACK: [u8; 4] = [255, 255, 255, 255];
const NORMAL_FALLBACK: [u8; 4] = [128, 128, 255, 255];
const METAL_FALLBACK: [u8; 4] = [0, 0, 0, 255];

/// The five lights of the demo. The third directional light casts shadows.
pub fn demo_lights() -> Vec<Light> {
    let white = Vec3::ONE;
    vec![
        Light::directional(Vec3::X, white, 1.0),
        Light::directional(Vec3::NEG_X, white, 1.0),
        Light::directional(Vec3::new(0.4, -1.0, 0.3), white, 1.0).with_shadows(),
        Light::point(Vec3::new(-2.0, 0.0, -1.0), 3.0, white, 2.0),
        Light::point(Vec3::new(2.0, 2.0, 0.0), 3.0, white, 2.0),
    ]
}

/// `<asset_dir>/textures/<material>_<map>.png`
pub fn texture_path(asset_dir: &Path, material: &str, map: &str) -> std::path::PathBuf {
    asset_dir
        .join("textures")
        .join(format!("{material}_{map}.png"))
}

fn pbr_material(
    gpu: &GpuContext,
    asset_dir: &Path,
    name: &str,
    vs: &Rc<ShaderProgram>,
    ps: &Rc<ShaderProgram>,
    sampler: &wgpu::Sampler,
) -> Material {
    let load = |map: &str, space: ColorSpace, fallback: [u8; 4]| {
        Texture::load_or(gpu, texture_path(asset_dir, name, map), space, fallback)
    };
    let albedo = load("albedo", ColorSpace::Srgb, ALBEDO_FALLBACK);
    let roughness = load("roughness", ColorSpace::Linear, ROUGHNESS_FALLBACK);
    let normals = load("normals", ColorSpace::Linear, NORMAL_FALLBACK);
    let metal = load("metal", ColorSpace::Linear, METAL_FALLBACK);

    let mut material = Material::new(name, Vec4::ONE, 0.8, Rc::clone(vs), Rc::clone(ps));
    material.add_texture_srv("SurfaceTexture", albedo.view());
    material.add_texture_srv("SurfaceRoughness", roughness.view());
    material.add_texture_srv("NormalMap", normals.view());
    material.add_texture_srv("MetalnessMap", metal.view());
    material.add_sampler("BasicSampler", sampler);
    debug!("Loaded material {}", material.name());
    material
}

/// A sphere from `<asset_dir>/models/sphere.obj`, or a generated one.
fn sphere_mesh(gpu: &GpuContext, asset_dir: &Path) -> Mesh {
    let path = asset_dir.join("models").join("sphere.obj");
    if !path.exists() {
        return Mesh::sphere(gpu, 48, 24);
    }
    match RawGeometry::load(&path) {
        Ok(geometry) => geometry.upload(gpu),
        Err(err) => {
            warn!("{err}; using a generated sphere");
            Mesh::sphere(gpu, 48, 24)
        }
    }
}

fn load_sky(gpu: &GpuContext, asset_dir: &Path) -> Sky {
    let dir = asset_dir.join("skies").join("sunny");
    let faces = SKY_FACES.map(|face| dir.join(format!("{face}.png")));
    match CubeMap::from_faces(gpu, &faces) {
        Ok(cube_map) => Sky::new(gpu, cube_map),
        Err(err) => {
            warn!("{err}; using a gradient sky");
            Sky::gradient(gpu)
        }
    }
}

/// Build the demo scene. Missing assets fall back to flat textures, a
/// generated sphere and a gradient sky.
pub fn build_demo_scene(gpu: &GpuContext, config: &DemoConfig) -> Scene {
    let asset_dir = config.asset_dir.as_path();
    info!("Building demo scene from {}", asset_dir.display());

    let camera = Camera::new(
        Vec3::from_array(config.camera.position),
        gpu.aspect(),
        config.camera.movement_speed,
        config.camera.mouse_look_speed,
        config.fov(),
    );
    let mut scene = Scene::new(camera);
    scene.set_spin_speed(config.spin_speed);
    scene.set_ambient(Vec3::new(0.05, 0.05, 0.15));

    let vs = Rc::new(programs::mesh_vertex_program(gpu));
    let ps = Rc::new(programs::pbr_pixel_program(gpu));
    let sampler = texture::create_material_sampler(gpu);

    let sphere = scene.add_mesh(sphere_mesh(gpu, asset_dir));
    let cube = scene.add_mesh(Mesh::cube(gpu));

    let mut floor_material = None;
    for (name, offset) in MATERIAL_NAMES.iter().zip(SPHERE_OFFSETS) {
        let material = scene.add_material(pbr_material(gpu, asset_dir, name, &vs, &ps, &sampler));
        if *name == "floor" {
            floor_material = Some(material);
        }
        let id = scene.add_entity(sphere, material);
        if let Some(entity) = scene.entity_mut(id) {
            entity
                .transform_mut()
                .move_absolute(offset.x, offset.y, offset.z);
        }
    }

    if let Some(material) = floor_material {
        let id = scene.add_entity(cube, material);
        if let Some(entity) = scene.entity_mut(id) {
            let transform = entity.transform_mut();
            transform.set_position(0.0, -6.0, 0.0);
            transform.set_scale(16.0, 0.25, 16.0);
        }
    }

    for light in demo_lights() {
        scene.add_light(light);
    }
    scene.set_sky(load_sky(gpu, asset_dir));

    info!(
        "Demo scene ready: {} entities, {} lights",
        scene.entities().len(),
        scene.lights().len()
    );
    scene
}
