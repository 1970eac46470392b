//! Scene contents and handle types.

use std::rc::Rc;

use glam::Vec3;
use log::warn;

use crate::camera::Camera;
use crate::entity::Entity;
use crate::input::Input;
use crate::light::{Light, LightKind, MAX_LIGHTS};
use crate::material::Material;
use crate::mesh::Mesh;
use crate::sky::Sky;

/// Handle to a mesh registered with [`Scene::add_mesh`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshId(pub(crate) usize);

/// Handle to a material registered with [`Scene::add_material`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MaterialId(pub(crate) usize);

/// Handle to an entity created with [`Scene::add_entity`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntityId(pub(crate) usize);

/// Everything drawn in a frame plus the camera it is drawn from.
///
/// Meshes and materials are shared between entities through `Rc`; handles
/// are indices into append-only vectors, so they stay valid for the life of
/// the scene.
pub struct Scene {
    pub(crate) meshes: Vec<Rc<Mesh>>,
    pub(crate) materials: Vec<Rc<Material>>,
    pub(crate) entities: Vec<Entity>,
    pub(crate) lights: Vec<Light>,
    pub(crate) ambient: Vec3,
    pub(crate) camera: Camera,
    pub(crate) sky: Option<Sky>,
    /// Yaw added to every entity per second, in radians.
    pub(crate) spin_speed: f32,
}

impl Scene {
    pub fn new(camera: Camera) -> Self {
        Self {
            meshes: Vec::new(),
            materials: Vec::new(),
            entities: Vec::new(),
            lights: Vec::new(),
            ambient: Vec3::ZERO,
            camera,
            sky: None,
            spin_speed: 0.0,
        }
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        let idx = self.meshes.len();
        self.meshes.push(Rc::new(mesh));
        MeshId(idx)
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        let idx = self.materials.len();
        self.materials.push(Rc::new(material));
        MaterialId(idx)
    }

    /// Place a new entity at the origin.
    pub fn add_entity(&mut self, mesh: MeshId, material: MaterialId) -> EntityId {
        let entity = Entity::new(
            Rc::clone(&self.meshes[mesh.0]),
            Rc::clone(&self.materials[material.0]),
        );
        let idx = self.entities.len();
        self.entities.push(entity);
        EntityId(idx)
    }

    /// Add a light. Lights past [`MAX_LIGHTS`] are kept but not shaded.
    pub fn add_light(&mut self, light: Light) -> usize {
        if self.lights.len() >= MAX_LIGHTS {
            warn!(
                "Scene has more than {MAX_LIGHTS} lights; light {} will not be shaded",
                self.lights.len()
            );
        }
        self.lights.push(light);
        self.lights.len() - 1
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id.0)
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn ambient(&self) -> Vec3 {
        self.ambient
    }

    pub fn set_ambient(&mut self, ambient: Vec3) {
        self.ambient = ambient;
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn sky(&self) -> Option<&Sky> {
        self.sky.as_ref()
    }

    pub fn set_sky(&mut self, sky: Sky) {
        self.sky = Some(sky);
    }

    pub fn spin_speed(&self) -> f32 {
        self.spin_speed
    }

    pub fn set_spin_speed(&mut self, radians_per_second: f32) {
        self.spin_speed = radians_per_second;
    }

    /// The first directional light that casts shadows.
    pub fn shadow_caster(&self) -> Option<&Light> {
        self.lights
            .iter()
            .take(MAX_LIGHTS)
            .find(|l| l.casts_shadows() && l.kind() == Some(LightKind::Directional))
    }

    /// Spin every entity about its yaw axis and move the camera.
    pub fn update(&mut self, dt: f32, input: &Input) {
        let spin = self.spin_speed * dt;
        for entity in &mut self.entities {
            entity.transform_mut().rotate(0.0, spin, 0.0);
        }
        self.camera.update(dt, input);
    }
}
