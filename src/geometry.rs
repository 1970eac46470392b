//! CPU-side geometry: procedural primitives, OBJ loading and the clean-up
//! passes (handedness conversion, normals, tangents) run before upload.
//!
//! OBJ files are authored right-handed with counter-clockwise front faces.
//! [`RawGeometry::from_obj`] converts them to the renderer's left-handed,
//! clockwise convention on load, so everything that reaches the GPU shares
//! the winding described in [`crate::mesh`].
//!
//! # Example
//!
//! ```ignore
//! use penumbra::RawGeometry;
//!
//! let mut helix = RawGeometry::from_obj("assets/models/helix.obj")?;
//! helix.recenter();
//! let mesh = helix.upload(&gpu);
//! ```

use std::f32::consts::PI;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use glam::{Vec2, Vec3};
use log::{debug, warn};

use crate::error::GeometryError;
use crate::gpu::GpuContext;
use crate::mesh::{Mesh, Vertex3d};

/// Vertices and triangle indices before GPU upload.
#[derive(Clone, Debug, Default)]
pub struct RawGeometry {
    pub vertices: Vec<Vertex3d>,
    pub indices: Vec<u32>,
}

impl RawGeometry {
    pub fn new(vertices: Vec<Vertex3d>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Unit cube centred at the origin, four vertices per face.
    pub fn cube() -> Self {
        let mut geometry = Self::default();
        // (outward normal, texture +u direction)
        let faces = [
            (Vec3::NEG_Z, Vec3::X),
            (Vec3::Z, Vec3::NEG_X),
            (Vec3::X, Vec3::Z),
            (Vec3::NEG_X, Vec3::NEG_Z),
            (Vec3::Y, Vec3::X),
            (Vec3::NEG_Y, Vec3::X),
        ];
        for (normal, right) in faces {
            geometry.push_quad(normal * 0.5, normal, right, 0.5);
        }
        geometry.calculate_tangents();
        geometry
    }

    /// Square of side `size` on the XZ plane, facing +Y.
    pub fn plane(size: f32) -> Self {
        let mut geometry = Self::default();
        geometry.push_quad(Vec3::ZERO, Vec3::Y, Vec3::X, size * 0.5);
        geometry.calculate_tangents();
        geometry
    }

    /// UV sphere of radius 0.5. `v` runs from the north pole to the south.
    pub fn sphere(segments: u32, rings: u32) -> Self {
        let segments = segments.max(3);
        let rings = rings.max(2);
        let mut vertices = Vec::with_capacity(((segments + 1) * (rings + 1)) as usize);

        for ring in 0..=rings {
            let phi = PI * ring as f32 / rings as f32;
            for seg in 0..=segments {
                let theta = 2.0 * PI * seg as f32 / segments as f32;
                let normal = Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
                vertices.push(Vertex3d::new(
                    (normal * 0.5).to_array(),
                    normal.to_array(),
                    [seg as f32 / segments as f32, ring as f32 / rings as f32],
                ));
            }
        }

        let mut indices = Vec::with_capacity((segments * rings * 6) as usize);
        for ring in 0..rings {
            for seg in 0..segments {
                let current = ring * (segments + 1) + seg;
                let below = current + segments + 1;
                indices.extend_from_slice(&[current, current + 1, below]);
                indices.extend_from_slice(&[current + 1, below + 1, below]);
            }
        }

        let mut geometry = Self::new(vertices, indices);
        geometry.calculate_tangents();
        geometry
    }

    /// Append a square face. `right` is the texture's +u direction; +v runs
    /// along `normal × right` so the face's triangles wind outward.
    fn push_quad(&mut self, center: Vec3, normal: Vec3, right: Vec3, half: f32) {
        let down = normal.cross(right);
        let base = self.vertices.len() as u32;
        for (s, t) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
            let position = center + right * (2.0 * s - 1.0) * half + down * (2.0 * t - 1.0) * half;
            self.vertices.push(Vertex3d::new(
                position.to_array(),
                normal.to_array(),
                [s, t],
            ));
        }
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    /// Load an OBJ file, converting it to left-handed geometry with tangents.
    pub fn from_obj(path: impl AsRef<Path>) -> Result<Self, GeometryError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let geometry = Self::from_obj_reader(&mut BufReader::new(file), path)?;
        debug!(
            "Loaded {}: {} vertices, {} triangles",
            path.display(),
            geometry.vertices.len(),
            geometry.triangle_count()
        );
        Ok(geometry)
    }

    /// Parse OBJ text. `source` is only used in error messages.
    pub fn from_obj_reader<R: BufRead>(reader: &mut R, source: &Path) -> Result<Self, GeometryError> {
        let options = tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        };
        let (models, _materials) =
            tobj::load_obj_buf(reader, &options, |_| Err(tobj::LoadError::OpenFileFailed))
                .map_err(|source_err| GeometryError::Obj {
                    path: source.to_path_buf(),
                    source: source_err,
                })?;

        let mut geometry = Self::default();
        let mut has_normals = true;
        for model in &models {
            let mesh = &model.mesh;
            let base = geometry.vertices.len() as u32;
            let count = mesh.positions.len() / 3;
            has_normals &= mesh.normals.len() == mesh.positions.len();

            for i in 0..count {
                let position = [
                    mesh.positions[3 * i],
                    mesh.positions[3 * i + 1],
                    mesh.positions[3 * i + 2],
                ];
                let normal = if mesh.normals.len() >= 3 * i + 3 {
                    [
                        mesh.normals[3 * i],
                        mesh.normals[3 * i + 1],
                        mesh.normals[3 * i + 2],
                    ]
                } else {
                    [0.0; 3]
                };
                let uv = if mesh.texcoords.len() >= 2 * i + 2 {
                    [mesh.texcoords[2 * i], mesh.texcoords[2 * i + 1]]
                } else {
                    [0.0; 2]
                };
                geometry.vertices.push(Vertex3d::new(position, normal, uv));
            }
            geometry
                .indices
                .extend(mesh.indices.iter().map(|&index| base + index));
        }

        if geometry.indices.len() < 3 {
            return Err(GeometryError::Empty(source.to_path_buf()));
        }

        geometry.to_left_handed();
        if !has_normals {
            warn!(
                "{} has no normals; computing smooth normals",
                source.display()
            );
            geometry.recalculate_normals();
        }
        geometry.calculate_tangents();
        Ok(geometry)
    }

    /// Load a model by file extension. Only `.obj` is supported.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GeometryError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "obj" => Self::from_obj(path),
            other => Err(GeometryError::UnknownFormat(other.to_string())),
        }
    }

    /// Convert right-handed, counter-clockwise data to left-handed,
    /// clockwise: negate z on positions and normals, flip `v`, reverse every
    /// triangle.
    pub fn to_left_handed(&mut self) {
        for v in &mut self.vertices {
            v.position[2] = -v.position[2];
            v.normal[2] = -v.normal[2];
            v.tangent[2] = -v.tangent[2];
            v.uv[1] = 1.0 - v.uv[1];
        }
        for tri in self.indices.chunks_exact_mut(3) {
            tri.swap(1, 2);
        }
    }

    /// Per-vertex tangents from triangle UV gradients, orthogonalised
    /// against the normal.
    pub fn calculate_tangents(&mut self) {
        let mut accumulated = vec![Vec3::ZERO; self.vertices.len()];

        for tri in self.indices.chunks_exact(3) {
            let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let (v0, v1, v2) = (&self.vertices[i0], &self.vertices[i1], &self.vertices[i2]);

            let e1 = Vec3::from(v1.position) - Vec3::from(v0.position);
            let e2 = Vec3::from(v2.position) - Vec3::from(v0.position);
            let d1 = Vec2::from(v1.uv) - Vec2::from(v0.uv);
            let d2 = Vec2::from(v2.uv) - Vec2::from(v0.uv);

            let det = d1.x * d2.y - d2.x * d1.y;
            if det.abs() < f32::EPSILON {
                continue;
            }
            let tangent = (e1 * d2.y - e2 * d1.y) / det;
            for i in [i0, i1, i2] {
                accumulated[i] += tangent;
            }
        }

        for (v, t) in self.vertices.iter_mut().zip(accumulated) {
            let n = Vec3::from(v.normal);
            let tangent = (t - n * n.dot(t)).normalize_or_zero();
            v.tangent = if tangent == Vec3::ZERO {
                n.normalize_or(Vec3::Y).any_orthonormal_vector().to_array()
            } else {
                tangent.to_array()
            };
        }
    }

    /// Smooth normals from area-weighted face normals.
    pub fn recalculate_normals(&mut self) {
        let mut accumulated = vec![Vec3::ZERO; self.vertices.len()];
        for tri in self.indices.chunks_exact(3) {
            let p0 = Vec3::from(self.vertices[tri[0] as usize].position);
            let p1 = Vec3::from(self.vertices[tri[1] as usize].position);
            let p2 = Vec3::from(self.vertices[tri[2] as usize].position);
            let face = (p1 - p0).cross(p2 - p0);
            for &i in tri {
                accumulated[i as usize] += face;
            }
        }
        for (v, n) in self.vertices.iter_mut().zip(accumulated) {
            v.normal = n.normalize_or_zero().to_array();
        }
    }

    /// Axis-aligned `(min, max)` corners.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        self.vertices.iter().fold(
            (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)),
            |(min, max), v| {
                let p = Vec3::from(v.position);
                (min.min(p), max.max(p))
            },
        )
    }

    pub fn center(&self) -> Vec3 {
        let (min, max) = self.bounds();
        (min + max) * 0.5
    }

    /// Move the bounding box centre to the origin.
    pub fn recenter(&mut self) {
        let offset = -self.center();
        for v in &mut self.vertices {
            v.position = (Vec3::from(v.position) + offset).to_array();
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Upload to the GPU.
    pub fn upload(&self, gpu: &GpuContext) -> Mesh {
        Mesh::new(gpu, &self.vertices, &self.indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Cross product of each triangle's edges, in index order.
    fn face_normals(geometry: &RawGeometry) -> Vec<(Vec3, Vec3)> {
        geometry
            .indices
            .chunks_exact(3)
            .map(|tri| {
                let p: Vec<Vec3> = tri
                    .iter()
                    .map(|&i| Vec3::from(geometry.vertices[i as usize].position))
                    .collect();
                let centroid = (p[0] + p[1] + p[2]) / 3.0;
                ((p[1] - p[0]).cross(p[2] - p[0]), centroid)
            })
            .collect()
    }

    #[test]
    fn cube_winds_outward() {
        let cube = RawGeometry::cube();
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.indices.len(), 36);
        for (face, centroid) in face_normals(&cube) {
            assert!(face.dot(centroid) > 0.0);
        }
        let (min, max) = cube.bounds();
        assert_eq!(min, Vec3::splat(-0.5));
        assert_eq!(max, Vec3::splat(0.5));
    }

    #[test]
    fn cube_normals_match_winding() {
        let cube = RawGeometry::cube();
        for tri in cube.indices.chunks_exact(3) {
            let v: Vec<&Vertex3d> = tri.iter().map(|&i| &cube.vertices[i as usize]).collect();
            let face = (Vec3::from(v[1].position) - Vec3::from(v[0].position))
                .cross(Vec3::from(v[2].position) - Vec3::from(v[0].position));
            assert!(face.dot(Vec3::from(v[0].normal)) > 0.0);
        }
    }

    #[test]
    fn sphere_winds_outward() {
        let sphere = RawGeometry::sphere(16, 8);
        assert_eq!(sphere.vertices.len(), 17 * 9);
        for (face, centroid) in face_normals(&sphere) {
            // Pole triangles collapse to zero area.
            if face.length_squared() > 1e-10 {
                assert!(face.dot(centroid) > 0.0);
            }
        }
    }

    #[test]
    fn plane_faces_up_with_x_tangent() {
        let plane = RawGeometry::plane(10.0);
        for (face, _) in face_normals(&plane) {
            assert!(face.y > 0.0);
        }
        for v in &plane.vertices {
            assert!(Vec3::from(v.tangent).abs_diff_eq(Vec3::X, 1e-5));
        }
        let (min, max) = plane.bounds();
        assert_eq!(min, Vec3::new(-5.0, 0.0, -5.0));
        assert_eq!(max, Vec3::new(5.0, 0.0, 5.0));
    }

    #[test]
    fn tangents_are_unit_and_orthogonal() {
        let sphere = RawGeometry::sphere(24, 12);
        for v in &sphere.vertices {
            let t = Vec3::from(v.tangent);
            let n = Vec3::from(v.normal);
            assert_relative_eq!(t.length(), 1.0, epsilon = 1e-4);
            assert_relative_eq!(t.dot(n), 0.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn left_handed_conversion_flips_z_and_winding() {
        let mut tri = RawGeometry::new(
            vec![
                Vertex3d::new([0.0, 0.0, 1.0], [0.0, 0.0, 1.0], [0.0, 0.0]),
                Vertex3d::new([1.0, 0.0, 1.0], [0.0, 0.0, 1.0], [1.0, 0.25]),
                Vertex3d::new([0.0, 1.0, 1.0], [0.0, 0.0, 1.0], [0.0, 1.0]),
            ],
            vec![0, 1, 2],
        );
        let before = face_normals(&tri)[0].0;
        tri.to_left_handed();

        assert_eq!(tri.indices, vec![0, 2, 1]);
        assert_eq!(tri.vertices[0].position, [0.0, 0.0, -1.0]);
        assert_eq!(tri.vertices[0].normal, [0.0, 0.0, -1.0]);
        assert_eq!(tri.vertices[1].uv, [1.0, 0.75]);

        // The edge cross product still agrees with the (mirrored) normal.
        let after = face_normals(&tri)[0].0;
        assert!(before.dot(Vec3::Z) > 0.0);
        assert!(after.dot(Vec3::NEG_Z) > 0.0);
    }

    #[test]
    fn parses_obj_and_converts() {
        let source = "\
v -1.0 0.0 0.0
v 1.0 0.0 0.0
v 1.0 1.0 0.0
v -1.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 1.0 1.0
vt 0.0 1.0
vn 0.0 0.0 1.0
f 1/1/1 2/2/1 3/3/1 4/4/1
";
        let geometry =
            RawGeometry::from_obj_reader(&mut source.as_bytes(), Path::new("quad.obj")).unwrap();
        assert_eq!(geometry.triangle_count(), 2);
        for v in &geometry.vertices {
            assert_eq!(v.normal, [0.0, 0.0, -1.0]);
        }
        for (face, _) in face_normals(&geometry) {
            assert!(face.z < 0.0);
        }
    }

    #[test]
    fn obj_without_normals_gets_computed_ones() {
        let source = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        let geometry =
            RawGeometry::from_obj_reader(&mut source.as_bytes(), Path::new("tri.obj")).unwrap();
        for v in &geometry.vertices {
            assert!(Vec3::from(v.normal).abs_diff_eq(Vec3::NEG_Z, 1e-5));
        }
    }

    #[test]
    fn empty_obj_is_an_error() {
        let result = RawGeometry::from_obj_reader(&mut "# nothing\n".as_bytes(), Path::new("e.obj"));
        assert!(matches!(result, Err(GeometryError::Empty(_))));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let result = RawGeometry::load("model.fbx");
        assert!(matches!(result, Err(GeometryError::UnknownFormat(ext)) if ext == "fbx"));
    }

    #[test]
    fn recenter_moves_bounds_to_origin() {
        let mut geometry = RawGeometry::new(
            vec![
                Vertex3d::new([2.0, 2.0, 2.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
                Vertex3d::new([4.0, 4.0, 4.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
            ],
            vec![0, 1, 0],
        );
        geometry.recenter();
        assert!(geometry.center().abs_diff_eq(Vec3::ZERO, 1e-6));
    }
}
