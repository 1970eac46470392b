use std::path::Path;

use approx::assert_relative_eq;
use penumbra::{GeometryError, RawGeometry, Vec3};

const QUAD_OBJ: &str = "\
v -1 -1 0
v 1 -1 0
v 1 1 0
v -1 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1 4/4/1
";

#[test]
fn loads_obj_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quad.obj");
    std::fs::write(&path, QUAD_OBJ).unwrap();

    let geometry = RawGeometry::load(&path).unwrap();
    assert_eq!(geometry.triangle_count(), 2);
    for v in &geometry.vertices {
        assert_relative_eq!(v.normal[2], -1.0);
        let tangent = Vec3::from(v.tangent);
        assert_relative_eq!(tangent.length(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(tangent.dot(Vec3::from(v.normal)), 0.0, epsilon = 1e-5);
    }
}

#[test]
fn converted_winding_follows_the_mirrored_normal() {
    let geometry = parse(QUAD_OBJ);
    for tri in geometry.indices.chunks_exact(3) {
        let p = |i: u32| Vec3::from(geometry.vertices[i as usize].position);
        let cross = (p(tri[1]) - p(tri[0])).cross(p(tri[2]) - p(tri[0]));
        assert!(cross.dot(Vec3::from(geometry.vertices[tri[0] as usize].normal)) > 0.0);
    }
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = RawGeometry::load(dir.path().join("absent.obj"));
    assert!(matches!(result, Err(GeometryError::Io(_))));
}

#[test]
fn unsupported_extension_is_rejected_before_reading() {
    let result = RawGeometry::load(Path::new("model.fbx"));
    assert!(matches!(result, Err(GeometryError::UnknownFormat(ext)) if ext == "fbx"));
}

#[test]
fn built_in_shapes_are_centred() {
    for geometry in [
        RawGeometry::cube(),
        RawGeometry::sphere(16, 8),
        RawGeometry::plane(4.0),
    ] {
        assert!(geometry.center().abs_diff_eq(Vec3::ZERO, 1e-5));
    }
}

fn parse(text: &str) -> RawGeometry {
    RawGeometry::from_obj_reader(&mut text.as_bytes(), Path::new("inline.obj")).unwrap()
}
