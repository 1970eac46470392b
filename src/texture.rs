//! 2D textures, cube maps and the samplers materials bind with them.
//!
//! Missing texture files are not fatal: [`Texture::load_or`] logs a warning
//! and returns a 1×1 texture of a fallback colour so the material stays
//! usable.

use std::path::Path;

use glam::Vec3;
use image::RgbaImage;
use log::{debug, warn};
use wgpu::util::DeviceExt;

use crate::error::TextureError;
use crate::gpu::GpuContext;

/// How texel values are interpreted when sampled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorSpace {
    /// Colour data (albedo); decoded from sRGB to linear on sampling.
    Srgb,
    /// Non-colour data (roughness, metalness, normals).
    Linear,
}

impl ColorSpace {
    fn format(self) -> wgpu::TextureFormat {
        match self {
            ColorSpace::Srgb => wgpu::TextureFormat::Rgba8UnormSrgb,
            ColorSpace::Linear => wgpu::TextureFormat::Rgba8Unorm,
        }
    }
}

/// A sampled 2D texture.
#[derive(Debug)]
pub struct Texture {
    #[allow(dead_code)]
    pub(crate) texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
}

impl Texture {
    /// Create a texture from tightly packed RGBA8 data.
    pub fn from_rgba(
        gpu: &GpuContext,
        data: &[u8],
        width: u32,
        height: u32,
        space: ColorSpace,
        label: &str,
    ) -> Self {
        let texture = gpu.device.create_texture_with_data(
            &gpu.queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: space.format(),
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            data,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            width,
            height,
        }
    }

    /// Decode an image file (PNG, JPEG, TIFF, ...).
    pub fn from_file(
        gpu: &GpuContext,
        path: impl AsRef<Path>,
        space: ColorSpace,
    ) -> Result<Self, TextureError> {
        let path = path.as_ref();
        let img = decode(path)?;
        let (width, height) = img.dimensions();
        check_size(path, width, height, gpu.device.limits().max_texture_dimension_2d)?;
        debug!("Loaded texture {} ({width}x{height})", path.display());
        Ok(Self::from_rgba(
            gpu,
            &img,
            width,
            height,
            space,
            &path.display().to_string(),
        ))
    }

    /// A single texel of one colour.
    pub fn solid(gpu: &GpuContext, rgba: [u8; 4], space: ColorSpace, label: &str) -> Self {
        Self::from_rgba(gpu, &rgba, 1, 1, space, label)
    }

    /// Load `path`, or fall back to a solid `fallback` texel with a warning.
    pub fn load_or(
        gpu: &GpuContext,
        path: impl AsRef<Path>,
        space: ColorSpace,
        fallback: [u8; 4],
    ) -> Self {
        let path = path.as_ref();
        match Self::from_file(gpu, path, space) {
            Ok(texture) => texture,
            Err(err) => {
                warn!("{err}; using fallback colour {fallback:?}");
                Self::solid(gpu, fallback, space, &path.display().to_string())
            }
        }
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}

/// Reject images the device cannot hold before wgpu validation does.
fn check_size(path: &Path, width: u32, height: u32, max: u32) -> Result<(), TextureError> {
    if (1..=max).contains(&width) && (1..=max).contains(&height) {
        return Ok(());
    }
    Err(TextureError::Size {
        path: path.to_path_buf(),
        width,
        height,
        max,
    })
}

fn decode(path: &Path) -> Result<RgbaImage, TextureError> {
    image::open(path)
        .map(|img| img.to_rgba8())
        .map_err(|source| TextureError::Decode {
            path: path.to_path_buf(),
            source,
        })
}

/// A six-layer cube texture for the sky.
#[derive(Debug)]
pub struct CubeMap {
    #[allow(dead_code)]
    pub(crate) texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub size: u32,
}

impl CubeMap {
    /// Build a cube map from RGBA8 data holding six square faces back to
    /// back, in +X, -X, +Y, -Y, +Z, -Z order.
    pub fn from_rgba(gpu: &GpuContext, data: &[u8], size: u32, label: &str) -> Self {
        let texture = gpu.device.create_texture_with_data(
            &gpu.queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width: size,
                    height: size,
                    depth_or_array_layers: 6,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            data,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(label),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });
        Self {
            texture,
            view,
            size,
        }
    }

    /// Load six face images in +X, -X, +Y, -Y, +Z, -Z order.
    pub fn from_faces<P: AsRef<Path>>(gpu: &GpuContext, faces: &[P; 6]) -> Result<Self, TextureError> {
        let max = gpu.device.limits().max_texture_dimension_2d;
        let images = faces
            .iter()
            .map(|p| {
                let img = decode(p.as_ref())?;
                check_size(p.as_ref(), img.width(), img.height(), max)?;
                Ok(img)
            })
            .collect::<Result<Vec<_>, TextureError>>()?;
        let (size, data) = stack_faces(&images)?;
        debug!("Loaded {size}x{size} cube map");
        Ok(Self::from_rgba(gpu, &data, size, "Sky Cube Map"))
    }

    /// A procedural sky: `top` straight up, `horizon` at the horizon and
    /// `bottom` straight down.
    pub fn gradient(gpu: &GpuContext, size: u32, top: Vec3, horizon: Vec3, bottom: Vec3) -> Self {
        let data = gradient_faces(size, top, horizon, bottom);
        Self::from_rgba(gpu, &data, size, "Gradient Sky")
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}

/// Concatenate six equally sized square faces into one layer-major buffer.
pub fn stack_faces(faces: &[RgbaImage]) -> Result<(u32, Vec<u8>), TextureError> {
    let expected = faces.first().map(|f| f.dimensions()).unwrap_or((0, 0));
    let mut data = Vec::with_capacity(expected.0 as usize * expected.1 as usize * 4 * 6);
    for (face, img) in faces.iter().enumerate() {
        let actual = img.dimensions();
        if actual != expected || actual.0 != actual.1 {
            return Err(TextureError::FaceSizeMismatch {
                face,
                expected: (expected.0, expected.0),
                actual,
            });
        }
        data.extend_from_slice(img.as_raw());
    }
    Ok((expected.0, data))
}

/// World direction through texel centre `(u, v)` in [-1, 1] of a cube face.
pub fn cube_face_direction(face: usize, u: f32, v: f32) -> Vec3 {
    match face {
        0 => Vec3::new(1.0, -v, -u),
        1 => Vec3::new(-1.0, -v, u),
        2 => Vec3::new(u, 1.0, v),
        3 => Vec3::new(u, -1.0, -v),
        4 => Vec3::new(u, -v, 1.0),
        _ => Vec3::new(-u, -v, -1.0),
    }
    .normalize()
}

/// RGBA8 texels for all six faces of a vertical gradient.
pub fn gradient_faces(size: u32, top: Vec3, horizon: Vec3, bottom: Vec3) -> Vec<u8> {
    let mut data = Vec::with_capacity(size as usize * size as usize * 4 * 6);
    for face in 0..6 {
        for y in 0..size {
            for x in 0..size {
                let u = (x as f32 + 0.5) / size as f32 * 2.0 - 1.0;
                let v = (y as f32 + 0.5) / size as f32 * 2.0 - 1.0;
                let height = cube_face_direction(face, u, v).y;
                let color = if height >= 0.0 {
                    horizon.lerp(top, height)
                } else {
                    horizon.lerp(bottom, -height)
                };
                let c = (color.clamp(Vec3::ZERO, Vec3::ONE) * 255.0).round();
                data.extend_from_slice(&[c.x as u8, c.y as u8, c.z as u8, 255]);
            }
        }
    }
    data
}

/// Trilinear, 16× anisotropic, repeating sampler for material textures.
pub fn create_material_sampler(gpu: &GpuContext) -> wgpu::Sampler {
    gpu.device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("Material Sampler"),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Linear,
        anisotropy_clamp: 16,
        ..Default::default()
    })
}

/// Linear clamped sampler for the sky cube map.
pub fn create_sky_sampler(gpu: &GpuContext) -> wgpu::Sampler {
    gpu.device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("Sky Sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}

/// Comparison sampler for the shadow map: a texel passes when the
/// fragment's light-space depth is at most the stored depth.
pub fn create_shadow_sampler(gpu: &GpuContext) -> wgpu::Sampler {
    gpu.device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("Shadow Sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        compare: Some(wgpu::CompareFunction::LessEqual),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_faces_concatenates_in_order() {
        let faces: Vec<RgbaImage> = (0..6u8)
            .map(|i| RgbaImage::from_pixel(2, 2, image::Rgba([i, 0, 0, 255])))
            .collect();
        let (size, data) = stack_faces(&faces).unwrap();
        assert_eq!(size, 2);
        assert_eq!(data.len(), 2 * 2 * 4 * 6);
        // First texel of each face carries the face index.
        for face in 0..6 {
            assert_eq!(data[face * 16], face as u8);
        }
    }

    #[test]
    fn test_stack_faces_rejects_mismatch() {
        let mut faces: Vec<RgbaImage> = (0..6).map(|_| RgbaImage::new(4, 4)).collect();
        faces[3] = RgbaImage::new(8, 8);
        match stack_faces(&faces) {
            Err(TextureError::FaceSizeMismatch {
                face,
                expected,
                actual,
            }) => {
                assert_eq!(face, 3);
                assert_eq!(expected, (4, 4));
                assert_eq!(actual, (8, 8));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_face_directions_point_at_face() {
        let axes = [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z];
        for (face, axis) in axes.iter().enumerate() {
            let centre = cube_face_direction(face, 0.0, 0.0);
            assert!(centre.abs_diff_eq(*axis, 1e-6));
        }
        // Top row of a side face leans upward.
        assert!(cube_face_direction(4, 0.0, -0.9).y > 0.0);
    }

    #[test]
    fn test_gradient_faces() {
        let top = Vec3::new(0.0, 0.0, 1.0);
        let horizon = Vec3::ONE;
        let bottom = Vec3::ZERO;
        let data = gradient_faces(4, top, horizon, bottom);
        assert_eq!(data.len(), 4 * 4 * 4 * 6);

        let face_len = 4 * 4 * 4;
        let up_face = &data[2 * face_len..3 * face_len];
        let down_face = &data[3 * face_len..4 * face_len];
        // +Y face is mostly blue, -Y face mostly black.
        assert!(up_face[2] > up_face[0]);
        assert!(down_face[0] < 128);
        assert!(data.chunks_exact(4).all(|px| px[3] == 255));
    }

    #[test]
    fn test_size_limits() {
        let path = Path::new("textures/bronze_albedo.png");
        assert!(check_size(path, 4096, 2, 8192).is_ok());
        assert!(check_size(path, 8192, 8192, 8192).is_ok());
        assert!(matches!(
            check_size(path, 8193, 16, 8192),
            Err(TextureError::Size { width: 8193, max: 8192, .. })
        ));
        assert!(check_size(path, 0, 16, 8192).is_err());
    }
}
