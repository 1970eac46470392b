//! Light values laid out exactly as the shaders read them.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Maximum number of lights the pixel shader iterates over.
pub const MAX_LIGHTS: usize = 8;

/// Light type tag stored in [`Light::kind`].
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LightKind {
    Directional = 0,
    Point = 1,
    Spot = 2,
}

/// One light, 64 bytes, matching the WGSL `Light` struct field for field.
///
/// Directional lights use `direction`; point lights use `position` and
/// `range`; spot lights use all three plus `spot_falloff`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Light {
    pub direction: [f32; 3],
    pub range: f32,
    pub position: [f32; 3],
    pub intensity: f32,
    pub color: [f32; 3],
    pub spot_falloff: f32,
    pub kind: i32,
    pub casts_shadows: i32,
    pub _padding: [f32; 2],
}

impl Light {
    pub fn directional(direction: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            kind: LightKind::Directional as i32,
            direction: direction.normalize_or_zero().to_array(),
            color: color.to_array(),
            intensity,
            ..Self::zeroed()
        }
    }

    pub fn point(position: Vec3, range: f32, color: Vec3, intensity: f32) -> Self {
        Self {
            kind: LightKind::Point as i32,
            position: position.to_array(),
            range,
            color: color.to_array(),
            intensity,
            ..Self::zeroed()
        }
    }

    pub fn spot(
        position: Vec3,
        direction: Vec3,
        range: f32,
        spot_falloff: f32,
        color: Vec3,
        intensity: f32,
    ) -> Self {
        Self {
            kind: LightKind::Spot as i32,
            position: position.to_array(),
            direction: direction.normalize_or_zero().to_array(),
            range,
            spot_falloff,
            color: color.to_array(),
            intensity,
            ..Self::zeroed()
        }
    }

    /// Mark this light as the shadow caster.
    pub fn with_shadows(mut self) -> Self {
        self.casts_shadows = 1;
        self
    }

    pub fn kind(&self) -> Option<LightKind> {
        match self.kind {
            0 => Some(LightKind::Directional),
            1 => Some(LightKind::Point),
            2 => Some(LightKind::Spot),
            _ => None,
        }
    }

    pub fn casts_shadows(&self) -> bool {
        self.casts_shadows != 0
    }

    pub fn direction(&self) -> Vec3 {
        Vec3::from_array(self.direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    #[test]
    fn test_layout_matches_wgsl() {
        assert_eq!(size_of::<Light>(), 64);
        assert_eq!(offset_of!(Light, direction), 0);
        assert_eq!(offset_of!(Light, range), 12);
        assert_eq!(offset_of!(Light, position), 16);
        assert_eq!(offset_of!(Light, intensity), 28);
        assert_eq!(offset_of!(Light, color), 32);
        assert_eq!(offset_of!(Light, spot_falloff), 44);
        assert_eq!(offset_of!(Light, kind), 48);
        assert_eq!(offset_of!(Light, casts_shadows), 52);
    }

    #[test]
    fn test_constructors_tag_kind() {
        let d = Light::directional(Vec3::new(0.0, -2.0, 0.0), Vec3::ONE, 1.0);
        assert_eq!(d.kind(), Some(LightKind::Directional));
        assert_eq!(d.direction(), Vec3::NEG_Y);
        assert!(!d.casts_shadows());
        assert!(d.with_shadows().casts_shadows());

        let p = Light::point(Vec3::new(2.0, 2.0, 0.0), 3.0, Vec3::ONE, 2.0);
        assert_eq!(p.kind(), Some(LightKind::Point));
        assert_eq!(p.range, 3.0);

        let s = Light::spot(Vec3::ZERO, Vec3::Z, 5.0, 20.0, Vec3::ONE, 1.0);
        assert_eq!(s.kind(), Some(LightKind::Spot));
        assert_eq!(s.spot_falloff, 20.0);
    }
}
