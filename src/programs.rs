//! Built-in shader programs.
//!
//! Each constructor compiles one embedded WGSL stage and declares the
//! [`ParameterLayout`] that matches its uniform struct and resource bindings.
//! The layout functions are public so the offsets can be checked without a
//! device.

use crate::gpu::GpuContext;
use crate::light::{Light, MAX_LIGHTS};
use crate::shader::{ParameterLayout, ShaderProgram, ShaderStage, TextureKind};

const MESH_VS: &str = include_str!("shaders/mesh_vs.wgsl");
const PBR_PS: &str = include_str!("shaders/pbr_ps.wgsl");
const SHADOW_VS: &str = include_str!("shaders/shadow_vs.wgsl");
const SKY_VS: &str = include_str!("shaders/sky_vs.wgsl");
const SKY_PS: &str = include_str!("shaders/sky_ps.wgsl");

pub fn mesh_vertex_layout() -> ParameterLayout {
    ParameterLayout::new()
        .mat4("world")
        .mat4("world_inverse_transpose")
        .mat4("view")
        .mat4("projection")
        .mat4("light_view")
        .mat4("light_projection")
}

pub fn pbr_pixel_layout() -> ParameterLayout {
    ParameterLayout::new()
        .vec4("color_tint")
        .vec3("camera_position")
        .float("roughness")
        .vec3("ambient_color")
        .int("light_count")
        .array("lights", size_of::<Light>() as u32, MAX_LIGHTS as u32)
        .texture("SurfaceTexture", 1, TextureKind::Color2d)
        .texture("SurfaceRoughness", 2, TextureKind::Color2d)
        .texture("NormalMap", 3, TextureKind::Color2d)
        .texture("MetalnessMap", 4, TextureKind::Color2d)
        .texture("ShadowMap", 5, TextureKind::Depth2d)
        .sampler("BasicSampler", 6)
        .comparison_sampler("ShadowSampler", 7)
}

pub fn shadow_vertex_layout() -> ParameterLayout {
    ParameterLayout::new()
        .mat4("world")
        .mat4("view")
        .mat4("projection")
}

pub fn sky_vertex_layout() -> ParameterLayout {
    ParameterLayout::new().mat4("view").mat4("projection")
}

pub fn sky_pixel_layout() -> ParameterLayout {
    ParameterLayout::new()
        .vec4("color_tint")
        .texture("CubeMap", 1, TextureKind::Cube)
        .sampler("BasicSampler", 2)
}

/// Vertex program for lit meshes.
pub fn mesh_vertex_program(gpu: &GpuContext) -> ShaderProgram {
    ShaderProgram::new(gpu, "Mesh VS", ShaderStage::Vertex, MESH_VS, mesh_vertex_layout())
}

/// Cook-Torrance pixel program with normal, roughness, metalness and
/// shadow maps.
pub fn pbr_pixel_program(gpu: &GpuContext) -> ShaderProgram {
    ShaderProgram::new(gpu, "PBR PS", ShaderStage::Fragment, PBR_PS, pbr_pixel_layout())
}

/// Depth-only vertex program used by the shadow pass.
pub fn shadow_vertex_program(gpu: &GpuContext) -> ShaderProgram {
    ShaderProgram::new(
        gpu,
        "Shadow VS",
        ShaderStage::Vertex,
        SHADOW_VS,
        shadow_vertex_layout(),
    )
}

pub fn sky_vertex_program(gpu: &GpuContext) -> ShaderProgram {
    ShaderProgram::new(gpu, "Sky VS", ShaderStage::Vertex, SKY_VS, sky_vertex_layout())
}

pub fn sky_pixel_program(gpu: &GpuContext) -> ShaderProgram {
    ShaderProgram::new(gpu, "Sky PS", ShaderStage::Fragment, SKY_PS, sky_pixel_layout())
}
