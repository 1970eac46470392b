//! Surface description shared by entities.
//!
//! A [`Material`] pairs a vertex and a pixel program with the values and
//! resources those programs read: a colour tint, a roughness scale and named
//! texture views and samplers. Several entities can share one material
//! through an `Rc`.

use std::rc::Rc;

use glam::Vec4;

use crate::shader::ShaderProgram;

pub struct Material {
    name: String,
    color_tint: Vec4,
    roughness: f32,
    vertex_shader: Rc<ShaderProgram>,
    pixel_shader: Rc<ShaderProgram>,
    textures: Vec<(String, wgpu::TextureView)>,
    samplers: Vec<(String, wgpu::Sampler)>,
}

impl Material {
    pub fn new(
        name: &str,
        color_tint: Vec4,
        roughness: f32,
        vertex_shader: Rc<ShaderProgram>,
        pixel_shader: Rc<ShaderProgram>,
    ) -> Self {
        Self {
            name: name.to_string(),
            color_tint,
            roughness,
            vertex_shader,
            pixel_shader,
            textures: Vec::new(),
            samplers: Vec::new(),
        }
    }

    /// Attach a texture view under the pixel program's slot name. A second
    /// view with the same name replaces the first.
    pub fn add_texture_srv(&mut self, name: &str, view: &wgpu::TextureView) {
        match self.textures.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = view.clone(),
            None => self.textures.push((name.to_string(), view.clone())),
        }
    }

    pub fn add_sampler(&mut self, name: &str, sampler: &wgpu::Sampler) {
        match self.samplers.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = sampler.clone(),
            None => self.samplers.push((name.to_string(), sampler.clone())),
        }
    }

    /// Stage every attached texture and sampler on the pixel program.
    pub fn prepare_material(&self) {
        for (name, view) in &self.textures {
            self.pixel_shader.set_shader_resource_view(name, view);
        }
        for (name, sampler) in &self.samplers {
            self.pixel_shader.set_sampler_state(name, sampler);
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color_tint(&self) -> Vec4 {
        self.color_tint
    }

    pub fn roughness(&self) -> f32 {
        self.roughness
    }

    pub fn vertex_shader(&self) -> &Rc<ShaderProgram> {
        &self.vertex_shader
    }

    pub fn pixel_shader(&self) -> &Rc<ShaderProgram> {
        &self.pixel_shader
    }

}
