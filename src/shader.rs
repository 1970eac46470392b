//! Shader programs with a named-parameter interface.
//!
//! A [`ShaderProgram`] is one WGSL stage plus a [`ParameterLayout`] that
//! mirrors the program's bind group: a uniform block at binding 0 followed by
//! textures and samplers at the bindings the WGSL source declares. Callers
//! stage values by name, flush the uniform block into the frame's
//! [`UniformArena`] and then bind the program:
//!
//! ```ignore
//! vs.set_matrix4x4("world", world);
//! vs.set_matrix4x4("view", camera.view());
//! vs.copy_all_buffer_data(gpu, arena)?;
//! vs.set_shader(gpu, &mut pass, 0, arena)?;
//! ```
//!
//! Names the layout does not declare are ignored, so one material can feed
//! the same parameter set to programs that only use part of it.
//!
//! Uniform offsets follow WGSL's uniform address space rules: `mat4x4<f32>`,
//! `vec4<f32>` and `vec3<f32>` align to 16 bytes, scalars to 4, and array
//! elements are padded to a 16-byte stride. A scalar declared right after a
//! `vec3` shares its last 4 bytes, exactly as in WGSL.

use std::cell::RefCell;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::{Mat4, Vec3, Vec4};
use log::trace;

use crate::error::{FrameError, ShaderError};
use crate::gpu::GpuContext;
use crate::render_graph::InputSlots;
use crate::uniform_arena::{UniformArena, align_up};

/// Which pipeline stage a program runs in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    /// WGSL entry point name for this stage.
    pub fn entry_point(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vs_main",
            ShaderStage::Fragment => "fs_main",
        }
    }

    fn visibility(self) -> wgpu::ShaderStages {
        match self {
            ShaderStage::Vertex => wgpu::ShaderStages::VERTEX,
            ShaderStage::Fragment => wgpu::ShaderStages::FRAGMENT,
        }
    }
}

/// Texture binding flavour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureKind {
    /// Filterable `texture_2d<f32>`.
    Color2d,
    /// Filterable `texture_cube<f32>`.
    Cube,
    /// `texture_depth_2d`, sampled with a comparison sampler.
    Depth2d,
}

/// Byte range of one uniform field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UniformField {
    pub offset: u32,
    pub size: u32,
}

#[derive(Clone, Debug)]
struct TextureSlot {
    name: String,
    binding: u32,
    kind: TextureKind,
}

#[derive(Clone, Debug)]
struct SamplerSlot {
    name: String,
    binding: u32,
    comparison: bool,
}

/// Declared parameters of one shader program.
#[derive(Clone, Debug, Default)]
pub struct ParameterLayout {
    fields: Vec<(String, UniformField)>,
    textures: Vec<TextureSlot>,
    samplers: Vec<SamplerSlot>,
    end: u32,
}

impl ParameterLayout {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_field(mut self, name: &str, align: u32, size: u32) -> Self {
        let offset = align_up(self.end as u64, align as u64) as u32;
        self.fields
            .push((name.to_string(), UniformField { offset, size }));
        self.end = offset + size;
        self
    }

    pub fn mat4(self, name: &str) -> Self {
        self.push_field(name, 16, 64)
    }

    pub fn vec4(self, name: &str) -> Self {
        self.push_field(name, 16, 16)
    }

    pub fn vec3(self, name: &str) -> Self {
        self.push_field(name, 16, 12)
    }

    pub fn float(self, name: &str) -> Self {
        self.push_field(name, 4, 4)
    }

    pub fn int(self, name: &str) -> Self {
        self.push_field(name, 4, 4)
    }

    /// An array of `count` elements, each `element_size` bytes before
    /// padding to a 16-byte stride.
    pub fn array(self, name: &str, element_size: u32, count: u32) -> Self {
        let stride = align_up(element_size as u64, 16) as u32;
        self.push_field(name, 16, stride * count)
    }

    pub fn texture(mut self, name: &str, binding: u32, kind: TextureKind) -> Self {
        self.textures.push(TextureSlot {
            name: name.to_string(),
            binding,
            kind,
        });
        self
    }

    pub fn sampler(mut self, name: &str, binding: u32) -> Self {
        self.samplers.push(SamplerSlot {
            name: name.to_string(),
            binding,
            comparison: false,
        });
        self
    }

    pub fn comparison_sampler(mut self, name: &str, binding: u32) -> Self {
        self.samplers.push(SamplerSlot {
            name: name.to_string(),
            binding,
            comparison: true,
        });
        self
    }

    /// Look up a uniform field by name.
    pub fn field(&self, name: &str) -> Option<UniformField> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, f)| *f)
    }

    pub fn texture_index(&self, name: &str) -> Option<usize> {
        self.textures.iter().position(|t| t.name == name)
    }

    pub fn sampler_index(&self, name: &str) -> Option<usize> {
        self.samplers.iter().position(|s| s.name == name)
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn sampler_count(&self) -> usize {
        self.samplers.len()
    }

    /// Size of the uniform block: the struct size rounded up to 16 bytes,
    /// never zero.
    pub fn uniform_size(&self) -> u32 {
        (align_up(self.end as u64, 16) as u32).max(16)
    }

    fn bind_group_layout_entries(&self, stage: ShaderStage) -> Vec<wgpu::BindGroupLayoutEntry> {
        let visibility = stage.visibility();
        let mut entries = vec![wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: true,
                min_binding_size: NonZeroU64::new(self.uniform_size() as u64),
            },
            count: None,
        }];
        entries.extend(self.textures.iter().map(|t| {
            let (sample_type, view_dimension) = match t.kind {
                TextureKind::Color2d => (
                    wgpu::TextureSampleType::Float { filterable: true },
                    wgpu::TextureViewDimension::D2,
                ),
                TextureKind::Cube => (
                    wgpu::TextureSampleType::Float { filterable: true },
                    wgpu::TextureViewDimension::Cube,
                ),
                TextureKind::Depth2d => (
                    wgpu::TextureSampleType::Depth,
                    wgpu::TextureViewDimension::D2,
                ),
            };
            wgpu::BindGroupLayoutEntry {
                binding: t.binding,
                visibility,
                ty: wgpu::BindingType::Texture {
                    sample_type,
                    view_dimension,
                    multisampled: false,
                },
                count: None,
            }
        }));
        entries.extend(self.samplers.iter().map(|s| wgpu::BindGroupLayoutEntry {
            binding: s.binding,
            visibility,
            ty: wgpu::BindingType::Sampler(if s.comparison {
                wgpu::SamplerBindingType::Comparison
            } else {
                wgpu::SamplerBindingType::Filtering
            }),
            count: None,
        }));
        entries
    }
}

/// CPU copy of a program's uniform block.
#[derive(Clone, Debug)]
pub struct ParameterBlock {
    bytes: Vec<u8>,
}

impl ParameterBlock {
    pub fn new(layout: &ParameterLayout) -> Self {
        Self {
            bytes: vec![0; layout.uniform_size() as usize],
        }
    }

    /// Write `data` into the field's range, truncated to the field size.
    /// Returns false if the layout has no such field.
    pub fn write(&mut self, layout: &ParameterLayout, name: &str, data: &[u8]) -> bool {
        let Some(field) = layout.field(name) else {
            return false;
        };
        let len = data.len().min(field.size as usize);
        let start = field.offset as usize;
        self.bytes[start..start + len].copy_from_slice(&data[..len]);
        true
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Optional resources bound to numbered slots.
///
/// Remembers whether any slot changed since the last
/// [`take_changed`](Self::take_changed), so bind groups are only rebuilt
/// when their resources differ.
#[derive(Clone, Debug)]
pub struct ResourceSlots<T> {
    slots: Vec<Option<T>>,
    changed: bool,
}

impl<T: PartialEq> ResourceSlots<T> {
    pub fn new(count: usize) -> Self {
        Self {
            slots: (0..count).map(|_| None).collect(),
            changed: false,
        }
    }

    /// Returns whether the slot held something else before.
    pub fn set(&mut self, index: usize, value: T) -> bool {
        let slot = &mut self.slots[index];
        if slot.as_ref() == Some(&value) {
            return false;
        }
        *slot = Some(value);
        self.changed = true;
        true
    }

    pub fn clear(&mut self, index: usize) {
        if self.slots[index].take().is_some() {
            self.changed = true;
        }
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots[index].as_ref()
    }

    /// Index of the first slot with nothing bound.
    pub fn first_empty(&self) -> Option<usize> {
        self.slots.iter().position(Option::is_none)
    }

    /// Whether anything changed since the last call.
    pub fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }
}

#[derive(Debug)]
struct Staging {
    block: ParameterBlock,
    textures: ResourceSlots<wgpu::TextureView>,
    samplers: ResourceSlots<wgpu::Sampler>,
    flushed_offset: Option<u32>,
    /// Last bind group and the uniform buffer it was built over.
    bind_group: Option<(wgpu::Buffer, wgpu::BindGroup)>,
}

static NEXT_PROGRAM_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies a program for pipeline caching.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProgramId(u64);

/// One compiled WGSL stage with named, staged parameters.
#[derive(Debug)]
pub struct ShaderProgram {
    id: ProgramId,
    label: String,
    stage: ShaderStage,
    module: wgpu::ShaderModule,
    layout: ParameterLayout,
    bind_group_layout: wgpu::BindGroupLayout,
    staging: RefCell<Staging>,
}

impl ShaderProgram {
    /// Compile `source` and build the bind group layout from `layout`.
    pub fn new(
        gpu: &GpuContext,
        label: &str,
        stage: ShaderStage,
        source: &str,
        layout: ParameterLayout,
    ) -> Self {
        let module = gpu
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });
        let bind_group_layout =
            gpu.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some(label),
                    entries: &layout.bind_group_layout_entries(stage),
                });
        let staging = Staging {
            block: ParameterBlock::new(&layout),
            textures: ResourceSlots::new(layout.texture_count()),
            samplers: ResourceSlots::new(layout.sampler_count()),
            flushed_offset: None,
            bind_group: None,
        };
        Self {
            id: ProgramId(NEXT_PROGRAM_ID.fetch_add(1, Ordering::Relaxed)),
            label: label.to_string(),
            stage,
            module,
            layout,
            bind_group_layout,
            staging: RefCell::new(staging),
        }
    }

    pub fn id(&self) -> ProgramId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn module(&self) -> &wgpu::ShaderModule {
        &self.module
    }

    pub fn layout(&self) -> &ParameterLayout {
        &self.layout
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    /// Stage raw bytes for a uniform field, truncated to the field's size.
    pub fn set_data(&self, name: &str, data: &[u8]) -> bool {
        let written = self
            .staging
            .borrow_mut()
            .block
            .write(&self.layout, name, data);
        if !written {
            trace!("{}: no uniform named '{}'", self.label, name);
        }
        written
    }

    /// Stage a matrix. glam is column-major like WGSL, so no transpose.
    pub fn set_matrix4x4(&self, name: &str, value: Mat4) -> bool {
        self.set_data(name, bytemuck::bytes_of(&value.to_cols_array()))
    }

    pub fn set_float4(&self, name: &str, value: Vec4) -> bool {
        self.set_data(name, bytemuck::bytes_of(&value.to_array()))
    }

    pub fn set_float3(&self, name: &str, value: Vec3) -> bool {
        self.set_data(name, bytemuck::bytes_of(&value.to_array()))
    }

    pub fn set_float(&self, name: &str, value: f32) -> bool {
        self.set_data(name, bytemuck::bytes_of(&value))
    }

    pub fn set_int(&self, name: &str, value: i32) -> bool {
        self.set_data(name, bytemuck::bytes_of(&value))
    }

    /// Stage a texture view for a texture slot.
    pub fn set_shader_resource_view(&self, name: &str, view: &wgpu::TextureView) -> bool {
        match self.layout.texture_index(name) {
            Some(index) => {
                self.staging.borrow_mut().textures.set(index, view.clone());
                true
            }
            None => {
                trace!("{}: no texture named '{}'", self.label, name);
                false
            }
        }
    }

    /// Stage a sampler for a sampler slot.
    pub fn set_sampler_state(&self, name: &str, sampler: &wgpu::Sampler) -> bool {
        match self.layout.sampler_index(name) {
            Some(index) => {
                self.staging.borrow_mut().samplers.set(index, sampler.clone());
                true
            }
            None => {
                trace!("{}: no sampler named '{}'", self.label, name);
                false
            }
        }
    }

    /// Drop whatever view is staged in a texture slot.
    pub fn unbind_shader_resource(&self, name: &str) -> bool {
        match self.layout.texture_index(name) {
            Some(index) => {
                self.staging.borrow_mut().textures.clear(index);
                true
            }
            None => false,
        }
    }

    /// Flush the staged uniform block into the arena.
    pub fn copy_all_buffer_data(
        &self,
        gpu: &GpuContext,
        arena: &mut UniformArena,
    ) -> Result<(), FrameError> {
        let mut staging = self.staging.borrow_mut();
        let offset = arena.push(gpu, staging.block.bytes())?;
        staging.flushed_offset = Some(offset);
        Ok(())
    }

    /// Bind this program at `group` with the last flushed offset. The bind
    /// group is rebuilt only when a staged view or sampler changed.
    pub fn set_shader(
        &self,
        gpu: &GpuContext,
        pass: &mut wgpu::RenderPass<'_>,
        group: u32,
        arena: &UniformArena,
    ) -> Result<(), ShaderError> {
        let mut staging = self.staging.borrow_mut();
        let offset = staging.flushed_offset.ok_or_else(|| ShaderError::NotFlushed {
            program: self.label.clone(),
        })?;

        let resources_changed = staging.textures.take_changed() | staging.samplers.take_changed();
        let stale = match &staging.bind_group {
            Some((buffer, _)) => resources_changed || buffer != arena.buffer(),
            None => true,
        };
        if stale {
            staging.bind_group = None;
            let bind_group = self.create_bind_group(gpu, &staging, arena)?;
            trace!("{}: rebuilt bind group", self.label);
            staging.bind_group = Some((arena.buffer().clone(), bind_group));
        }
        if let Some((_, bind_group)) = &staging.bind_group {
            pass.set_bind_group(group, bind_group, &[offset]);
        }
        Ok(())
    }

    fn create_bind_group(
        &self,
        gpu: &GpuContext,
        staging: &Staging,
        arena: &UniformArena,
    ) -> Result<wgpu::BindGroup, ShaderError> {
        let mut entries = vec![wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: arena.buffer(),
                offset: 0,
                size: NonZeroU64::new(self.layout.uniform_size() as u64),
            }),
        }];
        for (index, slot) in self.layout.textures.iter().enumerate() {
            let view = staging.textures.get(index).ok_or_else(|| self.unbound(&slot.name))?;
            entries.push(wgpu::BindGroupEntry {
                binding: slot.binding,
                resource: wgpu::BindingResource::TextureView(view),
            });
        }
        for (index, slot) in self.layout.samplers.iter().enumerate() {
            let sampler = staging.samplers.get(index).ok_or_else(|| self.unbound(&slot.name))?;
            entries.push(wgpu::BindGroupEntry {
                binding: slot.binding,
                resource: wgpu::BindingResource::Sampler(sampler),
            });
        }

        Ok(gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&self.label),
            layout: &self.bind_group_layout,
            entries: &entries,
        }))
    }

    fn unbound(&self, name: &str) -> ShaderError {
        ShaderError::UnboundResource {
            program: self.label.clone(),
            name: name.to_string(),
        }
    }
}

impl InputSlots for ShaderProgram {
    type Input = wgpu::TextureView;

    fn stage_input(&self, name: &str, value: &wgpu::TextureView) -> bool {
        self.set_shader_resource_view(name, value)
    }

    fn clear_input(&self, name: &str) -> bool {
        self.unbind_shader_resource(name)
    }
}
