//! CPU-side ordering of the passes in one frame.
//!
//! The shadow map is written as a depth target in the shadow pass and read
//! as a texture in the main pass. [`FrameSequencer`] tracks which phase the
//! frame is in and which resources are bound where, and rejects any step
//! that would leave one resource bound both ways.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::FrameError;

static NEXT_RESOURCE_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies a GPU resource tracked by the sequencer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ResourceId(u64);

impl ResourceId {
    /// A fresh, process-unique id.
    pub fn next() -> Self {
        Self(NEXT_RESOURCE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Named texture slots a program samples from.
///
/// [`FrameSequencer::stage_shader_input`] and
/// [`FrameSequencer::release_shader_input`] go through this trait so the slot
/// and the sequencer's record of it always change together.
pub trait InputSlots {
    type Input;

    /// Put `value` in the slot called `name`. False if there is no such slot.
    fn stage_input(&self, name: &str, value: &Self::Input) -> bool;

    /// Empty the slot called `name`. False if there is no such slot.
    fn clear_input(&self, name: &str) -> bool;
}

/// Where a frame is in `ShadowPass → MainPass → Present`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FramePhase {
    Idle,
    ShadowPass,
    MainPass,
    Present,
}

/// Validates pass transitions and depth-target/shader-input hazards.
#[derive(Debug)]
pub struct FrameSequencer {
    phase: FramePhase,
    depth_target: Option<ResourceId>,
    shader_inputs: HashSet<ResourceId>,
}

impl Default for FrameSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSequencer {
    pub fn new() -> Self {
        Self {
            phase: FramePhase::Idle,
            depth_target: None,
            shader_inputs: HashSet::new(),
        }
    }

    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    pub fn depth_target(&self) -> Option<ResourceId> {
        self.depth_target
    }

    pub fn is_bound_as_input(&self, resource: ResourceId) -> bool {
        self.shader_inputs.contains(&resource)
    }

    /// Start rendering depth into `shadow_map`.
    pub fn begin_shadow_pass(&mut self, shadow_map: ResourceId) -> Result<(), FrameError> {
        self.require_phase(&[FramePhase::Idle], "begin the shadow pass")?;
        if self.is_bound_as_input(shadow_map) {
            return Err(FrameError::BindingHazard(shadow_map));
        }
        self.depth_target = Some(shadow_map);
        self.phase = FramePhase::ShadowPass;
        Ok(())
    }

    /// Start the main pass; the shadow map stops being a depth target.
    pub fn begin_main_pass(&mut self, depth_buffer: ResourceId) -> Result<(), FrameError> {
        self.require_phase(
            &[FramePhase::Idle, FramePhase::ShadowPass],
            "begin the main pass",
        )?;
        if self.is_bound_as_input(depth_buffer) {
            return Err(FrameError::BindingHazard(depth_buffer));
        }
        self.depth_target = Some(depth_buffer);
        self.phase = FramePhase::MainPass;
        Ok(())
    }

    /// Record that `resource` is bound for sampling.
    pub fn bind_shader_input(&mut self, resource: ResourceId) -> Result<(), FrameError> {
        self.check_shader_input(resource)?;
        self.shader_inputs.insert(resource);
        Ok(())
    }

    /// Stage `value` in `program`'s `name` slot and record `resource` as a
    /// shader input. Returns `Ok(false)`, recording nothing, if the program
    /// has no such slot.
    pub fn stage_shader_input<P: InputSlots + ?Sized>(
        &mut self,
        program: &P,
        name: &str,
        value: &P::Input,
        resource: ResourceId,
    ) -> Result<bool, FrameError> {
        self.check_shader_input(resource)?;
        if !program.stage_input(name, value) {
            return Ok(false);
        }
        self.shader_inputs.insert(resource);
        Ok(true)
    }

    /// Empty the `name` slot of every program and stop tracking `resource`.
    pub fn release_shader_input<'p, P: InputSlots + ?Sized + 'p>(
        &mut self,
        programs: impl IntoIterator<Item = &'p P>,
        name: &str,
        resource: ResourceId,
    ) {
        for program in programs {
            program.clear_input(name);
        }
        self.unbind_shader_input(resource);
    }

    /// Allowed in any phase; unbinding something not bound is a no-op.
    pub fn unbind_shader_input(&mut self, resource: ResourceId) {
        self.shader_inputs.remove(&resource);
    }

    pub fn begin_present(&mut self) -> Result<(), FrameError> {
        self.require_phase(&[FramePhase::MainPass], "present")?;
        self.depth_target = None;
        self.phase = FramePhase::Present;
        Ok(())
    }

    /// Finish the frame. Every shader input must have been unbound.
    pub fn end_frame(&mut self) -> Result<(), FrameError> {
        self.require_phase(&[FramePhase::Present], "end the frame")?;
        if !self.shader_inputs.is_empty() {
            return Err(FrameError::DanglingShaderInputs(self.shader_inputs.len()));
        }
        self.phase = FramePhase::Idle;
        Ok(())
    }

    /// Pass `result` through, aborting the frame first if it failed.
    pub fn abort_on_error<T>(&mut self, result: Result<T, FrameError>) -> Result<T, FrameError> {
        if result.is_err() {
            self.abort_frame();
        }
        result
    }

    /// Drop back to `Idle` after a failed frame. Shader inputs stay recorded
    /// until they are explicitly unbound.
    pub fn abort_frame(&mut self) {
        self.depth_target = None;
        self.phase = FramePhase::Idle;
    }

    fn check_shader_input(&self, resource: ResourceId) -> Result<(), FrameError> {
        self.require_phase(&[FramePhase::MainPass], "bind a shader input")?;
        if self.depth_target == Some(resource) {
            return Err(FrameError::BindingHazard(resource));
        }
        Ok(())
    }

    fn require_phase(&self, allowed: &[FramePhase], action: &'static str) -> Result<(), FrameError> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(FrameError::InvalidTransition {
                action,
                phase: self.phase,
            })
        }
    }
}
