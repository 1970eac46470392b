//! Scripted frames against the pass-ordering state machine.

use std::cell::RefCell;

use penumbra::programs::{pbr_pixel_layout, sky_pixel_layout};
use penumbra::{
    FrameError, FramePhase, FrameSequencer, InputSlots, ParameterLayout, ResourceId,
    ResourceSlots, SHADOW_MAP_SLOT,
};

/// Texture slots of one pixel program, staged without a device.
struct PixelSlots {
    layout: ParameterLayout,
    textures: RefCell<ResourceSlots<&'static str>>,
}

impl PixelSlots {
    fn new(layout: ParameterLayout) -> Self {
        let textures = RefCell::new(ResourceSlots::new(layout.texture_count()));
        Self { layout, textures }
    }

    fn shadow_map(&self) -> Option<&'static str> {
        let index = self.layout.texture_index(SHADOW_MAP_SLOT)?;
        self.textures.borrow().get(index).copied()
    }
}

impl InputSlots for PixelSlots {
    type Input = &'static str;

    fn stage_input(&self, name: &str, value: &&'static str) -> bool {
        match self.layout.texture_index(name) {
            Some(index) => {
                self.textures.borrow_mut().set(index, *value);
                true
            }
            None => false,
        }
    }

    fn clear_input(&self, name: &str) -> bool {
        match self.layout.texture_index(name) {
            Some(index) => {
                self.textures.borrow_mut().clear(index);
                true
            }
            None => false,
        }
    }
}

struct Frame {
    shadow_map: ResourceId,
    depth: ResourceId,
}

impl Frame {
    fn new() -> Self {
        Self {
            shadow_map: ResourceId::next(),
            depth: ResourceId::next(),
        }
    }

    /// One well-behaved frame: write, sample, release, present.
    fn run(&self, seq: &mut FrameSequencer) -> Result<(), FrameError> {
        seq.begin_shadow_pass(self.shadow_map)?;
        assert!(!seq.is_bound_as_input(self.shadow_map));
        seq.begin_main_pass(self.depth)?;
        seq.bind_shader_input(self.shadow_map)?;
        seq.begin_present()?;
        seq.unbind_shader_input(self.shadow_map);
        seq.end_frame()
    }
}

#[test]
fn many_frames_in_a_row() {
    let frame = Frame::new();
    let mut seq = FrameSequencer::new();
    for _ in 0..5 {
        frame.run(&mut seq).unwrap();
        assert_eq!(seq.phase(), FramePhase::Idle);
        assert_eq!(seq.depth_target(), None);
    }
}

#[test]
fn shadow_map_is_never_input_and_target_at_once() {
    let frame = Frame::new();
    let mut seq = FrameSequencer::new();

    seq.begin_shadow_pass(frame.shadow_map).unwrap();
    assert_eq!(seq.depth_target(), Some(frame.shadow_map));
    assert!(seq.bind_shader_input(frame.shadow_map).is_err());
    assert!(!seq.is_bound_as_input(frame.shadow_map));

    seq.begin_main_pass(frame.depth).unwrap();
    assert_eq!(seq.depth_target(), Some(frame.depth));
    seq.bind_shader_input(frame.shadow_map).unwrap();
    assert!(seq.is_bound_as_input(frame.shadow_map));
}

#[test]
fn forgetting_to_unbind_fails_the_frame() {
    let frame = Frame::new();
    let mut seq = FrameSequencer::new();

    seq.begin_shadow_pass(frame.shadow_map).unwrap();
    seq.begin_main_pass(frame.depth).unwrap();
    seq.bind_shader_input(frame.shadow_map).unwrap();
    seq.begin_present().unwrap();
    assert_eq!(seq.end_frame(), Err(FrameError::DanglingShaderInputs(1)));

    // Still bound after a failed frame, so the next shadow pass is a hazard.
    seq.abort_frame();
    assert_eq!(
        seq.begin_shadow_pass(frame.shadow_map),
        Err(FrameError::BindingHazard(frame.shadow_map))
    );

    seq.unbind_shader_input(frame.shadow_map);
    frame.run(&mut seq).unwrap();
}

#[test]
fn passes_cannot_be_skipped_or_repeated() {
    let frame = Frame::new();
    let mut seq = FrameSequencer::new();

    assert!(matches!(
        seq.end_frame(),
        Err(FrameError::InvalidTransition {
            phase: FramePhase::Idle,
            ..
        })
    ));
    seq.begin_shadow_pass(frame.shadow_map).unwrap();
    assert!(seq.begin_shadow_pass(frame.shadow_map).is_err());
    assert!(seq.begin_present().is_err());
    assert_eq!(seq.phase(), FramePhase::ShadowPass);
}

#[test]
fn frame_without_shadow_caster_skips_to_main_pass() {
    let frame = Frame::new();
    let mut seq = FrameSequencer::new();
    seq.begin_main_pass(frame.depth).unwrap();
    seq.bind_shader_input(frame.shadow_map).unwrap();
    seq.begin_present().unwrap();
    seq.unbind_shader_input(frame.shadow_map);
    seq.end_frame().unwrap();
}

/// Main pass over several programs, then release and present.
fn draw_lit_frame(
    seq: &mut FrameSequencer,
    frame: &Frame,
    programs: &[PixelSlots],
    release: bool,
) -> Result<(), FrameError> {
    seq.begin_shadow_pass(frame.shadow_map)?;
    seq.begin_main_pass(frame.depth)?;
    for program in programs {
        seq.stage_shader_input(program, SHADOW_MAP_SLOT, &"shadow map", frame.shadow_map)?;
    }
    seq.begin_present()?;
    if release {
        seq.release_shader_input(programs, SHADOW_MAP_SLOT, frame.shadow_map);
    }
    let ended = seq.end_frame();
    seq.abort_on_error(ended)
}

#[test]
fn staged_shadow_map_is_released_before_the_next_frame() {
    let frame = Frame::new();
    let programs = [PixelSlots::new(pbr_pixel_layout()), PixelSlots::new(pbr_pixel_layout())];
    let mut seq = FrameSequencer::new();

    for _ in 0..3 {
        draw_lit_frame(&mut seq, &frame, &programs, true).unwrap();
        assert!(programs.iter().all(|p| p.shadow_map().is_none()));
        assert!(!seq.is_bound_as_input(frame.shadow_map));
        assert_eq!(seq.phase(), FramePhase::Idle);
    }
}

#[test]
fn staging_marks_the_shadow_map_as_input() {
    let frame = Frame::new();
    let pixel = PixelSlots::new(pbr_pixel_layout());
    let mut seq = FrameSequencer::new();
    seq.begin_shadow_pass(frame.shadow_map).unwrap();
    seq.begin_main_pass(frame.depth).unwrap();

    assert_eq!(
        seq.stage_shader_input(&pixel, SHADOW_MAP_SLOT, &"shadow map", frame.shadow_map),
        Ok(true)
    );
    assert_eq!(pixel.shadow_map(), Some("shadow map"));
    assert!(seq.is_bound_as_input(frame.shadow_map));
}

#[test]
fn unreleased_frame_is_aborted_and_blocks_the_next_shadow_pass() {
    let frame = Frame::new();
    let programs = [PixelSlots::new(pbr_pixel_layout())];
    let mut seq = FrameSequencer::new();

    assert_eq!(
        draw_lit_frame(&mut seq, &frame, &programs, false),
        Err(FrameError::DanglingShaderInputs(1))
    );
    assert_eq!(seq.phase(), FramePhase::Idle);
    assert_eq!(programs[0].shadow_map(), Some("shadow map"));
    assert_eq!(
        seq.begin_shadow_pass(frame.shadow_map),
        Err(FrameError::BindingHazard(frame.shadow_map))
    );

    seq.release_shader_input(&programs, SHADOW_MAP_SLOT, frame.shadow_map);
    assert_eq!(programs[0].shadow_map(), None);
    draw_lit_frame(&mut seq, &frame, &programs, true).unwrap();
}

#[test]
fn programs_without_a_shadow_slot_are_skipped() {
    let frame = Frame::new();
    let programs = [PixelSlots::new(sky_pixel_layout())];
    let mut seq = FrameSequencer::new();
    draw_lit_frame(&mut seq, &frame, &programs, false).unwrap();
    assert!(!seq.is_bound_as_input(frame.shadow_map));
}
