//! Per-frame keyboard and mouse state.
//!
//! An [`Input`] is owned by the application, fed from winit window events and
//! handed by reference to the scene update and the app's exit check.

use std::collections::HashSet;
use std::hash::Hash;

use glam::Vec2;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Held buttons plus this frame's press and release edges.
#[derive(Debug)]
struct ButtonSet<T> {
    held: HashSet<T>,
    pressed: HashSet<T>,
    released: HashSet<T>,
}

impl<T> Default for ButtonSet<T> {
    fn default() -> Self {
        Self {
            held: HashSet::new(),
            pressed: HashSet::new(),
            released: HashSet::new(),
        }
    }
}

impl<T: Copy + Eq + Hash> ButtonSet<T> {
    fn update(&mut self, button: T, state: ElementState) {
        match state {
            // OS key repeat re-sends presses for held keys; only the first counts.
            ElementState::Pressed => {
                if self.held.insert(button) {
                    self.pressed.insert(button);
                }
            }
            ElementState::Released => {
                self.held.remove(&button);
                self.released.insert(button);
            }
        }
    }

    fn end_frame(&mut self) {
        self.pressed.clear();
        self.released.clear();
    }

    fn release_all(&mut self) {
        self.released.extend(self.held.drain());
    }
}

#[derive(Debug, Default)]
pub struct Input {
    keys: ButtonSet<KeyCode>,
    buttons: ButtonSet<MouseButton>,
    cursor: Option<Vec2>,
    mouse_delta: Vec2,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget this frame's edges and mouse movement. Call after the frame
    /// has consumed them.
    pub fn begin_frame(&mut self) {
        self.keys.end_frame();
        self.buttons.end_frame();
        self.mouse_delta = Vec2::ZERO;
    }

    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    self.keys.update(key, event.state);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => self.buttons.update(*button, *state),
            WindowEvent::CursorMoved { position, .. } => {
                self.move_cursor(Vec2::new(position.x as f32, position.y as f32));
            }
            WindowEvent::CursorLeft { .. } => self.cursor = None,
            WindowEvent::Focused(false) => {
                // Releases never arrive for buttons held while focus is lost.
                self.keys.release_all();
                self.buttons.release_all();
            }
            _ => {}
        }
    }

    pub fn press_key(&mut self, key: KeyCode) {
        self.keys.update(key, ElementState::Pressed);
    }

    pub fn release_key(&mut self, key: KeyCode) {
        self.keys.update(key, ElementState::Released);
    }

    pub fn press_mouse(&mut self, button: MouseButton) {
        self.buttons.update(button, ElementState::Pressed);
    }

    /// Record a cursor position in window pixels. The first position after
    /// the cursor enters the window produces no delta.
    pub fn move_cursor(&mut self, position: Vec2) {
        if let Some(previous) = self.cursor.replace(position) {
            self.mouse_delta += position - previous;
        }
    }

    /// Add raw mouse movement to this frame's delta.
    pub fn add_mouse_delta(&mut self, delta: Vec2) {
        self.mouse_delta += delta;
    }

    pub fn key_down(&self, key: KeyCode) -> bool {
        self.keys.held.contains(&key)
    }

    /// True only on the frame the key went down.
    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.keys.pressed.contains(&key)
    }

    pub fn key_released(&self, key: KeyCode) -> bool {
        self.keys.released.contains(&key)
    }

    pub fn mouse_down(&self, button: MouseButton) -> bool {
        self.buttons.held.contains(&button)
    }

    pub fn mouse_released(&self, button: MouseButton) -> bool {
        self.buttons.released.contains(&button)
    }

    /// Cursor position, while the cursor is inside the window.
    pub fn cursor(&self) -> Option<Vec2> {
        self.cursor
    }

    /// Cursor movement this frame, in pixels. +y is down the window.
    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }
}
