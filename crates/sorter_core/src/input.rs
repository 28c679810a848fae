//! Input state for a pointer-driven game.
//!
//! - **Level-triggered (held):** `is_held(key)` / `is_pointer_held()` stay true every
//!   frame the key or button is physically down. Dragging polls this.
//!
//! - **Edge-triggered (just_pressed / just_released):** true only for the frame the
//!   transition happened. `end_frame()` clears them, and the host calls it only after a
//!   fixed simulation step has consumed the edges, so a click that lands on a frame with
//!   zero steps is not dropped.
//!
//! The cursor is tracked in window pixels. Mapping to world space belongs to the camera.

use std::collections::HashSet;

use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Escape,
    Enter,
    F3,
    R,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseBtn {
    Left,
    Right,
    Middle,
}

/// The button that picks up and drops pieces.
pub const DRAG_BUTTON: MouseBtn = MouseBtn::Left;

pub struct InputState {
    held: HashSet<Key>,
    just_pressed: HashSet<Key>,
    just_released: HashSet<Key>,

    mouse_held: HashSet<MouseBtn>,
    mouse_just_pressed: HashSet<MouseBtn>,
    mouse_just_released: HashSet<MouseBtn>,

    cursor_px: Vec2,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            held: HashSet::new(),
            just_pressed: HashSet::new(),
            just_released: HashSet::new(),
            mouse_held: HashSet::new(),
            mouse_just_pressed: HashSet::new(),
            mouse_just_released: HashSet::new(),
            cursor_px: Vec2::ZERO,
        }
    }

    pub fn key_down(&mut self, key: Key) {
        if self.held.insert(key) {
            self.just_pressed.insert(key);
        }
    }

    pub fn key_up(&mut self, key: Key) {
        if self.held.remove(&key) {
            self.just_released.insert(key);
        }
    }

    pub fn mouse_down(&mut self, btn: MouseBtn) {
        if self.mouse_held.insert(btn) {
            self.mouse_just_pressed.insert(btn);
        }
    }

    pub fn mouse_up(&mut self, btn: MouseBtn) {
        if self.mouse_held.remove(&btn) {
            self.mouse_just_released.insert(btn);
        }
    }

    pub fn set_cursor(&mut self, x: f64, y: f64) {
        self.cursor_px = Vec2::new(x as f32, y as f32);
    }

    pub fn cursor(&self) -> Vec2 {
        self.cursor_px
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn is_just_pressed(&self, key: Key) -> bool {
        self.just_pressed.contains(&key)
    }

    pub fn is_just_released(&self, key: Key) -> bool {
        self.just_released.contains(&key)
    }

    pub fn is_mouse_held(&self, btn: MouseBtn) -> bool {
        self.mouse_held.contains(&btn)
    }

    pub fn is_mouse_just_pressed(&self, btn: MouseBtn) -> bool {
        self.mouse_just_pressed.contains(&btn)
    }

    pub fn is_mouse_just_released(&self, btn: MouseBtn) -> bool {
        self.mouse_just_released.contains(&btn)
    }

    /// Collapse the drag button state into one pointer sample, with the cursor already
    /// mapped to world space by the caller.
    pub fn pointer_sample(&self, world: Vec2) -> PointerSample {
        PointerSample {
            world,
            pressed: self.is_mouse_just_pressed(DRAG_BUTTON),
            released: self.is_mouse_just_released(DRAG_BUTTON),
        }
    }

    pub fn end_frame(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
        self.mouse_just_pressed.clear();
        self.mouse_just_released.clear();
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

/// What the simulation sees of the pointer for one fixed step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerSample {
    pub world: Vec2,
    pub pressed: bool,
    pub released: bool,
}

impl PointerSample {
    pub fn idle(world: Vec2) -> Self {
        Self {
            world,
            pressed: false,
            released: false,
        }
    }

    /// The same position with edges cleared. Used for the extra steps of a frame so one
    /// click is not delivered twice.
    pub fn without_edges(self) -> Self {
        Self::idle(self.world)
    }
}
