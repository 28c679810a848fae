//! Draggable piece state machine.
//!
//! `Idle -> Dragging -> Idle` (released away from the slot, back to home) or
//! `Idle -> Dragging -> Placed` (released within the snap threshold of the bound slot).
//! `Placed` is terminal until the pool is rebuilt.

use glam::Vec2;

use crate::events::{GameEvent, SoundCue};
use crate::slot::{Slot, SlotId, Visual};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PieceId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceState {
    Idle,
    Dragging,
    Placed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// Not dragging, nothing happened.
    Ignored,
    Reverted,
    Placed(SlotId),
}

#[derive(Debug, Clone)]
pub struct Piece {
    pub id: PieceId,
    pub kind: String,
    pub state: PieceState,
    pub home_position: Vec2,
    pub position: Vec2,
    pub size: f32,
    pub slot: Option<SlotId>,
    pub active: bool,
    pub visual: Visual,
    grab_offset: Vec2,
}

impl Piece {
    pub fn new(id: PieceId, kind: &str, visual: Visual, size: f32) -> Self {
        Self {
            id,
            kind: kind.to_string(),
            state: PieceState::Idle,
            home_position: Vec2::ZERO,
            position: Vec2::ZERO,
            size,
            slot: None,
            active: false,
            visual,
            grab_offset: Vec2::ZERO,
        }
    }

    /// Bind to a slot. With `copy_visual` the piece also takes on the slot's look.
    pub fn init(&mut self, slot_id: SlotId, slot: &Slot, copy_visual: bool) {
        self.slot = Some(slot_id);
        if copy_visual {
            self.visual = slot.visual.clone();
        }
    }

    /// Show the piece at `position`, which also becomes where a failed drop returns to.
    pub fn activate_at(&mut self, position: Vec2) {
        self.home_position = position;
        self.position = position;
        self.state = PieceState::Idle;
        self.active = true;
        self.grab_offset = Vec2::ZERO;
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn is_placed(&self) -> bool {
        self.state == PieceState::Placed
    }

    pub fn is_dragging(&self) -> bool {
        self.state == PieceState::Dragging
    }

    pub fn contains(&self, point: Vec2) -> bool {
        let half = self.size * 0.5;
        let d = (point - self.position).abs();
        d.x <= half && d.y <= half
    }

    /// Returns true when the press started a drag.
    pub fn press_start(&mut self, pointer: Vec2, events: &mut Vec<GameEvent>) -> bool {
        if self.is_placed() || !self.active {
            return false;
        }
        self.state = PieceState::Dragging;
        self.grab_offset = pointer - self.position;
        events.push(GameEvent::Cue(SoundCue::PickUp));
        true
    }

    /// Follow the pointer. Only moves while dragging.
    pub fn frame_update(&mut self, pointer: Vec2) {
        if !self.is_dragging() {
            return;
        }
        self.position = pointer - self.grab_offset;
    }

    /// Drop the piece. `slot_position` is the bound slot's position, `None` when the piece
    /// never got a slot. Placement needs a distance strictly below `snap_threshold`.
    pub fn press_end(
        &mut self,
        slot_position: Option<Vec2>,
        snap_threshold: f32,
        events: &mut Vec<GameEvent>,
    ) -> ReleaseOutcome {
        if !self.is_dragging() {
            return ReleaseOutcome::Ignored;
        }

        if let (Some(slot_id), Some(target)) = (self.slot, slot_position) {
            if self.position.distance(target) < snap_threshold {
                self.position = target;
                self.state = PieceState::Placed;
                events.push(GameEvent::Cue(SoundCue::Success));
                return ReleaseOutcome::Placed(slot_id);
            }
        }

        self.position = self.home_position;
        self.state = PieceState::Idle;
        events.push(GameEvent::Cue(SoundCue::Drop));
        ReleaseOutcome::Reverted
    }
}
