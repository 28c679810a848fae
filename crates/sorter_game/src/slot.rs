use glam::Vec2;

use crate::config::SlotSpec;
use crate::events::{GameEvent, SoundCue};

/// Index into the session's slot list, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(pub usize);

/// What the host draws for a slot or piece.
#[derive(Debug, Clone, PartialEq)]
pub struct Visual {
    pub color: [f32; 4],
    pub label: String,
}

/// A typed drop target. Slots never change during a session.
#[derive(Debug, Clone)]
pub struct Slot {
    pub id: String,
    pub kind: String,
    pub position: Vec2,
    pub visual: Visual,
}

impl Slot {
    pub fn from_spec(spec: &SlotSpec) -> Self {
        Self {
            id: spec.id.clone(),
            kind: spec.kind.clone(),
            position: Vec2::new(spec.x, spec.y),
            visual: Visual {
                color: spec.color,
                label: spec.label.clone().unwrap_or_else(|| spec.kind.clone()),
            },
        }
    }

    /// A piece landed here. Only a completion cue; the slot keeps no state.
    pub fn placed(&self) -> GameEvent {
        log::debug!("Slot '{}' completed a placement", self.id);
        GameEvent::Cue(SoundCue::Complete)
    }
}

/// First slot in declaration order whose kind matches.
pub fn find_slot_for_kind(slots: &[Slot], kind: &str) -> Option<SlotId> {
    slots.iter().position(|s| s.kind == kind).map(SlotId)
}
