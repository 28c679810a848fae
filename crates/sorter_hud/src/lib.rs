pub mod hud;

pub use hud::{HudActions, HudModel, HudOverlay, SessionStats};
