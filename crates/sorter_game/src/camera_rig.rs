use glam::Vec2;

use crate::config::CameraStops;

/// Game-side view controller. Decides where the view sits; the render camera copies
/// `position` and `zoom` every frame.
#[derive(Debug, Clone)]
pub struct CameraRig {
    pub position: Vec2,
    pub zoom: f32,
    stops: CameraStops,
    ended: bool,
}

impl CameraRig {
    pub fn new(stops: CameraStops) -> Self {
        Self {
            position: stops.title.into(),
            zoom: stops.zoom,
            stops,
            ended: false,
        }
    }

    pub fn reset(&mut self) {
        self.position = self.stops.title.into();
        self.ended = false;
    }

    pub fn enter_play(&mut self) {
        self.position = self.stops.play.into();
    }

    pub fn end_game(&mut self) {
        log::info!("Game has ended!");
        self.position = self.stops.end.into();
        self.ended = true;
    }

    pub fn has_ended(&self) -> bool {
        self.ended
    }
}

/// Holds the one rig a session may have. A second registration is discarded.
#[derive(Debug, Default)]
pub struct CameraSlot {
    rig: Option<CameraRig>,
}

impl CameraSlot {
    /// Returns false when a rig was already registered; the newcomer is dropped.
    pub fn register(&mut self, rig: CameraRig) -> bool {
        if self.rig.is_some() {
            log::warn!("A camera rig is already registered for this session, discarding duplicate");
            return false;
        }
        self.rig = Some(rig);
        true
    }

    pub fn get(&self) -> Option<&CameraRig> {
        self.rig.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut CameraRig> {
        self.rig.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Point;

    fn stops() -> CameraStops {
        CameraStops {
            title: Point { x: 0.0, y: 10.0 },
            play: Point { x: 0.0, y: 0.0 },
            end: Point { x: 0.0, y: -10.0 },
            zoom: 50.0,
        }
    }

    #[test]
    fn transitions_move_between_stops() {
        let mut rig = CameraRig::new(stops());
        assert_eq!(rig.position, Vec2::new(0.0, 10.0));
        rig.enter_play();
        assert_eq!(rig.position, Vec2::ZERO);
        rig.end_game();
        assert_eq!(rig.position, Vec2::new(0.0, -10.0));
        assert!(rig.has_ended());
        rig.reset();
        assert_eq!(rig.position, Vec2::new(0.0, 10.0));
        assert!(!rig.has_ended());
    }

    #[test]
    fn second_registration_is_discarded() {
        let mut slot = CameraSlot::default();
        assert!(slot.register(CameraRig::new(stops())));

        let mut other = stops();
        other.zoom = 5.0;
        assert!(!slot.register(CameraRig::new(other)));
        assert_eq!(slot.get().map(|r| r.zoom), Some(50.0));
    }
}
