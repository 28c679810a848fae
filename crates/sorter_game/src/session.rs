//! One playthrough: slots, manager, score, camera and UI flags in a single context.
//!
//! The host calls [`Session::update`] once per fixed step with that step's pointer sample.
//! Within a step, press and release are handled before the dragged piece follows the
//! pointer, so a piece never moves on the step it was dropped.

use rand::rngs::StdRng;
use rand::SeedableRng;

use sorter_core::input::PointerSample;

use crate::camera_rig::{CameraRig, CameraSlot};
use crate::config::PuzzleFile;
use crate::events::{GameEvent, GameOverReason};
use crate::manager::PuzzleManager;
use crate::piece::{PieceId, ReleaseOutcome};
use crate::score::{ScoreSignal, ScoreTracker};
use crate::slot::Slot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    Title,
    Playing,
    Over(GameOverReason),
}

/// Which widgets the HUD should show. The session only flips flags and text.
#[derive(Debug, Clone, PartialEq)]
pub struct UiState {
    pub start_visible: bool,
    pub end_visible: bool,
    pub restart_visible: bool,
    pub score_text: String,
    pub end_text: String,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            start_visible: true,
            end_visible: false,
            restart_visible: false,
            score_text: "0".to_string(),
            end_text: String::new(),
        }
    }
}

pub struct Session {
    puzzle_id: String,
    seed: u64,
    snap_threshold: f32,
    restart_enabled: bool,
    slots: Vec<Slot>,
    manager: PuzzleManager,
    score: ScoreTracker,
    camera: CameraSlot,
    ui: UiState,
    phase: GamePhase,
    dragging: Option<PieceId>,
    play_time: f32,
    games_played: u32,
    events: Vec<GameEvent>,
}

impl Session {
    /// Seeded from the puzzle file when it pins a seed, otherwise from OS entropy.
    pub fn new(puzzle: &PuzzleFile) -> Self {
        let seed = puzzle.seed.unwrap_or_else(rand::random);
        Self::with_seed(puzzle, seed)
    }

    pub fn with_seed(puzzle: &PuzzleFile, seed: u64) -> Self {
        let mut camera = CameraSlot::default();
        camera.register(CameraRig::new(puzzle.camera));

        log::info!(
            "Session for puzzle '{}' (seed {}, ramp {:?})",
            puzzle.puzzle_id,
            seed,
            puzzle.ramp
        );

        Self {
            puzzle_id: puzzle.puzzle_id.clone(),
            seed,
            snap_threshold: puzzle.snap_threshold,
            restart_enabled: puzzle.restart_enabled,
            slots: puzzle.slots.iter().map(Slot::from_spec).collect(),
            manager: PuzzleManager::new(puzzle, StdRng::seed_from_u64(seed)),
            score: ScoreTracker::new(puzzle.target_score),
            camera,
            ui: UiState::default(),
            phase: GamePhase::Title,
            dragging: None,
            play_time: 0.0,
            games_played: 0,
            events: Vec::new(),
        }
    }

    pub fn start_game(&mut self) {
        if self.phase != GamePhase::Title {
            log::warn!("start_game ignored in phase {:?}", self.phase);
            return;
        }

        self.ui.start_visible = false;
        match self.camera.get_mut() {
            Some(rig) => rig.enter_play(),
            None => log::error!("No camera rig registered, view stays put"),
        }
        self.manager.initialize_queue();
        self.score.set_target(self.manager.round().target_score);
        self.ui.score_text = self.score.display_text().to_string();
        self.phase = GamePhase::Playing;
        self.play_time = 0.0;
        self.games_played += 1;
        log::info!(
            "Game {} started: target {}, first batch {}",
            self.games_played,
            self.score.target(),
            self.manager.round().batch_size
        );
        self.events.push(GameEvent::GameStarted {
            target_score: self.score.target(),
        });

        let count = self.manager.round().batch_size;
        if let Some(reason) =
            self.manager
                .spawn_batch(count, &self.slots, self.score.score(), &mut self.events)
        {
            self.game_over(reason);
        }
    }

    /// Repeated signals after the first are ignored.
    pub fn game_over(&mut self, reason: GameOverReason) {
        if let GamePhase::Over(previous) = self.phase {
            log::debug!("Game over ({reason}) already handled as ({previous})");
            return;
        }

        self.phase = GamePhase::Over(reason);
        self.dragging = None;
        log::info!(
            "Game over: {} with score {}/{} after {:.1}s",
            reason,
            self.score.score(),
            self.score.target(),
            self.play_time
        );
        match self.camera.get_mut() {
            Some(rig) => rig.end_game(),
            None => log::error!("No camera rig registered, cannot show the ending view"),
        }

        self.ui.end_visible = true;
        self.ui.restart_visible = self.restart_enabled;
        self.ui.end_text = match reason {
            GameOverReason::TargetReached => {
                format!("All sorted! Final score {}", self.score.score())
            }
            GameOverReason::PoolExhausted => format!(
                "Out of pieces. Final score {} of {}",
                self.score.score(),
                self.score.target()
            ),
        };
        self.events.push(GameEvent::GameOver(reason));
    }

    pub fn restart_game(&mut self) {
        if !matches!(self.phase, GamePhase::Over(_)) {
            log::warn!("restart_game ignored in phase {:?}", self.phase);
            return;
        }
        if !self.restart_enabled {
            log::warn!("restart_game ignored: restart is disabled for '{}'", self.puzzle_id);
            return;
        }

        self.ui.end_visible = false;
        self.ui.restart_visible = false;
        self.ui.end_text.clear();
        match self.camera.get_mut() {
            Some(rig) => rig.reset(),
            None => log::error!("No camera rig registered, view stays put"),
        }
        self.dragging = None;
        self.manager.reset_for_restart();
        self.score.reset();
        self.score.set_target(self.manager.round().target_score);
        self.ui.score_text = self.score.display_text().to_string();

        let round = self.manager.round();
        log::info!(
            "Restarting: target {}, extra pieces per round {}",
            round.target_score,
            round.extra_pieces_per_round
        );
        self.events.push(GameEvent::Restarted {
            target_score: round.target_score,
            extra_pieces_per_round: round.extra_pieces_per_round,
        });

        self.phase = GamePhase::Title;
        self.start_game();
    }

    pub fn update(&mut self, dt: f32, pointer: PointerSample) {
        if self.phase != GamePhase::Playing {
            return;
        }
        self.play_time += dt;

        if pointer.pressed && self.dragging.is_none() {
            self.press(pointer);
        }
        if pointer.released && self.dragging.is_some() {
            self.release();
        }

        if let Some(id) = self.dragging {
            if let Some(piece) = self.manager.piece_mut(id) {
                piece.frame_update(pointer.world);
            }
        }
    }

    fn press(&mut self, pointer: PointerSample) {
        let Some(id) = self.manager.topmost_at(pointer.world) else {
            log::trace!("Press at {:?} hit no piece", pointer.world);
            return;
        };
        let Some(piece) = self.manager.piece_mut(id) else {
            return;
        };
        if piece.press_start(pointer.world, &mut self.events) {
            log::debug!("Picked up piece {} ({})", id.0, piece.kind);
            self.dragging = Some(id);
        }
    }

    fn release(&mut self) {
        let Some(id) = self.dragging.take() else {
            return;
        };
        let Some(piece) = self.manager.piece_mut(id) else {
            return;
        };
        let slot_position = piece.slot.map(|s| self.slots[s.0].position);
        let outcome = piece.press_end(slot_position, self.snap_threshold, &mut self.events);

        let ReleaseOutcome::Placed(slot_id) = outcome else {
            log::debug!("Piece {} released: {:?}", id.0, outcome);
            return;
        };

        self.events.push(self.slots[slot_id.0].placed());
        let signal = self.score.increment();
        self.ui.score_text = self.score.display_text().to_string();
        self.events.push(GameEvent::ScoreChanged(self.score.score()));
        if signal == ScoreSignal::TargetReached {
            self.game_over(GameOverReason::TargetReached);
        }

        if let Some(reason) =
            self.manager
                .piece_placed(id, &self.slots, self.score.score(), &mut self.events)
        {
            self.game_over(reason);
        }
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn puzzle_id(&self) -> &str {
        &self.puzzle_id
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn snap_threshold(&self) -> f32 {
        self.snap_threshold
    }

    pub fn score(&self) -> &ScoreTracker {
        &self.score
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn manager(&self) -> &PuzzleManager {
        &self.manager
    }

    pub fn camera(&self) -> Option<&CameraRig> {
        self.camera.get()
    }

    pub fn dragging(&self) -> Option<PieceId> {
        self.dragging
    }
}
