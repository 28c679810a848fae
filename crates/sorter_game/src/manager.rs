//! Piece pool, spawn queue and round progression.
//!
//! The manager owns every piece instance. A session start builds the pool
//! (`copies_per_kind` clones per kind), shuffles it once and feeds it through a queue.
//! Each round spawns a batch from the queue; once the whole batch is placed the batch
//! size ramps and the next batch spawns.
//!
//! Game over is never acted on here. Operations that detect it return the reason and the
//! session decides what to do with it.

use std::collections::VecDeque;

use glam::Vec2;
use rand::rngs::StdRng;
use rand::Rng;

use crate::config::{PieceSpec, PuzzleFile, SpawnArea};
use crate::events::{GameEvent, GameOverReason};
use crate::piece::{Piece, PieceId};
use crate::round::{RampPolicy, RoundState};
use crate::slot::{find_slot_for_kind, Slot, Visual};

/// Per-kind blueprint that pool pieces are cloned from.
#[derive(Debug, Clone)]
pub struct PieceTemplate {
    pub kind: String,
    pub visual: Visual,
}

impl PieceTemplate {
    pub fn from_spec(spec: &PieceSpec) -> Self {
        Self {
            kind: spec.kind.clone(),
            visual: Visual {
                color: spec.color,
                label: spec.label.clone().unwrap_or_else(|| spec.kind.clone()),
            },
        }
    }
}

/// In-place Fisher-Yates: walk from the last index down to 1, swapping each element with
/// a uniformly chosen index at or below it.
pub fn shuffle<T>(rng: &mut impl Rng, items: &mut [T]) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}

pub struct PuzzleManager {
    templates: Vec<PieceTemplate>,
    copies_per_kind: u32,
    piece_size: f32,
    spawn_area: SpawnArea,
    ramp: RampPolicy,
    initial_batch_size: usize,
    swap_visual_on_bind: bool,
    rng: StdRng,

    pieces: Vec<Piece>,
    queue: VecDeque<PieceId>,
    /// Spawned and not yet placed, in spawn order. Later entries draw on top.
    active: Vec<PieceId>,
    round: RoundState,
}

impl PuzzleManager {
    pub fn new(puzzle: &PuzzleFile, rng: StdRng) -> Self {
        Self {
            templates: puzzle.pieces.iter().map(PieceTemplate::from_spec).collect(),
            copies_per_kind: puzzle.copies_per_kind,
            piece_size: puzzle.piece_size,
            spawn_area: puzzle.spawn_area,
            ramp: puzzle.ramp,
            initial_batch_size: puzzle.initial_batch_size,
            swap_visual_on_bind: puzzle.swap_visual_on_bind,
            rng,
            pieces: Vec::new(),
            queue: VecDeque::new(),
            active: Vec::new(),
            round: RoundState::new(
                puzzle.initial_batch_size,
                puzzle.target_score,
                puzzle.extra_pieces_per_round,
            ),
        }
    }

    /// Build the pool from the templates, all inactive, and queue it in shuffled order.
    /// Any previous pool is dropped.
    pub fn initialize_queue(&mut self) {
        self.pieces.clear();
        self.queue.clear();
        self.active.clear();

        for template in &self.templates {
            for _ in 0..self.copies_per_kind {
                let id = PieceId(self.pieces.len());
                self.pieces.push(Piece::new(
                    id,
                    &template.kind,
                    template.visual.clone(),
                    self.piece_size,
                ));
            }
        }

        let mut order: Vec<PieceId> = self.pieces.iter().map(|p| p.id).collect();
        shuffle(&mut self.rng, &mut order);
        self.queue.extend(order);

        log::info!(
            "Piece queue initialized: {} pieces across {} kinds",
            self.queue.len(),
            self.templates.len()
        );
    }

    /// Spawn up to `count` pieces. Returns the game-over reason instead when the score
    /// has already reached the target.
    pub fn spawn_batch(
        &mut self,
        count: usize,
        slots: &[Slot],
        score: u32,
        events: &mut Vec<GameEvent>,
    ) -> Option<GameOverReason> {
        if score >= self.round.target_score {
            log::info!(
                "Spawn skipped: score {} already at target {}",
                score,
                self.round.target_score
            );
            return Some(GameOverReason::TargetReached);
        }

        let mut spawned: Vec<PieceId> = Vec::with_capacity(count);
        // Consecutive rejections. A full rotation with nothing accepted means every
        // queued piece is already out, so stop instead of spinning.
        let mut rejected_in_a_row = 0usize;

        while spawned.len() < count && rejected_in_a_row < self.queue.len() {
            let Some(id) = self.queue.pop_front() else {
                break;
            };
            if self.active.contains(&id) || spawned.contains(&id) {
                self.queue.push_back(id);
                rejected_in_a_row += 1;
                continue;
            }
            rejected_in_a_row = 0;
            self.activate(id, slots);
            spawned.push(id);
        }

        if spawned.len() < count {
            log::error!(
                "Spawn queue exhausted: found {} of {} requested pieces (round {})",
                spawned.len(),
                count,
                self.round.round
            );
        }

        log::info!(
            "Round {}: spawned {} piece(s), {} left in queue",
            self.round.round,
            spawned.len(),
            self.queue.len()
        );
        events.push(GameEvent::BatchSpawned {
            round: self.round.round,
            requested: count,
            spawned: spawned.len(),
        });
        None
    }

    fn activate(&mut self, id: PieceId, slots: &[Slot]) {
        let position = self.random_spawn_position();
        let copy_visual = self.swap_visual_on_bind;
        let piece = &mut self.pieces[id.0];
        piece.activate_at(position);

        match find_slot_for_kind(slots, &piece.kind) {
            Some(slot_id) => piece.init(slot_id, &slots[slot_id.0], copy_visual),
            None => log::error!(
                "No slot accepts kind '{}'. Piece {} can never be placed.",
                piece.kind,
                id.0
            ),
        }

        self.active.push(id);
    }

    fn random_spawn_position(&mut self) -> Vec2 {
        let area = self.spawn_area;
        Vec2::new(
            self.rng.random_range(area.min_x..=area.max_x),
            self.rng.random_range(area.min_y..=area.max_y),
        )
    }

    /// Book a placed piece. Calling this for a piece that is not active is a caller bug;
    /// it is logged and nothing changes.
    pub fn piece_placed(
        &mut self,
        id: PieceId,
        slots: &[Slot],
        score: u32,
        events: &mut Vec<GameEvent>,
    ) -> Option<GameOverReason> {
        let Some(index) = self.active.iter().position(|&a| a == id) else {
            log::error!("piece_placed called for piece {} which is not active", id.0);
            return None;
        };
        self.active.remove(index);
        if let Some(piece) = self.pieces.get_mut(id.0) {
            piece.deactivate();
        }

        if self.round.record_placement() {
            if score >= self.round.target_score {
                return Some(GameOverReason::TargetReached);
            }
            self.round.advance(self.ramp);
            log::info!(
                "Round {} begins with batch size {}",
                self.round.round,
                self.round.batch_size
            );
            if let Some(reason) = self.spawn_batch(self.round.batch_size, slots, score, events) {
                return Some(reason);
            }
        }

        if self.active.is_empty() && self.queue.is_empty() {
            log::warn!(
                "Every piece has been used with score {} of {}",
                score,
                self.round.target_score
            );
            return Some(GameOverReason::PoolExhausted);
        }
        None
    }

    /// Deactivate everything, empty the queue and raise the difficulty for the next game.
    pub fn reset_for_restart(&mut self) {
        for piece in &mut self.pieces {
            piece.deactivate();
        }
        self.queue.clear();
        self.active.clear();
        self.round = RoundState::new(
            self.initial_batch_size,
            self.round.target_score + 2,
            self.round.extra_pieces_per_round + 2,
        );
    }

    /// Topmost active, unplaced piece under `point`.
    pub fn topmost_at(&self, point: Vec2) -> Option<PieceId> {
        self.active
            .iter()
            .rev()
            .copied()
            .find(|id| self.pieces[id.0].contains(point) && !self.pieces[id.0].is_placed())
    }

    pub fn piece(&self, id: PieceId) -> Option<&Piece> {
        self.pieces.get(id.0)
    }

    pub fn piece_mut(&mut self, id: PieceId) -> Option<&mut Piece> {
        self.pieces.get_mut(id.0)
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn active(&self) -> &[PieceId] {
        &self.active
    }

    pub fn queued(&self) -> impl Iterator<Item = PieceId> + '_ {
        self.queue.iter().copied()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn round(&self) -> &RoundState {
        &self.round
    }

    pub fn ramp(&self) -> RampPolicy {
        self.ramp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::two_kind_puzzle;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn slots_for(puzzle: &PuzzleFile) -> Vec<Slot> {
        puzzle.slots.iter().map(Slot::from_spec).collect()
    }

    fn manager(puzzle: &PuzzleFile, seed: u64) -> PuzzleManager {
        PuzzleManager::new(puzzle, StdRng::seed_from_u64(seed))
    }

    fn assert_active_unique(m: &PuzzleManager) {
        let unique: HashSet<_> = m.active().iter().collect();
        assert_eq!(unique.len(), m.active().len(), "active set has duplicates");
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut items: Vec<u32> = (0..50).collect();
        shuffle(&mut rng, &mut items);
        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn shuffle_handles_empty_and_single() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut empty: Vec<u8> = Vec::new();
        shuffle(&mut rng, &mut empty);
        let mut one = vec![9];
        shuffle(&mut rng, &mut one);
        assert_eq!(one, vec![9]);
    }

    #[test]
    fn queue_holds_every_piece_exactly_once() {
        let puzzle = two_kind_puzzle();
        let mut m = manager(&puzzle, 3);
        m.initialize_queue();

        assert_eq!(m.pieces().len(), 12);
        let queued: Vec<PieceId> = m.queued().collect();
        let unique: HashSet<_> = queued.iter().copied().collect();
        assert_eq!(queued.len(), 12);
        assert_eq!(unique.len(), 12);
        assert!(m.pieces().iter().all(|p| !p.active));
        assert_eq!(m.pieces().iter().filter(|p| p.kind == "paper").count(), 6);
    }

    #[test]
    fn same_seed_same_order() {
        let puzzle = two_kind_puzzle();
        let mut a = manager(&puzzle, 42);
        let mut b = manager(&puzzle, 42);
        a.initialize_queue();
        b.initialize_queue();
        assert_eq!(a.queued().collect::<Vec<_>>(), b.queued().collect::<Vec<_>>());
    }

    #[test]
    fn spawn_batch_activates_and_binds() {
        let puzzle = two_kind_puzzle();
        let slots = slots_for(&puzzle);
        let mut m = manager(&puzzle, 5);
        m.initialize_queue();
        let mut events = Vec::new();

        assert_eq!(m.spawn_batch(2, &slots, 0, &mut events), None);
        assert_eq!(m.active().len(), 2);
        assert_eq!(m.queue_len(), 10);
        for &id in m.active() {
            let piece = m.piece(id).expect("active piece exists");
            assert!(piece.active);
            assert!(puzzle.spawn_area.contains(piece.position));
            assert_eq!(piece.home_position, piece.position);
            let slot = piece.slot.expect("piece bound to a slot");
            assert_eq!(slots[slot.0].kind, piece.kind);
        }
        assert_eq!(
            events,
            vec![GameEvent::BatchSpawned {
                round: 1,
                requested: 2,
                spawned: 2
            }]
        );
    }

    #[test]
    fn spawn_batch_never_exceeds_count_or_duplicates() {
        let puzzle = two_kind_puzzle();
        let slots = slots_for(&puzzle);
        let mut m = manager(&puzzle, 8);
        m.initialize_queue();
        let mut events = Vec::new();

        m.spawn_batch(3, &slots, 0, &mut events);
        assert_eq!(m.active().len(), 3);
        m.spawn_batch(4, &slots, 0, &mut events);
        assert_eq!(m.active().len(), 7);
        assert_active_unique(&m);
    }

    #[test]
    fn spawn_batch_stops_when_queue_runs_dry() {
        let puzzle = two_kind_puzzle();
        let slots = slots_for(&puzzle);
        let mut m = manager(&puzzle, 8);
        m.initialize_queue();
        let mut events = Vec::new();

        m.spawn_batch(20, &slots, 0, &mut events);
        assert_eq!(m.active().len(), 12);
        assert_eq!(m.queue_len(), 0);
        assert_eq!(
            events.last(),
            Some(&GameEvent::BatchSpawned {
                round: 1,
                requested: 20,
                spawned: 12
            })
        );
    }

    #[test]
    fn rotation_of_active_only_queue_terminates() {
        let puzzle = two_kind_puzzle();
        let slots = slots_for(&puzzle);
        let mut m = manager(&puzzle, 8);
        m.initialize_queue();
        let mut events = Vec::new();
        m.spawn_batch(2, &slots, 0, &mut events);

        // Put already-active pieces back in the queue; nothing in it is spawnable.
        let active: Vec<PieceId> = m.active().to_vec();
        m.queue.clear();
        m.queue.extend(active.iter().copied());

        m.spawn_batch(2, &slots, 0, &mut events);
        assert_eq!(m.active(), active.as_slice());
        assert_eq!(m.queue_len(), 2, "rejected pieces are re-enqueued");
        assert_active_unique(&m);
    }

    #[test]
    fn spawn_blocked_once_target_reached() {
        let puzzle = two_kind_puzzle();
        let slots = slots_for(&puzzle);
        let mut m = manager(&puzzle, 1);
        m.initialize_queue();
        let mut events = Vec::new();

        let reason = m.spawn_batch(2, &slots, puzzle.target_score, &mut events);
        assert_eq!(reason, Some(GameOverReason::TargetReached));
        assert!(m.active().is_empty());
        assert!(events.is_empty());
    }

    #[test]
    fn unmatched_kind_spawns_unbound() {
        let mut puzzle = two_kind_puzzle();
        puzzle.slots.retain(|s| s.kind == "paper");
        let slots = slots_for(&puzzle);
        let mut m = manager(&puzzle, 2);
        m.initialize_queue();
        let mut events = Vec::new();
        m.spawn_batch(12, &slots, 0, &mut events);

        for piece in m.pieces() {
            match piece.kind.as_str() {
                "paper" => assert!(piece.slot.is_some()),
                _ => assert!(piece.slot.is_none()),
            }
        }
    }

    #[test]
    fn completing_a_round_ramps_and_spawns_next_batch() {
        let puzzle = two_kind_puzzle();
        let slots = slots_for(&puzzle);
        let mut m = manager(&puzzle, 4);
        m.initialize_queue();
        let mut events = Vec::new();
        m.spawn_batch(2, &slots, 0, &mut events);

        let first = m.active()[0];
        assert_eq!(m.piece_placed(first, &slots, 1, &mut events), None);
        assert_eq!(m.round().placed_in_round, 1);
        assert_eq!(m.active().len(), 1);
        assert!(!m.piece(first).expect("piece").active);

        let second = m.active()[0];
        assert_eq!(m.piece_placed(second, &slots, 2, &mut events), None);
        assert_eq!(m.round().round, 2);
        assert_eq!(m.round().batch_size, 4);
        assert_eq!(m.round().placed_in_round, 0);
        assert_eq!(m.active().len(), 4);
        assert_active_unique(&m);
    }

    #[test]
    fn placing_inactive_piece_changes_nothing() {
        let puzzle = two_kind_puzzle();
        let slots = slots_for(&puzzle);
        let mut m = manager(&puzzle, 4);
        m.initialize_queue();
        let mut events = Vec::new();
        m.spawn_batch(2, &slots, 0, &mut events);

        let queued = m.queued().next().expect("queue not empty");
        let before_round = m.round().clone();
        let before_active = m.active().to_vec();

        assert_eq!(m.piece_placed(queued, &slots, 0, &mut events), None);
        assert_eq!(m.round(), &before_round);
        assert_eq!(m.active(), before_active.as_slice());

        // Placing the same active piece twice only counts once.
        let id = before_active[0];
        m.piece_placed(id, &slots, 1, &mut events);
        m.piece_placed(id, &slots, 1, &mut events);
        assert_eq!(m.round().placed_in_round, 1);
    }

    #[test]
    fn round_completion_at_target_reports_game_over_without_spawning() {
        let mut puzzle = two_kind_puzzle();
        puzzle.target_score = 2;
        let slots = slots_for(&puzzle);
        let mut m = manager(&puzzle, 4);
        m.initialize_queue();
        let mut events = Vec::new();
        m.spawn_batch(2, &slots, 0, &mut events);

        let a = m.active()[0];
        let b = m.active()[1];
        m.piece_placed(a, &slots, 1, &mut events);
        let reason = m.piece_placed(b, &slots, 2, &mut events);
        assert_eq!(reason, Some(GameOverReason::TargetReached));
        assert!(m.active().is_empty());
        assert_eq!(m.queue_len(), 10);
        assert_eq!(m.round().round, 1);
    }

    #[test]
    fn restart_reset_raises_difficulty() {
        let puzzle = two_kind_puzzle();
        let slots = slots_for(&puzzle);
        let mut m = manager(&puzzle, 4);
        m.initialize_queue();
        let mut events = Vec::new();
        m.spawn_batch(2, &slots, 0, &mut events);

        m.reset_for_restart();
        assert!(m.active().is_empty());
        assert_eq!(m.queue_len(), 0);
        assert!(m.pieces().iter().all(|p| !p.active));
        assert_eq!(m.round().target_score, 28);
        assert_eq!(m.round().extra_pieces_per_round, 4);
        assert_eq!(m.round().batch_size, 2);
        assert_eq!(m.round().round, 1);
    }

    #[test]
    fn topmost_prefers_latest_spawn() {
        let puzzle = two_kind_puzzle();
        let slots = slots_for(&puzzle);
        let mut m = manager(&puzzle, 4);
        m.initialize_queue();
        let mut events = Vec::new();
        m.spawn_batch(2, &slots, 0, &mut events);

        let under = m.active()[0];
        let over = m.active()[1];
        let spot = Vec2::new(-5.0, 0.0);
        m.piece_mut(under).expect("piece").activate_at(spot);
        m.piece_mut(over).expect("piece").activate_at(spot);
        assert_eq!(m.topmost_at(spot), Some(over));
        assert_eq!(m.topmost_at(Vec2::new(100.0, 100.0)), None);
    }
}
