use glam::Vec2;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::round::RampPolicy;

#[derive(Debug, Deserialize, Clone)]
pub struct PuzzleFile {
    pub version: String,
    pub puzzle_id: String,
    /// Fixed RNG seed. Absent means a fresh seed per session (logged at start).
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_copies_per_kind")]
    pub copies_per_kind: u32,
    #[serde(default = "default_target_score")]
    pub target_score: u32,
    #[serde(default = "default_initial_batch_size")]
    pub initial_batch_size: usize,
    #[serde(default = "default_extra_pieces_per_round")]
    pub extra_pieces_per_round: usize,
    #[serde(default = "default_snap_threshold")]
    pub snap_threshold: f32,
    #[serde(default)]
    pub ramp: RampPolicy,
    #[serde(default = "default_true")]
    pub restart_enabled: bool,
    /// Copy the bound slot's visual onto a piece when it spawns.
    #[serde(default)]
    pub swap_visual_on_bind: bool,
    #[serde(default = "default_piece_size")]
    pub piece_size: f32,
    pub spawn_area: SpawnArea,
    #[serde(default)]
    pub camera: CameraStops,
    pub slots: Vec<SlotSpec>,
    pub pieces: Vec<PieceSpec>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct SpawnArea {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl SpawnArea {
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct Point {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
}

impl From<Point> for Vec2 {
    fn from(p: Point) -> Self {
        Vec2::new(p.x, p.y)
    }
}

/// Where the view sits before play, during play and after game over.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct CameraStops {
    #[serde(default)]
    pub title: Point,
    #[serde(default)]
    pub play: Point,
    #[serde(default)]
    pub end: Point,
    #[serde(default = "default_zoom")]
    pub zoom: f32,
}

impl Default for CameraStops {
    fn default() -> Self {
        Self {
            title: Point::default(),
            play: Point::default(),
            end: Point::default(),
            zoom: default_zoom(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SlotSpec {
    pub id: String,
    pub kind: String,
    pub x: f32,
    pub y: f32,
    #[serde(default = "default_color")]
    pub color: [f32; 4],
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PieceSpec {
    pub kind: String,
    #[serde(default = "default_color")]
    pub color: [f32; 4],
    #[serde(default)]
    pub label: Option<String>,
}

impl PuzzleFile {
    pub fn pool_size(&self) -> usize {
        self.pieces.len() * self.copies_per_kind as usize
    }
}

/// Polls a file's mtime so edits can be picked up at frame boundaries.
pub struct FileWatcher {
    path: PathBuf,
    last_seen_modified: Option<SystemTime>,
}

impl FileWatcher {
    pub fn new(path: PathBuf) -> Self {
        let last_seen_modified = modified_time(&path);
        Self {
            path,
            last_seen_modified,
        }
    }

    pub fn should_reload(&mut self) -> bool {
        let current = modified_time(&self.path);
        match (self.last_seen_modified, current) {
            (Some(old), Some(now)) if now > old => {
                self.last_seen_modified = Some(now);
                true
            }
            (None, Some(now)) => {
                self.last_seen_modified = Some(now);
                true
            }
            _ => false,
        }
    }
}

pub fn load_puzzle_from_path(path: &Path) -> Result<PuzzleFile, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read puzzle file {}: {e}", path.display()))?;
    let puzzle: PuzzleFile = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse puzzle JSON {}: {e}", path.display()))?;
    validate_puzzle(&puzzle)?;
    Ok(puzzle)
}

/// Hard errors reject the file. Soft problems (a kind with no slot, an unreachable
/// target) are logged and the puzzle still loads, because the game can run degraded.
pub fn validate_puzzle(puzzle: &PuzzleFile) -> Result<(), String> {
    if puzzle.slots.is_empty() {
        return Err("Puzzle validation failed: slots array is empty".to_string());
    }
    if puzzle.pieces.is_empty() {
        return Err("Puzzle validation failed: pieces array is empty".to_string());
    }
    if puzzle.copies_per_kind == 0 {
        return Err("Puzzle validation failed: copies_per_kind must be >= 1".to_string());
    }
    if puzzle.initial_batch_size == 0 {
        return Err("Puzzle validation failed: initial_batch_size must be >= 1".to_string());
    }
    if puzzle.snap_threshold <= 0.0 {
        return Err("Puzzle validation failed: snap_threshold must be > 0".to_string());
    }
    if puzzle.piece_size <= 0.0 {
        return Err("Puzzle validation failed: piece_size must be > 0".to_string());
    }
    if puzzle.camera.zoom <= 0.0 {
        return Err("Puzzle validation failed: camera zoom must be > 0".to_string());
    }
    let area = &puzzle.spawn_area;
    if !(area.min_x < area.max_x && area.min_y < area.max_y) {
        return Err(format!(
            "Puzzle validation failed: spawn_area is empty ({}, {}) .. ({}, {})",
            area.min_x, area.min_y, area.max_x, area.max_y
        ));
    }

    let mut slot_ids = HashSet::new();
    let mut slot_kinds = HashSet::new();
    for slot in &puzzle.slots {
        if !slot_ids.insert(slot.id.as_str()) {
            return Err(format!(
                "Puzzle validation failed: duplicate slot id '{}'",
                slot.id
            ));
        }
        slot_kinds.insert(slot.kind.as_str());
    }

    let mut piece_kinds = HashSet::new();
    for piece in &puzzle.pieces {
        if !piece_kinds.insert(piece.kind.as_str()) {
            return Err(format!(
                "Puzzle validation failed: duplicate piece kind '{}'",
                piece.kind
            ));
        }
        if !slot_kinds.contains(piece.kind.as_str()) {
            log::warn!(
                "Puzzle '{}': piece kind '{}' has no matching slot. Those pieces can never be placed.",
                puzzle.puzzle_id,
                piece.kind
            );
        }
    }

    if puzzle.target_score as usize > puzzle.pool_size() {
        log::warn!(
            "Puzzle '{}': target score {} exceeds the pool of {} pieces. The game will end on pool exhaustion instead.",
            puzzle.puzzle_id,
            puzzle.target_score,
            puzzle.pool_size()
        );
    }

    Ok(())
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).ok()?.modified().ok()
}

const fn default_copies_per_kind() -> u32 {
    6
}

const fn default_target_score() -> u32 {
    26
}

const fn default_initial_batch_size() -> usize {
    2
}

const fn default_extra_pieces_per_round() -> usize {
    2
}

const fn default_snap_threshold() -> f32 {
    3.0
}

const fn default_piece_size() -> f32 {
    1.0
}

const fn default_zoom() -> f32 {
    60.0
}

const fn default_true() -> bool {
    true
}

const fn default_color() -> [f32; 4] {
    [1.0, 1.0, 1.0, 1.0]
}
