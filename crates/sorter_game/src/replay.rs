use glam::Vec2;
use serde::Deserialize;
use sorter_core::input::PointerSample;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct ReplaySequence {
    #[serde(default = "default_dt")]
    pub fixed_dt: f32,
    pub frames: Vec<ReplayFrame>,
}

/// Pointer state for one or more consecutive steps. Edges fire on the first step of a
/// repeated frame only.
#[derive(Debug, Deserialize, Clone)]
pub struct ReplayFrame {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub press: bool,
    #[serde(default)]
    pub release: bool,
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

impl ReplaySequence {
    pub fn expanded_samples(&self) -> Vec<PointerSample> {
        let mut out = Vec::new();
        for frame in &self.frames {
            let first = PointerSample {
                world: Vec2::new(frame.x, frame.y),
                pressed: frame.press,
                released: frame.release,
            };
            out.push(first);
            for _ in 1..frame.repeat.max(1) {
                out.push(first.without_edges());
            }
        }
        out
    }
}

pub fn load_replay_from_path(path: &Path) -> Result<ReplaySequence, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let replay: ReplaySequence = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse replay JSON {}: {e}", path.display()))?;
    validate_replay(&replay)?;
    Ok(replay)
}

fn validate_replay(replay: &ReplaySequence) -> Result<(), String> {
    if replay.fixed_dt <= 0.0 {
        return Err("Replay validation failed: fixed_dt must be > 0".to_string());
    }
    if replay.frames.is_empty() {
        return Err("Replay validation failed: frames list is empty".to_string());
    }
    Ok(())
}

const fn default_dt() -> f32 {
    1.0 / 60.0
}

const fn default_repeat() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::two_kind_puzzle;
    use crate::session::{GamePhase, Session};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "sorter_replay_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    /// Replay that picks up the session's newest piece and walks it to its slot.
    fn solve_newest(session: &Session) -> ReplaySequence {
        let manager = session.manager();
        let id = *manager.active().last().expect("an active piece");
        let piece = manager.piece(id).expect("piece exists");
        let slot = session.slots()[piece.slot.expect("bound").0].position;
        let mid = (piece.position + slot) * 0.5;
        ReplaySequence {
            fixed_dt: default_dt(),
            frames: vec![
                ReplayFrame {
                    x: piece.position.x,
                    y: piece.position.y,
                    press: true,
                    release: false,
                    repeat: 3,
                },
                ReplayFrame {
                    x: mid.x,
                    y: mid.y,
                    press: false,
                    release: false,
                    repeat: 10,
                },
                ReplayFrame {
                    x: slot.x,
                    y: slot.y,
                    press: false,
                    release: false,
                    repeat: 2,
                },
                ReplayFrame {
                    x: slot.x,
                    y: slot.y,
                    press: false,
                    release: true,
                    repeat: 1,
                },
            ],
        }
    }

    fn run(session: &mut Session, replay: &ReplaySequence) {
        for sample in replay.expanded_samples() {
            session.update(replay.fixed_dt, sample);
        }
    }

    #[test]
    fn replay_file_parses_and_expands() {
        let path = temp_file_path("parse");
        fs::write(
            &path,
            r#"{
              "fixed_dt": 0.016666667,
              "frames": [
                { "x": -4.0, "y": 1.0, "press": true, "repeat": 3 },
                { "x": 5.0, "y": 3.0, "release": true }
              ]
            }"#,
        )
        .expect("write replay file");

        let replay = load_replay_from_path(&path).expect("replay should load");
        let samples = replay.expanded_samples();
        assert_eq!(samples.len(), 4);
        assert!(samples[0].pressed);
        assert!(!samples[1].pressed && !samples[2].pressed);
        assert!(samples[3].released);
        assert_eq!(samples[3].world, Vec2::new(5.0, 3.0));

        let _ = fs::remove_file(path);
    }

    #[test]
    fn replay_rejects_empty_frames() {
        let path = temp_file_path("empty");
        fs::write(&path, r#"{ "frames": [] }"#).expect("write replay file");
        let err = load_replay_from_path(&path).expect_err("empty replay should fail");
        assert!(err.contains("frames list is empty"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn same_seed_replays_identically() {
        let puzzle = two_kind_puzzle();
        let mut run_a = Session::with_seed(&puzzle, 2024);
        let mut run_b = Session::with_seed(&puzzle, 2024);
        run_a.start_game();
        run_b.start_game();

        for _ in 0..5 {
            let replay = solve_newest(&run_a);
            run(&mut run_a, &replay);
            run(&mut run_b, &replay);
        }

        assert_eq!(run_a.score().score(), 5);
        assert_eq!(run_a.score().score(), run_b.score().score());
        assert_eq!(run_a.manager().active(), run_b.manager().active());
        assert_eq!(run_a.manager().round(), run_b.manager().round());
        for (a, b) in run_a
            .manager()
            .pieces()
            .iter()
            .zip(run_b.manager().pieces())
        {
            assert_eq!(a.state, b.state);
            assert!((a.position - b.position).length() < 1e-5);
        }
    }

    #[test]
    fn full_game_to_pool_exhaustion() {
        let puzzle = two_kind_puzzle();
        let mut session = Session::with_seed(&puzzle, 7);
        session.start_game();

        let mut guard = 0;
        while session.phase() == GamePhase::Playing {
            guard += 1;
            assert!(guard <= 12, "game did not end after placing the whole pool");
            let replay = solve_newest(&session);
            run(&mut session, &replay);
        }

        assert_eq!(session.score().score(), 12);
        assert!(matches!(session.phase(), GamePhase::Over(_)));
    }
}
