//! Outgoing notifications from the session. The host drains them once per frame;
//! nothing in the game logic waits on them.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    PickUp,
    Drop,
    Success,
    Complete,
}

impl SoundCue {
    pub fn label(self) -> &'static str {
        match self {
            Self::PickUp => "pickup",
            Self::Drop => "drop",
            Self::Success => "success",
            Self::Complete => "complete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOverReason {
    /// Score reached the session target.
    TargetReached,
    /// Every piece in the pool is placed or unplaceable and nothing is left to spawn.
    PoolExhausted,
}

impl fmt::Display for GameOverReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TargetReached => f.write_str("target score reached"),
            Self::PoolExhausted => f.write_str("piece pool exhausted"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Cue(SoundCue),
    GameStarted {
        target_score: u32,
    },
    BatchSpawned {
        round: u32,
        requested: usize,
        spawned: usize,
    },
    ScoreChanged(u32),
    GameOver(GameOverReason),
    Restarted {
        target_score: u32,
        extra_pieces_per_round: usize,
    },
}
