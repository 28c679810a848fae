use serde::Deserialize;

/// Fixed ladder used by [`RampPolicy::Ladder`]. Sizes past the last rung stay put.
pub const LADDER: [usize; 4] = [2, 4, 8, 10];

/// How the batch size grows between rounds. Exactly one policy is active per puzzle.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RampPolicy {
    /// 2 -> 4 -> 8 -> 10, then 10 forever.
    #[default]
    Ladder,
    /// previous + `extra_pieces_per_round`.
    Arithmetic,
}

impl RampPolicy {
    pub fn next_batch_size(self, current: usize, extra_pieces_per_round: usize) -> usize {
        match self {
            Self::Ladder => match LADDER.iter().position(|&rung| rung == current) {
                Some(idx) => LADDER[(idx + 1).min(LADDER.len() - 1)],
                None => current,
            },
            Self::Arithmetic => current + extra_pieces_per_round,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundState {
    pub round: u32,
    pub batch_size: usize,
    pub placed_in_round: usize,
    pub target_score: u32,
    pub extra_pieces_per_round: usize,
}

impl RoundState {
    pub fn new(initial_batch_size: usize, target_score: u32, extra_pieces_per_round: usize) -> Self {
        Self {
            round: 1,
            batch_size: initial_batch_size,
            placed_in_round: 0,
            target_score,
            extra_pieces_per_round,
        }
    }

    /// Count one placement. Returns true when it completes the round, in which case the
    /// counter is already back at zero.
    pub fn record_placement(&mut self) -> bool {
        self.placed_in_round += 1;
        if self.placed_in_round >= self.batch_size {
            self.placed_in_round = 0;
            true
        } else {
            false
        }
    }

    pub fn advance(&mut self, policy: RampPolicy) {
        self.batch_size = policy.next_batch_size(self.batch_size, self.extra_pieces_per_round);
        self.round += 1;
    }
}
