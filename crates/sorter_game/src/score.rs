#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreSignal {
    Below,
    TargetReached,
}

/// Count of correct placements for the current session.
#[derive(Debug, Clone)]
pub struct ScoreTracker {
    score: u32,
    target: u32,
    display: String,
}

impl ScoreTracker {
    pub fn new(target: u32) -> Self {
        Self {
            score: 0,
            target,
            display: "0".to_string(),
        }
    }

    pub fn increment(&mut self) -> ScoreSignal {
        self.score += 1;
        self.display = self.score.to_string();
        if self.score >= self.target {
            log::info!("Score {} reached target {}", self.score, self.target);
            ScoreSignal::TargetReached
        } else {
            ScoreSignal::Below
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn target(&self) -> u32 {
        self.target
    }

    pub fn set_target(&mut self, target: u32) {
        self.target = target;
    }

    pub fn reset(&mut self) {
        self.score = 0;
        self.display = "0".to_string();
    }

    pub fn display_text(&self) -> &str {
        &self.display
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signals_on_reaching_target() {
        let mut score = ScoreTracker::new(2);
        assert_eq!(score.increment(), ScoreSignal::Below);
        assert_eq!(score.increment(), ScoreSignal::TargetReached);
        assert_eq!(score.display_text(), "2");
    }

    #[test]
    fn reset_clears_value_and_text() {
        let mut score = ScoreTracker::new(26);
        score.increment();
        score.increment();
        score.reset();
        assert_eq!(score.score(), 0);
        assert_eq!(score.display_text(), "0");
        assert_eq!(score.target(), 26);
    }

    #[test]
    fn moving_target_applies_to_next_increment() {
        let mut score = ScoreTracker::new(1);
        score.set_target(3);
        assert_eq!(score.increment(), ScoreSignal::Below);
    }
}
