use std::time::Instant;

const FPS_SAMPLE_COUNT: usize = 60;

/// Fixed-timestep frame clock.
///
/// `begin_frame` samples the wall clock; `advance` takes the delta explicitly so tests and
/// headless drivers can run the same stepping without real time passing.
pub struct FrameClock {
    pub fixed_dt: f64,
    pub max_frame_dt: f64,
    accumulator: f64,
    pub total_time: f64,
    pub fixed_step_count: u64,
    pub frame_count: u64,
    pub steps_this_frame: u32,
    pub real_dt: f64,
    last_instant: Instant,

    fps_samples: [f64; FPS_SAMPLE_COUNT],
    fps_sample_index: usize,
    pub smoothed_fps: f64,
    pub smoothed_frame_time_ms: f64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_fixed_dt(1.0 / 60.0)
    }

    pub fn with_fixed_dt(fixed_dt: f64) -> Self {
        Self {
            fixed_dt,
            max_frame_dt: 0.25,
            accumulator: 0.0,
            total_time: 0.0,
            fixed_step_count: 0,
            frame_count: 0,
            steps_this_frame: 0,
            real_dt: 0.0,
            last_instant: Instant::now(),
            fps_samples: [fixed_dt; FPS_SAMPLE_COUNT],
            fps_sample_index: 0,
            smoothed_fps: 1.0 / fixed_dt,
            smoothed_frame_time_ms: fixed_dt * 1000.0,
        }
    }

    pub fn begin_frame(&mut self) {
        let now = Instant::now();
        let real_dt = now.duration_since(self.last_instant).as_secs_f64();
        self.last_instant = now;
        self.advance(real_dt);
    }

    pub fn advance(&mut self, real_dt: f64) {
        self.real_dt = real_dt.max(0.0);

        // Spiral-of-death cap: a long stall (window drag, debugger) must not replay
        // seconds of simulation in one frame.
        if self.real_dt > self.max_frame_dt {
            log::warn!(
                "Frame took {:.1}ms, capping to {:.0}ms",
                self.real_dt * 1000.0,
                self.max_frame_dt * 1000.0
            );
            self.real_dt = self.max_frame_dt;
        }

        self.accumulator += self.real_dt;
        self.steps_this_frame = 0;
        self.frame_count += 1;

        self.fps_samples[self.fps_sample_index] = self.real_dt;
        self.fps_sample_index = (self.fps_sample_index + 1) % FPS_SAMPLE_COUNT;
        let avg_dt: f64 = self.fps_samples.iter().sum::<f64>() / FPS_SAMPLE_COUNT as f64;
        self.smoothed_frame_time_ms = avg_dt * 1000.0;
        self.smoothed_fps = if avg_dt > 0.0 { 1.0 / avg_dt } else { 0.0 };
    }

    pub fn should_step(&mut self) -> bool {
        if self.accumulator >= self.fixed_dt {
            self.accumulator -= self.fixed_dt;
            self.total_time += self.fixed_dt;
            self.fixed_step_count += 1;
            self.steps_this_frame += 1;
            true
        } else {
            false
        }
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain_steps(clock: &mut FrameClock) -> u32 {
        let mut steps = 0;
        while clock.should_step() {
            steps += 1;
        }
        steps
    }

    #[test]
    fn exact_fixed_dt_yields_one_step() {
        let mut clock = FrameClock::with_fixed_dt(0.5);
        clock.advance(0.5);
        assert_eq!(drain_steps(&mut clock), 1);
        assert_eq!(clock.steps_this_frame, 1);
        assert_eq!(clock.fixed_step_count, 1);
    }

    #[test]
    fn short_frames_accumulate_until_a_step() {
        let mut clock = FrameClock::with_fixed_dt(0.5);
        clock.advance(0.25);
        assert_eq!(drain_steps(&mut clock), 0);
        clock.advance(0.25);
        assert_eq!(drain_steps(&mut clock), 1);
        assert_eq!(clock.frame_count, 2);
    }

    #[test]
    fn long_stall_is_capped() {
        let mut clock = FrameClock::with_fixed_dt(1.0 / 60.0);
        clock.advance(5.0);
        assert!((clock.real_dt - clock.max_frame_dt).abs() < f64::EPSILON);
        // 0.25s at 60 Hz is 15 steps, never 300.
        let steps = drain_steps(&mut clock);
        assert!((14..=15).contains(&steps), "got {steps} steps");
    }

    #[test]
    fn negative_delta_is_treated_as_zero() {
        let mut clock = FrameClock::with_fixed_dt(0.5);
        clock.advance(-1.0);
        assert_eq!(clock.real_dt, 0.0);
        assert_eq!(drain_steps(&mut clock), 0);
    }
}
