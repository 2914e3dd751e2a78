use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

const MEASUREMENTS: usize = 120;

// The draw distance never shrinks or grows further than this
pub const MIN_MULTIPLIER: f32 = 0.5;
pub const MAX_MULTIPLIER: f32 = 1.5;

/// Rolling average of frame times, turned into a draw distance multiplier.
pub struct FpsCounter {
    frame_durations: VecDeque<Duration>,
    frame_start: Instant,
}

impl FpsCounter {
    pub fn new() -> Self {
        FpsCounter {
            frame_durations: VecDeque::with_capacity(MEASUREMENTS),
            frame_start: Instant::now(),
        }
    }

    pub fn begin_frame(&mut self) {
        self.frame_start = Instant::now();
    }

    pub fn end_frame(&mut self) {
        self.record(self.frame_start.elapsed());
    }

    pub fn record(&mut self, duration: Duration) {
        if self.frame_durations.len() == MEASUREMENTS {
            self.frame_durations.pop_front();
        }
        self.frame_durations.push_back(duration);
    }

    pub fn average_frame_time(&self) -> Duration {
        if self.frame_durations.is_empty() {
            // Default to 60 FPS-equivalent frame time, to avoid division by zero
            return Duration::from_millis(16);
        }

        let sum: Duration = self.frame_durations.iter().sum();
        sum / (self.frame_durations.len() as u32)
    }

    /// Above 1 when frames are faster than `target_ms`, below 1 when slower. `None` until a
    /// frame has been measured.
    pub fn draw_distance_multiplier(&self, target_ms: f32) -> Option<f32> {
        if self.frame_durations.is_empty() {
            return None;
        }

        let average_ms = self.average_frame_time().as_secs_f32() * 1000.0;
        if average_ms <= f32::EPSILON {
            return Some(MAX_MULTIPLIER);
        }

        Some((target_ms / average_ms).clamp(MIN_MULTIPLIER, MAX_MULTIPLIER))
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}
