use std::time::{Duration, Instant};

/// Frame clock for the render loop.
#[derive(Debug, Clone)]
pub struct Time {
    start: Instant,
    last: Instant,
    frames: u64,
    pub delta: Duration,
}

impl Time {
    pub fn new() -> Self {
        let now = Instant::now();
        Self { start: now, last: now, frames: 0, delta: Duration::ZERO }
    }

    pub fn tick(&mut self) {
        let now = Instant::now();
        self.delta = now - self.last;
        self.last = now;
        self.frames += 1;
    }

    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    pub fn elapsed_seconds(&self) -> f32 {
        self.last.duration_since(self.start).as_secs_f32()
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Average frames per second since the clock started.
    pub fn average_fps(&self) -> f32 {
        let elapsed = self.elapsed_seconds();
        if elapsed > 0.0 {
            self.frames as f32 / elapsed
        } else {
            0.0
        }
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_counts_frames() {
        let mut time = Time::new();
        assert_eq!(time.frame_count(), 0);
        time.tick();
        time.tick();
        assert_eq!(time.frame_count(), 2);
        assert!(time.elapsed_seconds() >= time.delta_seconds());
    }
}
