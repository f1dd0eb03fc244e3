use std::time::{Duration, Instant};

/// Monotonic stopwatch used for throttle accounting.
pub struct Timer {
    start_time: Option<Instant>,
    elapsed: Duration,
}

#[allow(dead_code)]
impl Timer {
    pub fn new() -> Timer {
        Timer {
            start_time: None,
            elapsed: Duration::new(0, 0),
        }
    }

    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    pub fn reset(&mut self) {
        self.start_time = None;
        self.elapsed = Duration::new(0, 0);
    }

    pub fn stop(&mut self) {
        if self.start_time.is_some() {
            self.elapsed = self.elapsed_duration();
            self.start_time = None;
        }
    }

    pub fn elapsed_duration(&self) -> Duration {
        match self.start_time {
            Some(start_time) => start_time.elapsed(),
            None => self.elapsed,
        }
    }

    pub fn elapsed_ms(&self) -> u128 {
        self.elapsed_duration().as_millis()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
