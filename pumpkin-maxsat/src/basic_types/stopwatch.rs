use std::time::Duration;
use std::time::Instant;

/// Measures the wall-clock time since the start of the solve, used to annotate progress logs.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    started_at: Instant,
}

impl Stopwatch {
    pub fn starting_now() -> Stopwatch {
        Stopwatch {
            started_at: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}
