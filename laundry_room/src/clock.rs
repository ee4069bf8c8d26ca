//! Wall-clock time for the threaded engine
//!
//! Logical time `t` maps to `start + t * unit`. Waiting for an absolute
//! deadline rather than sleeping a relative amount keeps long-waiting
//! students from drifting behind the others.

use std::thread;
use std::time::{Duration, Instant};

pub trait Clock: Send + Sync {
    /// Block until logical time `t` has been reached
    fn wait_until(&self, t: usize);
}

#[derive(Debug, Clone, Copy)]
pub struct WallClock {
    start: Instant,
    unit: Duration,
}

impl WallClock {
    /// Starts counting now
    pub fn new(unit: Duration) -> Self {
        WallClock {
            start: Instant::now(),
            unit,
        }
    }

    /// Offset of logical time `t` from the start
    fn offset(&self, t: usize) -> Duration {
        self.unit.saturating_mul(u32::try_from(t).unwrap_or(u32::MAX))
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl Clock for WallClock {
    fn wait_until(&self, t: usize) {
        let target = self.offset(t);
        let elapsed = self.start.elapsed();
        if target > elapsed {
            thread::sleep(target - elapsed);
        }
    }
}
