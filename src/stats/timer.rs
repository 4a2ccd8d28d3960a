//! Timing utilities for GC phases.

use std::time::Duration;

/// Wall-clock timer for a single GC phase or cycle.
pub struct GcTimer {
    start: std::time::Instant,
}

impl GcTimer {
    pub fn new() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn elapsed_ns(&self) -> u64 {
        self.elapsed().as_nanos() as u64
    }

    pub fn elapsed_us(&self) -> u64 {
        self.elapsed().as_micros() as u64
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed().as_secs_f64() * 1000.0
    }
}

impl Default for GcTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs `callback` with the elapsed duration when dropped. Useful for
/// timing a GC phase without threading a `GcTimer` through every return
/// path.
pub struct ScopedTimer<'a> {
    start: std::time::Instant,
    callback: Box<dyn FnMut(Duration) + 'a>,
}

impl<'a> ScopedTimer<'a> {
    pub fn new<F>(callback: F) -> Self
    where
        F: FnMut(Duration) + 'a,
    {
        Self {
            start: std::time::Instant::now(),
            callback: Box::new(callback),
        }
    }
}

impl<'a> Drop for ScopedTimer<'a> {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        (self.callback)(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn scoped_timer_invokes_callback_on_drop() {
        let fired = Cell::new(false);
        {
            let _t = ScopedTimer::new(|_d| fired.set(true));
        }
        assert!(fired.get());
    }
}
