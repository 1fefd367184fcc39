use std::time::{Duration, Instant};

use log::{debug, log_enabled, Level};

/// Stage stopwatch kept by a detector between frames.
///
/// `stop` logs the elapsed time and remembers it so overlays can report
/// the cost of the last detection.
#[derive(Clone, Debug, Default)]
pub struct StageTimer {
    started: Option<Instant>,
    last: Duration,
}

impl StageTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.started = Some(Instant::now());
    }

    /// Stop the running measurement. Without a matching `start` the last
    /// duration is reset to zero.
    pub fn stop(&mut self, label: &str) -> Duration {
        self.last = self
            .started
            .take()
            .map(|t| t.elapsed())
            .unwrap_or_default();
        debug!("{label} took {:.3} ms", self.last.as_secs_f64() * 1e3);
        self.last
    }

    pub fn last(&self) -> Duration {
        self.last
    }

    pub fn last_ms(&self) -> u128 {
        self.last.as_millis()
    }
}

/// Measures from construction and reports at scope end.
pub struct ScopedTimer {
    label: &'static str,
    started: Instant,
}

impl ScopedTimer {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Drop for ScopedTimer {
    fn drop(&mut self) {
        if log_enabled!(Level::Debug) {
            debug!(
                "{} finished in {:.3} ms",
                self.label,
                self.started.elapsed().as_secs_f64() * 1e3
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_without_start_is_zero() {
        let mut t = StageTimer::new();
        assert_eq!(t.stop("noop"), Duration::ZERO);
        assert_eq!(t.last_ms(), 0);
    }

    #[test]
    fn stop_records_elapsed() {
        let mut t = StageTimer::new();
        t.start();
        std::thread::sleep(Duration::from_millis(2));
        let d = t.stop("sleep");
        assert!(d >= Duration::from_millis(2));
        assert_eq!(t.last(), d);
    }
}
