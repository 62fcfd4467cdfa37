use std::time::Instant;

/// Tracks elapsed time for timed robot movements.
///
/// Elapsed queries return `None` until the watch has been started at least
/// once. While running, each query refreshes the end point; after `stop` the
/// reading is frozen.
#[derive(Debug, Default)]
pub struct Stopwatch {
    start: Option<Instant>,
    end: Option<Instant>,
    running: bool,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts (or restarts) the watch.
    pub fn start(&mut self) {
        self.start = Some(Instant::now());
        self.end = None;
        self.running = true;
    }

    /// Freezes the current reading. Has no effect if not running.
    pub fn stop(&mut self) {
        if self.running {
            self.end = Some(Instant::now());
            self.running = false;
        }
    }

    /// Moves the start point to now without changing the running state.
    pub fn reset(&mut self) {
        self.start = Some(Instant::now());
        self.end = None;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn elapsed_secs(&mut self) -> Option<f64> {
        self.elapsed().map(|d| d.as_secs_f64())
    }

    pub fn elapsed_msecs(&mut self) -> Option<f64> {
        self.elapsed().map(|d| d.as_secs_f64() * 1000.0)
    }

    fn elapsed(&mut self) -> Option<std::time::Duration> {
        let start = self.start?;
        if self.running {
            self.end = Some(Instant::now());
        }
        self.end.map(|end| end.duration_since(start))
    }
}
