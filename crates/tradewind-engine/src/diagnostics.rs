//! Rolling frame counter for debug builds of a session.
//!
//! Counts frames and elapsed time, and every 1000 ms turns the window into a
//! frames-per-second figure. Purely observational: nothing here feeds back
//! into the simulation.

/// Length of one measuring window in milliseconds.
const WINDOW_MS: f64 = 1000.0;

/// Frame rate measured over fixed windows.
#[derive(Debug, Clone, Default)]
pub struct FrameStats {
    frames: u32,
    elapsed_ms: f64,
    last_fps: Option<f64>,
    windows_completed: u64,
}

impl FrameStats {
    /// Create an empty counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one frame that took `elapsed_ms`.
    ///
    /// Returns the frame rate of the window when this frame closes it. The
    /// counters then restart from zero.
    pub fn record(&mut self, elapsed_ms: f64) -> Option<f64> {
        if elapsed_ms.is_finite() && elapsed_ms > 0.0 {
            self.elapsed_ms += elapsed_ms;
        }
        self.frames += 1;

        if self.elapsed_ms < WINDOW_MS {
            return None;
        }

        let fps = f64::from(self.frames) * 1000.0 / self.elapsed_ms;
        tracing::debug!(
            fps,
            frames = self.frames,
            elapsed_ms = self.elapsed_ms,
            "frame window"
        );
        self.last_fps = Some(fps);
        self.windows_completed += 1;
        self.frames = 0;
        self.elapsed_ms = 0.0;
        Some(fps)
    }

    /// Frames counted in the open window.
    pub fn frames(&self) -> u32 {
        self.frames
    }

    /// Time counted in the open window.
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    /// Frame rate of the last closed window.
    pub fn last_fps(&self) -> Option<f64> {
        self.last_fps
    }

    /// Number of closed windows.
    pub fn windows_completed(&self) -> u64 {
        self.windows_completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_rolls_after_one_second() {
        let mut stats = FrameStats::new();
        for _ in 0..59 {
            assert_eq!(stats.record(16.0), None);
        }
        assert_eq!(stats.frames(), 59);

        // 63 * 16 = 1008 ms
        for _ in 0..3 {
            stats.record(16.0);
        }
        let fps = stats.record(16.0).unwrap();
        assert!((fps - 62.5).abs() < 1e-9);
        assert_eq!(stats.frames(), 0);
        assert_eq!(stats.elapsed_ms(), 0.0);
        assert_eq!(stats.windows_completed(), 1);
        assert_eq!(stats.last_fps(), Some(fps));
    }

    #[test]
    fn negative_elapsed_is_ignored() {
        let mut stats = FrameStats::new();
        stats.record(-50.0);
        stats.record(f64::NAN);
        assert_eq!(stats.frames(), 2);
        assert_eq!(stats.elapsed_ms(), 0.0);
    }
}
