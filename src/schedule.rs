//! Frame pacing.

/// Tracks the derived target rate and when the next frame is due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePacer {
    fps: u16,
    max_fps: u16,
    next_due_ms: u64,
}

impl FramePacer {
    pub fn new(fps: u16, max_fps: u16) -> Self {
        let max_fps = max_fps.max(1);
        Self {
            fps: fps.clamp(1, max_fps),
            max_fps,
            next_due_ms: 0,
        }
    }

    pub fn fps(&self) -> u16 {
        self.fps
    }

    /// Frame period in whole milliseconds, never zero.
    pub fn period_ms(&self) -> u64 {
        (1000 / u64::from(self.fps)).max(1)
    }

    pub fn next_due_ms(&self) -> u64 {
        self.next_due_ms
    }

    /// If a frame is due at `now_ms`, schedule the next one and return true.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        if now_ms < self.next_due_ms {
            return false;
        }
        self.next_due_ms = now_ms.saturating_add(self.period_ms());
        true
    }

    /// Change the target rate. Zero is ignored.
    pub fn retarget(&mut self, fps: u16) {
        if fps > 0 {
            self.fps = fps.min(self.max_fps);
        }
    }

    /// Make the next poll due immediately.
    pub fn reset(&mut self) {
        self.next_due_ms = 0;
    }
}
