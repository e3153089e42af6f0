//! Frame harness: drives an engine against a manual clock.

use crate::color::Rgb;
use crate::engine::Engine;

/// Owns an engine, a frame buffer and a millisecond clock that only moves
/// when told to.
#[derive(Debug)]
pub struct FrameHarness {
    engine: Engine,
    frame: Vec<Rgb>,
    now_ms: u64,
    frames_drawn: usize,
}

impl FrameHarness {
    pub fn new(engine: Engine) -> Self {
        let frame = vec![Rgb::BLACK; engine.claims().len()];
        Self {
            engine,
            frame,
            now_ms: 0,
            frames_drawn: 0,
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    pub fn into_engine(self) -> Engine {
        self.engine
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// The last committed frame.
    pub fn frame(&self) -> &[Rgb] {
        &self.frame
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgb> {
        let i = self.engine.claims().index(x, y)?;
        self.frame.get(i).copied()
    }

    /// Frames that committed at least one write.
    pub fn frames_drawn(&self) -> usize {
        self.frames_drawn
    }

    /// Draw at the current time without moving the clock.
    pub fn tick(&mut self) -> usize {
        let written = self.engine.draw_frame(self.now_ms, &mut self.frame);
        if written > 0 {
            self.frames_drawn += 1;
        }
        written
    }

    /// Move the clock forward by `ms`, then draw.
    pub fn advance(&mut self, ms: u64) -> usize {
        self.now_ms = self.now_ms.saturating_add(ms);
        self.tick()
    }

    /// Advance in `step_ms` increments until `duration_ms` has passed.
    /// Returns the total write count.
    pub fn run_for(&mut self, duration_ms: u64, step_ms: u64) -> usize {
        let step = step_ms.max(1);
        let end = self.now_ms.saturating_add(duration_ms);
        let mut total = 0;
        while self.now_ms < end {
            total += self.advance(step.min(end - self.now_ms));
        }
        total
    }
}
