//! Reference routines.
//!
//! Small, deterministic bodies that exercise each part of the claim protocol:
//! plain fills, transitions that release pixels as they sweep, and a
//! remembrance routine that keeps fading what it drew earlier.

use crate::claims::Canvas;
use crate::color::Rgb;
use crate::routine::{Params, Routine};

/// 16-bit linear congruential generator (x * 2053 + 13849).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rng16 {
    seed: u16,
}

impl Rng16 {
    pub const fn new(seed: u16) -> Self {
        Self { seed }
    }

    pub fn next_u16(&mut self) -> u16 {
        self.seed = self.seed.wrapping_mul(2053).wrapping_add(13849);
        self.seed
    }

    pub fn next_u8(&mut self) -> u8 {
        (self.next_u16() >> 8) as u8
    }

    /// Uniform-ish value in `0..n`; zero when `n` is zero.
    pub fn below(&mut self, n: usize) -> usize {
        ((self.next_u16() as u64 * n as u64) >> 16) as usize
    }
}

impl Default for Rng16 {
    fn default() -> Self {
        Self::new(1337)
    }
}

/// Three-segment color wheel.
fn wheel(hue: u8) -> Rgb {
    let h = hue as u16 * 3;
    match h >> 8 {
        0 => Rgb::new(255 - (h & 0xFF) as u8, (h & 0xFF) as u8, 0),
        1 => Rgb::new(0, 255 - (h & 0xFF) as u8, (h & 0xFF) as u8),
        _ => Rgb::new((h & 0xFF) as u8, 0, 255 - (h & 0xFF) as u8),
    }
}

/// Paints every pixel `params.color`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SolidFill;

impl Routine for SolidFill {
    fn draw(&mut self, params: &mut Params, canvas: &mut Canvas<'_>) {
        for i in 0..canvas.len() {
            canvas.write(i, params.color);
        }
        params.counter = params.counter.wrapping_add(1);
    }

    fn name(&self) -> &str {
        "solid_fill"
    }
}

/// Transition that sweeps a `params.color` line left to right over
/// `params.transition_ms`, clearing (and so releasing) every column behind it.
///
/// `params.value` counts the columns already cleared.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineSwipe;

impl Routine for LineSwipe {
    fn draw(&mut self, params: &mut Params, canvas: &mut Canvas<'_>) {
        let width = canvas.width() as u64;
        let reached = match params.transition_ms {
            0 => width,
            total => (canvas.elapsed_ms().saturating_mul(width + 1) / total).min(width),
        };
        let height = canvas.height() as i32;
        for x in u64::from(params.value)..reached {
            for y in 0..height {
                canvas.write_xy(x as i32, y, Rgb::BLACK);
            }
        }
        params.value = reached as u32;
        if reached < width {
            for y in 0..height {
                canvas.write_xy(reached as i32, y, params.color);
            }
        }
    }

    fn name(&self) -> &str {
        "line_swipe"
    }
}

/// Transition that clears random pixels still held by retiring content,
/// finishing in about `params.transition_ms`. `params.scale` adds extra pixels
/// per frame. Sets `params.value` to the pixel count once nothing is left.
#[derive(Debug, Clone, Default)]
pub struct Dissolve {
    rng: Rng16,
}

impl Dissolve {
    pub fn new(seed: u16) -> Self {
        Self {
            rng: Rng16::new(seed),
        }
    }

    /// A pixel still showing retiring content, probing forward from `start`.
    fn next_phasing(canvas: &Canvas<'_>, start: usize) -> Option<usize> {
        let len = canvas.len();
        (0..len)
            .map(|k| (start + k) % len)
            .find(|&i| canvas.claim(i).is_some_and(|c| c.tier.is_phasing()))
    }
}

impl Routine for Dissolve {
    fn draw(&mut self, params: &mut Params, canvas: &mut Canvas<'_>) {
        let len = canvas.len();
        if len == 0 || params.value as usize >= len {
            return;
        }
        let due = match params.transition_ms {
            0 => len,
            total => (canvas.elapsed_ms().saturating_mul(len as u64) / total) as usize,
        };
        let target = due.saturating_add(params.scale as usize).min(len);
        while (params.value as usize) < target {
            let start = self.rng.below(len);
            match Self::next_phasing(canvas, start) {
                Some(i) => {
                    canvas.write(i, Rgb::BLACK);
                    params.value += 1;
                }
                None => {
                    params.value = len as u32;
                    break;
                }
            }
        }
    }

    fn name(&self) -> &str {
        "dissolve"
    }
}

/// Sprinkles colored dots and fades them out over later frames.
///
/// Each dot is remembered so it keeps its claim while fading; once black it is
/// forgotten. `params.speed` dots spawn per frame, `params.scale` is the
/// per-frame fade factor out of 256.
#[derive(Debug, Clone, Default)]
pub struct Confetti {
    rng: Rng16,
}

impl Confetti {
    pub fn new(seed: u16) -> Self {
        Self {
            rng: Rng16::new(seed),
        }
    }
}

impl Routine for Confetti {
    fn draw(&mut self, params: &mut Params, canvas: &mut Canvas<'_>) {
        let fade = params.scale.min(255) as u8;
        let mut cursor = canvas.first_remembered();
        while let Some(i) = cursor {
            cursor = canvas.next_remembered(i);
            let faded = canvas.color(i).unwrap_or_default().scale8(fade);
            let kept = canvas.write(i, faded);
            if !kept || faded.is_clear() {
                canvas.forget(i);
            }
        }

        let len = canvas.len();
        if len == 0 {
            return;
        }
        for _ in 0..params.speed {
            let i = self.rng.below(len);
            let hue = params.hue.wrapping_add(self.rng.next_u8() >> 2);
            if canvas.write(i, wheel(hue)) {
                canvas.remember(i);
            }
        }
        params.hue = params.hue.wrapping_add(1);
        params.counter = params.counter.wrapping_add(1);
    }

    fn name(&self) -> &str {
        "confetti"
    }
}
