//! The routine contract and per-slot parameter block.

use crate::claims::Canvas;
use crate::color::Rgb;

/// An animation body, invoked once per drawn frame while its slot is active.
///
/// A routine touches pixels only through the [`Canvas`], which applies the
/// claim protocol at the slot's current tier. Closures taking
/// `(&mut Params, &mut Canvas)` implement this trait directly.
pub trait Routine {
    fn draw(&mut self, params: &mut Params, canvas: &mut Canvas<'_>);

    /// Identity used by [`crate::Engine::queue_by_routine`].
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<F> Routine for F
where
    F: FnMut(&mut Params, &mut Canvas<'_>),
{
    fn draw(&mut self, params: &mut Params, canvas: &mut Canvas<'_>) {
        self(params, canvas)
    }
}

/// Knobs shared by every routine. Their meaning is up to the routine; the
/// engine itself reads only `fps` and `transition_ms`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    pub hue: u8,
    pub color: Rgb,
    pub speed: u16,
    pub scale: u16,
    /// Free-running counter, zeroed on activation.
    pub counter: u32,
    /// Routine-defined progress marker, zeroed on activation.
    pub value: u32,
    /// Requested frame rate. Zero defers to the engine default.
    pub fps: u16,
    /// Lifetime of a transition-tier slot, measured from its first frame.
    pub transition_ms: u64,
    pub(crate) activated_at: Option<u64>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }

    pub fn with_hue(mut self, hue: u8) -> Self {
        self.hue = hue;
        self
    }

    pub fn with_speed(mut self, speed: u16) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_scale(mut self, scale: u16) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_fps(mut self, fps: u16) -> Self {
        self.fps = fps;
        self
    }

    pub fn with_transition_ms(mut self, ms: u64) -> Self {
        self.transition_ms = ms;
        self
    }

    /// When the slot drew its first frame since the last activation.
    pub fn activated_at(&self) -> Option<u64> {
        self.activated_at
    }

    /// Clear per-activation state.
    pub(crate) fn reset_activation(&mut self) {
        self.counter = 0;
        self.value = 0;
        self.activated_at = None;
    }

    /// Stamp the activation time on first use and return elapsed time.
    pub(crate) fn elapsed_since_activation(&mut self, now_ms: u64) -> u64 {
        let start = *self.activated_at.get_or_insert(now_ms);
        now_ms.saturating_sub(start)
    }
}
