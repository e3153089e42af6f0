//! Real-time draw path.

// Runs once per frame: no allocation, no locks, no invariant logging here.

use crate::color::Rgb;
use crate::engine::Engine;
use crate::registry::{Pool, SlotId};
use crate::tier::Tier;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, warn};

impl Engine {
    /// Draw one frame into `out` if one is due at `now_ms`.
    ///
    /// Active slots run head to tail, each writing through the claim table at
    /// its current tier. A transition-tier slot is retired once it has run for
    /// its `transition_ms`; when none remain, the transition completes and the
    /// slots still on the phasing ladder are retired. If anything was written
    /// the table is copied into `out` (row-major, shorter of the two lengths)
    /// and decayed.
    ///
    /// Returns the number of writes, counting repeated writes to one pixel.
    /// Zero means the frame was not due or nothing drew; `out` is untouched.
    pub fn draw_frame(&mut self, now_ms: u64, out: &mut [Rgb]) -> usize {
        if !self.pacer.poll(now_ms) {
            return 0;
        }
        self.claims.reset_written();

        let mut transitioning = 0usize;
        let mut cursor = self.registry.first(Pool::Active);
        while let Some(id) = cursor {
            cursor = self.registry.next(id);
            let Some(slot) = self.registry.slot_mut(id) else {
                continue;
            };
            let tier = slot.tier();
            let (routine, params) = slot.parts();
            let elapsed = params.elapsed_since_activation(now_ms);
            let mut canvas = self.claims.canvas(id.0, tier, now_ms, elapsed);
            let drawn = catch_unwind(AssertUnwindSafe(|| routine.draw(params, &mut canvas)));
            let transition_ms = params.transition_ms;

            if drawn.is_err() {
                warn!(slot = id.0, ?tier, "routine panicked; retiring slot");
                let _ = self.retire(id);
                continue;
            }
            if tier == Tier::Transition {
                if elapsed >= transition_ms {
                    let _ = self.retire(id);
                } else {
                    transitioning += 1;
                }
            }
        }

        if self.claims.is_fenced() && transitioning == 0 {
            self.finish_transition();
        }

        let written = self.claims.written();
        if written > 0 {
            self.claims.commit_into(out);
            self.claims.end_of_frame_decay();
        }
        written
    }

    fn finish_transition(&mut self) {
        let mut retired = 0usize;
        let mut cursor = self.registry.first(Pool::Active);
        while let Some(id) = cursor {
            cursor = self.registry.next(id);
            if self.tier_of(id).is_some_and(Tier::is_phasing) && self.retire(id).is_ok() {
                retired += 1;
            }
        }
        self.claims.finish_transition();
        debug!(retired, "transition complete");
    }

    /// Whether a frame would be drawn at `now_ms`.
    pub fn is_due(&self, now_ms: u64) -> bool {
        now_ms >= self.pacer.next_due_ms()
    }

    /// Active slots still drawing at the transition tier.
    pub fn transitions_active(&self) -> usize {
        self.active()
            .filter(|&id: &SlotId| self.tier_of(id) == Some(Tier::Transition))
            .count()
    }
}
