//! The arbitration engine: registry operations and the swap protocol.
//!
//! One [`Engine`] owns the slot registry, the claim table and the frame pacer
//! for one display. Registry mutators and [`Engine::swap`] run outside the
//! real-time path and check their invariants; [`Engine::draw_frame`] lives in
//! `draw.rs` and never does.

use crate::claims::ClaimTable;
use crate::config::{ConfigError, EngineConfig};
use crate::invariant_ppt::{
    assert_invariant, note_invariant, ACTIVE_ORDER, CONFIG_VALID, HARD_CUT_CLEARS,
    LADDER_ALIGNMENT, POOL_EXCLUSIVITY, QUEUE_DRAINED, REGISTRY_REJECTS_INVALID,
    RETIRE_RELEASES_PIXELS, TRANSITION_FENCE,
};
use crate::registry::{Pool, Registry, RegistryError, Slot, SlotId};
use crate::routine::{Params, Routine};
use crate::schedule::FramePacer;
use crate::tier::{ladder_is_aligned, Layer, Tier};
use tracing::{debug, trace};

/// What a [`Engine::swap`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapOutcome {
    /// Nothing was queued; the active pool is untouched.
    Idle { dropped_transitions: usize },
    /// Old content retired, table cleared, queue activated.
    HardCut { retired: usize, activated: usize },
    /// Old content moved onto the phasing ladder behind a transition.
    Transition { phasing: usize, activated: usize },
}

/// Registry, claim table and pacer for one display.
#[derive(Debug)]
pub struct Engine {
    pub(crate) config: EngineConfig,
    pub(crate) registry: Registry,
    pub(crate) claims: ClaimTable,
    pub(crate) pacer: FramePacer,
}

impl Engine {
    /// Validate `config` and allocate everything the engine will ever use.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        note_invariant(CONFIG_VALID);
        assert_invariant(
            LADDER_ALIGNMENT,
            ladder_is_aligned(),
            "layers must map onto the tier ladder and phasing must round-trip",
            None,
        );
        Ok(Self {
            registry: Registry::new(config.slot_capacity),
            claims: ClaimTable::new(config.width, config.height, config.slot_capacity),
            pacer: FramePacer::new(config.default_fps, config.max_fps),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn claims(&self) -> &ClaimTable {
        &self.claims
    }

    pub fn pacer(&self) -> &FramePacer {
        &self.pacer
    }

    pub fn is_transition_in_progress(&self) -> bool {
        self.claims.is_fenced()
    }

    pub fn slot(&self, id: SlotId) -> Option<&Slot> {
        self.registry.slot(id)
    }

    pub fn params_mut(&mut self, id: SlotId) -> Option<&mut Params> {
        self.registry.slot_mut(id).map(Slot::params_mut)
    }

    pub fn pool_of(&self, id: SlotId) -> Option<Pool> {
        self.registry.pool_of(id)
    }

    /// Active slots in draw order.
    pub fn active(&self) -> impl Iterator<Item = SlotId> + '_ {
        self.registry.iter(Pool::Active)
    }

    /// Create a slot. It stays outside every pool until registered.
    pub fn add_slot<R>(
        &mut self,
        routine: R,
        params: Params,
        layer: Layer,
    ) -> Result<SlotId, RegistryError>
    where
        R: Routine + 'static,
    {
        self.add_boxed_slot(Box::new(routine), params, layer)
    }

    pub fn add_boxed_slot(
        &mut self,
        routine: Box<dyn Routine>,
        params: Params,
        layer: Layer,
    ) -> Result<SlotId, RegistryError> {
        let id = self.registry.insert(routine, params, layer);
        self.reject_on_err(id)
    }

    /// Put an unregistered slot into the waiting pool its layer selects.
    pub fn register(&mut self, id: SlotId, layer: Layer) -> Result<(), RegistryError> {
        let res = self.registry.register(id, layer);
        self.reject_on_err(res)?;
        trace!(slot = id.0, ?layer, "registered");
        self.check_pools();
        Ok(())
    }

    /// Take a slot out of every pool.
    ///
    /// An active slot is only removed when `force` is set; it is retired first
    /// so its remembered pixels are released.
    pub fn unregister(&mut self, id: SlotId, force: bool) -> Result<(), RegistryError> {
        let pool = self.registry.pool_of(id).ok_or(RegistryError::NotRegistered(id));
        let pool = self.reject_on_err(pool)?;
        if pool == Pool::Active {
            if !force {
                note_invariant(REGISTRY_REJECTS_INVALID);
                return Err(RegistryError::SlotActive(id));
            }
            self.retire(id)?;
            assert_invariant(
                RETIRE_RELEASES_PIXELS,
                self.claims.remembered_count(id.0) == 0,
                "retired slot still remembers pixels",
                None,
            );
        }
        self.registry.unlink(id)?;
        trace!(slot = id.0, ?pool, force, "unregistered");
        self.check_pools();
        Ok(())
    }

    /// Move a waiting slot onto the queue, at `layer` if given or its declared
    /// layer otherwise.
    pub fn queue(&mut self, id: SlotId, layer: Option<Layer>) -> Result<(), RegistryError> {
        let declared = self.reject_on_err(self.registry.get(id).map(Slot::layer))?;
        let tier = layer.unwrap_or(declared).tier();
        let res = self.registry.queue(id, tier);
        self.reject_on_err(res)?;
        trace!(slot = id.0, ?tier, "queued");
        self.check_pools();
        Ok(())
    }

    /// Queue the first waiting slot running routine `name`, scanning the main
    /// waiting pool before the transition one.
    pub fn queue_by_routine(
        &mut self,
        name: &str,
        layer: Option<Layer>,
    ) -> Result<SlotId, RegistryError> {
        let found = self
            .registry
            .find_waiting(name)
            .ok_or_else(|| RegistryError::NoWaitingRoutine(name.to_owned()));
        let id = self.reject_on_err(found)?;
        self.queue(id, layer)?;
        Ok(id)
    }

    /// Activate the queue.
    ///
    /// A queued transition-tier slot starts a transition: every claim drops to
    /// the bottom of the phasing ladder and current content keeps drawing at
    /// its phasing tier until the transition finishes. Without one the swap
    /// is a hard cut. With `use_blending` queued transitions are sent back
    /// to waiting instead. An empty queue leaves the active pool alone.
    ///
    /// Starting a transition while another is still running is rejected with
    /// [`RegistryError::TransitionInProgress`] and changes nothing. A hard cut
    /// is always allowed and ends any open transition.
    pub fn swap(&mut self, use_blending: bool) -> Result<SwapOutcome, RegistryError> {
        if !use_blending && self.claims.is_fenced() && self.transition_queued() {
            return self.reject_on_err(Err(RegistryError::TransitionInProgress));
        }

        let mut dropped = 0;
        let mut starting = false;
        let mut cursor = self.registry.first(Pool::Queued);
        while let Some(id) = cursor {
            cursor = self.registry.next(id);
            if self.tier_of(id) != Some(Tier::Transition) {
                continue;
            }
            if use_blending {
                if self.retire(id).is_ok() {
                    dropped += 1;
                }
            } else {
                starting = true;
            }
        }

        if self.registry.pool_len(Pool::Queued) == 0 {
            debug!(dropped, "swap with empty queue");
            return Ok(SwapOutcome::Idle {
                dropped_transitions: dropped,
            });
        }

        let outcome = if starting {
            let phasing = self.begin_transition();
            let activated = self.drain_queue();
            SwapOutcome::Transition { phasing, activated }
        } else {
            let retired = self.hard_cut();
            let activated = self.drain_queue();
            SwapOutcome::HardCut { retired, activated }
        };
        debug!(?outcome, fps = self.pacer.fps(), "swap");

        assert_invariant(
            QUEUE_DRAINED,
            self.registry.pool_len(Pool::Queued) == 0,
            "swap left slots queued",
            None,
        );
        assert_invariant(
            ACTIVE_ORDER,
            self.registry.active_sorted(),
            "active pool out of tier order",
            None,
        );
        self.check_pools();
        Ok(outcome)
    }

    fn transition_queued(&self) -> bool {
        self.registry
            .iter(Pool::Queued)
            .any(|id| self.tier_of(id) == Some(Tier::Transition))
    }

    /// Demote the table and the active pool onto the phasing ladder.
    fn begin_transition(&mut self) -> usize {
        self.claims.demote_all_to_phasing();
        let mut phasing = 0;
        let mut cursor = self.registry.first(Pool::Active);
        while let Some(id) = cursor {
            cursor = self.registry.next(id);
            let Some(tier) = self.tier_of(id) else {
                continue;
            };
            if tier == Tier::Transition {
                // Stale; its transition already ended.
                let _ = self.retire(id);
            } else if let Some(slot) = self.registry.slot_mut(id) {
                slot.set_tier(tier.to_phasing());
                phasing += 1;
            }
        }
        assert_invariant(
            TRANSITION_FENCE,
            self.claims.is_fenced()
                && self
                    .claims
                    .pixels()
                    .iter()
                    .all(|p| p.tier == Tier::PHASING_LOW),
            "transition must start with every pixel at phasing-low",
            None,
        );
        debug!(phasing, "transition started");
        phasing
    }

    /// Retire every active slot and paint the background.
    fn hard_cut(&mut self) -> usize {
        let mut retired = 0;
        while let Some(id) = self.registry.first(Pool::Active) {
            if self.retire(id).is_err() {
                break;
            }
            retired += 1;
        }
        let background = self.config.background;
        self.claims.clear(background);
        assert_invariant(
            HARD_CUT_CLEARS,
            self.registry.pool_len(Pool::Active) == 0
                && self
                    .claims
                    .pixels()
                    .iter()
                    .all(|p| p.tier == Tier::LOW && p.color == background),
            "hard cut must empty the active pool and clear the table",
            None,
        );
        retired
    }

    /// Move every queued slot into the active pool in tier order and derive
    /// the frame rate from what was activated.
    fn drain_queue(&mut self) -> usize {
        let mut activated = 0;
        let mut fps = 0;
        while let Some(id) = self.registry.pop_queued() {
            if let Some(slot) = self.registry.slot_mut(id) {
                let params = slot.params_mut();
                params.reset_activation();
                fps = fps.max(params.fps);
            }
            if self.registry.activate_sorted(id).is_ok() {
                activated += 1;
            }
        }
        if activated > 0 {
            let fps = if fps == 0 { self.config.default_fps } else { fps };
            self.pacer.retarget(fps);
            self.pacer.reset();
        }
        activated
    }

    /// Send a slot back to its waiting pool and release its remembered pixels.
    /// Safe to call from the draw path.
    pub(crate) fn retire(&mut self, id: SlotId) -> Result<Pool, RegistryError> {
        let pool = self.registry.park(id)?;
        let released = self.claims.release_remembered(id.0);
        debug!(slot = id.0, ?pool, released, "retired");
        Ok(pool)
    }

    pub(crate) fn tier_of(&self, id: SlotId) -> Option<Tier> {
        self.registry.slot(id).map(Slot::tier)
    }

    fn reject_on_err<T>(&self, res: Result<T, RegistryError>) -> Result<T, RegistryError> {
        if res.is_err() {
            note_invariant(REGISTRY_REJECTS_INVALID);
        }
        res
    }

    fn check_pools(&self) {
        assert_invariant(
            POOL_EXCLUSIVITY,
            self.registry.pools_consistent(),
            "slot found in more than one pool",
            None,
        );
    }
}
