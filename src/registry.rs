//! Slot arena and pool bookkeeping.
//!
//! Slots live in a fixed-capacity arena addressed by [`SlotId`]. Pool
//! membership is the slot's link in a four-list [`IndexList`], so a slot can
//! sit in at most one pool and "in no pool" is simply "unlinked".

use crate::list::{IndexList, ListId};
use crate::routine::{Params, Routine};
use crate::tier::{Layer, Tier};

/// Stable handle to a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub usize);

/// The four membership pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pool {
    WaitingMain,
    WaitingTransition,
    Queued,
    Active,
}

impl Pool {
    pub const ALL: [Pool; 4] = [
        Pool::WaitingMain,
        Pool::WaitingTransition,
        Pool::Queued,
        Pool::Active,
    ];

    /// The waiting pool a slot declared at `layer` returns to.
    pub const fn waiting_for(layer: Layer) -> Pool {
        if layer.is_transition() {
            Pool::WaitingTransition
        } else {
            Pool::WaitingMain
        }
    }

    pub const fn is_waiting(self) -> bool {
        matches!(self, Pool::WaitingMain | Pool::WaitingTransition)
    }

    const fn list(self) -> ListId {
        match self {
            Pool::WaitingMain => ListId(0),
            Pool::WaitingTransition => ListId(1),
            Pool::Queued => ListId(2),
            Pool::Active => ListId(3),
        }
    }

    const fn from_list(list: ListId) -> Option<Pool> {
        match list.0 {
            0 => Some(Pool::WaitingMain),
            1 => Some(Pool::WaitingTransition),
            2 => Some(Pool::Queued),
            3 => Some(Pool::Active),
            _ => None,
        }
    }
}

/// Registry operation errors. Every error leaves the registry unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("no slot {0:?}")]
    UnknownSlot(SlotId),
    #[error("all {0} slots are in use")]
    CapacityExhausted(usize),
    #[error("slot {0:?} is already registered")]
    AlreadyRegistered(SlotId),
    #[error("slot {0:?} is not registered")]
    NotRegistered(SlotId),
    #[error("slot {0:?} is not in a waiting pool")]
    NotWaiting(SlotId),
    #[error("slot {0:?} is active; force it to unregister")]
    SlotActive(SlotId),
    #[error("no waiting slot runs routine `{0}`")]
    NoWaitingRoutine(String),
    #[error("a transition is still running")]
    TransitionInProgress,
}

/// A routine with its parameters and tier state.
pub struct Slot {
    routine: Box<dyn Routine>,
    params: Params,
    layer: Layer,
    tier: Tier,
}

impl Slot {
    pub fn routine_name(&self) -> &str {
        self.routine.name()
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }

    /// Declared default layer.
    pub fn layer(&self) -> Layer {
        self.layer
    }

    /// Tier assigned at queue time and shifted by transitions.
    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub(crate) fn set_tier(&mut self, tier: Tier) {
        self.tier = tier;
    }

    pub(crate) fn parts(&mut self) -> (&mut Box<dyn Routine>, &mut Params) {
        (&mut self.routine, &mut self.params)
    }
}

impl std::fmt::Debug for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slot")
            .field("routine", &self.routine.name())
            .field("layer", &self.layer)
            .field("tier", &self.tier)
            .finish()
    }
}

/// Fixed-capacity slot arena plus the four pools.
#[derive(Debug)]
pub struct Registry {
    slots: Vec<Slot>,
    capacity: usize,
    pools: IndexList,
}

impl Registry {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            pools: IndexList::new(capacity, Pool::ALL.len()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots created so far, registered or not.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Create an unregistered slot.
    pub fn insert(
        &mut self,
        routine: Box<dyn Routine>,
        params: Params,
        layer: Layer,
    ) -> Result<SlotId, RegistryError> {
        if self.slots.len() >= self.capacity {
            return Err(RegistryError::CapacityExhausted(self.capacity));
        }
        let id = SlotId(self.slots.len());
        self.slots.push(Slot {
            routine,
            params,
            layer,
            tier: layer.tier(),
        });
        Ok(id)
    }

    pub fn slot(&self, id: SlotId) -> Option<&Slot> {
        self.slots.get(id.0)
    }

    pub fn slot_mut(&mut self, id: SlotId) -> Option<&mut Slot> {
        self.slots.get_mut(id.0)
    }

    pub(crate) fn get(&self, id: SlotId) -> Result<&Slot, RegistryError> {
        self.slots.get(id.0).ok_or(RegistryError::UnknownSlot(id))
    }

    pub(crate) fn get_mut(&mut self, id: SlotId) -> Result<&mut Slot, RegistryError> {
        self.slots.get_mut(id.0).ok_or(RegistryError::UnknownSlot(id))
    }

    pub fn pool_of(&self, id: SlotId) -> Option<Pool> {
        self.pools.owner(id.0).and_then(Pool::from_list)
    }

    pub fn is_registered(&self, id: SlotId) -> bool {
        self.pool_of(id).is_some()
    }

    pub fn pool_len(&self, pool: Pool) -> usize {
        self.pools.len(pool.list())
    }

    /// Slots currently in any pool.
    pub fn registered(&self) -> usize {
        Pool::ALL.iter().map(|&p| self.pool_len(p)).sum()
    }

    /// Walk `pool` head to tail.
    pub fn iter(&self, pool: Pool) -> impl Iterator<Item = SlotId> + '_ {
        self.pools.iter(pool.list()).map(SlotId)
    }

    pub fn first(&self, pool: Pool) -> Option<SlotId> {
        self.pools.first(pool.list()).map(SlotId)
    }

    /// The slot after `id` in whichever pool holds it.
    pub fn next(&self, id: SlotId) -> Option<SlotId> {
        self.pools.next(id.0).map(SlotId)
    }

    /// Put an unregistered slot into the waiting pool for `layer`.
    pub fn register(&mut self, id: SlotId, layer: Layer) -> Result<(), RegistryError> {
        self.get(id)?;
        if self.is_registered(id) {
            return Err(RegistryError::AlreadyRegistered(id));
        }
        self.pools
            .push_back(Pool::waiting_for(layer).list(), id.0)
            .map_err(|_| RegistryError::AlreadyRegistered(id))?;
        let slot = &mut self.slots[id.0];
        slot.layer = layer;
        slot.tier = layer.tier();
        Ok(())
    }

    /// Move a waiting slot onto the tail of the queue at `tier`.
    pub fn queue(&mut self, id: SlotId, tier: Tier) -> Result<(), RegistryError> {
        let pool = self.pool_of(id).ok_or(RegistryError::NotRegistered(id))?;
        if !pool.is_waiting() {
            return Err(RegistryError::NotWaiting(id));
        }
        self.move_to_back(id, pool, Pool::Queued)?;
        self.slots[id.0].tier = tier;
        Ok(())
    }

    /// First waiting slot, main before transition, whose routine is `name`.
    pub fn find_waiting(&self, name: &str) -> Option<SlotId> {
        [Pool::WaitingMain, Pool::WaitingTransition]
            .into_iter()
            .flat_map(|p| self.iter(p))
            .find(|&id| self.slots[id.0].routine_name() == name)
    }

    /// Return a slot to the waiting pool of its declared layer.
    pub(crate) fn park(&mut self, id: SlotId) -> Result<Pool, RegistryError> {
        let from = self.pool_of(id).ok_or(RegistryError::NotRegistered(id))?;
        let slot = self.get_mut(id)?;
        slot.tier = slot.layer.tier();
        let to = Pool::waiting_for(slot.layer);
        if from != to {
            self.move_to_back(id, from, to)?;
        }
        Ok(to)
    }

    /// Drop a slot from whatever pool holds it.
    pub(crate) fn unlink(&mut self, id: SlotId) -> Result<(), RegistryError> {
        let from = self.pool_of(id).ok_or(RegistryError::NotRegistered(id))?;
        self.pools
            .remove(from.list(), id.0)
            .map_err(|_| RegistryError::NotRegistered(id))
    }

    /// Take the head of the queue.
    pub(crate) fn pop_queued(&mut self) -> Option<SlotId> {
        let id = self.first(Pool::Queued)?;
        self.pools.remove(Pool::Queued.list(), id.0).ok()?;
        Some(id)
    }

    /// Link an unlinked slot into the active pool ahead of the first slot whose
    /// tier is not above its own, keeping the pool in descending tier order.
    pub(crate) fn activate_sorted(&mut self, id: SlotId) -> Result<(), RegistryError> {
        let tier = self.get(id)?.tier;
        let anchor = self.iter(Pool::Active).find(|a| self.slots[a.0].tier <= tier);
        let linked = match anchor {
            Some(a) => self.pools.insert_before(a.0, id.0),
            None => self.pools.push_back(Pool::Active.list(), id.0),
        };
        linked.map_err(|_| RegistryError::AlreadyRegistered(id))
    }

    fn move_to_back(&mut self, id: SlotId, from: Pool, to: Pool) -> Result<(), RegistryError> {
        self.pools
            .remove(from.list(), id.0)
            .map_err(|_| RegistryError::NotRegistered(id))?;
        self.pools
            .push_back(to.list(), id.0)
            .map_err(|_| RegistryError::AlreadyRegistered(id))
    }

    /// Every slot is in at most one pool and the pool lengths add up.
    pub fn pools_consistent(&self) -> bool {
        let mut seen = vec![0u8; self.slots.len()];
        for pool in Pool::ALL {
            for id in self.iter(pool) {
                match seen.get_mut(id.0) {
                    Some(n) => *n += 1,
                    None => return false,
                }
            }
        }
        let linked = (0..self.slots.len())
            .filter(|&i| self.pools.is_linked(i))
            .count();
        seen.iter().all(|&n| n <= 1) && linked == self.registered()
    }

    /// The active pool is in non-increasing tier order.
    pub fn active_sorted(&self) -> bool {
        let tiers: Vec<Tier> = self.iter(Pool::Active).map(|id| self.slots[id.0].tier).collect();
        tiers.windows(2).all(|w| w[0] >= w[1])
    }
}
