//! Start-up assembly of an engine with named slots.

use crate::config::{ConfigError, EngineConfig};
use crate::engine::Engine;
use crate::registry::{RegistryError, SlotId};
use crate::routine::{Params, Routine};
use crate::tier::{Layer, Tags};
use std::collections::HashMap;

/// Name to handle map returned by [`EngineBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct SlotNames {
    ids: HashMap<String, SlotId>,
}

impl SlotNames {
    pub fn get(&self, name: &str) -> Option<SlotId> {
        self.ids.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Builder errors.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("slot name `{0}` used twice")]
    DuplicateName(String),
}

struct PendingSlot {
    name: String,
    routine: Box<dyn Routine>,
    params: Params,
    layer: Layer,
}

/// Collects slots, then creates and registers them in one go.
pub struct EngineBuilder {
    config: EngineConfig,
    slots: Vec<PendingSlot>,
}

impl EngineBuilder {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            slots: Vec::new(),
        }
    }

    /// Add a slot declared at `layer`.
    pub fn slot<R>(&mut self, name: &str, routine: R, params: Params, layer: Layer) -> &mut Self
    where
        R: Routine + 'static,
    {
        self.slots.push(PendingSlot {
            name: name.to_string(),
            routine: Box::new(routine),
            params,
            layer,
        });
        self
    }

    /// Add a slot whose layer is derived from its tags.
    pub fn tagged<R>(&mut self, name: &str, routine: R, params: Params, tags: Tags) -> &mut Self
    where
        R: Routine + 'static,
    {
        self.slot(name, routine, params, Layer::for_tags(tags))
    }

    /// Create the engine and register every slot in insertion order.
    pub fn build(self) -> Result<(Engine, SlotNames), BuildError> {
        let mut engine = Engine::new(self.config)?;
        let mut names = SlotNames::default();
        for pending in self.slots {
            if names.ids.contains_key(&pending.name) {
                return Err(BuildError::DuplicateName(pending.name));
            }
            let id = engine.add_boxed_slot(pending.routine, pending.params, pending.layer)?;
            engine.register(id, pending.layer)?;
            names.ids.insert(pending.name, id);
        }
        Ok((engine, names))
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl std::fmt::Debug for EngineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineBuilder")
            .field("config", &self.config)
            .field("slots", &self.slots.iter().map(|s| s.name.as_str()).collect::<Vec<_>>())
            .finish()
    }
}
