//! Pixel arbitration for compositing LED matrix animations.
//!
//! Routines register into slots, get queued, and are swapped into the active
//! pool. Each drawn frame walks the active pool in tier order; every pixel write
//! goes through a claim table that decides which routine owns which pixel, so
//! a newly started animation can phase out the previous one without tearing.
//!
//! Everything is allocated by [`Engine::new`]. [`Engine::draw_frame`] does not
//! allocate or lock.

pub mod builder;
pub mod claims;
pub mod color;
pub mod config;
mod draw;
pub mod engine;
#[doc(hidden)]
pub mod harness;
#[doc(hidden)]
pub mod invariant_ppt;
pub mod list;
pub mod registry;
pub mod routine;
pub mod routines;
pub mod schedule;
pub mod tier;

pub use builder::{BuildError, EngineBuilder, SlotNames};
pub use claims::{Canvas, ClaimTable, PixelClaim};
pub use color::Rgb;
pub use config::{ConfigError, EngineConfig};
pub use engine::{Engine, SwapOutcome};
pub use registry::{Pool, RegistryError, SlotId};
pub use routine::{Params, Routine};
pub use tier::{Layer, Rung, Tags, Tier};
