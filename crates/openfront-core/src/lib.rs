//! Deterministic territorial simulation core.
//!
//! [`WorldEngine`] owns the map, players, units and diplomacy, and advances
//! them one tick at a time by running [`Execution`]s. Every tick returns a
//! [`GameUpdates`](openfront_protocol::GameUpdates) batch and, every few
//! ticks, a consistency hash that peers compare to detect desyncs.

mod alliance;
mod attack;
mod config;
mod engine;
mod entities;
mod execution;
pub mod executions;
mod player;
mod spatial;
mod stats;
mod tile_store;
mod unit;

pub use crate::alliance::*;
pub use crate::attack::*;
pub use crate::config::*;
pub use crate::engine::*;
pub use crate::entities::*;
pub use crate::execution::*;
pub use crate::player::*;
pub use crate::spatial::*;
pub use crate::stats::*;
pub use crate::tile_store::*;
pub use crate::unit::*;
