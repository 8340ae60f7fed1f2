//! Wire-level types shared between the simulation core and its consumers.
//!
//! Everything in this crate is plain data: ids, enums, the per-tick update
//! batch, player intents and the encode/decode helpers for them.

mod ids;
mod intent;
mod types;
mod update;
pub mod wire;

pub use crate::ids::*;
pub use crate::intent::*;
pub use crate::types::*;
pub use crate::update::*;
pub use crate::wire::{hash_bytes_fnv1a64, Fnv1a64, FnvBuildHasher, WireError};
