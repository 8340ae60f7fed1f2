use rmp_serde::{decode, encode};
use thiserror::Error;

use crate::{GameUpdates, ScheduledIntent, StampedIntent};

#[derive(Debug, Error)]
pub enum WireError {
    #[error("encode error: {0}")]
    Encode(#[from] encode::Error),
    #[error("decode error: {0}")]
    Decode(#[from] decode::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn serialize_updates(updates: &GameUpdates) -> Result<Vec<u8>, WireError> {
    Ok(encode::to_vec(updates)?)
}

pub fn deserialize_updates(bytes: &[u8]) -> Result<GameUpdates, WireError> {
    Ok(decode::from_slice(bytes)?)
}

pub fn serialize_intents(intents: &[StampedIntent]) -> Result<Vec<u8>, WireError> {
    Ok(encode::to_vec(intents)?)
}

pub fn deserialize_intents(bytes: &[u8]) -> Result<Vec<StampedIntent>, WireError> {
    Ok(decode::from_slice(bytes)?)
}

pub fn serialize_updates_json(updates: &GameUpdates) -> Result<String, WireError> {
    Ok(serde_json::to_string(updates)?)
}

pub fn deserialize_updates_json(json: &str) -> Result<GameUpdates, WireError> {
    Ok(serde_json::from_str(json)?)
}

pub fn serialize_intents_json(intents: &[StampedIntent]) -> Result<String, WireError> {
    Ok(serde_json::to_string(intents)?)
}

pub fn deserialize_intents_json(json: &str) -> Result<Vec<StampedIntent>, WireError> {
    Ok(serde_json::from_str(json)?)
}

pub fn deserialize_script_json(json: &str) -> Result<Vec<ScheduledIntent>, WireError> {
    Ok(serde_json::from_str(json)?)
}

/// Deterministic, stable 64-bit hash for raw bytes (FNV-1a).
pub fn hash_bytes_fnv1a64(bytes: &[u8]) -> u64 {
    let mut h = Fnv1a64::new();
    h.write(bytes);
    h.finish()
}

/// Incremental FNV-1a 64-bit hasher. Platform independent, unlike
/// `std::hash::DefaultHasher`, so every peer computes the same value.
#[derive(Clone, Copy, Debug)]
pub struct Fnv1a64 {
    hash: u64,
}

impl Default for Fnv1a64 {
    fn default() -> Self {
        Self::new()
    }
}

impl Fnv1a64 {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;

    pub fn new() -> Self {
        Self {
            hash: Self::OFFSET_BASIS,
        }
    }

    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.hash ^= u64::from(b);
            self.hash = self.hash.wrapping_mul(Self::PRIME);
        }
    }

    pub fn write_u32(&mut self, v: u32) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_str(&mut self, s: &str) {
        self.write_u32(s.len() as u32);
        self.write(s.as_bytes());
    }

    pub fn finish(&self) -> u64 {
        self.hash
    }
}

/// Lets deterministic collections use FNV instead of the randomly seeded
/// std hasher, so iteration order is identical on every peer.
impl std::hash::Hasher for Fnv1a64 {
    fn finish(&self) -> u64 {
        self.hash
    }

    fn write(&mut self, bytes: &[u8]) {
        Fnv1a64::write(self, bytes);
    }
}

pub type FnvBuildHasher = std::hash::BuildHasherDefault<Fnv1a64>;
