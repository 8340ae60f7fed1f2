use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Index of a tile in the row-major tile arrays.
pub type TileRef = u32;

/// Simulation clock, incremented once per executed tick.
pub type Tick = u32;

/// Stable, opaque player identifier (survives reconnects, used by clients).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Dense per-game player index. `0` is reserved for terra nullius and the
/// largest value is bounded by the 12-bit owner field of a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SmallId(pub u16);

impl SmallId {
    pub const TERRA_NULLIUS: SmallId = SmallId(0);

    #[inline]
    pub const fn is_terra_nullius(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for SmallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Sequential arena ids. The engine never frees slots, so a plain counter is
/// enough to keep handles stable for the whole game.
pub struct EntityId<T> {
    pub raw: u32,
    _marker: PhantomData<T>,
}

impl<T> EntityId<T> {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.raw as usize
    }
}

// Manual impls: derives would put bounds on the tag type.
impl<T> Clone for EntityId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for EntityId<T> {}

impl<T> PartialEq for EntityId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T> Eq for EntityId<T> {}

impl<T> PartialOrd for EntityId<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for EntityId<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl<T> std::hash::Hash for EntityId<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T> fmt::Debug for EntityId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl<T> Serialize for EntityId<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u32(self.raw)
    }
}

impl<'de, T> Deserialize<'de> for EntityId<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = u32::deserialize(deserializer)?;
        Ok(Self::new(raw))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitTag;
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AllianceTag;
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AllianceRequestTag;
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttackTag;

pub type UnitId = EntityId<UnitTag>;
pub type AllianceId = EntityId<AllianceTag>;
pub type AllianceRequestId = EntityId<AllianceRequestTag>;
pub type AttackId = EntityId<AttackTag>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_ids_serialize_as_bare_integers() {
        let id = UnitId::new(42);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "42");
        let back: UnitId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn terra_nullius_is_small_id_zero() {
        assert!(SmallId(0).is_terra_nullius());
        assert!(!SmallId(1).is_terra_nullius());
    }
}
