use std::collections::VecDeque;

use openfront_protocol::{hash_bytes_fnv1a64, SmallId, Tick, TileRef, UnitId, UnitType, UnitUpdate};

use crate::UnitInfo;

#[derive(Clone, Debug)]
pub struct Unit {
    id: UnitId,
    unit_type: UnitType,
    owner: SmallId,
    last_owner: Option<SmallId>,
    tile: TileRef,
    last_tile: TileRef,
    active: bool,
    health: Option<u32>,
    max_health: Option<u32>,
    level: u32,
    troops: u64,
    missile_timer_queue: VecDeque<Tick>,
    target_tile: Option<TileRef>,
    target_unit: Option<UnitId>,
    patrol_tile: Option<TileRef>,
    trajectory_index: u32,
    retreating: bool,
    reached_target: bool,
    under_construction: bool,
    created_at: Tick,
}

impl Unit {
    pub(crate) fn new(
        id: UnitId,
        unit_type: UnitType,
        owner: SmallId,
        tile: TileRef,
        troops: u64,
        info: &UnitInfo,
        created_at: Tick,
    ) -> Self {
        Self {
            id,
            unit_type,
            owner,
            last_owner: None,
            tile,
            last_tile: tile,
            active: true,
            health: info.max_health,
            max_health: info.max_health,
            level: 1,
            troops,
            missile_timer_queue: VecDeque::new(),
            target_tile: None,
            target_unit: None,
            patrol_tile: None,
            trajectory_index: 0,
            retreating: false,
            reached_target: false,
            under_construction: false,
            created_at,
        }
    }

    pub fn id(&self) -> UnitId {
        self.id
    }

    pub fn unit_type(&self) -> UnitType {
        self.unit_type
    }

    pub fn owner(&self) -> SmallId {
        self.owner
    }

    pub fn last_owner(&self) -> Option<SmallId> {
        self.last_owner
    }

    pub fn tile(&self) -> TileRef {
        self.tile
    }

    pub fn last_tile(&self) -> TileRef {
        self.last_tile
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn health(&self) -> Option<u32> {
        self.health
    }

    pub fn has_health(&self) -> bool {
        self.max_health.is_some()
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn troops(&self) -> u64 {
        self.troops
    }

    pub fn target_tile(&self) -> Option<TileRef> {
        self.target_tile
    }

    pub fn target_unit(&self) -> Option<UnitId> {
        self.target_unit
    }

    pub fn patrol_tile(&self) -> Option<TileRef> {
        self.patrol_tile
    }

    pub fn trajectory_index(&self) -> u32 {
        self.trajectory_index
    }

    pub fn is_retreating(&self) -> bool {
        self.retreating
    }

    pub fn reached_target(&self) -> bool {
        self.reached_target
    }

    pub fn is_under_construction(&self) -> bool {
        self.under_construction
    }

    pub fn created_at(&self) -> Tick {
        self.created_at
    }

    pub fn missile_timer_queue(&self) -> impl Iterator<Item = Tick> + '_ {
        self.missile_timer_queue.iter().copied()
    }

    /// Every missile slot (one per level) is reloading.
    pub fn is_in_cooldown(&self) -> bool {
        self.missile_timer_queue.len() as u32 >= self.level
    }

    pub fn set_target_tile(&mut self, tile: Option<TileRef>) {
        self.target_tile = tile;
    }

    pub fn set_target_unit(&mut self, unit: Option<UnitId>) {
        self.target_unit = unit;
    }

    pub fn set_patrol_tile(&mut self, tile: Option<TileRef>) {
        self.patrol_tile = tile;
    }

    pub fn set_trajectory_index(&mut self, index: u32) {
        self.trajectory_index = index;
    }

    pub fn set_retreating(&mut self, retreating: bool) {
        self.retreating = retreating;
    }

    pub fn set_reached_target(&mut self) {
        self.reached_target = true;
    }

    pub fn set_under_construction(&mut self, value: bool) {
        self.under_construction = value;
    }

    pub fn set_troops(&mut self, troops: u64) {
        self.troops = troops;
    }

    // Engine-only mutators: these move the unit between players or cells, so
    // the engine has to keep the owning indexes in sync.

    pub(crate) fn set_tile(&mut self, tile: TileRef) {
        self.last_tile = self.tile;
        self.tile = tile;
    }

    pub(crate) fn set_owner(&mut self, owner: SmallId) {
        self.last_owner = Some(self.owner);
        self.owner = owner;
    }

    pub(crate) fn deactivate(&mut self) {
        self.active = false;
    }

    pub(crate) fn increase_level(&mut self) {
        self.level += 1;
    }

    /// Clamps to `[0, max_health]`. Types without health ignore the call.
    pub(crate) fn modify_health(&mut self, delta: i64) {
        let (Some(health), Some(max)) = (self.health, self.max_health) else {
            return;
        };
        let next = (i64::from(health) + delta).clamp(0, i64::from(max));
        self.health = Some(next as u32);
    }

    pub(crate) fn launch(&mut self, now: Tick) {
        self.missile_timer_queue.push_back(now);
    }

    pub(crate) fn reload(&mut self) -> Option<Tick> {
        self.missile_timer_queue.pop_front()
    }

    pub fn hash(&self) -> u64 {
        let type_hash = hash_bytes_fnv1a64(self.unit_type.name().as_bytes());
        u64::from(self.tile).wrapping_add(type_hash.wrapping_mul(u64::from(self.id.raw)))
    }

    pub fn to_update(&self) -> UnitUpdate {
        UnitUpdate {
            id: self.id,
            unit_type: self.unit_type,
            owner_id: self.owner,
            last_owner_id: self.last_owner,
            pos: self.tile,
            last_pos: self.last_tile,
            is_active: self.active,
            troops: self.troops,
            health: self.health,
            level: self.level,
            retreating: self.retreating,
            reached_target: self.reached_target,
            under_construction: self.under_construction,
            target_tile: self.target_tile,
            target_unit_id: self.target_unit,
            patrol_tile: self.patrol_tile,
            trajectory_index: self.trajectory_index,
            missile_timer_queue: self.missile_timer_queue.iter().copied().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warship(max_health: Option<u32>) -> Unit {
        let info = UnitInfo {
            cost: 0,
            max_health,
            territory_bound: false,
            upgradable: false,
        };
        Unit::new(UnitId::new(3), UnitType::Warship, SmallId(1), 40, 0, &info, 0)
    }

    #[test]
    fn health_clamps_to_bounds() {
        let mut unit = warship(Some(100));
        unit.modify_health(-30);
        assert_eq!(unit.health(), Some(70));
        unit.modify_health(500);
        assert_eq!(unit.health(), Some(100));
        unit.modify_health(-1000);
        assert_eq!(unit.health(), Some(0));

        let mut shell = warship(None);
        shell.modify_health(-10);
        assert_eq!(shell.health(), None);
    }

    #[test]
    fn missile_slots_follow_level() {
        let mut silo = warship(None);
        assert!(!silo.is_in_cooldown());
        silo.launch(10);
        assert!(silo.is_in_cooldown());
        silo.increase_level();
        assert!(!silo.is_in_cooldown());
        silo.launch(12);
        assert_eq!(silo.missile_timer_queue().collect::<Vec<_>>(), vec![10, 12]);
        assert_eq!(silo.reload(), Some(10));
        assert!(!silo.is_in_cooldown());
    }

    #[test]
    fn moving_tracks_last_tile() {
        let mut unit = warship(None);
        unit.set_tile(41);
        unit.set_tile(42);
        assert_eq!((unit.last_tile(), unit.tile()), (41, 42));
    }

    #[test]
    fn hash_mixes_tile_type_and_id() {
        let unit = warship(None);
        let expected = 40u64.wrapping_add(hash_bytes_fnv1a64(b"Warship").wrapping_mul(3));
        assert_eq!(unit.hash(), expected);
    }
}
