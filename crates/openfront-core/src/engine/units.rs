use openfront_protocol::{GameUpdate, MessageType, SmallId, TileRef, UnitId, UnitType};
use tracing::debug;

use super::WorldEngine;
use crate::Unit;

impl WorldEngine {
    pub fn unit(&self, id: UnitId) -> &Unit {
        &self.units[id]
    }

    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    pub fn active_units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values().filter(|u| u.is_active())
    }

    pub fn units_of(&self, player: SmallId) -> impl Iterator<Item = &Unit> {
        self.player(player)
            .units()
            .iter()
            .map(move |&id| &self.units[id])
    }

    /// Active units of `types` within euclidean `radius`, with squared
    /// distances.
    pub fn nearby_units<F>(
        &self,
        tile: TileRef,
        radius: u32,
        types: &[UnitType],
        predicate: F,
    ) -> Vec<(UnitId, u64)>
    where
        F: FnMut(&Unit) -> bool,
    {
        self.grid
            .nearby_units(&self.map, &self.units, tile, radius, types, predicate)
    }

    pub fn has_unit_nearby(
        &self,
        tile: TileRef,
        radius: u32,
        unit_type: UnitType,
        owner: Option<SmallId>,
    ) -> bool {
        self.grid
            .has_unit_nearby(&self.map, &self.units, tile, radius, unit_type, owner)
    }

    fn push_unit_update(&mut self, id: UnitId) {
        let update = self.units[id].to_update();
        self.updates.push(GameUpdate::Unit(update));
    }

    pub fn build_unit(
        &mut self,
        owner: SmallId,
        unit_type: UnitType,
        tile: TileRef,
        troops: u64,
    ) -> UnitId {
        let info = self.config.unit_info(unit_type);
        let now = self.ticks;
        let id = self
            .units
            .insert_with(|id| Unit::new(id, unit_type, owner, tile, troops, &info, now));
        self.player_mut(owner).units.push(id);
        self.grid.add_unit(&self.units[id]);
        self.push_unit_update(id);

        let player_id = self.player(owner).id().clone();
        self.stats.unit_build(&player_id, unit_type);
        debug!("{} built {} at {}", owner, unit_type.name(), tile);
        id
    }

    /// Moves an active unit; moving a destroyed one is a no-op.
    pub fn move_unit(&mut self, id: UnitId, tile: TileRef) {
        let unit = &mut self.units[id];
        if !unit.is_active() {
            return;
        }
        unit.set_tile(tile);
        self.grid.update_unit_cell(&self.units[id]);
        self.push_unit_update(id);
    }

    /// Applies setter changes made by an execution and broadcasts the unit.
    pub fn update_unit(&mut self, id: UnitId, change: impl FnOnce(&mut Unit)) {
        change(&mut self.units[id]);
        self.push_unit_update(id);
    }

    /// Deactivates the unit and drops it from its owner and the spatial
    /// index. `destroyer` is told about the kill. Deleting twice is a no-op.
    pub fn delete_unit(&mut self, id: UnitId, destroyer: Option<SmallId>) {
        if !self.units[id].is_active() {
            return;
        }
        self.grid.remove_unit(&self.units[id]);
        let unit = &mut self.units[id];
        unit.deactivate();
        let (owner, unit_type) = (unit.owner(), unit.unit_type());
        self.player_mut(owner).units.retain(|&u| u != id);
        self.push_unit_update(id);

        let owner_id = self.player(owner).id().clone();
        self.stats.unit_destroy(&owner_id, unit_type);
        if let Some(destroyer) = destroyer {
            if destroyer != owner && unit_type.is_structure() {
                self.display_message(
                    format!("Your {} was destroyed", unit_type.name()),
                    MessageType::UnitDestroyed,
                    Some(owner),
                    None,
                );
            }
        }
    }

    /// Hands an active unit to `new_owner`.
    pub fn capture_unit(&mut self, id: UnitId, new_owner: SmallId) {
        let unit = &self.units[id];
        assert!(unit.is_active(), "cannot capture destroyed unit {id:?}");
        let (previous, unit_type) = (unit.owner(), unit.unit_type());
        if previous == new_owner {
            return;
        }
        self.player_mut(previous).units.retain(|&u| u != id);
        self.units[id].set_owner(new_owner);
        self.player_mut(new_owner).units.push(id);
        self.push_unit_update(id);

        let (prev_name, new_name) = (
            self.player(previous).name().to_string(),
            self.player(new_owner).name().to_string(),
        );
        self.display_message(
            format!("Captured {} from {prev_name}", unit_type.name()),
            MessageType::CapturedEnemyUnit,
            Some(new_owner),
            None,
        );
        self.display_message(
            format!("Your {} was captured by {new_name}", unit_type.name()),
            MessageType::UnitCapturedByEnemy,
            Some(previous),
            None,
        );
        let captor = self.player(new_owner).id().clone();
        self.stats.unit_capture(&captor, unit_type);
    }

    pub fn modify_unit_health(&mut self, id: UnitId, delta: i64) {
        if !self.units[id].has_health() {
            return;
        }
        self.units[id].modify_health(delta);
        self.push_unit_update(id);
    }

    /// `false` for types that cannot be upgraded.
    pub fn upgrade_unit(&mut self, id: UnitId) -> bool {
        let unit_type = self.units[id].unit_type();
        if !self.config.unit_info(unit_type).upgradable || !self.units[id].is_active() {
            return false;
        }
        self.units[id].increase_level();
        self.push_unit_update(id);
        let owner = self.player(self.units[id].owner()).id().clone();
        self.stats.unit_upgrade(&owner, unit_type);
        true
    }

    /// Starts a reload timer on the silo. `false` while every slot reloads.
    pub fn launch_missile(&mut self, silo: UnitId) -> bool {
        if self.units[silo].is_in_cooldown() {
            return false;
        }
        let now = self.ticks;
        self.units[silo].launch(now);
        self.push_unit_update(silo);
        let owner = self.player(self.units[silo].owner()).id().clone();
        let unit_type = self.units[silo].unit_type();
        self.stats.missile_launch(&owner, unit_type);
        true
    }

    /// Frees the oldest reloading slot.
    pub fn reload_missile(&mut self, silo: UnitId) {
        if self.units[silo].reload().is_some() {
            self.push_unit_update(silo);
        }
    }
}
