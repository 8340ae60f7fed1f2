//! Uniform grid over the tile map for unit proximity queries.
//!
//! Units move every tick, so bucket maintenance has to be cheap: a unit is
//! re-bucketed only when its cell actually changes, and queries visit only
//! the cells overlapping the query circle's bounding box.

use std::collections::{BTreeMap, BTreeSet};

use openfront_protocol::{SmallId, TileRef, UnitId, UnitTag, UnitType};

use crate::{EntityStore, TileStore, Unit};

pub const CELL_SIZE: u32 = 100;

#[derive(Clone, Debug, Default)]
struct Cell {
    units: BTreeMap<UnitType, BTreeSet<UnitId>>,
}

#[derive(Clone, Debug)]
pub struct SpatialUnitIndex {
    map_width: u32,
    cols: u32,
    rows: u32,
    cells: Vec<Cell>,
}

impl SpatialUnitIndex {
    pub fn new(map: &TileStore) -> Self {
        let cols = map.width().div_ceil(CELL_SIZE);
        let rows = map.height().div_ceil(CELL_SIZE);
        Self {
            map_width: map.width(),
            cols,
            rows,
            cells: vec![Cell::default(); (cols * rows) as usize],
        }
    }

    #[inline]
    fn cell_of(&self, tile: TileRef) -> usize {
        let x = tile % self.map_width;
        let y = tile / self.map_width;
        ((y / CELL_SIZE) * self.cols + x / CELL_SIZE) as usize
    }

    pub fn add_unit(&mut self, unit: &Unit) {
        let cell = self.cell_of(unit.tile());
        self.cells[cell]
            .units
            .entry(unit.unit_type())
            .or_default()
            .insert(unit.id());
    }

    /// Removing a unit that is not indexed is a no-op.
    pub fn remove_unit(&mut self, unit: &Unit) {
        let cell = self.cell_of(unit.tile());
        self.remove_from(cell, unit.unit_type(), unit.id());
    }

    fn remove_from(&mut self, cell: usize, unit_type: UnitType, id: UnitId) {
        let units = &mut self.cells[cell].units;
        if let Some(set) = units.get_mut(&unit_type) {
            set.remove(&id);
            if set.is_empty() {
                units.remove(&unit_type);
            }
        }
    }

    /// Moves the unit's entry if `last_tile` and `tile` fall in different
    /// cells.
    pub fn update_unit_cell(&mut self, unit: &Unit) {
        let old_cell = self.cell_of(unit.last_tile());
        let new_cell = self.cell_of(unit.tile());
        if old_cell == new_cell {
            return;
        }
        self.remove_from(old_cell, unit.unit_type(), unit.id());
        self.cells[new_cell]
            .units
            .entry(unit.unit_type())
            .or_default()
            .insert(unit.id());
    }

    /// Inclusive cell-index ranges covering the square around `tile`.
    fn cell_window(&self, tile: TileRef, radius: u32) -> (u32, u32, u32, u32) {
        let x = tile % self.map_width;
        let y = tile / self.map_width;
        let min_cx = x.saturating_sub(radius) / CELL_SIZE;
        let min_cy = y.saturating_sub(radius) / CELL_SIZE;
        let max_cx = (x.saturating_add(radius) / CELL_SIZE).min(self.cols - 1);
        let max_cy = (y.saturating_add(radius) / CELL_SIZE).min(self.rows - 1);
        (min_cx, min_cy, max_cx, max_cy)
    }

    /// Active units of the given types within euclidean `radius` of `tile`,
    /// paired with their squared distance. Ordered by cell, then type, then
    /// id.
    pub fn nearby_units<F>(
        &self,
        map: &TileStore,
        units: &EntityStore<UnitTag, Unit>,
        tile: TileRef,
        radius: u32,
        types: &[UnitType],
        mut predicate: F,
    ) -> Vec<(UnitId, u64)>
    where
        F: FnMut(&Unit) -> bool,
    {
        let r2 = u64::from(radius) * u64::from(radius);
        let (min_cx, min_cy, max_cx, max_cy) = self.cell_window(tile, radius);
        let mut out = Vec::new();
        for cy in min_cy..=max_cy {
            for cx in min_cx..=max_cx {
                let cell = &self.cells[(cy * self.cols + cx) as usize];
                for (unit_type, ids) in &cell.units {
                    if !types.contains(unit_type) {
                        continue;
                    }
                    for &id in ids {
                        let unit = &units[id];
                        if !unit.is_active() {
                            continue;
                        }
                        let d2 = map.euclidean_dist_squared(tile, unit.tile());
                        if d2 <= r2 && predicate(unit) {
                            out.push((id, d2));
                        }
                    }
                }
            }
        }
        out
    }

    /// Short-circuiting variant of `nearby_units` for a single type,
    /// optionally restricted to one owner.
    pub fn has_unit_nearby(
        &self,
        map: &TileStore,
        units: &EntityStore<UnitTag, Unit>,
        tile: TileRef,
        radius: u32,
        unit_type: UnitType,
        owner: Option<SmallId>,
    ) -> bool {
        let r2 = u64::from(radius) * u64::from(radius);
        let (min_cx, min_cy, max_cx, max_cy) = self.cell_window(tile, radius);
        for cy in min_cy..=max_cy {
            for cx in min_cx..=max_cx {
                let cell = &self.cells[(cy * self.cols + cx) as usize];
                let Some(ids) = cell.units.get(&unit_type) else {
                    continue;
                };
                let hit = ids.iter().any(|&id| {
                    let unit = &units[id];
                    unit.is_active()
                        && owner.map_or(true, |o| unit.owner() == o)
                        && map.euclidean_dist_squared(tile, unit.tile()) <= r2
                });
                if hit {
                    return true;
                }
            }
        }
        false
    }

    /// Number of indexed entries; used to check the index stays in sync with
    /// the set of active units.
    pub fn len(&self) -> usize {
        self.cells
            .iter()
            .flat_map(|c| c.units.values())
            .map(BTreeSet::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{terrain_byte, UnitInfo};

    fn setup() -> (TileStore, EntityStore<UnitTag, Unit>, SpatialUnitIndex) {
        let map = TileStore::from_terrain(
            250,
            250,
            vec![terrain_byte(true, false, false, 0); 250 * 250],
        )
        .unwrap();
        let grid = SpatialUnitIndex::new(&map);
        (map, EntityStore::new(), grid)
    }

    fn spawn(
        units: &mut EntityStore<UnitTag, Unit>,
        grid: &mut SpatialUnitIndex,
        unit_type: UnitType,
        owner: u16,
        tile: TileRef,
    ) -> UnitId {
        let info = UnitInfo {
            cost: 0,
            max_health: None,
            territory_bound: false,
            upgradable: false,
        };
        let id = units.insert_with(|id| Unit::new(id, unit_type, SmallId(owner), tile, 0, &info, 0));
        grid.add_unit(&units[id]);
        id
    }

    #[test]
    fn unit_at_query_tile_has_zero_distance() {
        let (map, mut units, mut grid) = setup();
        let tile = map.ref_at(120, 80);
        let id = spawn(&mut units, &mut grid, UnitType::Warship, 1, tile);
        let found = grid.nearby_units(&map, &units, tile, 5, &[UnitType::Warship], |_| true);
        assert_eq!(found, vec![(id, 0)]);
        assert!(grid
            .nearby_units(&map, &units, tile, 5, &[UnitType::Port], |_| true)
            .is_empty());
    }

    #[test]
    fn query_crosses_cell_boundaries() {
        let (map, mut units, mut grid) = setup();
        let a = spawn(&mut units, &mut grid, UnitType::City, 1, map.ref_at(99, 99));
        let b = spawn(&mut units, &mut grid, UnitType::City, 2, map.ref_at(101, 100));
        let far = spawn(&mut units, &mut grid, UnitType::City, 2, map.ref_at(10, 10));
        let found = grid.nearby_units(&map, &units, map.ref_at(100, 100), 3, &[UnitType::City], |_| true);
        let ids: Vec<_> = found.iter().map(|&(id, _)| id).collect();
        assert_eq!(ids, vec![a, b]);
        assert!(!ids.contains(&far));
        assert_eq!(found[0].1, 2);
        assert_eq!(found[1].1, 1);
    }

    #[test]
    fn moving_away_drops_unit_after_one_cell_update() {
        let (map, mut units, mut grid) = setup();
        let start = map.ref_at(5, 5);
        let id = spawn(&mut units, &mut grid, UnitType::TransportShip, 1, start);

        units[id].set_tile(map.ref_at(230, 230));
        grid.update_unit_cell(&units[id]);

        assert!(grid
            .nearby_units(&map, &units, start, 50, &[UnitType::TransportShip], |_| true)
            .is_empty());
        let found = grid.nearby_units(
            &map,
            &units,
            map.ref_at(229, 230),
            2,
            &[UnitType::TransportShip],
            |_| true,
        );
        assert_eq!(found, vec![(id, 1)]);
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn inactive_units_and_predicate_filter() {
        let (map, mut units, mut grid) = setup();
        let tile = map.ref_at(50, 50);
        let mine = spawn(&mut units, &mut grid, UnitType::SAMLauncher, 1, tile);
        let theirs = spawn(&mut units, &mut grid, UnitType::SAMLauncher, 2, tile + 1);

        let found = grid.nearby_units(&map, &units, tile, 10, &[UnitType::SAMLauncher], |u| {
            u.owner() == SmallId(2)
        });
        assert_eq!(found, vec![(theirs, 1)]);

        units[mine].deactivate();
        assert!(!grid.has_unit_nearby(&map, &units, tile, 10, UnitType::SAMLauncher, Some(SmallId(1))));
        assert!(grid.has_unit_nearby(&map, &units, tile, 10, UnitType::SAMLauncher, None));
        assert!(!grid.has_unit_nearby(&map, &units, tile, 10, UnitType::MissileSilo, None));
    }

    #[test]
    fn removing_twice_is_harmless() {
        let (map, mut units, mut grid) = setup();
        let id = spawn(&mut units, &mut grid, UnitType::Port, 1, map.ref_at(1, 1));
        grid.remove_unit(&units[id]);
        grid.remove_unit(&units[id]);
        assert!(grid.is_empty());
    }
}
