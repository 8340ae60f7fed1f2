use openfront_protocol::{PlayerId, PlayerType, Tick, TileRef};
use tracing::{info, warn};

use crate::{Execution, WorldEngine};

/// Places (or, during the spawn phase, re-places) a player on the map,
/// claiming the free land around `tile`.
pub struct SpawnExecution {
    player: PlayerId,
    name: String,
    player_type: PlayerType,
    tile: TileRef,
    active: bool,
}

impl SpawnExecution {
    pub fn new(player: PlayerId, name: String, player_type: PlayerType, tile: TileRef) -> Self {
        Self {
            player,
            name,
            player_type,
            tile,
            active: true,
        }
    }
}

impl Execution for SpawnExecution {
    fn init(&mut self, _engine: &mut WorldEngine, _tick: Tick) {}

    fn tick(&mut self, engine: &mut WorldEngine, _tick: Tick) {
        self.active = false;
        if !engine.in_spawn_phase() {
            warn!("{} tried to spawn after the spawn phase", self.player);
            return;
        }
        let map = engine.map();
        if !map.is_valid_ref(self.tile) || !map.is_land(self.tile) {
            warn!("{} cannot spawn on tile {}", self.player, self.tile);
            return;
        }

        let id = match engine.small_id_of(&self.player) {
            Some(id) => id,
            None => engine.add_player(
                self.player.clone(),
                self.name.clone(),
                self.player_type,
                None,
            ),
        };

        let mut previous: Vec<TileRef> = engine.player(id).tiles().iter().copied().collect();
        previous.sort_unstable();
        for t in previous {
            engine.relinquish(t);
        }

        let radius = engine.config().spawn_radius();
        let mut claim: Vec<TileRef> = engine
            .map()
            .circle_search(self.tile, radius, |m, t| m.is_land(t))
            .into_iter()
            .filter(|&t| !engine.map().has_owner(t))
            .collect();
        claim.sort_unstable();
        for t in claim {
            engine.conquer(id, t);
        }
        engine.player_mut(id).set_has_spawned();
        info!(
            "{} spawned at {} with {} tiles",
            id,
            self.tile,
            engine.player(id).num_tiles_owned()
        );
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn active_during_spawn_phase(&self) -> bool {
        true
    }
}
