//! The authoritative world state and its tick loop.
//!
//! `WorldEngine` owns the tile store, the spatial unit index and every entity
//! arena. Everything that changes the world goes through a method here so
//! that border sets, the unit index and the outgoing update batch stay in
//! step with the mutation that caused them.

mod combat;
mod diplomacy;
mod units;

use std::collections::BTreeMap;

use openfront_protocol::{
    AllianceRequestId, AllianceRequestTag, AllianceTag, AttackTag, GameUpdate, GameUpdates,
    MessageCategory, MessageType, PlayerId, PlayerType, PlayerUpdate, SmallId, Tick, TileRef,
    UnitTag,
};
use tracing::{debug, info};

use crate::executions::AllianceExpiryExecution;
use crate::{
    Alliance, AllianceRequest, Attack, Config, EntityStore, Execution, NoopStats, Owner, Player,
    SpatialUnitIndex, Stats, TileStore, Unit, PLAYER_ID_MASK,
};

/// A `Hash` update is emitted on every tick divisible by this.
pub const HASH_INTERVAL: Tick = 10;

pub struct WorldEngine {
    map: TileStore,
    grid: SpatialUnitIndex,
    config: Box<dyn Config>,
    stats: Box<dyn Stats>,

    /// Indexed by `small_id - 1`.
    players: Vec<Player>,
    player_ids: BTreeMap<PlayerId, SmallId>,
    units: EntityStore<UnitTag, Unit>,
    alliances: EntityStore<AllianceTag, Alliance>,
    alliance_requests: EntityStore<AllianceRequestTag, AllianceRequest>,
    pending_requests: Vec<AllianceRequestId>,
    attacks: EntityStore<AttackTag, Attack>,

    execs: Vec<Box<dyn Execution>>,
    uninit_execs: Vec<Box<dyn Execution>>,

    updates: GameUpdates,
    ticks: Tick,
}

impl WorldEngine {
    /// Creates an engine at tick 0 with the alliance expiry sweep already
    /// scheduled.
    pub fn new(map: TileStore, config: impl Config + 'static) -> Self {
        let mut engine = Self::without_default_executions(map, config);
        engine.add_execution(Box::new(AllianceExpiryExecution::new()));
        engine
    }

    /// Creates an engine with an empty execution queue.
    pub fn without_default_executions(map: TileStore, config: impl Config + 'static) -> Self {
        let grid = SpatialUnitIndex::new(&map);
        Self {
            map,
            grid,
            config: Box::new(config),
            stats: Box::new(NoopStats),
            players: Vec::new(),
            player_ids: BTreeMap::new(),
            units: EntityStore::new(),
            alliances: EntityStore::new(),
            alliance_requests: EntityStore::new(),
            pending_requests: Vec::new(),
            attacks: EntityStore::new(),
            execs: Vec::new(),
            uninit_execs: Vec::new(),
            updates: GameUpdates::new(0),
            ticks: 0,
        }
    }

    pub fn with_stats(mut self, stats: impl Stats + 'static) -> Self {
        self.stats = Box::new(stats);
        self
    }

    pub fn config(&self) -> &dyn Config {
        self.config.as_ref()
    }

    pub fn map(&self) -> &TileStore {
        &self.map
    }

    pub fn grid(&self) -> &SpatialUnitIndex {
        &self.grid
    }

    pub fn ticks(&self) -> Tick {
        self.ticks
    }

    pub fn in_spawn_phase(&self) -> bool {
        self.ticks <= self.config.num_spawn_phase_turns()
    }

    // =========================================================================
    // Tick loop
    // =========================================================================

    pub fn add_execution(&mut self, exec: Box<dyn Execution>) {
        self.uninit_execs.push(exec);
    }

    pub fn num_executions(&self) -> usize {
        self.execs.len() + self.uninit_execs.len()
    }

    /// Runs one tick and returns every update it produced, preceded by any
    /// made through direct mutator calls since the previous tick.
    pub fn execute_next_tick(&mut self) -> GameUpdates {
        let tick = self.ticks;
        self.updates.tick = tick;
        let in_spawn_phase = self.in_spawn_phase();

        let mut execs = std::mem::take(&mut self.execs);
        for exec in execs.iter_mut() {
            if (!in_spawn_phase || exec.active_during_spawn_phase()) && exec.is_active() {
                exec.tick(self, tick);
            }
        }

        let queued = std::mem::take(&mut self.uninit_execs);
        let mut inited = Vec::new();
        let mut deferred = Vec::new();
        for mut exec in queued {
            if !in_spawn_phase || exec.active_during_spawn_phase() {
                exec.init(self, tick);
                inited.push(exec);
            } else {
                deferred.push(exec);
            }
        }

        execs.retain(|e| e.is_active());
        execs.append(&mut inited);
        self.execs = execs;
        // Anything queued during init waits for the next tick.
        deferred.append(&mut self.uninit_execs);
        self.uninit_execs = deferred;

        for i in 0..self.players.len() {
            let update = self.player_update(&self.players[i]);
            self.updates.push(GameUpdate::Player(update));
        }

        if tick % HASH_INTERVAL == 0 {
            let hash = self.hash();
            debug!("tick {} hash {:#018x}", tick, hash);
            self.updates.push(GameUpdate::Hash { tick, hash });
        }

        self.ticks += 1;
        std::mem::take(&mut self.updates)
    }

    /// Updates accumulated since the last tick, for mutations made outside
    /// `execute_next_tick`.
    pub fn pending_updates(&self) -> &GameUpdates {
        &self.updates
    }

    pub fn add_update(&mut self, update: GameUpdate) {
        self.updates.push(update);
    }

    // =========================================================================
    // Players
    // =========================================================================

    /// Panics on a duplicate stable id or when the small-id space is full.
    pub fn add_player(
        &mut self,
        id: PlayerId,
        name: impl Into<String>,
        player_type: PlayerType,
        team: Option<String>,
    ) -> SmallId {
        assert!(
            !self.player_ids.contains_key(&id),
            "player {id} already exists"
        );
        let raw = self.players.len() + 1;
        assert!(
            raw <= usize::from(PLAYER_ID_MASK),
            "cannot add player {id}: small id space exhausted"
        );
        let small_id = SmallId(raw as u16);
        let player = Player::new(
            small_id,
            id.clone(),
            name.into(),
            player_type,
            team,
            self.config.start_troops(player_type),
            self.config.start_gold(player_type),
        );
        info!("player {} joined as {}", id, small_id);
        self.players.push(player);
        self.player_ids.insert(id, small_id);
        small_id
    }

    pub fn player_by_small_id(&self, id: SmallId) -> Option<&Player> {
        if id.is_terra_nullius() {
            return None;
        }
        self.players.get(usize::from(id.0) - 1)
    }

    pub fn player_by_id(&self, id: &PlayerId) -> Option<&Player> {
        self.player_ids
            .get(id)
            .and_then(|&small| self.player_by_small_id(small))
    }

    pub fn small_id_of(&self, id: &PlayerId) -> Option<SmallId> {
        self.player_ids.get(id).copied()
    }

    /// Panics on an id the engine never handed out.
    pub fn player(&self, id: SmallId) -> &Player {
        match self.player_by_small_id(id) {
            Some(p) => p,
            None => panic!("unknown player {id}"),
        }
    }

    pub fn player_mut(&mut self, id: SmallId) -> &mut Player {
        let index = usize::from(id.0).wrapping_sub(1);
        match self.players.get_mut(index) {
            Some(p) => p,
            None => panic!("unknown player {id}"),
        }
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    pub fn alive_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.is_alive())
    }

    pub fn num_players(&self) -> usize {
        self.players.len()
    }

    pub fn mark_disconnected(&mut self, player: SmallId, disconnected: bool) {
        let p = self.player_mut(player);
        if p.is_disconnected() != disconnected {
            debug!("player {} disconnected={}", player, disconnected);
        }
        p.set_disconnected(disconnected);
    }

    // =========================================================================
    // Ownership
    // =========================================================================

    pub fn owner(&self, tile: TileRef) -> Owner {
        Owner::from_small_id(self.map.owner_id(tile))
    }

    pub fn has_owner(&self, tile: TileRef) -> bool {
        self.map.has_owner(tile)
    }

    /// Hands `tile` to `owner`. Panics on water.
    pub fn conquer(&mut self, owner: SmallId, tile: TileRef) {
        assert!(
            self.map.is_land(tile),
            "cannot conquer water tile {tile}"
        );
        let now = self.ticks;
        self.evict(tile, now);
        self.map.set_owner_id(tile, owner.0);
        let player = self.player_mut(owner);
        player.tiles.insert(tile);
        player.last_tile_change = now;
        self.update_borders(tile);
        self.map.set_fallout(tile, false);
        self.push_tile_update(tile);
    }

    /// Returns `tile` to terra nullius. Panics if it is unowned or water.
    pub fn relinquish(&mut self, tile: TileRef) {
        assert!(
            self.map.has_owner(tile),
            "cannot relinquish unowned tile {tile}"
        );
        assert!(
            self.map.is_land(tile),
            "cannot relinquish water tile {tile}"
        );
        let now = self.ticks;
        self.evict(tile, now);
        self.map.set_owner_id(tile, 0);
        self.update_borders(tile);
        self.push_tile_update(tile);
    }

    fn evict(&mut self, tile: TileRef, now: Tick) {
        if let Owner::Player(previous) = self.owner(tile) {
            let player = self.player_mut(previous);
            player.last_tile_change = now;
            player.tiles.remove(&tile);
            player.border_tiles.remove(&tile);
        }
    }

    /// Re-evaluates border membership for `tile` and its neighbours.
    fn update_borders(&mut self, tile: TileRef) {
        let mut affected = [None; 5];
        affected[0] = Some(tile);
        for (slot, n) in affected[1..].iter_mut().zip(self.map.neighbors(tile)) {
            *slot = Some(n);
        }
        for t in affected.into_iter().flatten() {
            let Owner::Player(owner) = self.owner(t) else {
                continue;
            };
            let is_border = self.calc_is_border(t);
            let player = self.player_mut(owner);
            if is_border {
                player.border_tiles.insert(t);
            } else {
                player.border_tiles.remove(&t);
            }
        }
    }

    /// Any neighbour owned by someone else (terra nullius included).
    pub fn calc_is_border(&self, tile: TileRef) -> bool {
        let owner = self.map.owner_id(tile);
        self.map.neighbors(tile).any(|n| self.map.owner_id(n) != owner)
    }

    pub fn set_fallout(&mut self, tile: TileRef, value: bool) {
        if self.map.has_fallout(tile) == value {
            return;
        }
        self.map.set_fallout(tile, value);
        self.push_tile_update(tile);
    }

    pub fn set_defense_bonus(&mut self, tile: TileRef, value: bool) {
        if self.map.has_defense_bonus(tile) == value {
            return;
        }
        self.map.set_defense_bonus(tile, value);
        self.push_tile_update(tile);
    }

    fn push_tile_update(&mut self, tile: TileRef) {
        let update = self.map.to_tile_update(tile);
        self.updates.push(GameUpdate::Tile { update });
    }

    // =========================================================================
    // Messages
    // =========================================================================

    pub fn display_message(
        &mut self,
        message: impl Into<String>,
        message_type: MessageType,
        player: Option<SmallId>,
        gold_amount: Option<u64>,
    ) {
        self.updates.push(GameUpdate::DisplayEvent {
            message_type,
            message: message.into(),
            player_id: player,
            gold_amount,
        });
    }

    /// Chat line shown to `player`; `other_name` is the other side of the
    /// conversation.
    pub fn display_chat(
        &mut self,
        key: impl Into<String>,
        category: MessageCategory,
        target: Option<PlayerId>,
        player: SmallId,
        is_from: bool,
        other_name: impl Into<String>,
    ) {
        self.updates.push(GameUpdate::DisplayChatEvent {
            key: key.into(),
            category,
            target,
            player_id: Some(player),
            is_from,
            recipient: other_name.into(),
        });
    }

    // =========================================================================
    // Snapshots and hashing
    // =========================================================================

    pub fn player_update(&self, player: &Player) -> PlayerUpdate {
        let now = self.ticks;
        let me = player.small_id();
        let traitor_duration = self.config.traitor_duration();
        PlayerUpdate {
            id: player.id().clone(),
            small_id: me,
            name: player.name().to_string(),
            player_type: player.player_type(),
            team: player.team().map(str::to_string),
            is_alive: player.is_alive(),
            is_disconnected: player.is_disconnected(),
            has_spawned: player.has_spawned(),
            tiles_owned: player.num_tiles_owned(),
            gold: player.gold(),
            troops: player.troops(),
            allies: player
                .alliances()
                .iter()
                .filter_map(|&a| self.alliances[a].other(me))
                .collect(),
            embargoes: player.embargoes().map(|(id, _)| id).collect(),
            is_traitor: player.is_traitor(now, traitor_duration),
            traitor_remaining_ticks: player.traitor_remaining_ticks(now, traitor_duration),
            betrayals: player.betrayals(),
            targets: player.targets(now, self.config.target_duration()),
            outgoing_emojis: player.outgoing_emojis(now, self.config.emoji_message_duration()),
            outgoing_attacks: player
                .outgoing_attacks()
                .iter()
                .map(|&a| self.attacks[a].to_view())
                .collect(),
            incoming_attacks: player
                .incoming_attacks()
                .iter()
                .map(|&a| self.attacks[a].to_view())
                .collect(),
            outgoing_alliance_requests: self
                .outgoing_alliance_requests(me)
                .map(|r| r.recipient())
                .collect(),
            alliances: player
                .alliances()
                .iter()
                .filter_map(|&a| self.alliances[a].to_view(me))
                .collect(),
        }
    }

    /// Player hash: id hash times (troops + tiles), plus its units' hashes.
    pub fn player_hash(&self, player: &Player) -> u64 {
        player
            .units()
            .iter()
            .fold(player.base_hash(), |acc, &u| {
                acc.wrapping_add(self.units[u].hash())
            })
    }

    /// World consistency hash compared across peers to detect desyncs.
    pub fn hash(&self) -> u64 {
        self.players
            .iter()
            .fold(1u64, |acc, p| acc.wrapping_add(self.player_hash(p)))
    }
}
