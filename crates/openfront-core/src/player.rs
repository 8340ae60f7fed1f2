use std::collections::BTreeMap;

use openfront_protocol::{
    hash_bytes_fnv1a64, AllianceId, AllianceRequestId, AttackId, EmojiMessage, PlayerId,
    PlayerType, Relation, SmallId, Tick, UnitId,
};

use crate::TileSet;

/// Owner of a tile or target of an attack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Owner {
    Player(SmallId),
    TerraNullius,
}

impl Owner {
    pub fn from_small_id(id: u16) -> Self {
        if id == 0 {
            Owner::TerraNullius
        } else {
            Owner::Player(SmallId(id))
        }
    }

    pub fn small_id(self) -> SmallId {
        match self {
            Owner::Player(id) => id,
            Owner::TerraNullius => SmallId::TERRA_NULLIUS,
        }
    }

    pub fn player(self) -> Option<SmallId> {
        match self {
            Owner::Player(id) => Some(id),
            Owner::TerraNullius => None,
        }
    }

    pub fn is_player(self) -> bool {
        matches!(self, Owner::Player(_))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Embargo {
    pub created_at: Tick,
    /// Temporary embargoes are lifted automatically when an alliance forms.
    pub temporary: bool,
}

#[derive(Clone, Copy, Debug)]
struct TargetMark {
    target: SmallId,
    tick: Tick,
}

#[derive(Clone, Copy, Debug)]
struct Donation {
    recipient: SmallId,
    tick: Tick,
}

pub const MIN_RELATION: i32 = -100;
pub const MAX_RELATION: i32 = 100;

#[derive(Clone, Debug)]
pub struct Player {
    small_id: SmallId,
    id: PlayerId,
    name: String,
    player_type: PlayerType,
    team: Option<String>,

    pub(crate) tiles: TileSet,
    pub(crate) border_tiles: TileSet,
    troops: u64,
    gold: u64,

    pub(crate) units: Vec<UnitId>,
    pub(crate) alliances: Vec<AllianceId>,
    pub(crate) past_outgoing_requests: Vec<AllianceRequestId>,
    pub(crate) outgoing_attacks: Vec<AttackId>,
    pub(crate) incoming_attacks: Vec<AttackId>,

    relations: BTreeMap<SmallId, i32>,
    embargoes: BTreeMap<SmallId, Embargo>,
    targets: Vec<TargetMark>,
    outgoing_emojis: Vec<EmojiMessage>,
    sent_donations: Vec<Donation>,

    marked_traitor_tick: Option<Tick>,
    betrayals: u32,
    has_spawned: bool,
    disconnected: bool,
    pub(crate) last_tile_change: Tick,
}

impl Player {
    pub(crate) fn new(
        small_id: SmallId,
        id: PlayerId,
        name: String,
        player_type: PlayerType,
        team: Option<String>,
        troops: u64,
        gold: u64,
    ) -> Self {
        Self {
            small_id,
            id,
            name,
            player_type,
            team,
            tiles: TileSet::default(),
            border_tiles: TileSet::default(),
            troops,
            gold,
            units: Vec::new(),
            alliances: Vec::new(),
            past_outgoing_requests: Vec::new(),
            outgoing_attacks: Vec::new(),
            incoming_attacks: Vec::new(),
            relations: BTreeMap::new(),
            embargoes: BTreeMap::new(),
            targets: Vec::new(),
            outgoing_emojis: Vec::new(),
            sent_donations: Vec::new(),
            marked_traitor_tick: None,
            betrayals: 0,
            has_spawned: false,
            disconnected: false,
            last_tile_change: 0,
        }
    }

    pub fn small_id(&self) -> SmallId {
        self.small_id
    }

    pub fn id(&self) -> &PlayerId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn player_type(&self) -> PlayerType {
        self.player_type
    }

    pub fn team(&self) -> Option<&str> {
        self.team.as_deref()
    }

    pub fn is_on_same_team(&self, other: &Player) -> bool {
        match (&self.team, &other.team) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    pub fn tiles(&self) -> &TileSet {
        &self.tiles
    }

    pub fn border_tiles(&self) -> &TileSet {
        &self.border_tiles
    }

    pub fn num_tiles_owned(&self) -> u32 {
        self.tiles.len() as u32
    }

    pub fn is_alive(&self) -> bool {
        !self.tiles.is_empty()
    }

    pub fn has_spawned(&self) -> bool {
        self.has_spawned
    }

    pub(crate) fn set_has_spawned(&mut self) {
        self.has_spawned = true;
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }

    pub(crate) fn set_disconnected(&mut self, disconnected: bool) {
        self.disconnected = disconnected;
    }

    pub fn last_tile_change(&self) -> Tick {
        self.last_tile_change
    }

    pub fn units(&self) -> &[UnitId] {
        &self.units
    }

    pub fn alliances(&self) -> &[AllianceId] {
        &self.alliances
    }

    pub fn past_outgoing_requests(&self) -> &[AllianceRequestId] {
        &self.past_outgoing_requests
    }

    pub fn outgoing_attacks(&self) -> &[AttackId] {
        &self.outgoing_attacks
    }

    pub fn incoming_attacks(&self) -> &[AttackId] {
        &self.incoming_attacks
    }

    // --- resources ---

    pub fn troops(&self) -> u64 {
        self.troops
    }

    pub fn gold(&self) -> u64 {
        self.gold
    }

    pub fn add_troops(&mut self, troops: u64) {
        self.troops = self.troops.saturating_add(troops);
    }

    /// Removes up to `troops`; returns how many were actually removed.
    pub fn remove_troops(&mut self, troops: u64) -> u64 {
        let removed = troops.min(self.troops);
        self.troops -= removed;
        removed
    }

    pub fn add_gold(&mut self, gold: u64) {
        self.gold = self.gold.saturating_add(gold);
    }

    /// Removes up to `gold`; returns how much was actually removed.
    pub fn remove_gold(&mut self, gold: u64) -> u64 {
        let removed = gold.min(self.gold);
        self.gold -= removed;
        removed
    }

    // --- relations ---

    pub fn relation_score(&self, other: SmallId) -> i32 {
        self.relations.get(&other).copied().unwrap_or(0)
    }

    pub fn relation(&self, other: SmallId) -> Relation {
        Relation::from_score(self.relation_score(other))
    }

    pub fn update_relation(&mut self, other: SmallId, delta: i32) {
        if other == self.small_id {
            return;
        }
        let score = self
            .relation_score(other)
            .saturating_add(delta)
            .clamp(MIN_RELATION, MAX_RELATION);
        self.relations.insert(other, score);
    }

    // --- traitor mark ---

    pub fn marked_traitor_tick(&self) -> Option<Tick> {
        self.marked_traitor_tick
    }

    pub(crate) fn mark_traitor(&mut self, now: Tick) {
        self.marked_traitor_tick = Some(now);
        self.betrayals += 1;
    }

    pub fn betrayals(&self) -> u32 {
        self.betrayals
    }

    pub fn is_traitor(&self, now: Tick, traitor_duration: Tick) -> bool {
        self.traitor_remaining_ticks(now, traitor_duration).is_some()
    }

    pub fn traitor_remaining_ticks(&self, now: Tick, traitor_duration: Tick) -> Option<Tick> {
        let marked = self.marked_traitor_tick?;
        let elapsed = now.saturating_sub(marked);
        (elapsed < traitor_duration).then(|| traitor_duration - elapsed)
    }

    // --- embargoes ---

    pub fn has_embargo_against(&self, other: SmallId) -> bool {
        self.embargoes.contains_key(&other)
    }

    pub fn embargoes(&self) -> impl Iterator<Item = (SmallId, Embargo)> + '_ {
        self.embargoes.iter().map(|(&id, &e)| (id, e))
    }

    /// Re-embargoing keeps the original record.
    pub fn add_embargo(&mut self, other: SmallId, now: Tick, temporary: bool) {
        self.embargoes.entry(other).or_insert(Embargo {
            created_at: now,
            temporary,
        });
    }

    pub fn stop_embargo(&mut self, other: SmallId) {
        self.embargoes.remove(&other);
    }

    /// Lifts the embargo on `other` only if it was created as temporary.
    pub fn end_temporary_embargo(&mut self, other: SmallId) {
        if self.embargoes.get(&other).is_some_and(|e| e.temporary) {
            self.embargoes.remove(&other);
        }
    }

    // --- targets ---

    pub fn targets(&self, now: Tick, target_duration: Tick) -> Vec<SmallId> {
        self.targets
            .iter()
            .filter(|t| now.saturating_sub(t.tick) < target_duration)
            .map(|t| t.target)
            .collect()
    }

    /// Any target marked within the cooldown window blocks a new one.
    pub fn target_on_cooldown(&self, now: Tick, target_cooldown: Tick) -> bool {
        self.targets
            .iter()
            .any(|t| now.saturating_sub(t.tick) < target_cooldown)
    }

    /// Marks older than `keep_for` ticks are dropped first.
    pub(crate) fn record_target(&mut self, target: SmallId, now: Tick, keep_for: Tick) {
        self.targets.retain(|t| now.saturating_sub(t.tick) < keep_for);
        self.targets.push(TargetMark { target, tick: now });
    }

    // --- emojis ---

    pub fn outgoing_emojis(&self, now: Tick, duration: Tick) -> Vec<EmojiMessage> {
        self.outgoing_emojis
            .iter()
            .filter(|m| now.saturating_sub(m.created_at) < duration)
            .cloned()
            .collect()
    }

    /// Cooldown is tracked per recipient; `None` is the broadcast channel.
    pub fn emoji_on_cooldown(&self, recipient: Option<SmallId>, now: Tick, cooldown: Tick) -> bool {
        self.outgoing_emojis
            .iter()
            .filter(|m| m.recipient_id == recipient)
            .any(|m| now.saturating_sub(m.created_at) < cooldown)
    }

    pub(crate) fn record_emoji(&mut self, message: EmojiMessage, keep_for: Tick) {
        let now = message.created_at;
        self.outgoing_emojis.retain(|m| now.saturating_sub(m.created_at) < keep_for);
        self.outgoing_emojis.push(message);
    }

    // --- donations ---

    pub fn donation_on_cooldown(&self, recipient: SmallId, now: Tick, cooldown: Tick) -> bool {
        self.sent_donations
            .iter()
            .filter(|d| d.recipient == recipient)
            .any(|d| now.saturating_sub(d.tick) < cooldown)
    }

    pub(crate) fn record_donation(&mut self, recipient: SmallId, now: Tick, keep_for: Tick) {
        self.sent_donations.retain(|d| now.saturating_sub(d.tick) < keep_for);
        self.sent_donations.push(Donation {
            recipient,
            tick: now,
        });
    }

    /// Player part of the consistency hash, without the unit contributions.
    pub(crate) fn base_hash(&self) -> u64 {
        let id_hash = hash_bytes_fnv1a64(self.id.as_str().as_bytes());
        id_hash.wrapping_mul(self.troops.wrapping_add(u64::from(self.num_tiles_owned())))
    }
}
