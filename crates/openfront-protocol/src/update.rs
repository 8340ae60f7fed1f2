use serde::{Deserialize, Serialize};

use crate::{
    AllianceId, AllianceRequestId, AttackId, MessageCategory, MessageType, PlayerId, PlayerType,
    SmallId, Tick, TileRef, UnitId, UnitType,
};

/// Everything the engine reports for one executed tick, in emission order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GameUpdates {
    pub tick: Tick,
    pub updates: Vec<GameUpdate>,
}

impl GameUpdates {
    pub fn new(tick: Tick) -> Self {
        Self {
            tick,
            updates: Vec::new(),
        }
    }

    pub fn push(&mut self, update: GameUpdate) {
        self.updates.push(update);
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameUpdate> {
        self.updates.iter()
    }

    /// Packed tile updates of this batch, in emission order.
    pub fn tile_updates(&self) -> impl Iterator<Item = u64> + '_ {
        self.updates.iter().filter_map(|u| match u {
            GameUpdate::Tile { update } => Some(*update),
            _ => None,
        })
    }

    pub fn hash(&self) -> Option<u64> {
        self.updates.iter().find_map(|u| match u {
            GameUpdate::Hash { hash, .. } => Some(*hash),
            _ => None,
        })
    }
}

/// All sim→view updates. Consumers patch their mirrored state with these and
/// never read the authoritative state back.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GameUpdate {
    /// `ref << 16 | state word`.
    Tile {
        update: u64,
    },
    Unit(UnitUpdate),
    Player(PlayerUpdate),
    DisplayEvent {
        message_type: MessageType,
        message: String,
        player_id: Option<SmallId>,
        #[serde(default)]
        gold_amount: Option<u64>,
    },
    DisplayChatEvent {
        key: String,
        category: MessageCategory,
        #[serde(default)]
        target: Option<PlayerId>,
        player_id: Option<SmallId>,
        is_from: bool,
        /// Display name of the other side of the conversation.
        recipient: String,
    },
    AllianceRequest(AllianceRequestUpdate),
    AllianceRequestReply {
        request: AllianceRequestUpdate,
        accepted: bool,
    },
    BrokeAlliance {
        traitor_id: SmallId,
        betrayed_id: SmallId,
    },
    AllianceExpired {
        player1_id: SmallId,
        player2_id: SmallId,
    },
    AllianceExtension {
        player_id: SmallId,
        alliance_id: AllianceId,
    },
    TargetPlayer {
        player_id: SmallId,
        target_id: SmallId,
    },
    Emoji {
        emoji: EmojiMessage,
    },
    ConquestEvent {
        conqueror_id: SmallId,
        conquered_id: SmallId,
        gold: u64,
    },
    Hash {
        tick: Tick,
        hash: u64,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllianceRequestUpdate {
    pub id: AllianceRequestId,
    pub requestor_id: SmallId,
    pub recipient_id: SmallId,
    pub created_at: Tick,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmojiMessage {
    pub message: String,
    pub sender_id: SmallId,
    /// `None` broadcasts to every player.
    pub recipient_id: Option<SmallId>,
    pub created_at: Tick,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllianceView {
    pub id: AllianceId,
    pub other: SmallId,
    pub created_at: Tick,
    pub expires_at: Tick,
    pub has_extension_request: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackView {
    pub id: AttackId,
    pub attacker_id: SmallId,
    pub target_id: SmallId,
    pub troops: u64,
    pub retreating: bool,
}

/// Full per-tick player snapshot. Player state changes too often to diff.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerUpdate {
    pub id: PlayerId,
    pub small_id: SmallId,
    pub name: String,
    pub player_type: PlayerType,
    #[serde(default)]
    pub team: Option<String>,
    pub is_alive: bool,
    pub is_disconnected: bool,
    pub has_spawned: bool,
    pub tiles_owned: u32,
    pub gold: u64,
    pub troops: u64,
    pub allies: Vec<SmallId>,
    pub embargoes: Vec<SmallId>,
    pub is_traitor: bool,
    pub traitor_remaining_ticks: Option<Tick>,
    pub betrayals: u32,
    pub targets: Vec<SmallId>,
    pub outgoing_emojis: Vec<EmojiMessage>,
    pub outgoing_attacks: Vec<AttackView>,
    pub incoming_attacks: Vec<AttackView>,
    pub outgoing_alliance_requests: Vec<SmallId>,
    pub alliances: Vec<AllianceView>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitUpdate {
    pub id: UnitId,
    pub unit_type: UnitType,
    pub owner_id: SmallId,
    #[serde(default)]
    pub last_owner_id: Option<SmallId>,
    pub pos: TileRef,
    pub last_pos: TileRef,
    pub is_active: bool,
    pub troops: u64,
    #[serde(default)]
    pub health: Option<u32>,
    pub level: u32,
    pub retreating: bool,
    pub reached_target: bool,
    pub under_construction: bool,
    #[serde(default)]
    pub target_tile: Option<TileRef>,
    #[serde(default)]
    pub target_unit_id: Option<UnitId>,
    #[serde(default)]
    pub patrol_tile: Option<TileRef>,
    #[serde(default)]
    pub trajectory_index: u32,
    #[serde(default)]
    pub missile_timer_queue: Vec<Tick>,
}
