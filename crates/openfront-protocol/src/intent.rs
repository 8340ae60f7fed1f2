use serde::{Deserialize, Serialize};

use crate::{EmbargoAction, PlayerId, PlayerType, Tick, TileRef};

/// All possible client→sim intents. Attacks, construction and missile
/// launches are driven by executions that live outside this workspace, so
/// only the spawn and diplomacy surface is listed here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Intent {
    Spawn {
        name: String,
        player_type: PlayerType,
        tile: TileRef,
    },

    // Diplomacy
    AllianceRequest {
        recipient: PlayerId,
    },
    AllianceRequestReply {
        requestor: PlayerId,
        accept: bool,
    },
    BreakAlliance {
        recipient: PlayerId,
    },
    AllianceExtension {
        recipient: PlayerId,
    },
    Embargo {
        target: PlayerId,
        action: EmbargoAction,
    },
    TargetPlayer {
        target: PlayerId,
    },

    // Trade
    DonateGold {
        recipient: PlayerId,
        /// `None` donates a third of the sender's gold.
        #[serde(default)]
        gold: Option<u64>,
    },
    DonateTroops {
        recipient: PlayerId,
        /// `None` donates a third of the sender's troops.
        #[serde(default)]
        troops: Option<u64>,
    },

    // Chat
    Emoji {
        /// `None` broadcasts to everyone.
        #[serde(default)]
        recipient: Option<PlayerId>,
        emoji: String,
    },
    QuickChat {
        recipient: PlayerId,
        key: String,
        #[serde(default)]
        target: Option<PlayerId>,
    },

    MarkDisconnected {
        is_disconnected: bool,
    },
}

/// An intent attributed to the player that issued it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StampedIntent {
    pub player: PlayerId,
    pub intent: Intent,
}

/// One scheduled intent in a scripted run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledIntent {
    pub tick: Tick,
    #[serde(flatten)]
    pub stamped: StampedIntent,
}
