//! Built-in executions for the spawn and diplomacy intents.
//!
//! Each one resolves its players by stable id when it is initialised, so an
//! intent can be queued before the player it names has spawned. Rejections
//! are logged and dropped.

mod alliance;
mod social;
mod spawn;
mod trade;

use openfront_protocol::{Intent, PlayerId, SmallId, StampedIntent};
use tracing::warn;

use crate::{Execution, WorldEngine};

pub use alliance::{
    AllianceExpiryExecution, AllianceExtensionExecution, AllianceReplyExecution,
    AllianceRequestExecution, BreakAllianceExecution,
};
pub use social::{
    EmojiExecution, MarkDisconnectedExecution, QuickChatExecution, TargetPlayerExecution,
};
pub use spawn::SpawnExecution;
pub use trade::{DonateGoldExecution, DonateTroopsExecution, EmbargoExecution};

/// Turns a player's intent into the execution that carries it out.
pub fn create_execution(stamped: StampedIntent) -> Box<dyn Execution> {
    let StampedIntent { player, intent } = stamped;
    match intent {
        Intent::Spawn {
            name,
            player_type,
            tile,
        } => Box::new(SpawnExecution::new(player, name, player_type, tile)),
        Intent::AllianceRequest { recipient } => {
            Box::new(AllianceRequestExecution::new(player, recipient))
        }
        Intent::AllianceRequestReply { requestor, accept } => {
            Box::new(AllianceReplyExecution::new(requestor, player, accept))
        }
        Intent::BreakAlliance { recipient } => {
            Box::new(BreakAllianceExecution::new(player, recipient))
        }
        Intent::AllianceExtension { recipient } => {
            Box::new(AllianceExtensionExecution::new(player, recipient))
        }
        Intent::Embargo { target, action } => {
            Box::new(EmbargoExecution::new(player, target, action))
        }
        Intent::TargetPlayer { target } => Box::new(TargetPlayerExecution::new(player, target)),
        Intent::DonateGold { recipient, gold } => {
            Box::new(DonateGoldExecution::new(player, recipient, gold))
        }
        Intent::DonateTroops { recipient, troops } => {
            Box::new(DonateTroopsExecution::new(player, recipient, troops))
        }
        Intent::Emoji { recipient, emoji } => {
            Box::new(EmojiExecution::new(player, recipient, emoji))
        }
        Intent::QuickChat {
            recipient,
            key,
            target,
        } => Box::new(QuickChatExecution::new(player, recipient, key, target)),
        Intent::MarkDisconnected { is_disconnected } => {
            Box::new(MarkDisconnectedExecution::new(player, is_disconnected))
        }
    }
}

/// Resolves a stable id, logging when the player does not exist.
fn lookup(engine: &WorldEngine, id: &PlayerId) -> Option<SmallId> {
    let found = engine.small_id_of(id);
    if found.is_none() {
        warn!("intent references unknown player {}", id);
    }
    found
}

/// Resolves both players of a two-party intent.
fn lookup_pair(engine: &WorldEngine, a: &PlayerId, b: &PlayerId) -> Option<(SmallId, SmallId)> {
    Some((lookup(engine, a)?, lookup(engine, b)?))
}
