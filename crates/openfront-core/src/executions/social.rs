use openfront_protocol::{MessageCategory, PlayerId, Tick};
use tracing::warn;

use super::{lookup, lookup_pair};
use crate::{Execution, WorldEngine};

/// Longest emoji sequence accepted, in chars.
pub const MAX_EMOJI_CHARS: usize = 8;

pub struct TargetPlayerExecution {
    player: PlayerId,
    target: PlayerId,
    active: bool,
}

impl TargetPlayerExecution {
    pub fn new(player: PlayerId, target: PlayerId) -> Self {
        Self {
            player,
            target,
            active: true,
        }
    }
}

impl Execution for TargetPlayerExecution {
    fn init(&mut self, engine: &mut WorldEngine, _tick: Tick) {
        self.active = false;
        let Some((player, target)) = lookup_pair(engine, &self.player, &self.target) else {
            return;
        };
        if !engine.can_target(player, target) {
            warn!("{} cannot target {}", player, target);
            return;
        }
        engine.target(player, target);
    }

    fn tick(&mut self, _engine: &mut WorldEngine, _tick: Tick) {}

    fn is_active(&self) -> bool {
        self.active
    }

    fn active_during_spawn_phase(&self) -> bool {
        false
    }
}

/// An emoji to one player, or to everyone when `recipient` is `None`.
pub struct EmojiExecution {
    sender: PlayerId,
    recipient: Option<PlayerId>,
    emoji: String,
    active: bool,
}

impl EmojiExecution {
    pub fn new(sender: PlayerId, recipient: Option<PlayerId>, emoji: String) -> Self {
        Self {
            sender,
            recipient,
            emoji,
            active: true,
        }
    }
}

impl Execution for EmojiExecution {
    fn init(&mut self, engine: &mut WorldEngine, _tick: Tick) {
        self.active = false;
        let Some(sender) = lookup(engine, &self.sender) else {
            return;
        };
        let recipient = match &self.recipient {
            Some(id) => match lookup(engine, id) {
                Some(small) => Some(small),
                None => return,
            },
            None => None,
        };
        let chars = self.emoji.chars().count();
        if self.emoji.trim().is_empty() || chars > MAX_EMOJI_CHARS {
            warn!("{} sent an invalid emoji {:?}", sender, self.emoji);
            return;
        }
        if !engine.can_send_emoji(sender, recipient) {
            warn!("{} cannot send an emoji to {:?}", sender, recipient);
            return;
        }
        engine.send_emoji(sender, recipient, std::mem::take(&mut self.emoji));
    }

    fn tick(&mut self, _engine: &mut WorldEngine, _tick: Tick) {}

    fn is_active(&self) -> bool {
        self.active
    }

    fn active_during_spawn_phase(&self) -> bool {
        false
    }
}

/// A canned chat line. Both sides see it, each tagged with the other's name.
pub struct QuickChatExecution {
    sender: PlayerId,
    recipient: PlayerId,
    key: String,
    target: Option<PlayerId>,
    active: bool,
}

impl QuickChatExecution {
    pub fn new(
        sender: PlayerId,
        recipient: PlayerId,
        key: String,
        target: Option<PlayerId>,
    ) -> Self {
        Self {
            sender,
            recipient,
            key,
            target,
            active: true,
        }
    }
}

impl Execution for QuickChatExecution {
    fn init(&mut self, engine: &mut WorldEngine, _tick: Tick) {
        self.active = false;
        let Some((sender, recipient)) = lookup_pair(engine, &self.sender, &self.recipient) else {
            return;
        };
        if sender == recipient || self.key.is_empty() {
            warn!("{} sent an invalid quick chat {:?}", sender, self.key);
            return;
        }
        if let Some(target) = &self.target {
            if lookup(engine, target).is_none() {
                return;
            }
        }

        let sender_name = engine.player(sender).name().to_string();
        let recipient_name = engine.player(recipient).name().to_string();
        engine.display_chat(
            self.key.clone(),
            MessageCategory::Chat,
            self.target.clone(),
            recipient,
            true,
            sender_name,
        );
        engine.display_chat(
            self.key.clone(),
            MessageCategory::Chat,
            self.target.clone(),
            sender,
            false,
            recipient_name,
        );
    }

    fn tick(&mut self, _engine: &mut WorldEngine, _tick: Tick) {}

    fn is_active(&self) -> bool {
        self.active
    }

    fn active_during_spawn_phase(&self) -> bool {
        false
    }
}

pub struct MarkDisconnectedExecution {
    player: PlayerId,
    disconnected: bool,
    active: bool,
}

impl MarkDisconnectedExecution {
    pub fn new(player: PlayerId, disconnected: bool) -> Self {
        Self {
            player,
            disconnected,
            active: true,
        }
    }
}

impl Execution for MarkDisconnectedExecution {
    fn init(&mut self, engine: &mut WorldEngine, _tick: Tick) {
        self.active = false;
        if let Some(player) = lookup(engine, &self.player) {
            engine.mark_disconnected(player, self.disconnected);
        }
    }

    fn tick(&mut self, _engine: &mut WorldEngine, _tick: Tick) {}

    fn is_active(&self) -> bool {
        self.active
    }

    fn active_during_spawn_phase(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use openfront_protocol::{GameUpdate, GameUpdates, PlayerType, SmallId};

    use super::*;
    use crate::{GameConfig, TileStore};

    fn engine() -> (WorldEngine, SmallId, SmallId) {
        let map = TileStore::from_ascii("####").unwrap();
        let config = GameConfig {
            num_spawn_phase_turns: 0,
            ..GameConfig::default()
        };
        let mut engine = WorldEngine::without_default_executions(map, config);
        let a = engine.add_player(PlayerId::new("a"), "Alice", PlayerType::Human, None);
        let b = engine.add_player(PlayerId::new("b"), "Bob", PlayerType::Human, None);
        engine.conquer(a, 0);
        engine.conquer(b, 3);
        engine.execute_next_tick();
        (engine, a, b)
    }

    fn run(engine: &mut WorldEngine, exec: impl Execution + 'static) -> GameUpdates {
        engine.add_execution(Box::new(exec));
        engine.execute_next_tick()
    }

    #[test]
    fn targeting_is_recorded_and_rate_limited() {
        let (mut engine, a, b) = engine();
        let first = run(
            &mut engine,
            TargetPlayerExecution::new(PlayerId::new("a"), PlayerId::new("b")),
        );
        let second = run(
            &mut engine,
            TargetPlayerExecution::new(PlayerId::new("a"), PlayerId::new("b")),
        );
        let count = |batch: &GameUpdates| {
            batch
                .iter()
                .filter(|u| matches!(u, GameUpdate::TargetPlayer { .. }))
                .count()
        };
        assert_eq!(count(&first), 1);
        assert_eq!(count(&second), 0);
        let now = engine.ticks();
        assert_eq!(engine.player(a).targets(now, 100), vec![b]);
    }

    #[test]
    fn emoji_rejects_empty_and_cooldown() {
        let (mut engine, a, _) = engine();
        let send = |emoji: &str| {
            EmojiExecution::new(PlayerId::new("a"), Some(PlayerId::new("b")), emoji.into())
        };
        run(&mut engine, send(" "));
        run(&mut engine, send("👋"));
        run(&mut engine, send("👋"));
        let now = engine.ticks();
        assert_eq!(engine.player(a).outgoing_emojis(now, 1_000).len(), 1);
    }

    #[test]
    fn quick_chat_reaches_both_sides() {
        let (mut engine, a, b) = engine();
        let batch = run(
            &mut engine,
            QuickChatExecution::new(
                PlayerId::new("a"),
                PlayerId::new("b"),
                "help.troops".into(),
                None,
            ),
        );
        let chats: Vec<_> = batch
            .iter()
            .filter_map(|u| match u {
                GameUpdate::DisplayChatEvent {
                    player_id,
                    is_from,
                    recipient,
                    ..
                } => Some((*player_id, *is_from, recipient.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(
            chats,
            vec![
                (Some(b), true, "Alice".to_string()),
                (Some(a), false, "Bob".to_string()),
            ]
        );
    }

    #[test]
    fn disconnect_flag_round_trips() {
        let (mut engine, a, _) = engine();
        run(&mut engine, MarkDisconnectedExecution::new(PlayerId::new("a"), true));
        assert!(engine.player(a).is_disconnected());
        run(&mut engine, MarkDisconnectedExecution::new(PlayerId::new("a"), false));
        assert!(!engine.player(a).is_disconnected());
    }
}
