use openfront_protocol::{EmbargoAction, PlayerId, Tick};
use tracing::warn;

use super::lookup_pair;
use crate::{Execution, WorldEngine};

/// Relation the recipient gains towards a donor.
const DONATION_RELATION: i32 = 50;

pub struct EmbargoExecution {
    player: PlayerId,
    target: PlayerId,
    action: EmbargoAction,
    active: bool,
}

impl EmbargoExecution {
    pub fn new(player: PlayerId, target: PlayerId, action: EmbargoAction) -> Self {
        Self {
            player,
            target,
            action,
            active: true,
        }
    }
}

impl Execution for EmbargoExecution {
    fn init(&mut self, engine: &mut WorldEngine, _tick: Tick) {
        self.active = false;
        let Some((player, target)) = lookup_pair(engine, &self.player, &self.target) else {
            return;
        };
        match self.action {
            EmbargoAction::Start if engine.can_embargo(player, target) => {
                engine.add_embargo(player, target, false);
            }
            EmbargoAction::Start => warn!("{} cannot embargo {}", player, target),
            EmbargoAction::Stop => engine.stop_embargo(player, target),
        }
    }

    fn tick(&mut self, _engine: &mut WorldEngine, _tick: Tick) {}

    fn is_active(&self) -> bool {
        self.active
    }

    fn active_during_spawn_phase(&self) -> bool {
        false
    }
}

/// Sends gold to an ally or teammate; without an amount, a third of the
/// sender's treasury.
pub struct DonateGoldExecution {
    sender: PlayerId,
    recipient: PlayerId,
    gold: Option<u64>,
    active: bool,
}

impl DonateGoldExecution {
    pub fn new(sender: PlayerId, recipient: PlayerId, gold: Option<u64>) -> Self {
        Self {
            sender,
            recipient,
            gold,
            active: true,
        }
    }
}

impl Execution for DonateGoldExecution {
    fn init(&mut self, engine: &mut WorldEngine, _tick: Tick) {
        self.active = false;
        let Some((sender, recipient)) = lookup_pair(engine, &self.sender, &self.recipient) else {
            return;
        };
        let gold = self.gold.unwrap_or(engine.player(sender).gold() / 3);
        if !engine.can_donate_gold(sender, recipient) {
            warn!("{} cannot donate gold to {}", sender, recipient);
            return;
        }
        if engine.donate_gold(sender, recipient, gold) {
            engine
                .player_mut(recipient)
                .update_relation(sender, DONATION_RELATION);
        } else {
            warn!("{} tried to donate no gold to {}", sender, recipient);
        }
    }

    fn tick(&mut self, _engine: &mut WorldEngine, _tick: Tick) {}

    fn is_active(&self) -> bool {
        self.active
    }

    fn active_during_spawn_phase(&self) -> bool {
        false
    }
}

/// Sends troops to an ally or teammate; without an amount, a third of the
/// sender's army.
pub struct DonateTroopsExecution {
    sender: PlayerId,
    recipient: PlayerId,
    troops: Option<u64>,
    active: bool,
}

impl DonateTroopsExecution {
    pub fn new(sender: PlayerId, recipient: PlayerId, troops: Option<u64>) -> Self {
        Self {
            sender,
            recipient,
            troops,
            active: true,
        }
    }
}

impl Execution for DonateTroopsExecution {
    fn init(&mut self, engine: &mut WorldEngine, _tick: Tick) {
        self.active = false;
        let Some((sender, recipient)) = lookup_pair(engine, &self.sender, &self.recipient) else {
            return;
        };
        let troops = self.troops.unwrap_or(engine.player(sender).troops() / 3);
        if !engine.can_donate_troops(sender, recipient) {
            warn!("{} cannot donate troops to {}", sender, recipient);
            return;
        }
        if engine.donate_troops(sender, recipient, troops) {
            engine
                .player_mut(recipient)
                .update_relation(sender, DONATION_RELATION);
        } else {
            warn!("{} tried to donate no troops to {}", sender, recipient);
        }
    }

    fn tick(&mut self, _engine: &mut WorldEngine, _tick: Tick) {}

    fn is_active(&self) -> bool {
        self.active
    }

    fn active_during_spawn_phase(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use openfront_protocol::{PlayerType, SmallId};

    use super::*;
    use crate::{GameConfig, TileStore};

    fn engine() -> (WorldEngine, SmallId, SmallId) {
        let map = TileStore::from_ascii("####").unwrap();
        let config = GameConfig {
            num_spawn_phase_turns: 0,
            start_gold: 900,
            ..GameConfig::default()
        };
        let mut engine = WorldEngine::without_default_executions(map, config);
        let team = || Some("red".to_string());
        let a = engine.add_player(PlayerId::new("a"), "A", PlayerType::Human, team());
        let b = engine.add_player(PlayerId::new("b"), "B", PlayerType::Human, team());
        engine.conquer(a, 0);
        engine.conquer(b, 3);
        // leave the spawn phase
        engine.execute_next_tick();
        (engine, a, b)
    }

    fn run(engine: &mut WorldEngine, exec: impl Execution + 'static) {
        engine.add_execution(Box::new(exec));
        engine.execute_next_tick();
    }

    #[test]
    fn gold_donation_defaults_to_a_third() {
        let (mut engine, a, b) = engine();
        run(
            &mut engine,
            DonateGoldExecution::new(PlayerId::new("a"), PlayerId::new("b"), None),
        );
        assert_eq!(engine.player(a).gold(), 600);
        assert_eq!(engine.player(b).gold(), 1_200);
        assert_eq!(engine.player(b).relation_score(a), DONATION_RELATION);
    }

    #[test]
    fn donations_respect_the_cooldown() {
        let (mut engine, a, b) = engine();
        let before = engine.player(b).troops();
        run(
            &mut engine,
            DonateTroopsExecution::new(PlayerId::new("a"), PlayerId::new("b"), Some(100)),
        );
        run(
            &mut engine,
            DonateTroopsExecution::new(PlayerId::new("a"), PlayerId::new("b"), Some(100)),
        );
        assert_eq!(engine.player(b).troops(), before + 100);
        assert!(engine.player(a).troops() < before);
    }

    #[test]
    fn embargo_start_and_stop() {
        let (mut engine, a, b) = engine();
        run(
            &mut engine,
            EmbargoExecution::new(PlayerId::new("a"), PlayerId::new("b"), EmbargoAction::Start),
        );
        assert!(engine.player(a).has_embargo_against(b));
        assert!(!engine.can_trade(a, b));
        run(
            &mut engine,
            EmbargoExecution::new(PlayerId::new("a"), PlayerId::new("b"), EmbargoAction::Stop),
        );
        assert!(engine.can_trade(a, b));
    }
}
