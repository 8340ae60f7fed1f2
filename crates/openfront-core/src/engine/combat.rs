use openfront_protocol::{AttackId, GameUpdate, MessageType, SmallId, TileRef};
use tracing::info;

use super::WorldEngine;
use crate::{Attack, Owner};

impl WorldEngine {
    pub fn attack(&self, id: AttackId) -> &Attack {
        &self.attacks[id]
    }

    /// Registers an attack on both sides' attack lists.
    pub fn create_attack(
        &mut self,
        attacker: SmallId,
        target: Owner,
        troops: u64,
        source_tile: Option<TileRef>,
    ) -> AttackId {
        let now = self.ticks;
        let id = self
            .attacks
            .insert_with(|id| Attack::new(id, attacker, target, troops, source_tile, now));
        self.player_mut(attacker).outgoing_attacks.push(id);
        if let Owner::Player(defender) = target {
            self.player_mut(defender).incoming_attacks.push(id);
        }

        let attacker_id = self.player(attacker).id().clone();
        let target_id = target.player().map(|t| self.player(t).id().clone());
        self.stats.attack(&attacker_id, target_id.as_ref(), troops);
        id
    }

    /// Changes the troop count of an attack in flight.
    pub fn set_attack_troops(&mut self, id: AttackId, troops: u64) {
        self.attacks[id].set_troops(troops);
    }

    pub fn retreat_attack(&mut self, id: AttackId) {
        self.attacks[id].order_retreat();
    }

    /// Takes the attack off both lists. A cancelled attack is reported to its
    /// attacker. Ending an attack twice is a no-op.
    pub fn end_attack(&mut self, id: AttackId, cancelled: bool) {
        let attack = &mut self.attacks[id];
        if !attack.is_active() {
            return;
        }
        attack.deactivate();
        let (attacker, target, troops) = (attack.attacker(), attack.target(), attack.troops());
        self.player_mut(attacker).outgoing_attacks.retain(|&a| a != id);
        if let Owner::Player(defender) = target {
            self.player_mut(defender).incoming_attacks.retain(|&a| a != id);
        }

        if cancelled {
            let attacker_id = self.player(attacker).id().clone();
            let target_id = target.player().map(|t| self.player(t).id().clone());
            self.stats
                .attack_cancel(&attacker_id, target_id.as_ref(), troops);
            self.display_message(
                format!("Attack cancelled, {troops} troops returned"),
                MessageType::AttackCancelled,
                Some(attacker),
                None,
            );
        }
    }

    /// Settles the elimination of `conquered`: its gold goes to the
    /// conqueror.
    pub fn conquer_player(&mut self, conqueror: SmallId, conquered: SmallId) {
        let gold = self.player_mut(conquered).remove_gold(u64::MAX);
        self.player_mut(conqueror).add_gold(gold);
        self.updates.push(GameUpdate::ConquestEvent {
            conqueror_id: conqueror,
            conquered_id: conquered,
            gold,
        });

        let name = self.player(conquered).name().to_string();
        self.display_message(
            format!("You conquered {name} and received {gold} gold"),
            MessageType::ConqueredPlayer,
            Some(conqueror),
            Some(gold),
        );
        let (winner, loser) = (
            self.player(conqueror).id().clone(),
            self.player(conquered).id().clone(),
        );
        self.stats.conquer(&winner, &loser, gold);
        info!("{} conquered {} (+{} gold)", conqueror, conquered, gold);
    }
}

#[cfg(test)]
mod tests {
    use openfront_protocol::{PlayerId, PlayerType};

    use super::*;
    use crate::{GameConfig, TileStore};

    fn engine() -> (WorldEngine, SmallId, SmallId) {
        let map = TileStore::from_ascii("####\n####").unwrap();
        let config = GameConfig {
            start_gold: 300,
            ..GameConfig::default()
        };
        let mut engine = WorldEngine::without_default_executions(map, config);
        let a = engine.add_player(PlayerId::new("a"), "A", PlayerType::Human, None);
        let b = engine.add_player(PlayerId::new("b"), "B", PlayerType::Bot, None);
        (engine, a, b)
    }

    #[test]
    fn attacks_show_up_on_both_player_updates() {
        let (mut engine, a, b) = engine();
        let id = engine.create_attack(a, Owner::Player(b), 1_000, Some(0));
        let nullius = engine.create_attack(a, Owner::TerraNullius, 50, None);

        let view_a = engine.player_update(engine.player(a));
        let view_b = engine.player_update(engine.player(b));
        assert_eq!(view_a.outgoing_attacks.len(), 2);
        assert_eq!(view_b.incoming_attacks.len(), 1);
        assert_eq!(view_b.incoming_attacks[0].id, id);
        assert_eq!(view_a.outgoing_attacks[1].target_id, SmallId::TERRA_NULLIUS);

        engine.retreat_attack(id);
        engine.end_attack(id, true);
        engine.end_attack(id, true);
        engine.end_attack(nullius, false);
        assert!(engine.player(a).outgoing_attacks().is_empty());
        assert!(engine.player(b).incoming_attacks().is_empty());
        assert!(engine.attack(id).is_retreating());
        let cancelled = engine
            .pending_updates()
            .iter()
            .filter(|u| {
                matches!(u, GameUpdate::DisplayEvent { message_type: MessageType::AttackCancelled, .. })
            })
            .count();
        assert_eq!(cancelled, 1);
    }

    #[test]
    fn cancelled_attacks_return_their_current_troops() {
        let (mut engine, a, b) = engine();
        let id = engine.create_attack(a, Owner::Player(b), 1_000, None);
        engine.set_attack_troops(id, 400);
        assert_eq!(engine.attack(id).troops(), 400);
        let view = engine.player_update(engine.player(b));
        assert_eq!(view.incoming_attacks[0].troops, 400);

        engine.end_attack(id, true);
        assert!(engine.pending_updates().iter().any(|u| matches!(
            u,
            GameUpdate::DisplayEvent { message, player_id, .. }
                if message == "Attack cancelled, 400 troops returned" && *player_id == Some(a)
        )));
    }

    #[test]
    fn conquering_a_player_transfers_gold() {
        let (mut engine, a, b) = engine();
        engine.conquer_player(a, b);
        assert_eq!(engine.player(a).gold(), 600);
        assert_eq!(engine.player(b).gold(), 0);
        assert!(engine.pending_updates().iter().any(|u| matches!(
            u,
            GameUpdate::ConquestEvent { conqueror_id, gold: 300, .. } if *conqueror_id == a
        )));
    }
}
