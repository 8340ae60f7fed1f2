use std::collections::BTreeSet;

use openfront_protocol::{AllianceId, MessageType, PlayerId, Tick};
use tracing::{debug, warn};

use super::lookup_pair;
use crate::{Execution, WorldEngine};

/// Relation gained by both sides when a request is accepted.
const ACCEPT_RELATION: i32 = 100;
/// Relation lost by the betrayed player towards the traitor.
const BETRAYED_RELATION: i32 = -200;
/// Relation every other player loses towards a traitor.
const WITNESS_RELATION: i32 = -40;

pub struct AllianceRequestExecution {
    requestor: PlayerId,
    recipient: PlayerId,
    active: bool,
}

impl AllianceRequestExecution {
    pub fn new(requestor: PlayerId, recipient: PlayerId) -> Self {
        Self {
            requestor,
            recipient,
            active: true,
        }
    }
}

impl Execution for AllianceRequestExecution {
    fn init(&mut self, engine: &mut WorldEngine, _tick: Tick) {
        self.active = false;
        let Some((from, to)) = lookup_pair(engine, &self.requestor, &self.recipient) else {
            return;
        };
        if !engine.can_send_alliance_request(from, to) {
            warn!("{} cannot send an alliance request to {}", from, to);
            return;
        }
        engine.create_alliance_request(from, to);
    }

    fn tick(&mut self, _engine: &mut WorldEngine, _tick: Tick) {}

    fn is_active(&self) -> bool {
        self.active
    }

    fn active_during_spawn_phase(&self) -> bool {
        false
    }
}

/// The recipient's answer to a pending request from `requestor`.
pub struct AllianceReplyExecution {
    requestor: PlayerId,
    recipient: PlayerId,
    accept: bool,
    active: bool,
}

impl AllianceReplyExecution {
    pub fn new(requestor: PlayerId, recipient: PlayerId, accept: bool) -> Self {
        Self {
            requestor,
            recipient,
            accept,
            active: true,
        }
    }
}

impl Execution for AllianceReplyExecution {
    fn init(&mut self, engine: &mut WorldEngine, _tick: Tick) {
        self.active = false;
        let Some((from, to)) = lookup_pair(engine, &self.requestor, &self.recipient) else {
            return;
        };
        if engine.is_allied_with(from, to) {
            warn!("{} and {} are already allied", from, to);
            return;
        }
        let request = engine
            .outgoing_alliance_requests(from)
            .find(|r| r.recipient() == to)
            .map(|r| r.id());
        let Some(request) = request else {
            warn!("no pending alliance request from {} to {}", from, to);
            return;
        };

        if self.accept {
            engine.accept_alliance_request(request);
            engine.player_mut(from).update_relation(to, ACCEPT_RELATION);
            engine.player_mut(to).update_relation(from, ACCEPT_RELATION);
        } else {
            engine.reject_alliance_request(request);
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

pub struct BreakAllianceExecution {
    breaker: PlayerId,
    other: PlayerId,
    active: bool,
}

impl BreakAllianceExecution {
    pub fn new(breaker: PlayerId, other: PlayerId) -> Self {
        Self {
            breaker,
            other,
            active: true,
        }
    }
}

impl Execution for BreakAllianceExecution {
    fn init(&mut self, engine: &mut WorldEngine, _tick: Tick) {
        self.active = false;
        let Some((breaker, other)) = lookup_pair(engine, &self.breaker, &self.other) else {
            return;
        };
        if !engine.is_allied_with(breaker, other) {
            warn!("{} has no alliance with {} to break", breaker, other);
            return;
        }
        engine.break_alliance(breaker, other);
        engine
            .player_mut(other)
            .update_relation(breaker, BETRAYED_RELATION);

        let witnesses: Vec<_> = engine
            .players()
            .map(|p| p.small_id())
            .filter(|&id| id != breaker && id != other)
            .collect();
        for id in witnesses {
            engine.player_mut(id).update_relation(breaker, WITNESS_RELATION);
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

pub struct AllianceExtensionExecution {
    player: PlayerId,
    other: PlayerId,
    active: bool,
}

impl AllianceExtensionExecution {
    pub fn new(player: PlayerId, other: PlayerId) -> Self {
        Self {
            player,
            other,
            active: true,
        }
    }
}

impl Execution for AllianceExtensionExecution {
    fn init(&mut self, engine: &mut WorldEngine, _tick: Tick) {
        self.active = false;
        let Some((player, other)) = lookup_pair(engine, &self.player, &self.other) else {
            return;
        };
        if !engine.request_alliance_extension(player, other) {
            warn!("{} asked to renew a missing alliance with {}", player, other);
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

/// Long-lived sweep that ends alliances once they run out, and reminds the
/// undecided side when only one partner has asked to renew.
#[derive(Default)]
pub struct AllianceExpiryExecution {
    /// Alliances already reminded, keyed with the expiry they were reminded
    /// about so a renewed alliance can be reminded again.
    reminded: BTreeSet<(AllianceId, Tick)>,
}

impl AllianceExpiryExecution {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Execution for AllianceExpiryExecution {
    fn init(&mut self, _engine: &mut WorldEngine, _tick: Tick) {}

    fn tick(&mut self, engine: &mut WorldEngine, tick: Tick) {
        let offset = engine.config().alliance_extension_prompt_offset();
        let mut expired = Vec::new();
        let mut reminders = Vec::new();
        for alliance in engine.active_alliances() {
            let expires_at = alliance.expires_at();
            if expires_at <= tick {
                expired.push(alliance.id());
                continue;
            }
            if !alliance.only_one_agreed_to_extend() || expires_at - tick > offset {
                continue;
            }
            if self.reminded.insert((alliance.id(), expires_at)) {
                let (asked, undecided) = if alliance.has_extension_request(alliance.requestor()) {
                    (alliance.requestor(), alliance.recipient())
                } else {
                    (alliance.recipient(), alliance.requestor())
                };
                reminders.push((asked, undecided));
            }
        }

        for id in expired {
            engine.expire_alliance(id);
        }
        for (asked, undecided) in reminders {
            let name = engine.player(asked).name().to_string();
            debug!("reminding {} to renew with {}", undecided, asked);
            engine.display_message(
                format!("{name} wants to renew your alliance"),
                MessageType::RenewAlliance,
                Some(undecided),
                None,
            );
        }
    }

    fn is_active(&self) -> bool {
        true
    }

    fn active_during_spawn_phase(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use openfront_protocol::{GameUpdate, PlayerType, SmallId};

    use super::*;
    use crate::{GameConfig, TileStore};

    fn engine() -> (WorldEngine, SmallId, SmallId, SmallId) {
        let map = TileStore::from_ascii("######\n######").unwrap();
        let config = GameConfig {
            num_spawn_phase_turns: 0,
            alliance_duration: 50,
            alliance_extension_prompt_offset: 10,
            ..GameConfig::default()
        };
        let mut engine = WorldEngine::new(map, config);
        let mut ids = Vec::new();
        for (i, name) in ["a", "b", "c"].into_iter().enumerate() {
            let id = engine.add_player(PlayerId::new(name), name, PlayerType::Human, None);
            engine.conquer(id, i as u32 * 2);
            ids.push(id);
        }
        (engine, ids[0], ids[1], ids[2])
    }

    fn run(engine: &mut WorldEngine, exec: impl Execution + 'static) {
        engine.add_execution(Box::new(exec));
        engine.execute_next_tick();
    }

    fn ally(engine: &mut WorldEngine) {
        let (a, b) = (PlayerId::new("a"), PlayerId::new("b"));
        run(engine, AllianceRequestExecution::new(a.clone(), b.clone()));
        run(engine, AllianceReplyExecution::new(a, b, true));
    }

    #[test]
    fn accepted_reply_forms_alliance_and_warms_relations() {
        let (mut engine, a, b, _) = engine();
        ally(&mut engine);
        assert!(engine.is_allied_with(a, b));
        assert_eq!(engine.player(a).relation_score(b), 100);
        assert_eq!(engine.player(b).relation_score(a), 100);
    }

    #[test]
    fn rejected_reply_leaves_players_apart() {
        let (mut engine, a, b, _) = engine();
        run(
            &mut engine,
            AllianceRequestExecution::new(PlayerId::new("a"), PlayerId::new("b")),
        );
        run(
            &mut engine,
            AllianceReplyExecution::new(PlayerId::new("a"), PlayerId::new("b"), false),
        );
        assert!(!engine.is_allied_with(a, b));
        assert_eq!(engine.pending_alliance_requests().count(), 0);
    }

    #[test]
    fn breaking_sours_every_relation_with_the_traitor() {
        let (mut engine, a, b, c) = engine();
        ally(&mut engine);
        run(
            &mut engine,
            BreakAllianceExecution::new(PlayerId::new("a"), PlayerId::new("b")),
        );
        assert!(!engine.is_allied_with(a, b));
        assert!(engine.is_traitor(a));
        assert_eq!(engine.player(b).relation_score(a), -100);
        assert_eq!(engine.player(c).relation_score(a), -40);
    }

    #[test]
    fn undecided_partner_is_reminded_once_then_alliance_expires() {
        let (mut engine, a, b, _) = engine();
        ally(&mut engine);
        let expires_at = engine.alliance(engine.alliance_between(a, b).unwrap()).expires_at();
        run(
            &mut engine,
            AllianceExtensionExecution::new(PlayerId::new("a"), PlayerId::new("b")),
        );

        let mut reminders = 0;
        let mut expired = false;
        while engine.ticks() <= expires_at {
            for update in engine.execute_next_tick().updates {
                match update {
                    GameUpdate::DisplayEvent {
                        message_type: MessageType::RenewAlliance,
                        player_id,
                        ..
                    } => {
                        assert_eq!(player_id, Some(b));
                        reminders += 1;
                    }
                    GameUpdate::AllianceExpired { .. } => expired = true,
                    _ => {}
                }
            }
        }
        assert_eq!(reminders, 1);
        assert!(expired);
        assert!(!engine.is_allied_with(a, b));
    }
}
