//! Alliance lifecycle and the player-to-player rule checks.
//!
//! Rule checks (`can_*`) return `false` for ordinary rejections. Broken
//! invariants, such as a second alliance between the same pair, panic.

use openfront_protocol::{
    AllianceId, AllianceRequestId, EmojiMessage, GameUpdate, MessageType, PlayerId, PlayerType,
    SmallId,
};
use tracing::{debug, info};

use super::WorldEngine;
use crate::{Alliance, AllianceRequest, RequestStatus};

impl WorldEngine {
    // =========================================================================
    // Queries
    // =========================================================================

    pub fn alliance(&self, id: AllianceId) -> &Alliance {
        &self.alliances[id]
    }

    pub fn alliance_request(&self, id: AllianceRequestId) -> &AllianceRequest {
        &self.alliance_requests[id]
    }

    pub fn active_alliances(&self) -> impl Iterator<Item = &Alliance> {
        self.alliances.values().filter(|a| a.is_active())
    }

    pub fn pending_alliance_requests(&self) -> impl Iterator<Item = &AllianceRequest> {
        self.pending_requests
            .iter()
            .map(|&id| &self.alliance_requests[id])
    }

    pub fn outgoing_alliance_requests(
        &self,
        player: SmallId,
    ) -> impl Iterator<Item = &AllianceRequest> {
        self.pending_alliance_requests()
            .filter(move |r| r.requestor() == player)
    }

    pub fn incoming_alliance_requests(
        &self,
        player: SmallId,
    ) -> impl Iterator<Item = &AllianceRequest> {
        self.pending_alliance_requests()
            .filter(move |r| r.recipient() == player)
    }

    pub fn alliance_between(&self, a: SmallId, b: SmallId) -> Option<AllianceId> {
        self.player(a)
            .alliances()
            .iter()
            .copied()
            .find(|&id| self.alliances[id].other(a) == Some(b))
    }

    pub fn is_allied_with(&self, a: SmallId, b: SmallId) -> bool {
        self.alliance_between(a, b).is_some()
    }

    /// Allied or on the same team.
    pub fn is_friendly(&self, a: SmallId, b: SmallId) -> bool {
        self.player(a).is_on_same_team(self.player(b)) || self.is_allied_with(a, b)
    }

    pub fn is_traitor(&self, player: SmallId) -> bool {
        self.player(player)
            .is_traitor(self.ticks, self.config.traitor_duration())
    }

    /// The single alliance linking `a` and `b`, found from both sides'
    /// back-references. Panics unless there is exactly one.
    fn shared_alliance(&self, a: SmallId, b: SmallId) -> AllianceId {
        let theirs = self.player(b).alliances();
        let shared: Vec<AllianceId> = self
            .player(a)
            .alliances()
            .iter()
            .copied()
            .filter(|id| theirs.contains(id))
            .collect();
        assert!(
            shared.len() == 1,
            "expected exactly one alliance between {a} and {b}, found {}",
            shared.len()
        );
        shared[0]
    }

    // =========================================================================
    // Alliance requests
    // =========================================================================

    pub fn can_send_alliance_request(&self, requestor: SmallId, recipient: SmallId) -> bool {
        if requestor == recipient {
            return false;
        }
        let (from, to) = (self.player(requestor), self.player(recipient));
        if from.is_disconnected() || to.is_disconnected() {
            return false;
        }
        if self.is_friendly(requestor, recipient) || !from.is_alive() || !to.is_alive() {
            return false;
        }
        if self
            .outgoing_alliance_requests(requestor)
            .any(|r| r.recipient() == recipient)
        {
            return false;
        }
        let last_request = from
            .past_outgoing_requests()
            .iter()
            .map(|&id| &self.alliance_requests[id])
            .filter(|r| r.recipient() == recipient)
            .map(|r| r.created_at())
            .max();
        match last_request {
            Some(created_at) => {
                self.ticks.saturating_sub(created_at) >= self.config.alliance_request_cooldown()
            }
            None => true,
        }
    }

    /// Records a pending request. Returns `None` for a request to oneself,
    /// when the pair is already allied, when the same request is already
    /// pending, and when the recipient had asked first, in which case that
    /// request is accepted.
    pub fn create_alliance_request(
        &mut self,
        requestor: SmallId,
        recipient: SmallId,
    ) -> Option<AllianceRequestId> {
        if requestor == recipient {
            debug!("{} cannot ally with itself", requestor);
            return None;
        }
        if self.is_allied_with(requestor, recipient) {
            debug!("{} and {} are already allied", requestor, recipient);
            return None;
        }
        if self
            .outgoing_alliance_requests(requestor)
            .any(|r| r.recipient() == recipient)
        {
            debug!("duplicate alliance request {} -> {}", requestor, recipient);
            return None;
        }
        let counter = self
            .outgoing_alliance_requests(recipient)
            .find(|r| r.recipient() == requestor)
            .map(|r| r.id());
        if let Some(counter) = counter {
            debug!(
                "{} answered {} with its own request; accepting",
                requestor, recipient
            );
            self.accept_alliance_request(counter);
            return None;
        }

        let now = self.ticks;
        let id = self
            .alliance_requests
            .insert_with(|id| AllianceRequest::new(id, requestor, recipient, now));
        self.pending_requests.push(id);
        let update = self.alliance_requests[id].to_update();
        self.updates.push(GameUpdate::AllianceRequest(update));
        debug!("alliance request {} -> {}", requestor, recipient);
        Some(id)
    }

    /// Panics if the two players are already allied, which is also what a
    /// second accept of the same request runs into.
    pub fn accept_alliance_request(&mut self, id: AllianceRequestId) -> AllianceId {
        let request = &self.alliance_requests[id];
        let (a, b) = (request.requestor(), request.recipient());
        assert!(
            !self.is_allied_with(a, b),
            "players {a} and {b} are already allied"
        );
        assert!(
            request.is_pending(),
            "alliance request {id:?} was already resolved"
        );

        let now = self.ticks;
        let duration = self.config.alliance_duration();
        let alliance = self
            .alliances
            .insert_with(|aid| Alliance::new(aid, a, b, now, duration));
        self.player_mut(a).alliances.push(alliance);
        self.player_mut(b).alliances.push(alliance);
        self.resolve_request(id, RequestStatus::Accepted);

        self.player_mut(a).end_temporary_embargo(b);
        self.player_mut(b).end_temporary_embargo(a);

        let request = self.alliance_requests[id].to_update();
        self.updates.push(GameUpdate::AllianceRequestReply {
            request,
            accepted: true,
        });
        info!("{} and {} formed an alliance", a, b);
        alliance
    }

    pub fn reject_alliance_request(&mut self, id: AllianceRequestId) {
        assert!(
            self.alliance_requests[id].is_pending(),
            "alliance request {id:?} was already resolved"
        );
        self.resolve_request(id, RequestStatus::Rejected);
        let request = self.alliance_requests[id].to_update();
        debug!(
            "{} rejected the alliance request from {}",
            request.recipient_id, request.requestor_id
        );
        self.updates.push(GameUpdate::AllianceRequestReply {
            request,
            accepted: false,
        });
    }

    fn resolve_request(&mut self, id: AllianceRequestId, status: RequestStatus) {
        self.alliance_requests[id].status = status;
        self.pending_requests.retain(|&p| p != id);
        let requestor = self.alliance_requests[id].requestor();
        self.player_mut(requestor).past_outgoing_requests.push(id);
    }

    // =========================================================================
    // Alliance end of life
    // =========================================================================

    fn end_alliance(&mut self, id: AllianceId) {
        let now = self.ticks;
        let alliance = &mut self.alliances[id];
        alliance.ended_at = Some(now);
        let (a, b) = (alliance.requestor(), alliance.recipient());
        self.player_mut(a).alliances.retain(|&x| x != id);
        self.player_mut(b).alliances.retain(|&x| x != id);
    }

    /// `breaker` leaves its alliance with `other` and is marked a traitor,
    /// unless `other` is a traitor itself or disconnected.
    pub fn break_alliance(&mut self, breaker: SmallId, other: SmallId) {
        let id = self.shared_alliance(breaker, other);
        let other_player = self.player(other);
        let excused = other_player.is_traitor(self.ticks, self.config.traitor_duration())
            || other_player.is_disconnected();
        if !excused {
            let now = self.ticks;
            self.player_mut(breaker).mark_traitor(now);
            let traitor = self.player(breaker).id().clone();
            self.stats.betray(&traitor);
        }
        self.end_alliance(id);
        self.updates.push(GameUpdate::BrokeAlliance {
            traitor_id: breaker,
            betrayed_id: other,
        });
        info!("{} broke its alliance with {}", breaker, other);
    }

    pub fn expire_alliance(&mut self, id: AllianceId) {
        let alliance = &self.alliances[id];
        let (a, b) = (alliance.requestor(), alliance.recipient());
        let shared = self.shared_alliance(a, b);
        assert!(
            shared == id,
            "alliance {id:?} is not the one linking {a} and {b}"
        );
        self.end_alliance(id);
        self.updates.push(GameUpdate::AllianceExpired {
            player1_id: a,
            player2_id: b,
        });
        let (name_a, name_b) = (
            self.player(a).name().to_string(),
            self.player(b).name().to_string(),
        );
        self.display_message(
            format!("Your alliance with {name_b} expired"),
            MessageType::AllianceExpired,
            Some(a),
            None,
        );
        self.display_message(
            format!("Your alliance with {name_a} expired"),
            MessageType::AllianceExpired,
            Some(b),
            None,
        );
        info!("alliance between {} and {} expired", a, b);
    }

    /// Records `player`'s wish to renew its alliance with `other`, renewing
    /// it once both sides agree. `false` if they are not allied.
    pub fn request_alliance_extension(&mut self, player: SmallId, other: SmallId) -> bool {
        let Some(id) = self.alliance_between(player, other) else {
            return false;
        };
        self.alliances[id].add_extension_request(player);
        self.updates.push(GameUpdate::AllianceExtension {
            player_id: player,
            alliance_id: id,
        });
        if self.alliances[id].both_agreed_to_extend() {
            let now = self.ticks;
            let duration = self.config.alliance_duration();
            self.alliances[id].extend(now, duration);
            for (me, them) in [(player, other), (other, player)] {
                let name = self.player(them).name().to_string();
                self.display_message(
                    format!("Your alliance with {name} has been renewed"),
                    MessageType::AllianceAccepted,
                    Some(me),
                    None,
                );
            }
            info!("alliance between {} and {} renewed", player, other);
        }
        true
    }

    // =========================================================================
    // Other player-to-player actions
    // =========================================================================

    pub fn can_target(&self, player: SmallId, target: SmallId) -> bool {
        player != target
            && !self.is_friendly(player, target)
            && !self
                .player(player)
                .target_on_cooldown(self.ticks, self.config.target_cooldown())
    }

    pub fn target(&mut self, player: SmallId, target: SmallId) {
        let now = self.ticks;
        let keep_for = self.config.target_duration().max(self.config.target_cooldown());
        self.player_mut(player).record_target(target, now, keep_for);
        self.updates.push(GameUpdate::TargetPlayer {
            player_id: player,
            target_id: target,
        });
    }

    /// `recipient == None` is a broadcast to every player.
    pub fn can_send_emoji(&self, sender: SmallId, recipient: Option<SmallId>) -> bool {
        recipient != Some(sender)
            && !self.player(sender).emoji_on_cooldown(
                recipient,
                self.ticks,
                self.config.emoji_message_cooldown(),
            )
    }

    pub fn send_emoji(&mut self, sender: SmallId, recipient: Option<SmallId>, emoji: String) {
        let message = EmojiMessage {
            message: emoji,
            sender_id: sender,
            recipient_id: recipient,
            created_at: self.ticks,
        };
        let keep_for = self
            .config
            .emoji_message_duration()
            .max(self.config.emoji_message_cooldown());
        self.player_mut(sender).record_emoji(message.clone(), keep_for);
        self.updates.push(GameUpdate::Emoji { emoji: message });
    }

    fn can_donate(&self, sender: SmallId, recipient: SmallId, enabled_for_humans: bool) -> bool {
        let (from, to) = (self.player(sender), self.player(recipient));
        if sender == recipient || !from.is_alive() || !to.is_alive() {
            return false;
        }
        if !self.is_friendly(sender, recipient) {
            return false;
        }
        if to.player_type() == PlayerType::Human && !enabled_for_humans {
            return false;
        }
        !from.donation_on_cooldown(recipient, self.ticks, self.config.donate_cooldown())
    }

    pub fn can_donate_gold(&self, sender: SmallId, recipient: SmallId) -> bool {
        self.can_donate(sender, recipient, self.config.donate_gold())
    }

    pub fn can_donate_troops(&self, sender: SmallId, recipient: SmallId) -> bool {
        self.can_donate(sender, recipient, self.config.donate_troops())
    }

    /// Moves up to `gold` to `recipient`. Returns `false` for a zero amount.
    pub fn donate_gold(&mut self, sender: SmallId, recipient: SmallId, gold: u64) -> bool {
        if gold == 0 {
            return false;
        }
        let now = self.ticks;
        let sent = self.player_mut(sender).remove_gold(gold);
        self.player_mut(recipient).add_gold(sent);
        let keep_for = self.config.donate_cooldown();
        self.player_mut(sender).record_donation(recipient, now, keep_for);

        let (from, to) = self.names(sender, recipient);
        self.display_message(
            format!("Sent {sent} gold to {to}"),
            MessageType::SentGoldToPlayer,
            Some(sender),
            None,
        );
        self.display_message(
            format!("Received {sent} gold from {from}"),
            MessageType::ReceivedGoldFromPlayer,
            Some(recipient),
            Some(sent),
        );
        let (from_id, to_id) = self.ids(sender, recipient);
        self.stats.donate_gold(&from_id, &to_id, sent);
        true
    }

    /// Moves up to `troops` to `recipient`. Returns `false` for a zero amount.
    pub fn donate_troops(&mut self, sender: SmallId, recipient: SmallId, troops: u64) -> bool {
        if troops == 0 {
            return false;
        }
        let now = self.ticks;
        let sent = self.player_mut(sender).remove_troops(troops);
        self.player_mut(recipient).add_troops(sent);
        let keep_for = self.config.donate_cooldown();
        self.player_mut(sender).record_donation(recipient, now, keep_for);

        let (from, to) = self.names(sender, recipient);
        self.display_message(
            format!("Sent {sent} troops to {to}"),
            MessageType::SentTroopsToPlayer,
            Some(sender),
            None,
        );
        self.display_message(
            format!("Received {sent} troops from {from}"),
            MessageType::ReceivedTroopsFromPlayer,
            Some(recipient),
            None,
        );
        let (from_id, to_id) = self.ids(sender, recipient);
        self.stats.donate_troops(&from_id, &to_id, sent);
        true
    }

    pub fn can_embargo(&self, player: SmallId, target: SmallId) -> bool {
        player != target && !self.player(player).has_embargo_against(target)
    }

    pub fn add_embargo(&mut self, player: SmallId, target: SmallId, temporary: bool) {
        let now = self.ticks;
        self.player_mut(player).add_embargo(target, now, temporary);
    }

    pub fn stop_embargo(&mut self, player: SmallId, target: SmallId) {
        self.player_mut(player).stop_embargo(target);
    }

    /// Trade needs two distinct players with no embargo either way.
    pub fn can_trade(&self, a: SmallId, b: SmallId) -> bool {
        a != b
            && !self.player(a).has_embargo_against(b)
            && !self.player(b).has_embargo_against(a)
    }

    fn names(&self, a: SmallId, b: SmallId) -> (String, String) {
        (
            self.player(a).name().to_string(),
            self.player(b).name().to_string(),
        )
    }

    fn ids(&self, a: SmallId, b: SmallId) -> (PlayerId, PlayerId) {
        (self.player(a).id().clone(), self.player(b).id().clone())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GameConfig, TileStore};

    fn engine(config: GameConfig) -> (WorldEngine, SmallId, SmallId) {
        let map = TileStore::from_ascii("#####").unwrap();
        let mut engine = WorldEngine::without_default_executions(map, config);
        let a = engine.add_player(PlayerId::new("a"), "A", PlayerType::Human, None);
        let b = engine.add_player(PlayerId::new("b"), "B", PlayerType::Human, None);
        engine.conquer(a, 0);
        engine.conquer(b, 4);
        (engine, a, b)
    }

    fn allied(engine: &mut WorldEngine, a: SmallId, b: SmallId) -> AllianceId {
        let request = engine.create_alliance_request(a, b).unwrap();
        engine.accept_alliance_request(request)
    }

    #[test]
    fn duplicate_requests_are_ignored() {
        let (mut engine, a, b) = engine(GameConfig::default());
        assert!(engine.create_alliance_request(a, b).is_some());
        assert!(engine.create_alliance_request(a, b).is_none());
        assert!(!engine.can_send_alliance_request(a, b));
        assert_eq!(engine.outgoing_alliance_requests(a).count(), 1);
        assert_eq!(engine.incoming_alliance_requests(b).count(), 1);
    }

    #[test]
    fn self_requests_are_rejected() {
        let (mut engine, a, _) = engine(GameConfig::default());
        assert!(engine.create_alliance_request(a, a).is_none());
        assert!(!engine.is_allied_with(a, a));
        assert_eq!(engine.pending_alliance_requests().count(), 0);
        assert_eq!(engine.active_alliances().count(), 0);
        assert!(engine.player(a).alliances().is_empty());
    }

    #[test]
    fn counter_request_is_accepted() {
        let (mut engine, a, b) = engine(GameConfig::default());
        engine.create_alliance_request(a, b);
        assert!(engine.create_alliance_request(b, a).is_none());
        assert!(engine.is_allied_with(a, b));
        assert_eq!(engine.pending_alliance_requests().count(), 0);
        assert_eq!(engine.player(a).past_outgoing_requests().len(), 1);
    }

    #[test]
    fn request_cooldown_applies_after_rejection() {
        let config = GameConfig {
            alliance_request_cooldown: 5,
            ..GameConfig::default()
        };
        let (mut engine, a, b) = engine(config);
        let request = engine.create_alliance_request(a, b).unwrap();
        engine.reject_alliance_request(request);
        assert!(!engine.can_send_alliance_request(a, b));
        for _ in 0..5 {
            engine.execute_next_tick();
        }
        assert!(engine.can_send_alliance_request(a, b));
    }

    #[test]
    #[should_panic(expected = "already allied")]
    fn accepting_twice_panics() {
        let (mut engine, a, b) = engine(GameConfig::default());
        let request = engine.create_alliance_request(a, b).unwrap();
        engine.accept_alliance_request(request);
        engine.accept_alliance_request(request);
    }

    #[test]
    fn accepting_lifts_temporary_embargoes_only() {
        let (mut engine, a, b) = engine(GameConfig::default());
        engine.add_embargo(a, b, true);
        engine.add_embargo(b, a, false);
        allied(&mut engine, a, b);
        assert!(!engine.player(a).has_embargo_against(b));
        assert!(engine.player(b).has_embargo_against(a));
    }

    #[test]
    fn breaking_a_traitor_is_not_treason() {
        let (mut engine, a, b) = engine(GameConfig::default());
        allied(&mut engine, a, b);
        engine.break_alliance(a, b);
        assert!(engine.is_traitor(a));

        allied(&mut engine, a, b);
        engine.break_alliance(b, a);
        assert!(!engine.is_traitor(b));
        assert_eq!(engine.player(a).betrayals(), 1);
    }

    #[test]
    fn breaking_a_disconnected_ally_is_not_treason() {
        let (mut engine, a, b) = engine(GameConfig::default());
        allied(&mut engine, a, b);
        engine.mark_disconnected(b, true);
        engine.break_alliance(a, b);
        assert!(!engine.is_traitor(a));
        assert!(engine.alliance_between(a, b).is_none());
    }

    #[test]
    #[should_panic(expected = "expected exactly one alliance")]
    fn breaking_without_alliance_panics() {
        let (mut engine, a, b) = engine(GameConfig::default());
        engine.break_alliance(a, b);
    }

    #[test]
    fn extension_needs_both_sides() {
        let config = GameConfig {
            alliance_duration: 100,
            ..GameConfig::default()
        };
        let (mut engine, a, b) = engine(config);
        let id = allied(&mut engine, a, b);
        for _ in 0..40 {
            engine.execute_next_tick();
        }
        assert!(engine.request_alliance_extension(a, b));
        assert_eq!(engine.alliance(id).expires_at(), 100);
        assert!(engine.alliance(id).only_one_agreed_to_extend());
        assert!(engine.request_alliance_extension(b, a));
        assert_eq!(engine.alliance(id).expires_at(), 140);
        assert!(!engine.alliance(id).only_one_agreed_to_extend());
    }

    #[test]
    fn expiring_ends_the_alliance_for_both() {
        let (mut engine, a, b) = engine(GameConfig::default());
        let id = allied(&mut engine, a, b);
        engine.expire_alliance(id);
        assert!(!engine.alliance(id).is_active());
        assert!(engine.player(a).alliances().is_empty());
        assert!(engine.player(b).alliances().is_empty());
        assert!(!engine.request_alliance_extension(a, b));
    }

    #[test]
    fn donations_need_a_friend() {
        let config = GameConfig {
            start_gold: 90,
            ..GameConfig::default()
        };
        let (mut engine, a, b) = engine(config);
        assert!(!engine.can_donate_gold(a, b));
        allied(&mut engine, a, b);
        assert!(engine.can_donate_gold(a, b));
        assert!(!engine.donate_gold(a, b, 0));
        assert!(engine.donate_gold(a, b, 30));
        assert_eq!(engine.player(b).gold(), 120);
        assert!(!engine.can_donate_gold(a, b));
    }

    #[test]
    fn allies_cannot_be_targeted() {
        let (mut engine, a, b) = engine(GameConfig::default());
        assert!(engine.can_target(a, b));
        engine.target(a, b);
        assert!(!engine.can_target(a, b));
        allied(&mut engine, b, a);
        assert!(!engine.can_target(b, a));
    }
}
