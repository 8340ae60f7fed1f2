use openfront_protocol::{
    AllianceId, AllianceRequestId, AllianceRequestUpdate, AllianceView, SmallId, Tick,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Clone, Debug)]
pub struct AllianceRequest {
    id: AllianceRequestId,
    requestor: SmallId,
    recipient: SmallId,
    created_at: Tick,
    pub(crate) status: RequestStatus,
}

impl AllianceRequest {
    pub(crate) fn new(
        id: AllianceRequestId,
        requestor: SmallId,
        recipient: SmallId,
        created_at: Tick,
    ) -> Self {
        Self {
            id,
            requestor,
            recipient,
            created_at,
            status: RequestStatus::Pending,
        }
    }

    pub fn id(&self) -> AllianceRequestId {
        self.id
    }

    pub fn requestor(&self) -> SmallId {
        self.requestor
    }

    pub fn recipient(&self) -> SmallId {
        self.recipient
    }

    pub fn created_at(&self) -> Tick {
        self.created_at
    }

    pub fn status(&self) -> RequestStatus {
        self.status
    }

    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }

    pub fn to_update(&self) -> AllianceRequestUpdate {
        AllianceRequestUpdate {
            id: self.id,
            requestor_id: self.requestor,
            recipient_id: self.recipient,
            created_at: self.created_at,
        }
    }
}

/// An agreement between two players. Each side can independently ask to
/// extend; the alliance renews only once both have.
#[derive(Clone, Debug)]
pub struct Alliance {
    id: AllianceId,
    requestor: SmallId,
    recipient: SmallId,
    created_at: Tick,
    expires_at: Tick,
    extension_requested_requestor: bool,
    extension_requested_recipient: bool,
    pub(crate) ended_at: Option<Tick>,
}

impl Alliance {
    pub(crate) fn new(
        id: AllianceId,
        requestor: SmallId,
        recipient: SmallId,
        created_at: Tick,
        duration: Tick,
    ) -> Self {
        Self {
            id,
            requestor,
            recipient,
            created_at,
            expires_at: created_at.saturating_add(duration),
            extension_requested_requestor: false,
            extension_requested_recipient: false,
            ended_at: None,
        }
    }

    pub fn id(&self) -> AllianceId {
        self.id
    }

    pub fn requestor(&self) -> SmallId {
        self.requestor
    }

    pub fn recipient(&self) -> SmallId {
        self.recipient
    }

    pub fn created_at(&self) -> Tick {
        self.created_at
    }

    pub fn expires_at(&self) -> Tick {
        self.expires_at
    }

    pub fn is_active(&self) -> bool {
        self.ended_at.is_none()
    }

    pub fn other(&self, player: SmallId) -> Option<SmallId> {
        if self.requestor == player {
            Some(self.recipient)
        } else if self.recipient == player {
            Some(self.requestor)
        } else {
            None
        }
    }

    /// Records `player`'s wish to renew. Ignored for outsiders.
    pub fn add_extension_request(&mut self, player: SmallId) {
        if self.requestor == player {
            self.extension_requested_requestor = true;
        } else if self.recipient == player {
            self.extension_requested_recipient = true;
        }
    }

    pub fn has_extension_request(&self, player: SmallId) -> bool {
        if self.requestor == player {
            self.extension_requested_requestor
        } else if self.recipient == player {
            self.extension_requested_recipient
        } else {
            false
        }
    }

    pub fn both_agreed_to_extend(&self) -> bool {
        self.extension_requested_requestor && self.extension_requested_recipient
    }

    pub fn only_one_agreed_to_extend(&self) -> bool {
        self.extension_requested_requestor != self.extension_requested_recipient
    }

    pub fn extend(&mut self, now: Tick, duration: Tick) {
        self.extension_requested_requestor = false;
        self.extension_requested_recipient = false;
        self.expires_at = now.saturating_add(duration);
    }

    /// The view from `player`'s side.
    pub fn to_view(&self, player: SmallId) -> Option<AllianceView> {
        Some(AllianceView {
            id: self.id,
            other: self.other(player)?,
            created_at: self.created_at,
            expires_at: self.expires_at,
            has_extension_request: self.has_extension_request(player),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alliance() -> Alliance {
        Alliance::new(AllianceId::new(0), SmallId(1), SmallId(2), 100, 500)
    }

    #[test]
    fn expiry_derives_from_duration() {
        let a = alliance();
        assert_eq!(a.expires_at(), 600);
        assert_eq!(a.other(SmallId(1)), Some(SmallId(2)));
        assert_eq!(a.other(SmallId(3)), None);
    }

    #[test]
    fn extension_needs_both_sides() {
        let mut a = alliance();
        assert!(!a.only_one_agreed_to_extend());
        a.add_extension_request(SmallId(2));
        assert!(a.only_one_agreed_to_extend());
        assert!(!a.both_agreed_to_extend());
        a.add_extension_request(SmallId(9));
        assert!(!a.both_agreed_to_extend());
        a.add_extension_request(SmallId(1));
        assert!(a.both_agreed_to_extend());
        assert!(!a.only_one_agreed_to_extend());

        a.extend(550, 500);
        assert_eq!(a.expires_at(), 1_050);
        assert!(!a.has_extension_request(SmallId(1)));
        assert!(!a.has_extension_request(SmallId(2)));
    }

    #[test]
    fn view_is_relative_to_the_asking_side() {
        let mut a = alliance();
        a.add_extension_request(SmallId(2));
        let view = a.to_view(SmallId(2)).unwrap();
        assert_eq!(view.other, SmallId(1));
        assert!(view.has_extension_request);
        assert!(a.to_view(SmallId(5)).is_none());
    }
}
