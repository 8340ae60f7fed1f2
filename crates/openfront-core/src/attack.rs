use openfront_protocol::{AttackId, AttackView, SmallId, Tick, TileRef};

use crate::Owner;

/// Bookkeeping for an attack in flight. The combat itself is run by an
/// external execution; the engine only tracks who is attacking whom.
#[derive(Clone, Debug)]
pub struct Attack {
    id: AttackId,
    attacker: SmallId,
    target: Owner,
    troops: u64,
    source_tile: Option<TileRef>,
    created_at: Tick,
    active: bool,
    retreating: bool,
}

impl Attack {
    pub(crate) fn new(
        id: AttackId,
        attacker: SmallId,
        target: Owner,
        troops: u64,
        source_tile: Option<TileRef>,
        created_at: Tick,
    ) -> Self {
        Self {
            id,
            attacker,
            target,
            troops,
            source_tile,
            created_at,
            active: true,
            retreating: false,
        }
    }

    pub fn id(&self) -> AttackId {
        self.id
    }

    pub fn attacker(&self) -> SmallId {
        self.attacker
    }

    pub fn target(&self) -> Owner {
        self.target
    }

    pub fn troops(&self) -> u64 {
        self.troops
    }

    pub fn source_tile(&self) -> Option<TileRef> {
        self.source_tile
    }

    pub fn created_at(&self) -> Tick {
        self.created_at
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_retreating(&self) -> bool {
        self.retreating
    }

    pub fn set_troops(&mut self, troops: u64) {
        self.troops = troops;
    }

    pub fn order_retreat(&mut self) {
        self.retreating = true;
    }

    pub(crate) fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn to_view(&self) -> AttackView {
        AttackView {
            id: self.id,
            attacker_id: self.attacker,
            target_id: self.target.small_id(),
            troops: self.troops,
            retreating: self.retreating,
        }
    }
}
