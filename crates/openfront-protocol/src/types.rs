use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitType {
    // Structures
    City,
    Port,
    MissileSilo,
    DefensePost,
    SAMLauncher,
    Factory,
    // Mobile
    TransportShip,
    Warship,
    TradeShip,
    Train,
    // Ordnance
    Shell,
    SAMMissile,
    AtomBomb,
    HydrogenBomb,
    MIRV,
    MIRVWarhead,
}

impl UnitType {
    pub const ALL: [UnitType; 16] = [
        UnitType::City,
        UnitType::Port,
        UnitType::MissileSilo,
        UnitType::DefensePost,
        UnitType::SAMLauncher,
        UnitType::Factory,
        UnitType::TransportShip,
        UnitType::Warship,
        UnitType::TradeShip,
        UnitType::Train,
        UnitType::Shell,
        UnitType::SAMMissile,
        UnitType::AtomBomb,
        UnitType::HydrogenBomb,
        UnitType::MIRV,
        UnitType::MIRVWarhead,
    ];

    /// Display name; also feeds the consistency hash, so it must stay stable.
    pub fn name(self) -> &'static str {
        match self {
            UnitType::City => "City",
            UnitType::Port => "Port",
            UnitType::MissileSilo => "Missile Silo",
            UnitType::DefensePost => "Defense Post",
            UnitType::SAMLauncher => "SAM Launcher",
            UnitType::Factory => "Factory",
            UnitType::TransportShip => "Transport",
            UnitType::Warship => "Warship",
            UnitType::TradeShip => "Trade Ship",
            UnitType::Train => "Train",
            UnitType::Shell => "Shell",
            UnitType::SAMMissile => "SAMMissile",
            UnitType::AtomBomb => "Atom Bomb",
            UnitType::HydrogenBomb => "Hydrogen Bomb",
            UnitType::MIRV => "MIRV",
            UnitType::MIRVWarhead => "MIRV Warhead",
        }
    }

    pub fn is_structure(self) -> bool {
        matches!(
            self,
            UnitType::City
                | UnitType::Port
                | UnitType::MissileSilo
                | UnitType::DefensePost
                | UnitType::SAMLauncher
                | UnitType::Factory
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerType {
    Human,
    Bot,
    FakeHuman,
}

/// Qualitative bucket of the numeric relation score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Relation {
    Hostile = 0,
    Distrustful = 1,
    Neutral = 2,
    Friendly = 3,
}

impl Relation {
    pub fn from_score(score: i32) -> Self {
        if score < -50 {
            Relation::Hostile
        } else if score < 0 {
            Relation::Distrustful
        } else if score < 50 {
            Relation::Neutral
        } else {
            Relation::Friendly
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerrainType {
    Plains,
    Highland,
    Mountain,
    Lake,
    Ocean,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageCategory {
    Attack,
    Alliance,
    Trade,
    Chat,
}

/// User-facing notification kinds carried by `GameUpdate::DisplayEvent`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    AttackFailed,
    AttackCancelled,
    AttackRequest,
    ConqueredPlayer,
    MirvInbound,
    NukeInbound,
    HydrogenBombInbound,
    NavalInvasionInbound,
    SamMiss,
    SamHit,
    CapturedEnemyUnit,
    UnitCapturedByEnemy,
    UnitDestroyed,
    AllianceAccepted,
    AllianceRejected,
    AllianceRequest,
    AllianceBroken,
    AllianceExpired,
    RenewAlliance,
    SentGoldToPlayer,
    ReceivedGoldFromPlayer,
    ReceivedGoldFromTrade,
    SentTroopsToPlayer,
    ReceivedTroopsFromPlayer,
    Chat,
}

impl MessageType {
    pub fn category(self) -> MessageCategory {
        match self {
            MessageType::AttackFailed
            | MessageType::AttackCancelled
            | MessageType::AttackRequest
            | MessageType::ConqueredPlayer
            | MessageType::MirvInbound
            | MessageType::NukeInbound
            | MessageType::HydrogenBombInbound
            | MessageType::NavalInvasionInbound
            | MessageType::SamMiss
            | MessageType::SamHit
            | MessageType::CapturedEnemyUnit
            | MessageType::UnitCapturedByEnemy
            | MessageType::UnitDestroyed => MessageCategory::Attack,
            MessageType::AllianceAccepted
            | MessageType::AllianceRejected
            | MessageType::AllianceRequest
            | MessageType::AllianceBroken
            | MessageType::AllianceExpired
            | MessageType::RenewAlliance => MessageCategory::Alliance,
            MessageType::SentGoldToPlayer
            | MessageType::ReceivedGoldFromPlayer
            | MessageType::ReceivedGoldFromTrade
            | MessageType::SentTroopsToPlayer
            | MessageType::ReceivedTroopsFromPlayer => MessageCategory::Trade,
            MessageType::Chat => MessageCategory::Chat,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmbargoAction {
    Start,
    Stop,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relation_buckets_match_thresholds() {
        assert_eq!(Relation::from_score(-100), Relation::Hostile);
        assert_eq!(Relation::from_score(-51), Relation::Hostile);
        assert_eq!(Relation::from_score(-50), Relation::Distrustful);
        assert_eq!(Relation::from_score(-1), Relation::Distrustful);
        assert_eq!(Relation::from_score(0), Relation::Neutral);
        assert_eq!(Relation::from_score(49), Relation::Neutral);
        assert_eq!(Relation::from_score(50), Relation::Friendly);
    }

    #[test]
    fn message_categories() {
        assert_eq!(MessageType::SamHit.category(), MessageCategory::Attack);
        assert_eq!(
            MessageType::AllianceExpired.category(),
            MessageCategory::Alliance
        );
        assert_eq!(
            MessageType::ReceivedGoldFromTrade.category(),
            MessageCategory::Trade
        );
        assert_eq!(MessageType::Chat.category(), MessageCategory::Chat);
    }
}
