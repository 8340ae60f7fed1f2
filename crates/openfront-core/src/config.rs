//! Tunable game constants.
//!
//! The engine only ever reads through the [`Config`] trait. [`GameConfig`]
//! is the stock implementation and can be loaded from YAML or JSON; any field
//! left out of a file keeps its default.

use std::collections::BTreeMap;
use std::path::Path;

use openfront_protocol::{PlayerType, Tick, UnitType};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("json parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Static per-type unit properties.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitInfo {
    pub cost: u64,
    /// Only types with a maximum carry health at all.
    #[serde(default)]
    pub max_health: Option<u32>,
    #[serde(default)]
    pub territory_bound: bool,
    #[serde(default)]
    pub upgradable: bool,
}

/// Read-only lookup of every tunable the engine and built-in executions use.
/// Durations are in ticks.
pub trait Config {
    fn num_spawn_phase_turns(&self) -> Tick;
    fn spawn_radius(&self) -> u32;
    fn start_troops(&self, player_type: PlayerType) -> u64;
    fn start_gold(&self, player_type: PlayerType) -> u64;

    fn alliance_duration(&self) -> Tick;
    fn alliance_request_cooldown(&self) -> Tick;
    /// How long before expiry the undecided side gets a renewal nudge.
    fn alliance_extension_prompt_offset(&self) -> Tick;
    fn traitor_duration(&self) -> Tick;

    fn target_duration(&self) -> Tick;
    fn target_cooldown(&self) -> Tick;
    fn emoji_message_duration(&self) -> Tick;
    fn emoji_message_cooldown(&self) -> Tick;
    fn donate_cooldown(&self) -> Tick;
    fn donate_gold(&self) -> bool;
    fn donate_troops(&self) -> bool;

    fn unit_info(&self, unit_type: UnitType) -> UnitInfo;
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub num_spawn_phase_turns: Tick,
    /// Radius (euclidean, in tiles) claimed around a spawn tile.
    pub spawn_radius: u32,
    pub start_troops_human: u64,
    pub start_troops_bot: u64,
    pub start_gold: u64,

    pub alliance_duration: Tick,
    pub alliance_request_cooldown: Tick,
    pub alliance_extension_prompt_offset: Tick,
    pub traitor_duration: Tick,

    pub target_duration: Tick,
    pub target_cooldown: Tick,
    pub emoji_message_duration: Tick,
    pub emoji_message_cooldown: Tick,
    pub donate_cooldown: Tick,
    pub donate_gold: bool,
    pub donate_troops: bool,

    /// Per-type overrides layered over the built-in unit table.
    pub units: BTreeMap<UnitType, UnitInfo>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            num_spawn_phase_turns: 100,
            spawn_radius: 4,
            start_troops_human: 25_000,
            start_troops_bot: 10_000,
            start_gold: 0,
            alliance_duration: 3_000,
            alliance_request_cooldown: 300,
            alliance_extension_prompt_offset: 300,
            traitor_duration: 300,
            target_duration: 100,
            target_cooldown: 150,
            emoji_message_duration: 50,
            emoji_message_cooldown: 50,
            donate_cooldown: 100,
            donate_gold: true,
            donate_troops: true,
            units: BTreeMap::new(),
        }
    }
}

impl GameConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Picks the parser from the file extension (`.yaml`, `.yml`, `.json`).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "yaml" | "yml" => Self::from_yaml_str(&std::fs::read_to_string(path)?),
            "json" => Self::from_json_str(&std::fs::read_to_string(path)?),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.alliance_duration == 0 {
            return Err(ConfigError::Invalid(
                "alliance_duration must be positive".into(),
            ));
        }
        if self.alliance_extension_prompt_offset > self.alliance_duration {
            return Err(ConfigError::Invalid(format!(
                "alliance_extension_prompt_offset ({}) exceeds alliance_duration ({})",
                self.alliance_extension_prompt_offset, self.alliance_duration
            )));
        }
        Ok(())
    }
}

fn default_unit_info(unit_type: UnitType) -> UnitInfo {
    let (cost, max_health, territory_bound, upgradable) = match unit_type {
        UnitType::City => (125_000, None, true, true),
        UnitType::Port => (125_000, None, true, true),
        UnitType::MissileSilo => (1_000_000, None, true, true),
        UnitType::DefensePost => (50_000, None, true, true),
        UnitType::SAMLauncher => (1_500_000, None, true, true),
        UnitType::Factory => (125_000, None, true, true),
        UnitType::TransportShip => (0, None, false, false),
        UnitType::Warship => (250_000, Some(1_000), false, false),
        UnitType::TradeShip => (0, None, false, false),
        UnitType::Train => (0, None, false, false),
        UnitType::Shell => (0, None, false, false),
        UnitType::SAMMissile => (0, None, false, false),
        UnitType::AtomBomb => (750_000, None, false, false),
        UnitType::HydrogenBomb => (5_000_000, None, false, false),
        UnitType::MIRV => (35_000_000, None, false, false),
        UnitType::MIRVWarhead => (0, None, false, false),
    };
    UnitInfo {
        cost,
        max_health,
        territory_bound,
        upgradable,
    }
}

impl Config for GameConfig {
    fn num_spawn_phase_turns(&self) -> Tick {
        self.num_spawn_phase_turns
    }

    fn spawn_radius(&self) -> u32 {
        self.spawn_radius
    }

    fn start_troops(&self, player_type: PlayerType) -> u64 {
        match player_type {
            PlayerType::Human | PlayerType::FakeHuman => self.start_troops_human,
            PlayerType::Bot => self.start_troops_bot,
        }
    }

    fn start_gold(&self, _player_type: PlayerType) -> u64 {
        self.start_gold
    }

    fn alliance_duration(&self) -> Tick {
        self.alliance_duration
    }

    fn alliance_request_cooldown(&self) -> Tick {
        self.alliance_request_cooldown
    }

    fn alliance_extension_prompt_offset(&self) -> Tick {
        self.alliance_extension_prompt_offset
    }

    fn traitor_duration(&self) -> Tick {
        self.traitor_duration
    }

    fn target_duration(&self) -> Tick {
        self.target_duration
    }

    fn target_cooldown(&self) -> Tick {
        self.target_cooldown
    }

    fn emoji_message_duration(&self) -> Tick {
        self.emoji_message_duration
    }

    fn emoji_message_cooldown(&self) -> Tick {
        self.emoji_message_cooldown
    }

    fn donate_cooldown(&self) -> Tick {
        self.donate_cooldown
    }

    fn donate_gold(&self) -> bool {
        self.donate_gold
    }

    fn donate_troops(&self) -> bool {
        self.donate_troops
    }

    fn unit_info(&self, unit_type: UnitType) -> UnitInfo {
        self.units
            .get(&unit_type)
            .copied()
            .unwrap_or_else(|| default_unit_info(unit_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = GameConfig::from_yaml_str(
            "alliance_duration: 500\nunits:\n  City:\n    cost: 10\n    upgradable: true\n",
        )
        .unwrap();
        assert_eq!(config.alliance_duration(), 500);
        assert_eq!(config.traitor_duration(), 300);
        assert_eq!(config.unit_info(UnitType::City).cost, 10);
        assert!(!config.unit_info(UnitType::City).territory_bound);
        assert_eq!(config.unit_info(UnitType::Warship).max_health, Some(1_000));
    }

    #[test]
    fn json_round_trips() {
        let config = GameConfig {
            num_spawn_phase_turns: 7,
            ..GameConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back = GameConfig::from_json_str(&json).unwrap();
        assert_eq!(back.num_spawn_phase_turns(), 7);
        assert_eq!(back.start_troops(PlayerType::Bot), 10_000);
    }

    #[test]
    fn validation_rejects_zero_duration() {
        let err = GameConfig::from_yaml_str("alliance_duration: 0\nalliance_extension_prompt_offset: 0\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = GameConfig::load("settings.toml").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }
}
