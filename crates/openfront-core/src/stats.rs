use openfront_protocol::{PlayerId, UnitType};

/// Fire-and-forget sink for game statistics. The engine never reads
/// anything back, so every hook defaults to doing nothing.
pub trait Stats {
    fn attack(&mut self, _attacker: &PlayerId, _target: Option<&PlayerId>, _troops: u64) {}
    fn attack_cancel(&mut self, _attacker: &PlayerId, _target: Option<&PlayerId>, _troops: u64) {}
    fn betray(&mut self, _traitor: &PlayerId) {}
    fn conquer(&mut self, _conqueror: &PlayerId, _conquered: &PlayerId, _gold: u64) {}
    fn donate_gold(&mut self, _sender: &PlayerId, _recipient: &PlayerId, _gold: u64) {}
    fn donate_troops(&mut self, _sender: &PlayerId, _recipient: &PlayerId, _troops: u64) {}
    fn unit_build(&mut self, _player: &PlayerId, _unit_type: UnitType) {}
    fn unit_capture(&mut self, _player: &PlayerId, _unit_type: UnitType) {}
    fn unit_destroy(&mut self, _player: &PlayerId, _unit_type: UnitType) {}
    fn unit_upgrade(&mut self, _player: &PlayerId, _unit_type: UnitType) {}
    fn missile_launch(&mut self, _player: &PlayerId, _unit_type: UnitType) {}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopStats;

impl Stats for NoopStats {}
