use openfront_protocol::Tick;

use crate::WorldEngine;

/// An in-flight action driven by the engine once per tick.
///
/// `init` runs once, on the first tick the execution is eligible; `tick`
/// runs on every later tick while `is_active` holds. During the spawn phase
/// only executions with `active_during_spawn_phase` are initialised or
/// ticked, the rest wait in the queue.
pub trait Execution {
    fn init(&mut self, engine: &mut WorldEngine, tick: Tick);

    fn tick(&mut self, engine: &mut WorldEngine, tick: Tick);

    fn is_active(&self) -> bool;

    fn active_during_spawn_phase(&self) -> bool;
}
