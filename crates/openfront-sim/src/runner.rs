//! Feeds a tick-stamped intent script into an engine.

use std::collections::VecDeque;

use openfront_core::executions::create_execution;
use openfront_core::WorldEngine;
use openfront_protocol::{GameUpdates, ScheduledIntent};
use tracing::debug;

pub struct ScriptedRun {
    engine: WorldEngine,
    script: VecDeque<ScheduledIntent>,
}

impl ScriptedRun {
    /// Intents keep their relative order within a tick.
    pub fn new(engine: WorldEngine, mut script: Vec<ScheduledIntent>) -> Self {
        script.sort_by_key(|s| s.tick);
        Self {
            engine,
            script: script.into(),
        }
    }

    /// Queues the intents due by the next tick, then runs it. Intents
    /// stamped with a tick that has already passed run right away.
    pub fn step(&mut self) -> GameUpdates {
        let now = self.engine.ticks();
        while self.script.front().is_some_and(|s| s.tick <= now) {
            let Some(next) = self.script.pop_front() else {
                break;
            };
            debug!("tick {}: {} issued {:?}", now, next.stamped.player, next.stamped.intent);
            self.engine.add_execution(create_execution(next.stamped));
        }
        self.engine.execute_next_tick()
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    pub fn engine(&self) -> &WorldEngine {
        &self.engine
    }
}
