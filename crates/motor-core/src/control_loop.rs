//! Periodic control task built on [`control_step_with_derating`].

use crate::control::{control_step_with_derating, Derating};
use crate::error::StateError;
use crate::periodic::PeriodicTask;
use crate::state::MotorStateAccess;
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;

pub const CONTROL_PERIOD_MS: u64 = 50;

#[derive(Clone, Debug)]
pub struct ControlConfig {
    pub period: Duration,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(CONTROL_PERIOD_MS),
        }
    }
}

#[derive(Clone, Default, Debug)]
pub struct ExecutionStats {
    pub cycles_executed: u64,
    pub soft_derated_cycles: u64,
    pub hard_derated_cycles: u64,
}

/// Control task: snapshot, step the controller and plant outside the lock,
/// write the feedback back.
pub struct ControlLoop<S: MotorStateAccess> {
    store: Arc<S>,
    stats: ExecutionStats,
    derating: Derating,
}

impl<S: MotorStateAccess> ControlLoop<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            stats: ExecutionStats::default(),
            derating: Derating::None,
        }
    }

    pub fn stats(&self) -> &ExecutionStats {
        &self.stats
    }

    fn note_derating(&mut self, derating: Derating, temperature_c: f64) {
        match derating {
            Derating::Soft => self.stats.soft_derated_cycles += 1,
            Derating::Hard => self.stats.hard_derated_cycles += 1,
            Derating::None => {}
        }
        if derating != self.derating {
            let t = temperature_c as i64;
            match derating {
                Derating::None => debug!("output derating cleared (T={} C)", t),
                Derating::Soft => warn!("soft temperature derating active (T={} C)", t),
                Derating::Hard => warn!("hard temperature derating active (T={} C)", t),
            }
            self.derating = derating;
        }
    }
}

impl<S: MotorStateAccess> PeriodicTask for ControlLoop<S> {
    fn name(&self) -> &'static str {
        "motor_ctrl"
    }

    fn run_once(&mut self) -> Result<(), StateError> {
        let state = self.store.snapshot()?;
        let (next, derating) = control_step_with_derating(&state);
        self.store
            .update_feedback(next.measured_rpm, next.control_output_pct, next.temperature_c)?;

        self.stats.cycles_executed += 1;
        self.note_derating(derating, next.temperature_c);
        Ok(())
    }
}
