//! Periodic fault monitoring with rate-limited reporting.
//!
//! Faults are evaluated every period but reported at most once per
//! `min_report_interval`. Speed and temperature faults share one cooldown.

use crate::error::StateError;
use crate::fault::{evaluate_faults, FaultFlags, FaultThresholds};
use crate::periodic::PeriodicTask;
use crate::state::{MotorState, MotorStateAccess};
use crate::timebase::Clock;
use log::{error, warn};
use std::sync::Arc;
use std::time::Duration;

pub const FAULT_MONITOR_PERIOD_MS: u64 = 2000;
pub const FAULT_REPORT_INTERVAL_MS: u64 = 10_000;

#[derive(Clone, Debug)]
pub struct FaultConfig {
    pub period: Duration,
    pub thresholds: FaultThresholds,
    pub min_report_interval: Duration,
}

impl Default for FaultConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(FAULT_MONITOR_PERIOD_MS),
            thresholds: FaultThresholds::default(),
            min_report_interval: Duration::from_millis(FAULT_REPORT_INTERVAL_MS),
        }
    }
}

/// Single cooldown timer. The first request always passes.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    min_interval_ms: u64,
    last_ms: Option<u64>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval_ms: min_interval.as_millis() as u64,
            last_ms: None,
        }
    }

    /// Whether a report may be emitted at `now_ms`. Does not consume the slot.
    pub fn is_open(&self, now_ms: u64) -> bool {
        match self.last_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.min_interval_ms,
        }
    }

    pub fn mark(&mut self, now_ms: u64) {
        self.last_ms = Some(now_ms);
    }

    pub fn last_ms(&self) -> Option<u64> {
        self.last_ms
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaultOutcome {
    pub flags: FaultFlags,
    pub reported: bool,
}

#[derive(Clone, Default, Debug)]
pub struct MonitorStats {
    pub evaluations: u64,
    pub faulted_evaluations: u64,
    pub reports: u64,
}

/// Fault context owned by the monitor task: thresholds plus the private
/// rate-limiting state.
#[derive(Debug, Clone)]
pub struct FaultMonitor {
    thresholds: FaultThresholds,
    limiter: RateLimiter,
    stats: MonitorStats,
}

impl FaultMonitor {
    pub fn new(thresholds: FaultThresholds, min_report_interval: Duration) -> Self {
        Self {
            thresholds,
            limiter: RateLimiter::new(min_report_interval),
            stats: MonitorStats::default(),
        }
    }

    pub fn from_config(config: &FaultConfig) -> Self {
        Self::new(config.thresholds, config.min_report_interval)
    }

    /// Evaluate `state` and log the active faults unless still cooling down.
    pub fn process(&mut self, state: &MotorState, now_ms: u64) -> FaultOutcome {
        let flags = evaluate_faults(state, &self.thresholds);
        self.stats.evaluations += 1;

        if flags.is_empty() {
            return FaultOutcome {
                flags,
                reported: false,
            };
        }
        self.stats.faulted_evaluations += 1;

        if !self.limiter.is_open(now_ms) {
            return FaultOutcome {
                flags,
                reported: false,
            };
        }

        report(state, flags);
        self.limiter.mark(now_ms);
        self.stats.reports += 1;
        FaultOutcome {
            flags,
            reported: true,
        }
    }

    pub fn stats(&self) -> &MonitorStats {
        &self.stats
    }

    pub fn thresholds(&self) -> &FaultThresholds {
        &self.thresholds
    }
}

fn report(state: &MotorState, flags: FaultFlags) {
    if flags.contains(FaultFlags::SPEED_ERROR) {
        warn!(
            "Fault(speed): |SP-MEAS|={} rpm (OUT={}%, T={} C)",
            (state.setpoint_rpm - state.measured_rpm).abs() as i64,
            state.control_output_pct as i64,
            state.temperature_c as i64
        );
    }
    if flags.contains(FaultFlags::TEMP_SOFT) {
        warn!(
            "Fault(temp soft): T={} C (OUT={}%, SP={} rpm)",
            state.temperature_c as i64,
            state.control_output_pct as i64,
            state.setpoint_rpm as i64
        );
    }
    if flags.contains(FaultFlags::TEMP_HARD) {
        error!(
            "Fault(temp hard): T={} C (OUT={}%, SP={} rpm)",
            state.temperature_c as i64,
            state.control_output_pct as i64,
            state.setpoint_rpm as i64
        );
    }
}

/// Periodic wrapper: read the store, never write it.
pub struct FaultMonitorTask<S: MotorStateAccess, C: Clock> {
    store: Arc<S>,
    monitor: FaultMonitor,
    clock: C,
    last_outcome: Option<FaultOutcome>,
}

impl<S: MotorStateAccess, C: Clock> FaultMonitorTask<S, C> {
    pub fn new(store: Arc<S>, monitor: FaultMonitor, clock: C) -> Self {
        Self {
            store,
            monitor,
            clock,
            last_outcome: None,
        }
    }

    pub fn monitor(&self) -> &FaultMonitor {
        &self.monitor
    }

    pub fn last_outcome(&self) -> Option<FaultOutcome> {
        self.last_outcome
    }
}

impl<S: MotorStateAccess, C: Clock> PeriodicTask for FaultMonitorTask<S, C> {
    fn name(&self) -> &'static str {
        "fault_monitor"
    }

    fn run_once(&mut self) -> Result<(), StateError> {
        let state = self.store.snapshot()?;
        let outcome = self.monitor.process(&state, self.clock.now_ms());
        self.last_outcome = Some(outcome);
        Ok(())
    }
}
