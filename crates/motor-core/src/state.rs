//! Shared motor state record and its owning store.
//!
//! The store is the only writer of [`MotorState`]. Every read is a copy taken
//! under a short critical section, so callers never observe a half-written
//! record. Feedback updates raise a sample signal that telemetry-style
//! consumers can block on.

use crate::error::{PublishError, StateError};
use crate::plant::AMBIENT_TEMP_C;
use crate::setpoint::{Setpoint, SetpointRange};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Condvar, Mutex};
use std::time::Duration;

pub const DEFAULT_SETPOINT_RPM: f64 = 1500.0;

/// One consistent view of the motor, in physical units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotorState {
    pub setpoint_rpm: f64,
    pub measured_rpm: f64,
    pub control_output_pct: f64,
    pub temperature_c: f64,
}

impl Default for MotorState {
    fn default() -> Self {
        Self {
            setpoint_rpm: DEFAULT_SETPOINT_RPM,
            measured_rpm: 0.0,
            control_output_pct: 0.0,
            temperature_c: AMBIENT_TEMP_C,
        }
    }
}

/// Integer-truncated summary used by the shell and telemetry.
impl fmt::Display for MotorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SP={} rpm, MEAS={} rpm, OUT={}%, T={} C",
            self.setpoint_rpm as i64,
            self.measured_rpm as i64,
            self.control_output_pct as i64,
            self.temperature_c as i64
        )
    }
}

/// Which mutation produced a published record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateKind {
    Init,
    Setpoint,
    Feedback,
}

/// Full copy of the record handed to the observer after every mutation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateUpdate {
    pub sequence: u64,
    pub kind: UpdateKind,
    pub state: MotorState,
}

/// Receiver of published state. Called with the state lock held, so
/// implementations must not block.
pub trait StateObserver: Send + Sync {
    fn publish(&self, update: &StateUpdate) -> Result<(), PublishError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl StateObserver for NoopObserver {
    fn publish(&self, _update: &StateUpdate) -> Result<(), PublishError> {
        Ok(())
    }
}

/// Capability handed to tasks that read or write the motor state.
pub trait MotorStateAccess: Send + Sync {
    /// Consistent copy of the current record.
    fn snapshot(&self) -> Result<MotorState, StateError>;

    /// Validate and store a new setpoint. Rejected requests leave state as is.
    fn set_setpoint(&self, rpm: f64) -> Result<(), StateError>;

    /// Replace the three feedback fields as one unit and signal a new sample.
    fn update_feedback(
        &self,
        measured_rpm: f64,
        control_output_pct: f64,
        temperature_c: f64,
    ) -> Result<(), StateError>;

    /// Block until a sample signal is pending, then consume it.
    fn wait_for_sample(&self) -> Result<(), StateError>;

    /// Like `wait_for_sample`, giving up after `timeout`. Returns whether a
    /// sample was consumed.
    fn wait_for_sample_timeout(&self, timeout: Duration) -> Result<bool, StateError>;
}

struct Record {
    state: MotorState,
    sequence: u64,
    kind: UpdateKind,
}

pub struct StateStore {
    record: Mutex<Record>,
    pending_samples: Mutex<u64>,
    sample_ready: Condvar,
    observer: Box<dyn StateObserver>,
    range: SetpointRange,
}

impl StateStore {
    pub fn new() -> Self {
        Self::with_observer(Box::new(NoopObserver))
    }

    pub fn with_observer(observer: Box<dyn StateObserver>) -> Self {
        Self {
            record: Mutex::new(Record {
                state: MotorState::default(),
                sequence: 0,
                kind: UpdateKind::Init,
            }),
            pending_samples: Mutex::new(0),
            sample_ready: Condvar::new(),
            observer,
            range: SetpointRange::default(),
        }
    }

    /// Reset the record to its defaults and publish it.
    pub fn init(&self) -> Result<(), StateError> {
        let mut record = self.record.lock().map_err(|_| StateError::LockPoisoned)?;
        record.state = MotorState::default();
        self.publish_locked(&mut record, UpdateKind::Init);
        info!(
            "motor state initialized: setpoint={} rpm",
            record.state.setpoint_rpm as i64
        );
        Ok(())
    }

    /// Explicit-output variant of `snapshot` for callers that own the buffer.
    pub fn snapshot_into(&self, out: Option<&mut MotorState>) -> Result<(), StateError> {
        let out = out.ok_or(StateError::InvalidArgument("snapshot output buffer missing"))?;
        *out = self.snapshot()?;
        Ok(())
    }

    /// Number of mutations published so far, including `init`.
    pub fn sequence(&self) -> Result<u64, StateError> {
        let record = self.record.lock().map_err(|_| StateError::LockPoisoned)?;
        Ok(record.sequence)
    }

    /// The record as it was last published, with its sequence number.
    pub fn latest_update(&self) -> Result<StateUpdate, StateError> {
        let record = self.record.lock().map_err(|_| StateError::LockPoisoned)?;
        Ok(StateUpdate {
            sequence: record.sequence,
            kind: record.kind,
            state: record.state,
        })
    }

    pub fn setpoint_range(&self) -> SetpointRange {
        self.range
    }

    fn publish_locked(&self, record: &mut Record, kind: UpdateKind) {
        record.sequence += 1;
        record.kind = kind;
        let update = StateUpdate {
            sequence: record.sequence,
            kind,
            state: record.state,
        };
        if let Err(e) = self.observer.publish(&update) {
            warn!("state publish failed (seq {}): {}", update.sequence, e);
        }
    }

    fn signal_sample(&self) -> Result<(), StateError> {
        let mut pending = self
            .pending_samples
            .lock()
            .map_err(|_| StateError::SignalWait)?;
        *pending = pending.saturating_add(1);
        self.sample_ready.notify_one();
        Ok(())
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MotorStateAccess for StateStore {
    fn snapshot(&self) -> Result<MotorState, StateError> {
        let record = self.record.lock().map_err(|_| StateError::LockPoisoned)?;
        Ok(record.state)
    }

    fn set_setpoint(&self, rpm: f64) -> Result<(), StateError> {
        let setpoint = match Setpoint::new(rpm).validate(&self.range) {
            Ok(setpoint) => setpoint,
            Err(e) => {
                warn!("setpoint rejected: {}", e);
                return Err(e);
            }
        };

        let mut record = self.record.lock().map_err(|_| StateError::LockPoisoned)?;
        record.state.setpoint_rpm = setpoint.rpm();
        self.publish_locked(&mut record, UpdateKind::Setpoint);
        Ok(())
    }

    fn update_feedback(
        &self,
        measured_rpm: f64,
        control_output_pct: f64,
        temperature_c: f64,
    ) -> Result<(), StateError> {
        if !(measured_rpm.is_finite() && control_output_pct.is_finite() && temperature_c.is_finite())
        {
            return Err(StateError::InvalidArgument("feedback values must be finite"));
        }

        {
            let mut record = self.record.lock().map_err(|_| StateError::LockPoisoned)?;
            record.state.measured_rpm = measured_rpm;
            record.state.control_output_pct = control_output_pct;
            record.state.temperature_c = temperature_c;
            self.publish_locked(&mut record, UpdateKind::Feedback);
        }

        self.signal_sample()
    }

    fn wait_for_sample(&self) -> Result<(), StateError> {
        let mut pending = self
            .pending_samples
            .lock()
            .map_err(|_| StateError::SignalWait)?;
        while *pending == 0 {
            pending = self
                .sample_ready
                .wait(pending)
                .map_err(|_| StateError::SignalWait)?;
        }
        *pending -= 1;
        Ok(())
    }

    fn wait_for_sample_timeout(&self, timeout: Duration) -> Result<bool, StateError> {
        let pending = self
            .pending_samples
            .lock()
            .map_err(|_| StateError::SignalWait)?;
        let (mut pending, _) = self
            .sample_ready
            .wait_timeout_while(pending, timeout, |p| *p == 0)
            .map_err(|_| StateError::SignalWait)?;
        if *pending == 0 {
            return Ok(false);
        }
        *pending -= 1;
        Ok(true)
    }
}
