//! Operator setpoint validation. Only validated values reach the store.

use crate::error::StateError;
use std::marker::PhantomData;

/// Highest speed an operator may request, matching the motor model full scale.
pub const MAX_SETPOINT_RPM: f64 = 3000.0;
pub const MIN_SETPOINT_RPM: f64 = 0.0;

#[derive(Debug, Clone, Copy)]
pub struct Unvalidated;

#[derive(Debug, Clone, Copy)]
pub struct Validated;

/// Operator speed request. Only a `Setpoint<Validated>` can reach the store.
#[derive(Debug, Clone, Copy)]
pub struct Setpoint<State = Unvalidated> {
    rpm: f64,
    _state: PhantomData<State>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetpointRange {
    pub min_rpm: f64,
    pub max_rpm: f64,
}

impl Default for SetpointRange {
    fn default() -> Self {
        Self {
            min_rpm: MIN_SETPOINT_RPM,
            max_rpm: MAX_SETPOINT_RPM,
        }
    }
}

impl Setpoint<Unvalidated> {
    pub fn new(rpm: f64) -> Self {
        Self {
            rpm,
            _state: PhantomData,
        }
    }

    pub fn validate(self, range: &SetpointRange) -> Result<Setpoint<Validated>, StateError> {
        if self.rpm.is_nan() {
            return Err(StateError::InvalidArgument("setpoint is not a number"));
        }
        if self.rpm < range.min_rpm || self.rpm > range.max_rpm {
            return Err(StateError::OutOfRange {
                requested: self.rpm,
                min: range.min_rpm,
                max: range.max_rpm,
            });
        }

        Ok(Setpoint {
            rpm: self.rpm,
            _state: PhantomData,
        })
    }
}

impl Setpoint<Validated> {
    pub fn rpm(&self) -> f64 {
        self.rpm
    }
}
