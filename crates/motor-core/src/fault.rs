//! Fault word and its pure evaluation against thresholds.

use crate::control::{HARD_LIMIT_TEMP_C, SOFT_LIMIT_TEMP_C};
use crate::state::MotorState;
use bitflags::bitflags;

pub const FAULT_SPEED_ERROR_RPM: f64 = 300.0;

bitflags! {
    /// Fault conditions found in one monitoring cycle.
    ///
    /// The temperature bits are exclusive: when the hard limit is exceeded
    /// only `TEMP_HARD` is set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FaultFlags: u32 {
        /// Absolute speed error exceeds threshold.
        const SPEED_ERROR = 1 << 0;
        /// Temperature exceeds soft limit.
        const TEMP_SOFT   = 1 << 1;
        /// Temperature exceeds hard limit.
        const TEMP_HARD   = 1 << 2;
    }
}

impl FaultFlags {
    pub const NONE: Self = Self::empty();
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaultThresholds {
    pub speed_error_rpm: f64,
    pub soft_temp_c: f64,
    pub hard_temp_c: f64,
}

impl Default for FaultThresholds {
    fn default() -> Self {
        Self {
            speed_error_rpm: FAULT_SPEED_ERROR_RPM,
            soft_temp_c: SOFT_LIMIT_TEMP_C,
            hard_temp_c: HARD_LIMIT_TEMP_C,
        }
    }
}

/// Evaluate fault flags for a state snapshot. All comparisons are strict, so
/// a value sitting exactly on a threshold is not a fault.
pub fn evaluate_faults(state: &MotorState, thresholds: &FaultThresholds) -> FaultFlags {
    let mut flags = FaultFlags::NONE;

    if (state.setpoint_rpm - state.measured_rpm).abs() > thresholds.speed_error_rpm {
        flags |= FaultFlags::SPEED_ERROR;
    }

    if state.temperature_c > thresholds.hard_temp_c {
        flags |= FaultFlags::TEMP_HARD;
    } else if state.temperature_c > thresholds.soft_temp_c {
        flags |= FaultFlags::TEMP_SOFT;
    }

    flags
}


#[cfg(test)]
mod proptest_fault {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        // Property: soft and hard temperature bits are never set together
        #[test]
        fn temperature_bits_exclusive(
            setpoint in 0.0f64..=3000.0,
            measured in 0.0f64..=3000.0,
            temp in 0.0f64..=200.0,
        ) {
            let flags = evaluate_faults(
                &MotorState {
                    setpoint_rpm: setpoint,
                    measured_rpm: measured,
                    control_output_pct: 0.0,
                    temperature_c: temp,
                },
                &FaultThresholds::default(),
            );
            prop_assert!(!flags.contains(FaultFlags::TEMP_SOFT | FaultFlags::TEMP_HARD));
            prop_assert_eq!(flags.contains(FaultFlags::TEMP_HARD), temp > 100.0);
            prop_assert_eq!(
                flags.contains(FaultFlags::SPEED_ERROR),
                (setpoint - measured).abs() > 300.0
            );
        }
    }
}
