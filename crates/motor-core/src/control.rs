//! Proportional speed controller with thermal derating.

use crate::plant::{self, MOTOR_MAX_RPM};
use crate::state::MotorState;

/// Output change, in percent of full scale, per full-scale speed error.
pub const KP_PERCENT: f64 = 10.0;

pub const SOFT_LIMIT_TEMP_C: f64 = 80.0;
pub const HARD_LIMIT_TEMP_C: f64 = 100.0;
pub const SOFT_LIMIT_OUTPUT_PCT: f64 = 60.0;
pub const HARD_LIMIT_OUTPUT_PCT: f64 = 10.0;

/// Output restriction applied by the last control step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Derating {
    #[default]
    None,
    Soft,
    Hard,
}

/// Advance the controller and plant by one period.
pub fn control_step(state: &MotorState) -> MotorState {
    control_step_with_derating(state).0
}

/// Same as [`control_step`], also reporting which temperature limit clipped
/// the output.
pub fn control_step_with_derating(state: &MotorState) -> (MotorState, Derating) {
    let mut next = *state;

    let error = next.setpoint_rpm - next.measured_rpm;
    next.control_output_pct =
        (next.control_output_pct + (error / MOTOR_MAX_RPM) * KP_PERCENT).clamp(0.0, 100.0);

    next.measured_rpm = plant::advance_speed(next.measured_rpm, next.control_output_pct);
    next.temperature_c = plant::advance_temperature(next.temperature_c, next.measured_rpm);

    // Hard limit is checked last so it can restrict the soft-limited output further.
    let mut derating = Derating::None;
    if next.temperature_c > SOFT_LIMIT_TEMP_C && next.control_output_pct > SOFT_LIMIT_OUTPUT_PCT {
        next.control_output_pct = SOFT_LIMIT_OUTPUT_PCT;
        derating = Derating::Soft;
    }
    if next.temperature_c > HARD_LIMIT_TEMP_C && next.control_output_pct > HARD_LIMIT_OUTPUT_PCT {
        next.control_output_pct = HARD_LIMIT_OUTPUT_PCT;
        derating = Derating::Hard;
    }

    (next, derating)
}


#[cfg(test)]
mod proptest_control {
    use super::*;
    use crate::plant::{AMBIENT_TEMP_C, MAX_TEMP_C};
    use proptest::prelude::*;

    proptest! {
        // Property: output and temperature invariants hold after any step
        #[test]
        fn step_keeps_invariants(
            setpoint in 0.0f64..=3000.0,
            measured in -500.0f64..=3500.0,
            output in 0.0f64..=100.0,
            temp in -50.0f64..=300.0,
        ) {
            let s = control_step(&MotorState {
                setpoint_rpm: setpoint,
                measured_rpm: measured,
                control_output_pct: output,
                temperature_c: temp,
            });
            prop_assert!((0.0..=100.0).contains(&s.control_output_pct));
            prop_assert!((AMBIENT_TEMP_C..=MAX_TEMP_C).contains(&s.temperature_c));
            prop_assert_eq!(s.setpoint_rpm, setpoint);
            if s.temperature_c > HARD_LIMIT_TEMP_C {
                prop_assert!(s.control_output_pct <= HARD_LIMIT_OUTPUT_PCT);
            } else if s.temperature_c > SOFT_LIMIT_TEMP_C {
                prop_assert!(s.control_output_pct <= SOFT_LIMIT_OUTPUT_PCT);
            }
        }
    }
}
