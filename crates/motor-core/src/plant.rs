//! Simulated motor plant: first-order speed response and a lumped thermal
//! model. Both are driven purely by the control output.

pub const MOTOR_MAX_RPM: f64 = 3000.0;
pub const AMBIENT_TEMP_C: f64 = 25.0;
pub const MAX_TEMP_C: f64 = 130.0;

/// Fraction of the remaining speed gap closed per step.
pub const SPEED_FILTER_ALPHA: f64 = 0.2;
pub const HEAT_GAIN: f64 = 0.08;
pub const COOL_GAIN: f64 = 0.02;

/// Speed the motor settles at for a given output percentage.
pub fn target_rpm(control_output_pct: f64) -> f64 {
    (control_output_pct / 100.0) * MOTOR_MAX_RPM
}

/// Move `measured_rpm` one low-pass step towards the speed commanded by
/// `control_output_pct`.
pub fn advance_speed(measured_rpm: f64, control_output_pct: f64) -> f64 {
    measured_rpm + (target_rpm(control_output_pct) - measured_rpm) * SPEED_FILTER_ALPHA
}

/// One thermal step: heating grows with the square of normalised speed,
/// cooling is proportional to the rise above ambient. Result is clamped to
/// `[AMBIENT_TEMP_C, MAX_TEMP_C]`.
pub fn advance_temperature(temperature_c: f64, measured_rpm: f64) -> f64 {
    let speed_norm = measured_rpm.abs() / MOTOR_MAX_RPM;
    let heating = HEAT_GAIN * speed_norm * speed_norm;
    let cooling = COOL_GAIN * (temperature_c - AMBIENT_TEMP_C);
    (temperature_c + heating - cooling).clamp(AMBIENT_TEMP_C, MAX_TEMP_C)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_moves_a_fifth_of_the_gap() {
        assert!((advance_speed(0.0, 100.0) - 600.0).abs() < 1e-9);
        assert!((advance_speed(3000.0, 0.0) - 2400.0).abs() < 1e-9);
        assert_eq!(advance_speed(1500.0, 50.0), 1500.0);
    }

    #[test]
    fn idle_motor_cools_towards_ambient() {
        let t = advance_temperature(75.0, 0.0);
        assert!((t - 74.0).abs() < 1e-9);
    }

    #[test]
    fn full_speed_heats_above_ambient() {
        let t = advance_temperature(AMBIENT_TEMP_C, MOTOR_MAX_RPM);
        assert!((t - (AMBIENT_TEMP_C + HEAT_GAIN)).abs() < 1e-9);
    }

    #[test]
    fn reverse_speed_heats_like_forward_speed() {
        assert_eq!(
            advance_temperature(40.0, -1200.0),
            advance_temperature(40.0, 1200.0)
        );
    }

    #[test]
    fn temperature_is_clamped() {
        assert_eq!(advance_temperature(0.0, 0.0), AMBIENT_TEMP_C);
        assert_eq!(advance_temperature(200.0, 0.0), MAX_TEMP_C);
    }
}
