/// Naming for one published motor value across logs, metrics and the wire.
#[derive(Debug, Clone, Copy)]
pub struct Tag {
    pub key: &'static str,
    pub metric: &'static str,
    pub help: &'static str,
}

pub const SETPOINT_RPM: Tag = Tag {
    key: "setpoint_rpm",
    metric: "motor_setpoint_rpm",
    help: "Operator-requested motor speed in RPM",
};

pub const MEASURED_RPM: Tag = Tag {
    key: "measured_rpm",
    metric: "motor_measured_rpm",
    help: "Simulated measured motor speed in RPM",
};

pub const CONTROL_OUTPUT_PCT: Tag = Tag {
    key: "control_output_pct",
    metric: "motor_control_output_percent",
    help: "Actuator output in percent of full scale",
};

pub const TEMPERATURE_C: Tag = Tag {
    key: "temperature_c",
    metric: "motor_temperature_celsius",
    help: "Simulated motor temperature in Celsius",
};

pub const STATE_SEQUENCE: Tag = Tag {
    key: "sequence",
    metric: "motor_state_sequence",
    help: "Sequence number of the last published state",
};

pub const ALL: [Tag; 4] = [SETPOINT_RPM, MEASURED_RPM, CONTROL_OUTPUT_PCT, TEMPERATURE_C];
