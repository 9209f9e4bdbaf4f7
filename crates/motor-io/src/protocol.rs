use motor_core::{tags, MotorState, StateUpdate, UpdateKind};
use serde::{Deserialize, Serialize};

pub const STATE_TAGS: &[tags::Tag] = &tags::ALL;

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ProtocolVersion {
    pub major: u8,
    pub minor: u8,
}

impl ProtocolVersion {
    pub const fn v1() -> Self {
        Self { major: 1, minor: 0 }
    }

    pub fn is_supported(&self) -> bool {
        self.major == 1
    }
}

/// One published motor state, as a single JSON line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StateMsg {
    #[serde(rename = "type")]
    pub msg_type: String,
    #[serde(default)]
    pub protocol_version: ProtocolVersion,
    pub sequence: u64,
    pub kind: UpdateKind,
    pub unix_us: u64,
    pub setpoint_rpm: f64,
    pub measured_rpm: f64,
    pub control_output_pct: f64,
    pub temperature_c: f64,
}

impl StateMsg {
    pub fn from_update(update: &StateUpdate, unix_us: u64) -> Self {
        let MotorState {
            setpoint_rpm,
            measured_rpm,
            control_output_pct,
            temperature_c,
        } = update.state;
        Self {
            msg_type: "state".to_string(),
            protocol_version: ProtocolVersion::v1(),
            sequence: update.sequence,
            kind: update.kind,
            unix_us,
            setpoint_rpm,
            measured_rpm,
            control_output_pct,
            temperature_c,
        }
    }

    pub fn state(&self) -> MotorState {
        MotorState {
            setpoint_rpm: self.setpoint_rpm,
            measured_rpm: self.measured_rpm,
            control_output_pct: self.control_output_pct,
            temperature_c: self.temperature_c,
        }
    }

    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parse a state line, rejecting other message types and unsupported
    /// protocol versions.
    pub fn parse(line: &str) -> Option<Self> {
        let parsed: StateMsg = serde_json::from_str(line).ok()?;
        if parsed.msg_type == "state" && parsed.protocol_version.is_supported() {
            Some(parsed)
        } else {
            None
        }
    }
}
