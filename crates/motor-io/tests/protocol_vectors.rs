use motor_core::{tags, MotorState, StateUpdate, UpdateKind};
use motor_io::protocol::{ProtocolVersion, StateMsg, STATE_TAGS};

fn update() -> StateUpdate {
    StateUpdate {
        sequence: 42,
        kind: UpdateKind::Feedback,
        state: MotorState {
            setpoint_rpm: 1500.0,
            measured_rpm: 1234.5,
            control_output_pct: 41.0,
            temperature_c: 31.25,
        },
    }
}

#[test]
fn state_message_uses_tag_keys() {
    let line = StateMsg::from_update(&update(), 1_700_000_000_000_000)
        .to_json_line()
        .expect("state should serialize");
    let value: serde_json::Value = serde_json::from_str(&line).unwrap();

    assert_eq!(value["type"], "state");
    assert_eq!(value["kind"], "feedback");
    assert_eq!(value["sequence"], 42);
    assert_eq!(value["protocol_version"]["major"], 1);
    for tag in STATE_TAGS {
        assert!(value.get(tag.key).is_some(), "missing field {}", tag.key);
    }
    assert_eq!(value[tags::MEASURED_RPM.key], 1234.5);
}

#[test]
fn parses_state_message() {
    let raw = r#"{
        "type":"state",
        "protocol_version":{"major":1,"minor":0},
        "sequence":7,
        "kind":"setpoint",
        "unix_us":1700000000000000,
        "setpoint_rpm":2000.0,
        "measured_rpm":0.0,
        "control_output_pct":0.0,
        "temperature_c":25.0
    }"#;

    let msg = StateMsg::parse(raw).expect("state should parse");
    assert_eq!(msg.protocol_version, ProtocolVersion::v1());
    assert_eq!(msg.kind, UpdateKind::Setpoint);
    assert_eq!(msg.state().setpoint_rpm, 2000.0);
}

#[test]
fn rejects_other_types_and_versions() {
    let wrong_type = r#"{"type":"hello","sequence":1,"kind":"init","unix_us":0,
        "setpoint_rpm":0.0,"measured_rpm":0.0,"control_output_pct":0.0,"temperature_c":25.0}"#;
    assert!(StateMsg::parse(wrong_type).is_none());

    let wrong_version = r#"{"type":"state","protocol_version":{"major":2,"minor":0},
        "sequence":1,"kind":"init","unix_us":0,
        "setpoint_rpm":0.0,"measured_rpm":0.0,"control_output_pct":0.0,"temperature_c":25.0}"#;
    assert!(StateMsg::parse(wrong_version).is_none());

    assert!(StateMsg::parse("not json").is_none());
}
