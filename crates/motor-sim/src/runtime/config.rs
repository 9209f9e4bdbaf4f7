use crate::runtime::telemetry::TelemetryConfig;
use motor_core::{ControlConfig, FaultConfig};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub show_help: bool,
    pub run_seconds: Option<u64>,
    pub json_logs: bool,
    pub log_file: Option<PathBuf>,
    pub metrics_addr: Option<String>,
    pub shell_enabled: bool,
    pub initial_setpoint: Option<f64>,
    pub control: ControlConfig,
    pub fault: FaultConfig,
    pub telemetry: TelemetryConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            show_help: false,
            run_seconds: None,
            json_logs: false,
            log_file: None,
            metrics_addr: None,
            shell_enabled: true,
            initial_setpoint: None,
            control: ControlConfig::default(),
            fault: FaultConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

fn parse_millis(value: &str) -> Option<Duration> {
    value
        .parse::<u64>()
        .ok()
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
}

fn parse_finite(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        let args: Vec<String> = std::env::args().collect();
        Self::from_args(&args)
    }

    /// Parse command-line arguments. Unknown flags and unparsable values
    /// are ignored and the default kept.
    pub fn from_args(args: &[String]) -> Self {
        let mut cfg = RuntimeConfig::default();
        let mut i = 1;
        while i < args.len() {
            let value = args.get(i + 1).map(String::as_str);
            match (args[i].as_str(), value) {
                ("--run-seconds", Some(v)) => {
                    cfg.run_seconds = v.parse::<u64>().ok();
                    i += 1;
                }
                ("--json-logs", _) => {
                    cfg.json_logs = true;
                }
                ("--log-file", Some(v)) => {
                    cfg.log_file = Some(PathBuf::from(v));
                    i += 1;
                }
                ("--metrics-addr", Some(v)) => {
                    cfg.metrics_addr = Some(v.to_string());
                    i += 1;
                }
                ("--no-shell", _) => {
                    cfg.shell_enabled = false;
                }
                ("--setpoint", Some(v)) => {
                    cfg.initial_setpoint = parse_finite(v);
                    i += 1;
                }
                ("--control-period-ms", Some(v)) => {
                    if let Some(period) = parse_millis(v) {
                        cfg.control.period = period;
                    }
                    i += 1;
                }
                ("--fault-period-ms", Some(v)) => {
                    if let Some(period) = parse_millis(v) {
                        cfg.fault.period = period;
                    }
                    i += 1;
                }
                ("--fault-report-interval-ms", Some(v)) => {
                    if let Ok(ms) = v.parse::<u64>() {
                        cfg.fault.min_report_interval = Duration::from_millis(ms);
                    }
                    i += 1;
                }
                ("--speed-error-rpm", Some(v)) => {
                    if let Some(rpm) = parse_finite(v) {
                        cfg.fault.thresholds.speed_error_rpm = rpm;
                    }
                    i += 1;
                }
                ("--soft-temp-c", Some(v)) => {
                    if let Some(t) = parse_finite(v) {
                        cfg.fault.thresholds.soft_temp_c = t;
                    }
                    i += 1;
                }
                ("--hard-temp-c", Some(v)) => {
                    if let Some(t) = parse_finite(v) {
                        cfg.fault.thresholds.hard_temp_c = t;
                    }
                    i += 1;
                }
                ("--telemetry-every", Some(v)) => {
                    if let Ok(n) = v.parse::<u32>() {
                        cfg.telemetry.log_every = n;
                    }
                    i += 1;
                }
                ("--help" | "-h", _) => {
                    cfg.show_help = true;
                    break;
                }
                _ => {}
            }
            i += 1;
        }
        cfg
    }

    pub fn print_help() {
        println!(
            r#"motor-sim - Closed-loop motor controller simulation

USAGE:
    motor-sim [OPTIONS]

OPTIONS:
    --run-seconds <SECS>             Run for a fixed duration then exit
    --json-logs                      Output logs in JSON format (for log aggregation)
    --log-file <PATH>                Also write logs to the given file
    --metrics-addr <ADDR>            Enable Prometheus metrics server on address (e.g., 0.0.0.0:9090)
    --no-shell                       Do not read shell commands from stdin
    --setpoint <RPM>                 Initial setpoint [default: 1500]
    --control-period-ms <MS>         Control loop period [default: 50]
    --fault-period-ms <MS>           Fault monitor period [default: 2000]
    --fault-report-interval-ms <MS>  Minimum time between fault reports [default: 10000]
    --speed-error-rpm <RPM>          Speed error fault threshold [default: 300]
    --soft-temp-c <C>                Soft temperature fault threshold [default: 80]
    --hard-temp-c <C>                Hard temperature fault threshold [default: 100]
    --telemetry-every <N>            Log every Nth sample, 0 disables [default: 10]
    -h, --help                       Print this help message

SHELL COMMANDS:
    motor_set <rpm>                  Set motor speed setpoint (0..3000 rpm)
    motor_info                       Print current motor state snapshot
    motor_json                       Print the last published state as JSON
    help                             List shell commands
    quit                             Stop the simulator

ENVIRONMENT VARIABLES:
    RUST_LOG                         Set log filter (e.g., RUST_LOG=debug,motor_core=trace)

EXAMPLES:
    # Basic run with metrics
    motor-sim --metrics-addr 0.0.0.0:9090

    # Short unattended run
    motor-sim --run-seconds 10 --no-shell
"#
        );
    }
}
