//! Line-oriented operator shell.
//!
//! `motor_set` and `motor_info` are the interactive surface; `motor_json`
//! prints the last published update in the wire format.

use motor_core::{MotorStateAccess, StateError, StateStore, StopToken, TimeBase};
use motor_io::metrics::SETPOINT_REJECTIONS;
use motor_io::StateMsg;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::thread;
use thiserror::Error;
use tracing::{debug, info, warn};

const HELP: &str = "\
motor_set <rpm>   set motor speed setpoint
motor_info        print motor state snapshot
motor_json        print last published state as JSON
help              list commands
quit              stop the simulator";

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("usage: motor_set <rpm>")]
    Usage,
    #[error("invalid rpm value '{0}'")]
    InvalidValue(String),
    #[error("rpm must be non-negative")]
    Negative,
    #[error("rpm must be at most {max}")]
    OutOfRange { max: f64 },
    #[error("unknown command (try 'help')")]
    UnknownCommand,
    #[error(transparent)]
    State(#[from] StateError),
    #[error("failed to encode state: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, PartialEq)]
pub enum ShellOutcome {
    Output(String),
    Quit,
}

pub struct Shell {
    store: Arc<StateStore>,
    timebase: TimeBase,
}

impl Shell {
    pub fn new(store: Arc<StateStore>, timebase: TimeBase) -> Self {
        Self { store, timebase }
    }

    /// Run one command line. Blank lines produce empty output.
    pub fn execute(&self, line: &str) -> Result<ShellOutcome, ShellError> {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            return Ok(ShellOutcome::Output(String::new()));
        };
        let args: Vec<&str> = words.collect();

        match command {
            "motor_set" => self.motor_set(&args),
            "motor_info" => {
                let state = self.store.snapshot()?;
                Ok(ShellOutcome::Output(state.to_string()))
            }
            "motor_json" => {
                let update = self.store.latest_update()?;
                let line = StateMsg::from_update(&update, self.timebase.unix_us()).to_json_line()?;
                Ok(ShellOutcome::Output(line))
            }
            "help" => Ok(ShellOutcome::Output(HELP.to_string())),
            "quit" | "exit" => Ok(ShellOutcome::Quit),
            _ => Err(ShellError::UnknownCommand),
        }
    }

    fn motor_set(&self, args: &[&str]) -> Result<ShellOutcome, ShellError> {
        let [raw] = args else {
            return Err(ShellError::Usage);
        };
        let result = self.apply_setpoint(raw);
        if result.is_err() {
            SETPOINT_REJECTIONS.inc();
        }
        result
    }

    fn apply_setpoint(&self, raw: &str) -> Result<ShellOutcome, ShellError> {
        let rpm: f64 = raw
            .parse()
            .map_err(|_| ShellError::InvalidValue(raw.to_string()))?;
        if rpm.is_nan() {
            return Err(ShellError::InvalidValue(raw.to_string()));
        }
        if rpm < 0.0 {
            return Err(ShellError::Negative);
        }
        let range = self.store.setpoint_range();
        if rpm > range.max_rpm {
            return Err(ShellError::OutOfRange { max: range.max_rpm });
        }
        self.store.set_setpoint(rpm)?;
        Ok(ShellOutcome::Output(format!("Setpoint set to {rpm} rpm")))
    }
}

/// Read commands from stdin on a dedicated thread. `quit` requests a stop;
/// end of input just ends the thread.
pub fn spawn_stdin_shell(
    shell: Shell,
    stop: StopToken,
) -> io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("shell".to_string())
        .spawn(move || {
            let stdin = io::stdin();
            let mut stdout = io::stdout();
            for line in stdin.lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        warn!(error = %e, "stdin read failed");
                        break;
                    }
                };
                if stop.is_stopped() {
                    break;
                }
                debug!(command = %line.trim(), "shell command");
                let reply = match shell.execute(&line) {
                    Ok(ShellOutcome::Output(text)) => text,
                    Ok(ShellOutcome::Quit) => {
                        info!("Quit requested from shell");
                        stop.request_stop();
                        break;
                    }
                    Err(e) => format!("error: {e}"),
                };
                if reply.is_empty() {
                    continue;
                }
                if writeln!(stdout, "{reply}").and_then(|_| stdout.flush()).is_err() {
                    break;
                }
            }
            debug!("shell input closed");
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use motor_core::MAX_SETPOINT_RPM;

    fn shell() -> Shell {
        let store = Arc::new(StateStore::new());
        store.init().unwrap();
        Shell::new(store, TimeBase::new())
    }

    fn output(result: Result<ShellOutcome, ShellError>) -> String {
        match result {
            Ok(ShellOutcome::Output(text)) => text,
            other => panic!("expected output, got {other:?}"),
        }
    }

    #[test]
    fn motor_set_updates_setpoint() {
        let shell = shell();
        assert_eq!(
            output(shell.execute("motor_set 1234")),
            "Setpoint set to 1234 rpm"
        );
        assert_eq!(shell.store.snapshot().unwrap().setpoint_rpm, 1234.0);
    }

    #[test]
    fn motor_set_rejections_leave_state() {
        let shell = shell();
        assert!(matches!(shell.execute("motor_set"), Err(ShellError::Usage)));
        assert!(matches!(
            shell.execute("motor_set 1 2"),
            Err(ShellError::Usage)
        ));
        assert!(matches!(
            shell.execute("motor_set fast"),
            Err(ShellError::InvalidValue(_))
        ));
        assert!(matches!(
            shell.execute("motor_set -5"),
            Err(ShellError::Negative)
        ));
        match shell.execute("motor_set 3001") {
            Err(ShellError::OutOfRange { max }) => assert_eq!(max, MAX_SETPOINT_RPM),
            other => panic!("expected out of range, got {other:?}"),
        }
        assert_eq!(shell.store.snapshot().unwrap().setpoint_rpm, 1500.0);
    }

    #[test]
    fn motor_set_echoes_fractional_value_as_stored() {
        let shell = shell();
        assert_eq!(
            output(shell.execute("motor_set 1500.7")),
            "Setpoint set to 1500.7 rpm"
        );
        assert_eq!(shell.store.snapshot().unwrap().setpoint_rpm, 1500.7);
    }

    #[test]
    fn motor_set_rejects_infinity_as_out_of_range() {
        let shell = shell();
        assert!(matches!(
            shell.execute("motor_set inf"),
            Err(ShellError::OutOfRange { .. })
        ));
    }

    #[test]
    fn motor_set_accepts_bounds() {
        let shell = shell();
        assert_eq!(output(shell.execute("motor_set 0")), "Setpoint set to 0 rpm");
        assert_eq!(
            output(shell.execute("motor_set 3000")),
            "Setpoint set to 3000 rpm"
        );
    }

    #[test]
    fn motor_info_formats_snapshot() {
        let shell = shell();
        shell.store.update_feedback(999.9, 33.3, 41.7).unwrap();
        assert_eq!(
            output(shell.execute("  motor_info  ")),
            "SP=1500 rpm, MEAS=999 rpm, OUT=33%, T=41 C"
        );
    }

    #[test]
    fn motor_json_prints_last_update() {
        let shell = shell();
        shell.execute("motor_set 2000").unwrap();
        let line = output(shell.execute("motor_json"));
        let msg = StateMsg::parse(&line).expect("valid state line");
        assert_eq!(msg.sequence, 2);
        assert_eq!(msg.state().setpoint_rpm, 2000.0);
    }

    #[test]
    fn misc_commands() {
        let shell = shell();
        assert_eq!(output(shell.execute("")), "");
        assert!(output(shell.execute("help")).contains("motor_set"));
        assert_eq!(shell.execute("quit").unwrap(), ShellOutcome::Quit);
        assert!(matches!(
            shell.execute("reboot"),
            Err(ShellError::UnknownCommand)
        ));
    }
}
