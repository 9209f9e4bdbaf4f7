use std::io::Write;
use std::process::{Child, Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

fn sim() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_motor-sim"));
    cmd.env("RUST_LOG", "warn")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    cmd
}

/// Wait for the child with a deadline so a hung shutdown fails the test
/// instead of hanging it.
fn wait_with_deadline(mut child: Child, deadline: Duration) -> Output {
    let start = Instant::now();
    loop {
        match child.try_wait().expect("Failed to poll motor-sim") {
            Some(_) => return child.wait_with_output().expect("Failed to collect output"),
            None if start.elapsed() > deadline => {
                let _ = child.kill();
                panic!("motor-sim did not exit within {:?}", deadline);
            }
            None => thread::sleep(Duration::from_millis(50)),
        }
    }
}

#[test]
fn timed_run_exits_cleanly() {
    let child = sim()
        .args(["--run-seconds", "1", "--no-shell", "--control-period-ms", "10"])
        .spawn()
        .expect("Failed to start motor-sim");

    let output = wait_with_deadline(child, Duration::from_secs(10));
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn shell_commands_round_trip() {
    let mut child = sim().spawn().expect("Failed to start motor-sim");
    {
        let stdin = child.stdin.as_mut().expect("stdin piped");
        stdin
            .write_all(b"motor_set 1234\nmotor_set 5000\nmotor_info\nmotor_json\nquit\n")
            .expect("Failed to write commands");
    }

    let output = wait_with_deadline(child, Duration::from_secs(10));
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 4, "unexpected output: {stdout}");
    assert_eq!(lines[0], "Setpoint set to 1234 rpm");
    assert!(lines[1].starts_with("error:"), "got {}", lines[1]);
    assert!(lines[2].starts_with("SP=1234 rpm, MEAS="), "got {}", lines[2]);
    assert!(lines[3].contains("\"type\":\"state\""), "got {}", lines[3]);
    assert!(lines[3].contains("\"setpoint_rpm\":1234.0"), "got {}", lines[3]);
}

#[test]
fn help_lists_options() {
    let output = sim()
        .arg("--help")
        .output()
        .expect("Failed to run motor-sim --help");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--run-seconds"));
    assert!(stdout.contains("motor_set <rpm>"));
}
