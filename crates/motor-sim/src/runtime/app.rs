use crate::runtime::config::RuntimeConfig;
use crate::runtime::logging::init_tracing;
use crate::runtime::telemetry;
use crate::shell::{spawn_stdin_shell, Shell};
use motor_core::{
    spawn_periodic, ControlLoop, FaultMonitor, FaultMonitorTask, MotorStateAccess, StateStore,
    StopToken, TimeBase,
};
use motor_io::publish::{channel, spawn_listener, DEFAULT_CHANNEL_CAPACITY};
use std::io;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

pub fn run_from_args() -> io::Result<()> {
    let config = RuntimeConfig::from_env();
    if config.show_help {
        RuntimeConfig::print_help();
        return Ok(());
    }
    run(config)
}

fn join<T>(handle: thread::JoinHandle<T>) -> io::Result<T> {
    let name = handle.thread().name().unwrap_or("unnamed").to_string();
    handle
        .join()
        .map_err(|_| io::Error::other(format!("thread '{name}' panicked")))
}

pub fn run(config: RuntimeConfig) -> io::Result<()> {
    // Initialize tracing; the guard flushes the log file on exit
    let _log_guard = init_tracing(config.json_logs, config.log_file.as_deref())?;

    // Initialize metrics
    telemetry::init();

    // Start metrics server if enabled
    let _metrics_handle = telemetry::start_metrics_server(&config.metrics_addr);

    let stop = StopToken::new();
    let timebase = TimeBase::new();

    let (publisher, updates) = channel(DEFAULT_CHANNEL_CAPACITY);
    let listener_handle = spawn_listener(updates, stop.clone())?;

    let store = Arc::new(StateStore::with_observer(Box::new(publisher)));
    store
        .init()
        .map_err(|e| io::Error::other(format!("state init failed: {e}")))?;

    if let Some(rpm) = config.initial_setpoint {
        if let Err(e) = store.set_setpoint(rpm) {
            warn!(error = %e, "Initial setpoint ignored");
        }
    }

    info!(
        period_ms = config.control.period.as_millis(),
        "Starting motor control loop"
    );
    let control_handle = spawn_periodic(
        ControlLoop::new(Arc::clone(&store)),
        config.control.period,
        stop.clone(),
    )?;

    let monitor = FaultMonitor::from_config(&config.fault);
    let thresholds = *monitor.thresholds();
    info!(
        period_ms = config.fault.period.as_millis(),
        speed_error_rpm = thresholds.speed_error_rpm,
        soft_temp_c = thresholds.soft_temp_c,
        hard_temp_c = thresholds.hard_temp_c,
        report_interval_ms = config.fault.min_report_interval.as_millis(),
        "Starting fault monitor"
    );
    let fault_handle = spawn_periodic(
        FaultMonitorTask::new(Arc::clone(&store), monitor, timebase),
        config.fault.period,
        stop.clone(),
    )?;

    let telemetry_handle =
        telemetry::start_telemetry(Arc::clone(&store), config.telemetry.clone(), stop.clone())?;

    // Not joined: a blocking stdin read cannot be interrupted.
    if config.shell_enabled {
        spawn_stdin_shell(Shell::new(Arc::clone(&store), timebase), stop.clone())?;
        info!("Motor simulator running. Type 'help' for shell commands.");
    } else {
        info!("Motor simulator running (shell disabled)");
    }

    match config.run_seconds {
        Some(seconds) => {
            info!(seconds, "Running for limited duration");
            stop.wait_timeout(Duration::from_secs(seconds));
        }
        None => stop.wait(),
    }
    stop.request_stop();

    let (control, control_driver) = join(control_handle)?;
    let (fault, fault_driver) = join(fault_handle)?;
    let telemetry_stats = join(telemetry_handle)?;
    let listener_stats = join(listener_handle)?;

    let control_stats = control.stats();
    let fault_stats = fault.monitor().stats();
    info!(
        control_iterations = control_driver.iterations,
        control_skipped = control_driver.skipped,
        control_overruns = control_driver.overruns,
        soft_derated_cycles = control_stats.soft_derated_cycles,
        hard_derated_cycles = control_stats.hard_derated_cycles,
        fault_evaluations = fault_stats.evaluations,
        faulted_evaluations = fault_stats.faulted_evaluations,
        fault_reports = fault_stats.reports,
        fault_skipped = fault_driver.skipped,
        samples = telemetry_stats.samples,
        updates_received = listener_stats.updates_received,
        "Run complete"
    );

    Ok(())
}
