pub mod control;
pub mod control_loop;
pub mod error;
pub mod fault;
pub mod fault_monitor;
pub mod periodic;
pub mod plant;
pub mod setpoint;
mod setpoint_proptest;
pub mod state;
pub mod tags;
pub mod timebase;

pub use control::{control_step, control_step_with_derating, Derating};
pub use control_loop::{ControlConfig, ControlLoop, ExecutionStats};
pub use error::{PublishError, StateError};
pub use fault::{evaluate_faults, FaultFlags, FaultThresholds};
pub use fault_monitor::{FaultConfig, FaultMonitor, FaultMonitorTask, FaultOutcome, RateLimiter};
pub use periodic::{spawn_periodic, DriverStats, PeriodicDriver, PeriodicTask, StopToken};
pub use setpoint::{Setpoint, SetpointRange, Unvalidated, Validated, MAX_SETPOINT_RPM};
pub use state::{
    MotorState, MotorStateAccess, NoopObserver, StateObserver, StateStore, StateUpdate,
    UpdateKind,
};
pub use timebase::{Clock, TimeBase};
