//! Fixed-period task driver.
//!
//! Business logic implements [`PeriodicTask::run_once`]; the driver owns the
//! timing, the stop check and the log-and-skip handling of failed iterations.

use crate::error::StateError;
use log::{error, info, warn};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

/// Shared stop request. Sleeping drivers wake as soon as it is raised.
#[derive(Clone, Default)]
pub struct StopToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        let (flag, cvar) = &*self.inner;
        *flag.lock().unwrap_or_else(PoisonError::into_inner) = true;
        cvar.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        *self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sleep for `timeout` unless a stop arrives first. Returns `true` when
    /// stopped.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (flag, cvar) = &*self.inner;
        let guard = flag.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = cvar
            .wait_timeout_while(guard, timeout, |stopped| !*stopped)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }

    /// Block until a stop is requested.
    pub fn wait(&self) {
        let (flag, cvar) = &*self.inner;
        let guard = flag.lock().unwrap_or_else(PoisonError::into_inner);
        let _stopped = cvar
            .wait_while(guard, |stopped| !*stopped)
            .unwrap_or_else(PoisonError::into_inner);
    }
}

pub trait PeriodicTask: Send {
    fn name(&self) -> &'static str;

    /// One iteration. An error skips the iteration; the cadence continues.
    fn run_once(&mut self) -> Result<(), StateError>;
}

#[derive(Clone, Default, Debug)]
pub struct DriverStats {
    pub iterations: u64,
    pub skipped: u64,
    pub overruns: u64,
}

pub struct PeriodicDriver {
    period: Duration,
    stop: StopToken,
    stats: DriverStats,
}

impl PeriodicDriver {
    pub fn new(period: Duration, stop: StopToken) -> Self {
        Self {
            period,
            stop,
            stats: DriverStats::default(),
        }
    }

    /// Run `task` every period until a stop is requested. An iteration that
    /// is already running when the stop arrives completes normally.
    pub fn run<T: PeriodicTask + ?Sized>(&mut self, task: &mut T) {
        let mut next_cycle = Instant::now();

        while !self.stop.is_stopped() {
            if let Err(e) = task.run_once() {
                error!("T[{}] iteration skipped: {}", task.name(), e);
                self.stats.skipped += 1;
            }
            self.stats.iterations += 1;

            next_cycle += self.period;
            let now = Instant::now();
            if now >= next_cycle {
                self.stats.overruns += 1;
                warn!(
                    "T[{}] overran period by {} us",
                    task.name(),
                    now.duration_since(next_cycle).as_micros()
                );
                next_cycle = now;
                continue;
            }
            if self.stop.wait_timeout(next_cycle - now) {
                break;
            }
        }
    }

    pub fn stats(&self) -> &DriverStats {
        &self.stats
    }
}

/// Run `task` on a dedicated named thread. The join handle hands the task
/// back together with the driver statistics.
pub fn spawn_periodic<T: PeriodicTask + 'static>(
    mut task: T,
    period: Duration,
    stop: StopToken,
) -> std::io::Result<thread::JoinHandle<(T, DriverStats)>> {
    let name = task.name();
    let handle = thread::Builder::new().name(name.to_string()).spawn(move || {
        let mut driver = PeriodicDriver::new(period, stop);
        driver.run(&mut task);
        let stats = driver.stats().clone();
        (task, stats)
    })?;
    info!("Thread '{}' started (period {} ms)", name, period.as_millis());
    Ok(handle)
}
