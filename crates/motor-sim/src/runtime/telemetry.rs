use motor_core::{MotorStateAccess, StateStore, StopToken};
use motor_io::metrics::{init_metrics, serve_metrics};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Clone, Debug)]
pub struct TelemetryConfig {
    /// Log every Nth sample. Zero disables sample logging.
    pub log_every: u32,
    /// Upper bound on one wait, so a stop request is noticed.
    pub poll: Duration,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_every: 10,
            poll: Duration::from_millis(200),
        }
    }
}

/// Passes one sample in every `every`.
#[derive(Debug)]
pub struct SampleDecimator {
    every: u32,
    counter: u32,
}

impl SampleDecimator {
    pub fn new(every: u32) -> Self {
        Self { every, counter: 0 }
    }

    pub fn should_log(&mut self) -> bool {
        if self.every == 0 {
            return false;
        }
        self.counter += 1;
        if self.counter >= self.every {
            self.counter = 0;
            true
        } else {
            false
        }
    }
}

#[derive(Clone, Default, Debug)]
pub struct TelemetryStats {
    pub samples: u64,
    pub logged: u64,
}

pub fn init() {
    init_metrics();
}

pub fn start_metrics_server(addr: &Option<String>) -> Option<thread::JoinHandle<()>> {
    addr.as_ref().map(|addr| {
        info!(addr = %addr, "Starting metrics server");
        serve_metrics(addr.clone())
    })
}

/// Consume sample signals and log a decimated view of the state.
pub fn start_telemetry(
    store: Arc<StateStore>,
    config: TelemetryConfig,
    stop: StopToken,
) -> std::io::Result<thread::JoinHandle<TelemetryStats>> {
    thread::Builder::new()
        .name("telemetry".to_string())
        .spawn(move || {
            let mut decimator = SampleDecimator::new(config.log_every);
            let mut stats = TelemetryStats::default();
            while !stop.is_stopped() {
                match store.wait_for_sample_timeout(config.poll) {
                    Ok(true) => {
                        stats.samples += 1;
                        if !decimator.should_log() {
                            continue;
                        }
                        match store.snapshot() {
                            Ok(state) => {
                                stats.logged += 1;
                                info!(%state, "telemetry");
                            }
                            Err(e) => warn!(error = %e, "telemetry snapshot failed"),
                        }
                    }
                    Ok(false) => {}
                    Err(e) => {
                        warn!(error = %e, "sample wait failed");
                        stop.wait_timeout(config.poll);
                    }
                }
            }
            stats
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimator_passes_every_nth_sample() {
        let mut decimator = SampleDecimator::new(3);
        let passed: Vec<bool> = (0..7).map(|_| decimator.should_log()).collect();
        assert_eq!(passed, [false, false, true, false, false, true, false]);
    }

    #[test]
    fn decimator_zero_never_logs() {
        let mut decimator = SampleDecimator::new(0);
        assert!((0..20).all(|_| !decimator.should_log()));
    }

    #[test]
    fn telemetry_consumes_samples_until_stopped() {
        let store = Arc::new(StateStore::new());
        store.init().unwrap();
        for i in 0..4 {
            store.update_feedback(i as f64, 1.0, 25.0).unwrap();
        }

        let stop = StopToken::new();
        let config = TelemetryConfig {
            log_every: 2,
            poll: Duration::from_millis(10),
        };
        let handle = start_telemetry(Arc::clone(&store), config, stop.clone()).unwrap();

        thread::sleep(Duration::from_millis(300));
        stop.request_stop();
        let stats = handle.join().unwrap();
        assert_eq!(stats.samples, 4);
        assert_eq!(stats.logged, 2);
    }
}
