//! Bounded publish channel between the state store and its listeners.
//!
//! The store side only ever calls `try_send`, so a slow or stopped listener
//! can never stall a state update. The listener side logs setpoint changes
//! and mirrors every update into the metrics.

use crate::metrics::{record_update, PUBLISH_DROPPED};
use motor_core::{PublishError, StateObserver, StateUpdate, StopToken, UpdateKind};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

const LISTENER_POLL: Duration = Duration::from_millis(100);

pub struct ChannelPublisher {
    tx: SyncSender<StateUpdate>,
}

/// Create a publisher and the receiving end for a listener.
pub fn channel(capacity: usize) -> (ChannelPublisher, Receiver<StateUpdate>) {
    let (tx, rx) = mpsc::sync_channel(capacity);
    (ChannelPublisher { tx }, rx)
}

impl StateObserver for ChannelPublisher {
    fn publish(&self, update: &StateUpdate) -> Result<(), PublishError> {
        self.tx.try_send(*update).map_err(|e| {
            PUBLISH_DROPPED.inc();
            match e {
                TrySendError::Full(_) => PublishError::Full,
                TrySendError::Disconnected(_) => PublishError::Disconnected,
            }
        })
    }
}

#[derive(Clone, Default, Debug)]
pub struct ListenerStats {
    pub updates_received: u64,
    pub setpoint_changes_logged: u64,
}

/// Event-driven consumer of published state. Logs the setpoint only when it
/// differs from the last value it logged.
#[derive(Debug, Default)]
pub struct SetpointListener {
    last_logged_setpoint: Option<f64>,
    stats: ListenerStats,
}

impl SetpointListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle one update. Returns `true` when a setpoint change was logged.
    pub fn on_update(&mut self, update: &StateUpdate) -> bool {
        self.stats.updates_received += 1;
        record_update(update);

        let setpoint = update.state.setpoint_rpm;
        if self.last_logged_setpoint == Some(setpoint) {
            return false;
        }
        if update.kind == UpdateKind::Init {
            debug!(setpoint_rpm = setpoint, "Initial setpoint published");
        } else {
            info!(
                setpoint_rpm = setpoint as i64,
                sequence = update.sequence,
                "Setpoint changed"
            );
        }
        self.last_logged_setpoint = Some(setpoint);
        self.stats.setpoint_changes_logged += 1;
        true
    }

    pub fn stats(&self) -> &ListenerStats {
        &self.stats
    }
}

/// Run a [`SetpointListener`] on its own thread until a stop is requested
/// or every publisher is gone. Pending updates are drained before exit.
pub fn spawn_listener(
    rx: Receiver<StateUpdate>,
    stop: StopToken,
) -> std::io::Result<thread::JoinHandle<ListenerStats>> {
    thread::Builder::new()
        .name("state_listener".to_string())
        .spawn(move || {
            let mut listener = SetpointListener::new();
            loop {
                match rx.recv_timeout(LISTENER_POLL) {
                    Ok(update) => {
                        listener.on_update(&update);
                    }
                    Err(RecvTimeoutError::Timeout) => {
                        if stop.is_stopped() {
                            break;
                        }
                    }
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            while let Ok(update) = rx.try_recv() {
                listener.on_update(&update);
            }
            listener.stats().clone()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use motor_core::{MotorState, MotorStateAccess, StateStore};

    fn update(sequence: u64, kind: UpdateKind, setpoint: f64) -> StateUpdate {
        StateUpdate {
            sequence,
            kind,
            state: MotorState {
                setpoint_rpm: setpoint,
                ..MotorState::default()
            },
        }
    }

    #[test]
    fn listener_logs_only_setpoint_changes() {
        let mut listener = SetpointListener::new();
        assert!(listener.on_update(&update(1, UpdateKind::Init, 1500.0)));
        assert!(!listener.on_update(&update(2, UpdateKind::Feedback, 1500.0)));
        assert!(listener.on_update(&update(3, UpdateKind::Setpoint, 2000.0)));
        assert!(!listener.on_update(&update(4, UpdateKind::Setpoint, 2000.0)));
        assert_eq!(listener.stats().updates_received, 4);
        assert_eq!(listener.stats().setpoint_changes_logged, 2);
    }

    #[test]
    fn full_channel_drops_without_blocking() {
        let (publisher, rx) = channel(1);
        assert!(publisher.publish(&update(1, UpdateKind::Init, 1.0)).is_ok());
        assert_eq!(
            publisher.publish(&update(2, UpdateKind::Setpoint, 2.0)),
            Err(PublishError::Full)
        );
        drop(rx);
        assert_eq!(
            publisher.publish(&update(3, UpdateKind::Setpoint, 3.0)),
            Err(PublishError::Disconnected)
        );
    }

    #[test]
    fn store_updates_reach_listener_thread() {
        let (publisher, rx) = channel(DEFAULT_CHANNEL_CAPACITY);
        let stop = StopToken::new();
        let handle = spawn_listener(rx, stop.clone()).unwrap();

        let store = StateStore::with_observer(Box::new(publisher));
        store.init().unwrap();
        store.set_setpoint(2500.0).unwrap();
        store.update_feedback(10.0, 1.0, 25.0).unwrap();
        assert!(store.set_setpoint(5000.0).is_err());

        stop.request_stop();
        let stats = handle.join().unwrap();
        assert_eq!(stats.updates_received, 3);
        assert_eq!(stats.setpoint_changes_logged, 2);
    }
}
