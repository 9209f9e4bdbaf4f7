//! Error types surfaced by the state store and its observer.

use thiserror::Error;

/// Errors returned by the motor state store.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum StateError {
    #[error("setpoint {requested} rpm outside allowed range [{min}, {max}]")]
    OutOfRange { requested: f64, min: f64, max: f64 },
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("state lock poisoned")]
    LockPoisoned,
    #[error("sample signal wait failed")]
    SignalWait,
}

/// Advisory publish failures. Logged by the store, never returned to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PublishError {
    #[error("observer channel full")]
    Full,
    #[error("observer channel disconnected")]
    Disconnected,
}
