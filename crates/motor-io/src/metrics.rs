//! Prometheus metrics for the motor simulator.
//!
//! Gauges mirror the last published motor state; counters track published
//! updates, dropped publishes and rejected setpoint commands.

use motor_core::{tags, StateUpdate, UpdateKind};
use prometheus::{
    Encoder, Gauge, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::sync::LazyLock;
use std::thread;
use tiny_http::{Header, Response, Server};

/// Global metrics registry
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Motor State Metrics
// ============================================================================

fn state_gauge(tag: tags::Tag) -> Gauge {
    let gauge = Gauge::new(tag.metric, tag.help).unwrap();
    REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
}

pub static SETPOINT_RPM: LazyLock<Gauge> = LazyLock::new(|| state_gauge(tags::SETPOINT_RPM));

pub static MEASURED_RPM: LazyLock<Gauge> = LazyLock::new(|| state_gauge(tags::MEASURED_RPM));

pub static CONTROL_OUTPUT_PCT: LazyLock<Gauge> =
    LazyLock::new(|| state_gauge(tags::CONTROL_OUTPUT_PCT));

pub static TEMPERATURE_C: LazyLock<Gauge> = LazyLock::new(|| state_gauge(tags::TEMPERATURE_C));

/// Sequence number of the last published state
pub static STATE_SEQUENCE: LazyLock<IntGauge> = LazyLock::new(|| {
    let gauge = IntGauge::new(tags::STATE_SEQUENCE.metric, tags::STATE_SEQUENCE.help).unwrap();
    REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

// ============================================================================
// Publish / Command Metrics
// ============================================================================

/// Published state updates, labelled by the mutation that produced them
pub static STATE_UPDATES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "motor_state_updates_total",
            "Published motor state updates by kind",
        ),
        &["kind"],
    )
    .unwrap();
    REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

/// Publishes dropped because the observer channel was full or closed
pub static PUBLISH_DROPPED: LazyLock<IntCounter> = LazyLock::new(|| {
    let counter = IntCounter::new(
        "motor_publish_dropped_total",
        "State publishes dropped by the observer channel",
    )
    .unwrap();
    REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

/// Setpoint commands rejected by range validation
pub static SETPOINT_REJECTIONS: LazyLock<IntCounter> = LazyLock::new(|| {
    let counter = IntCounter::new(
        "motor_setpoint_rejections_total",
        "Setpoint commands rejected by validation",
    )
    .unwrap();
    REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

fn kind_label(kind: UpdateKind) -> &'static str {
    match kind {
        UpdateKind::Init => "init",
        UpdateKind::Setpoint => "setpoint",
        UpdateKind::Feedback => "feedback",
    }
}

/// Mirror one published update into the gauges and counters.
pub fn record_update(update: &StateUpdate) {
    SETPOINT_RPM.set(update.state.setpoint_rpm);
    MEASURED_RPM.set(update.state.measured_rpm);
    CONTROL_OUTPUT_PCT.set(update.state.control_output_pct);
    TEMPERATURE_C.set(update.state.temperature_c);
    STATE_SEQUENCE.set(update.sequence as i64);
    STATE_UPDATES
        .with_label_values(&[kind_label(update.kind)])
        .inc();
}

// ============================================================================
// Metrics HTTP Server
// ============================================================================

fn encode_registry() -> Result<Vec<u8>, prometheus::Error> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(buffer)
}

/// Status code and body for one request path.
fn route(path: &str) -> (u16, Vec<u8>) {
    match path {
        "/metrics" => match encode_registry() {
            Ok(body) => (200, body),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to encode metrics");
                (500, b"Internal Server Error".to_vec())
            }
        },
        "/health" => (200, b"OK".to_vec()),
        // Ready once the control loop has produced a sample
        "/ready" if STATE_UPDATES.with_label_values(&["feedback"]).get() > 0 => {
            (200, b"Ready".to_vec())
        }
        "/ready" => (503, b"Not Ready".to_vec()),
        _ => (404, b"Not Found".to_vec()),
    }
}

/// Serve `/metrics`, `/health` and `/ready` on `bind_addr` from a
/// dedicated thread.
pub fn serve_metrics(bind_addr: String) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let server = match Server::http(&bind_addr) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(addr = %bind_addr, error = %e, "Failed to start metrics server");
                return;
            }
        };
        tracing::info!("Metrics server listening on http://{}/metrics", bind_addr);

        for request in server.incoming_requests() {
            let path = request.url().split('?').next().unwrap_or_default().to_string();
            let (status, body) = route(&path);
            let mut response = Response::from_data(body).with_status_code(status);
            if path == "/metrics" {
                if let Ok(header) =
                    Header::from_bytes(&b"Content-Type"[..], &b"text/plain; version=0.0.4"[..])
                {
                    response.add_header(header);
                }
            }
            if let Err(e) = request.respond(response) {
                tracing::debug!(error = %e, "metrics client went away");
            }
        }
    })
}

/// Initialize all metrics (forces lazy initialization)
pub fn init_metrics() {
    let _ = SETPOINT_RPM.get();
    let _ = MEASURED_RPM.get();
    let _ = CONTROL_OUTPUT_PCT.get();
    let _ = TEMPERATURE_C.get();
    let _ = STATE_SEQUENCE.get();
    for kind in [UpdateKind::Init, UpdateKind::Setpoint, UpdateKind::Feedback] {
        let _ = STATE_UPDATES.with_label_values(&[kind_label(kind)]).get();
    }
    let _ = PUBLISH_DROPPED.get();
    let _ = SETPOINT_REJECTIONS.get();
}
