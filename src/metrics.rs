// ===============================
// src/metrics.rs
// ===============================
use once_cell::sync::Lazy;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder,
};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;

// Single custom registry (we register everything here)
pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

// -------- Cycle metrics --------
pub static CYCLES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("cycles_total", "pipeline cycles by outcome (done | error kind)"),
        &["outcome"],
    )
    .unwrap()
});

pub static VALIDATION_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("validation_failures_total", "rejected sales input by reason"),
        &["reason"],
    )
    .unwrap()
});

pub static CYCLE_SECONDS: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(HistogramOpts::new(
        "cycle_duration_seconds",
        "Time from validated input to stock row written",
    ))
    .unwrap()
});

// -------- Store --------
pub static ROWS_APPENDED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("store_rows_appended_total", "rows appended per table"),
        &["table"],
    )
    .unwrap()
});

pub static STORE_ERRORS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("store_errors_total", "failed store calls (labels: table, op)"),
        &["table", "op"],
    )
    .unwrap()
});

// -------- Last cycle values per item --------
pub static SURPLUS_UNITS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("surplus_units", "last surplus per item (negative = stock-out)"),
        &["item"],
    )
    .unwrap()
});

pub static FORECAST_UNITS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("forecast_units", "last projected stock per item"),
        &["item"],
    )
    .unwrap()
});

// ---- Config visibility ----
pub static CONFIG_STORE: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("config_store", "store backend (label: backend)"),
        &["backend"],
    )
    .unwrap()
});

pub fn init() {
    // Register all metrics to the custom registry
    for m in [
        REGISTRY.register(Box::new(CYCLES.clone())),
        REGISTRY.register(Box::new(VALIDATION_FAILURES.clone())),
        REGISTRY.register(Box::new(CYCLE_SECONDS.clone())),
        REGISTRY.register(Box::new(ROWS_APPENDED.clone())),
        REGISTRY.register(Box::new(STORE_ERRORS.clone())),
        REGISTRY.register(Box::new(SURPLUS_UNITS.clone())),
        REGISTRY.register(Box::new(FORECAST_UNITS.clone())),
        REGISTRY.register(Box::new(CONFIG_STORE.clone())),
    ] {
        let _ = m;
    }
}

// Encode all metrics in Prometheus text format
pub fn encode_metrics() -> Vec<u8> {
    let encoder = TextEncoder::new();
    let families = REGISTRY.gather();
    let mut buf = Vec::new();
    if encoder.encode(&families, &mut buf).is_err() || buf.is_empty() {
        buf.extend_from_slice(b"# no metrics\n");
    }
    buf
}

// Serve one HTTP request (GET / or /metrics), tiny HTTP 1.1 responder
fn handle_client(mut stream: TcpStream) {
    // Read a bit to consume headers (no full parse)
    let mut _req_buf = [0u8; 1024];
    let _ = stream.read(&mut _req_buf);

    let body = encode_metrics();
    let header = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain; version=0.0.4; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );

    let _ = stream.write_all(header.as_bytes());
    let _ = stream.write_all(&body);
    let _ = stream.flush();
}

/// Serve metrics from a dedicated OS thread; the pipeline itself stays sequential.
pub fn serve_metrics(port: u16) -> std::io::Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr)?;
    tracing::info!(%addr, "metrics listening (GET / or /metrics)");
    thread::spawn(move || {
        for conn in listener.incoming() {
            match conn {
                Ok(stream) => handle_client(stream),
                Err(e) => tracing::warn!(?e, "metrics accept error"),
            }
        }
    });
    Ok(())
}
