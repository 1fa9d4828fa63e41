// ===============================
// src/main.rs
// ===============================
/*
 # stok pembukaan WAJIB ada sebelum cycle pertama; tanpa itu cycle berhenti
 # di DerivingSurplus (no_prior_stock) dan baris sales-nya tetap tertulis.
 mkdir -p data && echo '{"cycle_id":null,"recorded_at":"2025-01-01T00:00:00Z","values":[{"item":"bacon","value":15},{"item":"egg_salad","value":20},{"item":"ham","value":25},{"item":"chicken","value":50},{"item":"tuna","value":45},{"item":"turkey","value":70}]}' > data/stock.jsonl

 # sekali jalan, non-interaktif, store file lokal
 STORE=jsonl STORE_DIR=./data cargo run -- --input 10,20,30,40,50,60

 # interaktif + metrics
 METRICS_PORT=9898 cargo run
 curl -s localhost:9898/metrics | egrep '^(cycles_total|forecast_units)'
*/
/*
=============================================================================
Project : restock_sync — sales intake, surplus and restock forecast in Rust
Module  : main.rs
Version : 0.1.0

Summary : Reads per-market sales counts, appends them to a tabular store
          (memory / JSONL / Google Sheets), derives surplus against the last
          stock row and projects next-market stock from a moving average.
=============================================================================
*/
use std::io::{self, Write};
use std::process::ExitCode;

use chrono::Utc;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use restock_sync::config::{self, Cli, Config, StoreMode};
use restock_sync::domain::Event;
use restock_sync::error::CycleError;
use restock_sync::metrics;
use restock_sync::prompt;
use restock_sync::recorder::Recorder;
use restock_sync::store::{AnyStore, JsonlStore, MemoryStore, SheetsStore};
use restock_sync::{PipelineSettings, SyncOrchestrator};

fn build_store(cfg: &Config) -> Result<AnyStore, restock_sync::StoreError> {
    Ok(match &cfg.store {
        StoreMode::Memory => AnyStore::Memory(MemoryStore::new()),
        StoreMode::Jsonl { dir } => AnyStore::Jsonl(JsonlStore::new(dir)),
        StoreMode::Sheets { base_url, spreadsheet_id, token } => {
            AnyStore::Sheets(SheetsStore::new(base_url, spreadsheet_id, token)?)
        }
    })
}

async fn record_failure(recorder: &mut Option<Recorder>, err: &CycleError) {
    if let Some(rec) = recorder.as_mut() {
        rec.record(&Event::Failed {
            ts: Utc::now(),
            state: format!("{:?}", err.state),
            kind: err.error.kind().to_string(),
            message: err.error.to_string(),
        })
        .await;
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // ---- Logging (stderr, agar prompt di stdout tetap bersih) ----
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    // ---- Load config ----
    let cli = Cli::parse();
    let cfg = match config::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            error!(%e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    // ---- Metrics ----
    metrics::init();
    metrics::CONFIG_STORE.with_label_values(&[cfg.store.label()]).set(1);
    if let Some(port) = cfg.metrics_port {
        if let Err(e) = metrics::serve_metrics(port) {
            error!(?e, port, "metrics bind failed");
            return ExitCode::FAILURE;
        }
    }

    let item_names: Vec<&str> = cfg.catalog.items().iter().map(|i| i.as_str()).collect();
    info!(
        items = ?item_names,
        window = cfg.window,
        buffer = cfg.buffer,
        rounding = ?cfg.rounding,
        validation = ?cfg.strictness,
        empty_window = ?cfg.empty_window,
        store = cfg.store.label(),
        "startup config"
    );

    // ---- Recorder (optional) ----
    let mut recorder = match &cfg.record_file {
        Some(path) => match Recorder::open(path).await {
            Ok(r) => Some(r),
            Err(e) => {
                error!(?e, path = %path.display(), "recorder: open failed");
                return ExitCode::FAILURE;
            }
        },
        None => None,
    };

    // ---- Store + orchestrator ----
    let store = match build_store(&cfg) {
        Ok(s) => s,
        Err(e) => {
            error!(%e, "store init failed");
            return ExitCode::FAILURE;
        }
    };
    info!(backend = store.label(), "store ready");
    let mut orch = SyncOrchestrator::new(store, PipelineSettings::from(&cfg));

    let stdout = io::stdout();

    // ---- Non-interactive: satu cycle dari --input ----
    if let Some(raw) = cfg.input.as_deref() {
        return match orch.run_cycle(raw).await {
            Ok(report) => {
                if let Err(e) = prompt::print_report(&mut stdout.lock(), &report) {
                    error!(?e, "stdout error");
                    return ExitCode::FAILURE;
                }
                if let Some(rec) = recorder.as_mut() {
                    rec.record(&Event::Done(report)).await;
                }
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!(state = ?e.state, error = %e.error, "cycle failed");
                record_failure(&mut recorder, &e).await;
                ExitCode::FAILURE
            }
        };
    }

    // ---- Interactive: cycle demi cycle sampai EOF ----
    let stdin = io::stdin();
    loop {
        let sales = match prompt::read_sales(
            &mut stdin.lock(),
            &mut stdout.lock(),
            &cfg.catalog,
            cfg.strictness,
        ) {
            Ok(Some(s)) => s,
            Ok(None) => {
                info!("input closed, bye");
                return ExitCode::SUCCESS;
            }
            Err(e) => {
                error!(?e, "stdin/stdout error");
                return ExitCode::FAILURE;
            }
        };

        match orch.run_validated(sales).await {
            Ok(report) => {
                let mut out = stdout.lock();
                if let Err(e) = prompt::print_report(&mut out, &report).and_then(|_| out.flush()) {
                    error!(?e, "stdin/stdout error");
                    return ExitCode::FAILURE;
                }
                drop(out);
                if let Some(rec) = recorder.as_mut() {
                    rec.record(&Event::Done(report)).await;
                }
                if cfg.once {
                    return ExitCode::SUCCESS;
                }
            }
            Err(e) => {
                error!(state = ?e.state, error = %e.error, "cycle failed");
                record_failure(&mut recorder, &e).await;
                return ExitCode::FAILURE;
            }
        }
    }
}
