// ===============================
// src/config.rs
// ===============================
/*
=============================================================================
Project : restock_sync — sales intake, surplus and restock forecast in Rust
Module  : config.rs
Version : 0.1.0

Summary : Reads per-market sales counts, appends them to a tabular store
          (memory / JSONL / Google Sheets), derives surplus against the last
          stock row and projects next-market stock from a moving average.
=============================================================================
*/
use std::env;
use std::path::PathBuf;

use clap::Parser;
use dotenvy::dotenv;

use crate::domain::Catalog;
use crate::error::ConfigError;
use crate::forecast::{EmptyWindowPolicy, Rounding};
use crate::validator::Strictness;

pub const DEFAULT_ITEMS: &str = "bacon,egg_salad,ham,chicken,tuna,turkey";
pub const DEFAULT_WINDOW: usize = 5;
pub const DEFAULT_BUFFER: f64 = 0.10;
pub const DEFAULT_STORE_DIR: &str = "data";
pub const DEFAULT_SHEETS_BASE_URL: &str = "https://sheets.googleapis.com";

/// Command-line flags. Semua flag opsional; kalau kosong pakai ENV / default.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "restock_sync", version, about = "Record market sales and project next-market stock")]
pub struct Cli {
    /// Comma separated item catalog (overrides ITEMS)
    #[arg(long)]
    pub items: Option<String>,
    /// Trailing sales window per item (overrides HISTORY_WINDOW)
    #[arg(long)]
    pub window: Option<usize>,
    /// Forecast buffer fraction, e.g. 0.1 (overrides FORECAST_BUFFER)
    #[arg(long)]
    pub buffer: Option<f64>,
    /// memory | jsonl | sheets (overrides STORE)
    #[arg(long)]
    pub store: Option<String>,
    /// Run one cycle on this input instead of prompting
    #[arg(long)]
    pub input: Option<String>,
    /// Stop after one successful cycle
    #[arg(long)]
    pub once: bool,
}

/// Backend tabel yang dipakai.
#[derive(Clone, Debug, PartialEq)]
pub enum StoreMode {
    Memory,
    Jsonl { dir: PathBuf },
    Sheets {
        base_url: String,
        spreadsheet_id: String,
        token: String,
    },
}

impl StoreMode {
    pub fn label(&self) -> &'static str {
        match self {
            StoreMode::Memory => "memory",
            StoreMode::Jsonl { .. } => "jsonl",
            StoreMode::Sheets { .. } => "sheets",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    // catalog & forecast
    pub catalog: Catalog,
    pub window: usize,
    pub buffer: f64,
    pub rounding: Rounding,
    pub strictness: Strictness,
    pub empty_window: EmptyWindowPolicy,

    // store
    pub store: StoreMode,

    // files/metrics
    pub record_file: Option<PathBuf>,
    pub metrics_port: Option<u16>,

    // run mode
    pub input: Option<String>,
    pub once: bool,
}

/// Load `.env`, then environment, then CLI overrides.
pub fn load(cli: &Cli) -> Result<Config, ConfigError> {
    // Pastikan .env dibaca (agar ITEMS, STORE, dll ter-load)
    let _ = dotenv();
    load_from(cli, |key| env::var(key).ok())
}

/// Same as [`load`] with an injectable variable lookup.
pub fn load_from<F>(cli: &Cli, var: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    // ===== Catalog =====
    let items = cli
        .items
        .clone()
        .or_else(|| var("ITEMS"))
        .unwrap_or_else(|| DEFAULT_ITEMS.to_string());
    let catalog = Catalog::new(items.split(',').filter(|s| !s.trim().is_empty()))
        .map_err(|reason| ConfigError::Invalid { key: "ITEMS", reason })?;

    // ===== Forecast =====
    let window = match cli.window {
        Some(w) => w,
        None => parse_var(&var, "HISTORY_WINDOW")?.unwrap_or(DEFAULT_WINDOW),
    };
    if window == 0 {
        return Err(ConfigError::Invalid {
            key: "HISTORY_WINDOW",
            reason: "must be at least 1".to_string(),
        });
    }

    let buffer = match cli.buffer {
        Some(b) => b,
        None => parse_var(&var, "FORECAST_BUFFER")?.unwrap_or(DEFAULT_BUFFER),
    };
    if !buffer.is_finite() || buffer <= -1.0 {
        return Err(ConfigError::Invalid {
            key: "FORECAST_BUFFER",
            reason: format!("{buffer} is not a usable buffer fraction"),
        });
    }

    let rounding = match var("ROUNDING") {
        Some(s) => Rounding::parse(&s).ok_or_else(|| ConfigError::Invalid {
            key: "ROUNDING",
            reason: format!("unknown rounding '{s}' (half_even | half_away)"),
        })?,
        None => Rounding::default(),
    };
    let strictness = match var("VALIDATION") {
        Some(s) => Strictness::parse(&s).ok_or_else(|| ConfigError::Invalid {
            key: "VALIDATION",
            reason: format!("unknown level '{s}' (lenient | strict)"),
        })?,
        None => Strictness::default(),
    };
    let empty_window = match var("EMPTY_WINDOW") {
        Some(s) => EmptyWindowPolicy::parse(&s).ok_or_else(|| ConfigError::Invalid {
            key: "EMPTY_WINDOW",
            reason: format!("unknown policy '{s}' (fail | zero)"),
        })?,
        None => EmptyWindowPolicy::default(),
    };

    // ===== Store =====
    let store_kind = cli
        .store
        .clone()
        .or_else(|| var("STORE"))
        .unwrap_or_else(|| "jsonl".to_string());
    let store = match store_kind.trim().to_ascii_lowercase().as_str() {
        "memory" | "mem" => StoreMode::Memory,
        "jsonl" | "file" => StoreMode::Jsonl {
            dir: var("STORE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_DIR)),
        },
        "sheets" | "gsheets" => StoreMode::Sheets {
            base_url: var("SHEETS_BASE_URL")
                .unwrap_or_else(|| DEFAULT_SHEETS_BASE_URL.to_string()),
            spreadsheet_id: var("SHEETS_SPREADSHEET_ID")
                .ok_or(ConfigError::Missing("SHEETS_SPREADSHEET_ID"))?,
            token: var("SHEETS_TOKEN").ok_or(ConfigError::Missing("SHEETS_TOKEN"))?,
        },
        other => {
            return Err(ConfigError::Invalid {
                key: "STORE",
                reason: format!("unknown store '{other}' (memory | jsonl | sheets)"),
            })
        }
    };

    // ===== Files / metrics =====
    let record_file = var("RECORD_FILE")
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from);
    let metrics_port = parse_var(&var, "METRICS_PORT")?;

    Ok(Config {
        catalog,
        window,
        buffer,
        rounding,
        strictness,
        empty_window,
        store,
        record_file,
        metrics_port,
        input: cli.input.clone(),
        once: cli.once,
    })
}

fn parse_var<F, T>(var: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match var(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::Invalid { key, reason: format!("'{raw}': {e}") }),
    }
}
