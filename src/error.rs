// ===============================
// src/error.rs
// ===============================
use thiserror::Error;

use crate::domain::{ItemType, Table};
use crate::orchestrator::CycleState;

/// Input yang ditolak validator. Recoverable: loop prompt akan meminta ulang.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("'{token}' at position {position} is not a whole number")]
    Format { token: String, position: usize },
    #[error("Exactly {expected} values required, you provided {got}")]
    Arity { expected: usize, got: usize },
    #[error("negative sales ({value}) for {item} are not accepted")]
    Negative { item: ItemType, value: i64 },
}

impl ValidationError {
    /// Short label used for the validation-failure metric.
    pub fn reason(&self) -> &'static str {
        match self {
            ValidationError::Format { .. } => "format",
            ValidationError::Arity { .. } => "arity",
            ValidationError::Negative { .. } => "negative",
        }
    }
}

/// Errors raised by a `TableStore` backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("bad store url: {0}")]
    Url(#[from] url::ParseError),
    #[error("store rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("table {table} has no column for {item}")]
    MissingColumn { table: Table, item: ItemType },
    #[error("table {table}: cell {cell:?} in column {item} is not an integer")]
    BadCell {
        table: Table,
        item: ItemType,
        cell: String,
    },
    #[error("table {table} unavailable: {reason}")]
    Unavailable { table: Table, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForecastError {
    #[error("no sales history for {item}")]
    EmptyWindow { item: ItemType },
}

/// Fatal errors for one cycle. Earlier appends of the cycle stay in the store.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid sales input: {0}")]
    Invalid(#[from] ValidationError),
    #[error("row shape mismatch in {table}: {detail}")]
    ShapeMismatch { table: Table, detail: String },
    #[error(transparent)]
    EmptyWindow(#[from] ForecastError),
    #[error("no prior stock row in {table}")]
    NoPriorStock { table: Table },
    #[error("append to {table} failed: {source}")]
    StoreWrite {
        table: Table,
        #[source]
        source: StoreError,
    },
    #[error("reading {table} failed: {source}")]
    StoreUnavailable {
        table: Table,
        #[source]
        source: StoreError,
    },
}

impl PipelineError {
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Invalid(_) => "invalid",
            PipelineError::ShapeMismatch { .. } => "shape_mismatch",
            PipelineError::EmptyWindow(_) => "empty_window",
            PipelineError::NoPriorStock { .. } => "no_prior_stock",
            PipelineError::StoreWrite { .. } => "store_write",
            PipelineError::StoreUnavailable { .. } => "store_unavailable",
        }
    }
}

/// A pipeline error together with the state at which the cycle halted.
#[derive(Debug, Error)]
#[error("cycle halted in {state:?}: {error}")]
pub struct CycleError {
    pub state: CycleState,
    #[source]
    pub error: PipelineError,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key}: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error("{0} must be set when STORE=sheets")]
    Missing(&'static str),
}
