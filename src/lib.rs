// ===============================
// src/lib.rs
// ===============================
pub mod config;
pub mod domain;
pub mod error;
pub mod forecast;
pub mod history;
pub mod metrics;
pub mod orchestrator;
pub mod prompt;
pub mod recorder;
pub mod store;
pub mod surplus;
pub mod validator;

pub use domain::{Catalog, CycleId, CycleReport, ItemRow, ItemType, Table};
pub use error::{CycleError, PipelineError, StoreError, ValidationError};
pub use orchestrator::{CycleState, PipelineSettings, SyncOrchestrator};
pub use store::{AnyStore, JsonlStore, MemoryStore, SheetsStore, TableStore};
