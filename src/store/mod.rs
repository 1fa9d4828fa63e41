// ===============================
// src/store/mod.rs
// ===============================
//
// Abstraksi tabel append-only (sales / surplus / stock).
// Handle store di-inject ke orchestrator; tidak ada singleton global.
//
// Backend:
// - memory : in-process, untuk test (bisa inject gagal tulis/baca)
// - jsonl  : satu file <dir>/<table>.jsonl per tabel
// - sheets : Google Sheets v4 values API, satu worksheet per tabel
//
pub mod jsonl;
pub mod memory;
pub mod sheets;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{CycleId, ItemRow, ItemType, Table};
use crate::error::StoreError;

pub use jsonl::JsonlStore;
pub use memory::MemoryStore;
pub use sheets::SheetsStore;

/// One persisted row plus the cycle that wrote it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRow {
    /// `None` for rows seeded outside a cycle.
    pub cycle_id: Option<CycleId>,
    pub recorded_at: DateTime<Utc>,
    pub values: ItemRow,
}

/// Generic "append row / read rows" interface over the three logical tables.
///
/// Rows are keyed by item, so a backend never has to trust column position.
#[allow(async_fn_in_trait)]
pub trait TableStore {
    async fn append_row(
        &mut self,
        table: Table,
        row: &ItemRow,
        cycle_id: &CycleId,
    ) -> Result<(), StoreError>;

    /// All rows, oldest first.
    async fn read_all_rows(&self, table: Table) -> Result<Vec<ItemRow>, StoreError>;

    /// One item's values down the table, oldest first. Rows without the item are skipped.
    async fn read_column(&self, table: Table, item: &ItemType) -> Result<Vec<i64>, StoreError> {
        let rows = self.read_all_rows(table).await?;
        Ok(rows.iter().filter_map(|r| r.get(item)).collect())
    }

    async fn latest_row(&self, table: Table) -> Result<Option<ItemRow>, StoreError> {
        let mut rows = self.read_all_rows(table).await?;
        Ok(rows.pop())
    }
}

/// Backend chosen at start-up (see `config::StoreMode`).
pub enum AnyStore {
    Memory(MemoryStore),
    Jsonl(JsonlStore),
    Sheets(SheetsStore),
}

impl AnyStore {
    pub fn label(&self) -> &'static str {
        match self {
            AnyStore::Memory(_) => "memory",
            AnyStore::Jsonl(_) => "jsonl",
            AnyStore::Sheets(_) => "sheets",
        }
    }
}

impl TableStore for AnyStore {
    async fn append_row(
        &mut self,
        table: Table,
        row: &ItemRow,
        cycle_id: &CycleId,
    ) -> Result<(), StoreError> {
        match self {
            AnyStore::Memory(s) => s.append_row(table, row, cycle_id).await,
            AnyStore::Jsonl(s) => s.append_row(table, row, cycle_id).await,
            AnyStore::Sheets(s) => s.append_row(table, row, cycle_id).await,
        }
    }

    async fn read_all_rows(&self, table: Table) -> Result<Vec<ItemRow>, StoreError> {
        match self {
            AnyStore::Memory(s) => s.read_all_rows(table).await,
            AnyStore::Jsonl(s) => s.read_all_rows(table).await,
            AnyStore::Sheets(s) => s.read_all_rows(table).await,
        }
    }

    async fn read_column(&self, table: Table, item: &ItemType) -> Result<Vec<i64>, StoreError> {
        match self {
            AnyStore::Memory(s) => s.read_column(table, item).await,
            AnyStore::Jsonl(s) => s.read_column(table, item).await,
            AnyStore::Sheets(s) => s.read_column(table, item).await,
        }
    }
}
