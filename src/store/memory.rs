// ===============================
// src/store/memory.rs
// ===============================
use ahash::{AHashMap as HashMap, AHashSet as HashSet};
use chrono::Utc;

use super::{StoredRow, TableStore};
use crate::domain::{CycleId, ItemRow, Table};
use crate::error::StoreError;

/// In-process tables. Mainly a test double for the remote store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: HashMap<Table, Vec<StoredRow>>,
    broken_writes: HashSet<Table>,
    broken_reads: HashSet<Table>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row outside of any cycle (initial stock, old sales, ...).
    pub fn seed(&mut self, table: Table, row: ItemRow) {
        self.tables.entry(table).or_default().push(StoredRow {
            cycle_id: None,
            recorded_at: Utc::now(),
            values: row,
        });
    }

    /// Every following append to `table` fails.
    pub fn break_writes(&mut self, table: Table) {
        self.broken_writes.insert(table);
    }

    /// Every following read of `table` fails.
    pub fn break_reads(&mut self, table: Table) {
        self.broken_reads.insert(table);
    }

    pub fn rows(&self, table: Table) -> &[StoredRow] {
        self.tables.get(&table).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl TableStore for MemoryStore {
    async fn append_row(
        &mut self,
        table: Table,
        row: &ItemRow,
        cycle_id: &CycleId,
    ) -> Result<(), StoreError> {
        if self.broken_writes.contains(&table) {
            return Err(StoreError::Unavailable {
                table,
                reason: "write refused".to_string(),
            });
        }
        self.tables.entry(table).or_default().push(StoredRow {
            cycle_id: Some(cycle_id.clone()),
            recorded_at: Utc::now(),
            values: row.clone(),
        });
        Ok(())
    }

    async fn read_all_rows(&self, table: Table) -> Result<Vec<ItemRow>, StoreError> {
        if self.broken_reads.contains(&table) {
            return Err(StoreError::Unavailable {
                table,
                reason: "read refused".to_string(),
            });
        }
        Ok(self.rows(table).iter().map(|r| r.values.clone()).collect())
    }
}
