// ===============================
// src/store/jsonl.rs
// ===============================
//
// Tabel berbasis file JSONL:
// - Satu file per tabel: <dir>/sales.jsonl, surplus.jsonl, stock.jsonl.
// - Append-only, satu StoredRow per baris.
// - Parent directory dibuat otomatis kalau belum ada.
// - File yang belum ada = tabel kosong.
//
use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::{
    fs::{self, OpenOptions},
    io::{AsyncWriteExt, BufWriter},
};
use tracing::{debug, error};

use super::{StoredRow, TableStore};
use crate::domain::{CycleId, ItemRow, Table};
use crate::error::StoreError;

#[derive(Debug, Clone)]
pub struct JsonlStore {
    dir: PathBuf,
}

impl JsonlStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn table_path(&self, table: Table) -> PathBuf {
        self.dir.join(format!("{}.jsonl", table.name()))
    }

    /// Every stored row of `table` including cycle ids.
    pub async fn stored_rows(&self, table: Table) -> Result<Vec<StoredRow>, StoreError> {
        let path = self.table_path(table);
        let text = match fs::read_to_string(&path).await {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut rows = Vec::new();
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            rows.push(serde_json::from_str::<StoredRow>(line)?);
        }
        Ok(rows)
    }
}

async fn open_writer(path: &Path) -> Result<BufWriter<fs::File>, StoreError> {
    // Pastikan parent directory ada (kalau ada)
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = fs::create_dir_all(parent).await {
                error!(?e, path = %path.display(), "jsonl: create_dir_all failed");
                return Err(e.into());
            }
        }
    }
    let file = OpenOptions::new().create(true).append(true).open(path).await?;
    Ok(BufWriter::new(file))
}

impl TableStore for JsonlStore {
    async fn append_row(
        &mut self,
        table: Table,
        row: &ItemRow,
        cycle_id: &CycleId,
    ) -> Result<(), StoreError> {
        let stored = StoredRow {
            cycle_id: Some(cycle_id.clone()),
            recorded_at: Utc::now(),
            values: row.clone(),
        };
        let mut line = serde_json::to_string(&stored)?;
        line.push('\n');

        let path = self.table_path(table);
        let mut writer = open_writer(&path).await?;
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
        debug!(%table, path = %path.display(), "jsonl: row appended");
        Ok(())
    }

    async fn read_all_rows(&self, table: Table) -> Result<Vec<ItemRow>, StoreError> {
        Ok(self
            .stored_rows(table)
            .await?
            .into_iter()
            .map(|r| r.values)
            .collect())
    }
}
