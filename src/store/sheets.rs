// ===============================
// src/store/sheets.rs
// ===============================
//
// Google Sheets v4 (values API) sebagai tabel:
// - Satu worksheet per tabel (nama = "sales" / "surplus" / "stock").
// - Baris 1 = header nama item. Kolom dipetakan lewat header, bukan posisi.
// - Append pakai `values/{sheet}:append?valueInputOption=USER_ENTERED`.
// - Token bearer disediakan operator (SHEETS_TOKEN); refresh token di luar scope.
//
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use super::TableStore;
use crate::domain::{CycleId, ItemRow, ItemType, Table};
use crate::error::StoreError;

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Serialize)]
struct AppendBody {
    values: Vec<Vec<Value>>,
}

pub struct SheetsStore {
    http: reqwest::Client,
    base: Url,
    spreadsheet_id: String,
    token: String,
}

fn cell_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Header row + data rows -> keyed rows. Empty cells are left out of the row.
fn rows_from_grid(table: Table, grid: &[Vec<Value>]) -> Result<Vec<ItemRow>, StoreError> {
    let Some((header, body)) = grid.split_first() else {
        return Ok(Vec::new());
    };
    let header: Vec<ItemType> = header.iter().map(|c| ItemType::new(cell_text(c))).collect();

    let mut rows = Vec::with_capacity(body.len());
    for raw in body {
        let mut pairs = Vec::with_capacity(header.len());
        for (item, cell) in header.iter().zip(raw.iter()) {
            let text = cell_text(cell);
            if text.is_empty() || item.as_str().is_empty() {
                continue;
            }
            let v = text.parse::<i64>().map_err(|_| StoreError::BadCell {
                table,
                item: item.clone(),
                cell: text.clone(),
            })?;
            pairs.push((item.clone(), v));
        }
        rows.push(ItemRow::from_pairs(pairs));
    }
    Ok(rows)
}

/// Order `row` by the worksheet header. Header columns the row lacks stay blank.
fn ordered_cells(table: Table, header: &[ItemType], row: &ItemRow) -> Result<Vec<Value>, StoreError> {
    if let Some(unknown) = row.items().find(|&i| !header.contains(i)) {
        return Err(StoreError::MissingColumn { table, item: unknown.clone() });
    }
    Ok(header
        .iter()
        .map(|h| match row.get(h) {
            Some(v) => Value::from(v),
            None => Value::String(String::new()),
        })
        .collect())
}

impl SheetsStore {
    pub fn new(base_url: &str, spreadsheet_id: &str, token: &str) -> Result<Self, StoreError> {
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base: Url::parse(&base)?,
            spreadsheet_id: spreadsheet_id.to_string(),
            token: token.to_string(),
        })
    }

    fn values_url(&self, range: &str, suffix: &str) -> Result<Url, StoreError> {
        let path = format!(
            "v4/spreadsheets/{}/values/{}{}",
            urlencoding::encode(&self.spreadsheet_id),
            urlencoding::encode(range),
            suffix
        );
        Ok(self.base.join(&path)?)
    }

    async fn get_values(&self, range: &str) -> Result<Vec<Vec<Value>>, StoreError> {
        let url = self.values_url(range, "")?;
        let rsp = self.http.get(url).bearer_auth(&self.token).send().await?;
        if !rsp.status().is_success() {
            let status = rsp.status().as_u16();
            let body = rsp.text().await.unwrap_or_default();
            return Err(StoreError::Rejected { status, body });
        }
        Ok(rsp.json::<ValueRange>().await?.values)
    }

    async fn append_values(&self, sheet: &str, cells: Vec<Value>) -> Result<(), StoreError> {
        let mut url = self.values_url(sheet, ":append")?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED")
            .append_pair("insertDataOption", "INSERT_ROWS");
        let body = AppendBody { values: vec![cells] };
        let rsp = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        if !rsp.status().is_success() {
            let status = rsp.status().as_u16();
            let body = rsp.text().await.unwrap_or_default();
            return Err(StoreError::Rejected { status, body });
        }
        Ok(())
    }

    async fn header(&self, table: Table) -> Result<Vec<ItemType>, StoreError> {
        let grid = self.get_values(&format!("{}!1:1", table.name())).await?;
        Ok(grid
            .first()
            .map(|r| r.iter().map(|c| ItemType::new(cell_text(c))).collect())
            .unwrap_or_default())
    }
}

impl TableStore for SheetsStore {
    async fn append_row(
        &mut self,
        table: Table,
        row: &ItemRow,
        cycle_id: &CycleId,
    ) -> Result<(), StoreError> {
        let mut header = self.header(table).await?;
        if header.is_empty() {
            // worksheet kosong: tulis header dulu dari urutan row
            header = row.items().cloned().collect();
            let cells = header.iter().map(|h| Value::from(h.as_str())).collect();
            self.append_values(table.name(), cells).await?;
            info!(%table, "sheets: header row written");
        }
        let cells = ordered_cells(table, &header, row)?;
        self.append_values(table.name(), cells).await?;
        debug!(%table, cycle = %cycle_id.short(), "sheets: row appended");
        Ok(())
    }

    async fn read_all_rows(&self, table: Table) -> Result<Vec<ItemRow>, StoreError> {
        let grid = self.get_values(table.name()).await?;
        rows_from_grid(table, &grid)
    }

    async fn read_column(&self, table: Table, item: &ItemType) -> Result<Vec<i64>, StoreError> {
        let grid = self.get_values(table.name()).await?;
        if let Some(header) = grid.first() {
            if !header.iter().any(|c| cell_text(c) == item.as_str()) {
                return Err(StoreError::MissingColumn { table, item: item.clone() });
            }
        }
        let rows = rows_from_grid(table, &grid)?;
        Ok(rows.iter().filter_map(|r| r.get(item)).collect())
    }
}

#[cfg(test)]
impl SheetsStore {
    fn with_http(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }
}
