// ===============================
// src/history.rs
// ===============================
use crate::domain::{Catalog, SalesHistoryWindow, Table};
use crate::error::PipelineError;
use crate::store::TableStore;

/// Last `k` sales values per catalog item (fewer if the table is shorter).
///
/// Read-only. A failed fetch is returned as `StoreUnavailable`; no retry here.
pub async fn read_recent_sales<S: TableStore>(
    store: &S,
    catalog: &Catalog,
    k: usize,
) -> Result<SalesHistoryWindow, PipelineError> {
    let mut columns = Vec::with_capacity(catalog.len());
    for item in catalog.items() {
        let column = store
            .read_column(Table::Sales, item)
            .await
            .map_err(|source| PipelineError::StoreUnavailable { table: Table::Sales, source })?;
        let start = column.len().saturating_sub(k);
        columns.push((item.clone(), column[start..].to_vec()));
    }
    Ok(SalesHistoryWindow { columns })
}
