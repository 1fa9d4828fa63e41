// ===============================
// src/orchestrator.rs
// ===============================
//
// Satu cycle, linear, tanpa cabang balik:
//   AwaitingInput -> Validating -> RecordingSales -> DerivingSurplus
//   -> RecordingSurplus -> ReadingHistory -> Forecasting -> RecordingStock -> Done
//
// Append yang gagal menghentikan cycle di state tersebut. Append sebelumnya
// TIDAK di-rollback; cycle_id di setiap baris dipakai untuk melacak cycle parsial.
//
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::domain::{
    Catalog, CycleId, CycleReport, ItemRow, SalesRecord, StockForecast, SurplusRecord, Table,
};
use crate::error::{CycleError, PipelineError};
use crate::forecast::{forecast_with_policy, EmptyWindowPolicy, Rounding};
use crate::history::read_recent_sales;
use crate::metrics::{
    CYCLES, CYCLE_SECONDS, FORECAST_UNITS, ROWS_APPENDED, STORE_ERRORS, SURPLUS_UNITS,
    VALIDATION_FAILURES,
};
use crate::store::TableStore;
use crate::surplus::compute_surplus;
use crate::validator::{parse_line, Strictness};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CycleState {
    AwaitingInput,
    Validating,
    RecordingSales,
    DerivingSurplus,
    RecordingSurplus,
    ReadingHistory,
    Forecasting,
    RecordingStock,
    Done,
}

/// Knobs the pipeline needs from [`Config`].
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub catalog: Catalog,
    pub window: usize,
    pub buffer: f64,
    pub rounding: Rounding,
    pub strictness: Strictness,
    pub empty_window: EmptyWindowPolicy,
}

impl PipelineSettings {
    /// Reference deployment values for `catalog`: K=5, 10% buffer.
    pub fn with_catalog(catalog: Catalog) -> Self {
        Self {
            catalog,
            window: crate::config::DEFAULT_WINDOW,
            buffer: crate::config::DEFAULT_BUFFER,
            rounding: Rounding::default(),
            strictness: Strictness::default(),
            empty_window: EmptyWindowPolicy::default(),
        }
    }
}

impl From<&Config> for PipelineSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            catalog: cfg.catalog.clone(),
            window: cfg.window,
            buffer: cfg.buffer,
            rounding: cfg.rounding,
            strictness: cfg.strictness,
            empty_window: cfg.empty_window,
        }
    }
}

/// Sequences validator, surplus, history and forecast against one injected store.
pub struct SyncOrchestrator<S> {
    store: S,
    settings: PipelineSettings,
    state: CycleState,
}

impl<S: TableStore> SyncOrchestrator<S> {
    pub fn new(store: S, settings: PipelineSettings) -> Self {
        Self { store, settings, state: CycleState::AwaitingInput }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn enter(&mut self, next: CycleState) {
        debug!(from = ?self.state, to = ?next, "cycle transition");
        self.state = next;
    }

    /// Validate `raw` and run a full cycle. Invalid input halts in `Validating`.
    pub async fn run_cycle(&mut self, raw: &str) -> Result<CycleReport, CycleError> {
        self.state = CycleState::AwaitingInput;
        self.enter(CycleState::Validating);
        let sales = match parse_line(raw, &self.settings.catalog, self.settings.strictness) {
            Ok(s) => s,
            Err(e) => {
                VALIDATION_FAILURES.with_label_values(&[e.reason()]).inc();
                CYCLES.with_label_values(&["invalid"]).inc();
                return Err(CycleError { state: self.state, error: e.into() });
            }
        };
        self.run_validated(sales).await
    }

    /// Run a cycle on an already validated sales record.
    pub async fn run_validated(&mut self, sales: SalesRecord) -> Result<CycleReport, CycleError> {
        if self.state != CycleState::Validating {
            self.state = CycleState::AwaitingInput;
            self.enter(CycleState::Validating);
        }
        let started_at = Utc::now();
        let cycle_id = CycleId::derive(&sales, started_at);
        let timer = CYCLE_SECONDS.start_timer();
        info!(cycle = %cycle_id.short(), sales = %sales, "cycle started");

        match self.drive(&sales, &cycle_id).await {
            Ok((surplus, forecast)) => {
                timer.observe_duration();
                self.enter(CycleState::Done);
                CYCLES.with_label_values(&["done"]).inc();
                for (item, v) in surplus.iter() {
                    SURPLUS_UNITS.with_label_values(&[item.as_str()]).set(v);
                }
                for (item, v) in forecast.iter() {
                    FORECAST_UNITS.with_label_values(&[item.as_str()]).set(v);
                }
                info!(cycle = %cycle_id.short(), forecast = %forecast, "cycle done");
                Ok(CycleReport {
                    cycle_id,
                    started_at,
                    finished_at: Utc::now(),
                    sales,
                    surplus,
                    forecast,
                })
            }
            Err(error) => {
                timer.stop_and_discard();
                CYCLES.with_label_values(&[error.kind()]).inc();
                warn!(cycle = %cycle_id.short(), state = ?self.state, %error, "cycle halted");
                Err(CycleError { state: self.state, error })
            }
        }
    }

    async fn drive(
        &mut self,
        sales: &SalesRecord,
        cycle_id: &CycleId,
    ) -> Result<(SurplusRecord, StockForecast), PipelineError> {
        // 1) sales
        self.enter(CycleState::RecordingSales);
        self.append(Table::Sales, sales, cycle_id).await?;

        // 2) surplus vs stock terakhir
        self.enter(CycleState::DerivingSurplus);
        let prior_stock = self
            .store
            .latest_row(Table::Stock)
            .await
            .map_err(|source| {
                STORE_ERRORS.with_label_values(&[Table::Stock.name(), "read"]).inc();
                PipelineError::StoreUnavailable { table: Table::Stock, source }
            })?
            .ok_or(PipelineError::NoPriorStock { table: Table::Stock })?;
        let surplus = compute_surplus(
            &self.settings.catalog,
            sales,
            &prior_stock,
            self.settings.strictness,
        )?;

        self.enter(CycleState::RecordingSurplus);
        self.append(Table::Surplus, &surplus, cycle_id).await?;

        // 3) history window -> forecast
        self.enter(CycleState::ReadingHistory);
        let window = read_recent_sales(&self.store, &self.settings.catalog, self.settings.window)
            .await
            .inspect_err(|_| {
                STORE_ERRORS.with_label_values(&[Table::Sales.name(), "read"]).inc();
            })?;

        self.enter(CycleState::Forecasting);
        let forecast = forecast_with_policy(
            &window,
            self.settings.buffer,
            self.settings.rounding,
            self.settings.empty_window,
        )?;

        self.enter(CycleState::RecordingStock);
        self.append(Table::Stock, &forecast, cycle_id).await?;

        Ok((surplus, forecast))
    }

    async fn append(
        &mut self,
        table: Table,
        row: &ItemRow,
        cycle_id: &CycleId,
    ) -> Result<(), PipelineError> {
        info!(%table, "updating {table} table...");
        match self.store.append_row(table, row, cycle_id).await {
            Ok(()) => {
                ROWS_APPENDED.with_label_values(&[table.name()]).inc();
                info!(%table, "{table} table updated successfully");
                Ok(())
            }
            Err(source) => {
                STORE_ERRORS.with_label_values(&[table.name(), "append"]).inc();
                Err(PipelineError::StoreWrite { table, source })
            }
        }
    }
}
