use restock_sync::forecast::Rounding;
use restock_sync::store::{JsonlStore, MemoryStore, TableStore};
use restock_sync::validator::Strictness;
use restock_sync::{
    Catalog, CycleState, ItemRow, ItemType, PipelineError, PipelineSettings, SyncOrchestrator,
    Table,
};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn six() -> Catalog {
    Catalog::new(["bacon", "egg_salad", "ham", "chicken", "tuna", "turkey"]).unwrap()
}

/// Opening stock only, no sales yet.
fn opening_store() -> MemoryStore {
    let mut store = MemoryStore::new();
    store.seed(Table::Stock, ItemRow::from_catalog(&six(), &[15, 20, 25, 50, 45, 70]));
    store
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn scenario_a_first_market() {
    let mut orch = SyncOrchestrator::new(opening_store(), PipelineSettings::with_catalog(six()));
    let report = orch.run_cycle("10,20,30,40,50,60").await.unwrap();

    assert_eq!(report.surplus.values(), vec![5, 0, -5, 10, -5, 10]);
    // hanya satu baris history -> mean = nilai itu sendiri
    assert_eq!(report.forecast.values(), vec![11, 22, 33, 44, 55, 66]);

    let surplus_rows = orch.store().read_all_rows(Table::Surplus).await.unwrap();
    assert_eq!(surplus_rows, vec![report.surplus.clone()]);
}

#[tokio::test]
async fn scenarios_b_and_c_are_rejected_without_writes() {
    let mut orch = SyncOrchestrator::new(opening_store(), PipelineSettings::with_catalog(six()));
    for raw in ["10,20,thirty,40,50,60", "10,20,30,40,50"] {
        let err = orch.run_cycle(raw).await.unwrap_err();
        assert_eq!(err.state, CycleState::Validating);
        assert!(matches!(err.error, PipelineError::Invalid(_)));
    }
    assert!(orch.store().rows(Table::Sales).is_empty());
}

#[tokio::test]
async fn scenario_d_window_of_five_after_several_markets() {
    let mut orch = SyncOrchestrator::new(opening_store(), PipelineSettings::with_catalog(six()));
    let mut last = None;
    for bacon in [3, 8, 12, 10, 9, 11] {
        let raw = format!("{bacon},20,30,40,50,60");
        last = Some(orch.run_cycle(&raw).await.unwrap());
    }
    let report = last.unwrap();
    // window bacon = [8,12,10,9,11] (3 sudah keluar dari window)
    assert_eq!(report.forecast.get(&ItemType::new("bacon")), Some(11));
    assert_eq!(orch.store().rows(Table::Sales).len(), 6);
    assert_eq!(orch.store().rows(Table::Stock).len(), 7);

    // surplus cycle terakhir dihitung terhadap stok hasil forecast sebelumnya
    let prev_stock = &orch.store().rows(Table::Stock)[5].values;
    assert_eq!(
        report.surplus.get(&ItemType::new("bacon")).unwrap(),
        prev_stock.get(&ItemType::new("bacon")).unwrap() - 11
    );
}

#[tokio::test]
async fn scenario_e_new_item_without_history() {
    let old = Catalog::new(["bacon", "ham"]).unwrap();
    let grown = Catalog::new(["bacon", "ham", "falafel"]).unwrap();

    let mut store = MemoryStore::new();
    store.seed(Table::Sales, ItemRow::from_catalog(&old, &[10, 10]));
    store.seed(Table::Stock, ItemRow::from_catalog(&grown, &[12, 12, 5]));

    // history untuk falafel hanya dari cycle ini -> tidak kosong
    let mut orch = SyncOrchestrator::new(store, PipelineSettings::with_catalog(grown.clone()));
    let report = orch.run_cycle("10,10,4").await.unwrap();
    assert_eq!(report.forecast.values(), vec![11, 11, 4]);

    // item tanpa satu pun data penjualan: forecaster harus menolak
    let empty = restock_sync::domain::SalesHistoryWindow {
        columns: vec![(ItemType::new("falafel"), vec![])],
    };
    let err = restock_sync::forecast::forecast(&empty, 0.10, Default::default()).unwrap_err();
    assert!(err.to_string().contains("falafel"));
}

#[tokio::test]
async fn partial_sales_row_halts_before_surplus() {
    let cat = Catalog::new(["bacon", "ham"]).unwrap();
    let mut store = MemoryStore::new();
    store.seed(Table::Stock, ItemRow::from_catalog(&cat, &[12, 12]));
    let mut orch = SyncOrchestrator::new(store, PipelineSettings::with_catalog(cat.clone()));

    let partial = ItemRow::from_catalog(&Catalog::new(["bacon"]).unwrap(), &[10]);
    let err = orch.run_validated(partial).await.unwrap_err();
    assert_eq!(err.state, CycleState::DerivingSurplus);
    assert!(matches!(
        err.error,
        PipelineError::ShapeMismatch { table: Table::Sales, .. }
    ));

    let report = orch.run_validated(ItemRow::from_catalog(&cat, &[10, 10])).await.unwrap();
    assert_eq!(report.forecast.values(), vec![11, 11]);
}

#[tokio::test]
async fn configured_rounding_is_applied_on_ties() {
    let cat = Catalog::new(["a"]).unwrap();
    let mut results = Vec::new();
    for rounding in [Rounding::HalfEven, Rounding::HalfAwayFromZero] {
        let mut store = MemoryStore::new();
        store.seed(Table::Stock, ItemRow::from_catalog(&cat, &[5]));
        let mut settings = PipelineSettings::with_catalog(cat.clone());
        settings.buffer = 0.0;
        settings.rounding = rounding;
        let mut orch = SyncOrchestrator::new(store, settings);
        orch.run_cycle("2").await.unwrap();
        // window [2, 3] -> 2.5
        results.push(orch.run_cycle("3").await.unwrap().forecast.values()[0]);
    }
    assert_eq!(results, vec![2, 3]);
}

#[tokio::test]
async fn strict_mode_rejects_negative_sales() {
    let mut settings = PipelineSettings::with_catalog(six());
    settings.strictness = Strictness::Strict;
    let mut orch = SyncOrchestrator::new(opening_store(), settings);
    let err = orch.run_cycle("10,-20,30,40,50,60").await.unwrap_err();
    assert_eq!(err.state, CycleState::Validating);

    let mut lenient = SyncOrchestrator::new(opening_store(), PipelineSettings::with_catalog(six()));
    let report = lenient.run_cycle("10,-20,30,40,50,60").await.unwrap();
    assert_eq!(report.surplus.get(&ItemType::new("egg_salad")), Some(40));
}

#[tokio::test]
async fn stock_write_failure_leaves_sales_and_surplus() {
    let mut store = opening_store();
    store.break_writes(Table::Stock);
    let mut orch = SyncOrchestrator::new(store, PipelineSettings::with_catalog(six()));
    let err = orch.run_cycle("10,20,30,40,50,60").await.unwrap_err();

    assert_eq!(err.state, CycleState::RecordingStock);
    let store = orch.into_store();
    assert_eq!(store.rows(Table::Sales).len(), 1);
    assert_eq!(store.rows(Table::Surplus).len(), 1);
    assert_eq!(store.rows(Table::Stock).len(), 1);
    // baris parsial bisa dilacak lewat cycle_id
    assert_eq!(store.rows(Table::Sales)[0].cycle_id, store.rows(Table::Surplus)[0].cycle_id);
}

#[tokio::test]
async fn jsonl_store_persists_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let mut seed = JsonlStore::new(dir.path());
    let opening = ItemRow::from_catalog(&six(), &[15, 20, 25, 50, 45, 70]);
    let seed_id = restock_sync::CycleId::derive(&opening, chrono::Utc::now());
    seed.append_row(Table::Stock, &opening, &seed_id).await.unwrap();

    let mut first = SyncOrchestrator::new(JsonlStore::new(dir.path()), PipelineSettings::with_catalog(six()));
    first.run_cycle("10,20,30,40,50,60").await.unwrap();
    drop(first);

    let mut second = SyncOrchestrator::new(JsonlStore::new(dir.path()), PipelineSettings::with_catalog(six()));
    let report = second.run_cycle("12,20,30,40,50,60").await.unwrap();
    // stok sebelumnya = forecast run pertama (11,22,...)
    assert_eq!(report.surplus.values(), vec![-1, 2, 3, 4, 5, 6]);
    // bacon window = [10, 12] -> 11 * 1.1 = 12.1 -> 12
    assert_eq!(report.forecast.get(&ItemType::new("bacon")), Some(12));

    let stock = second.store().stored_rows(Table::Stock).await.unwrap();
    assert_eq!(stock.len(), 3);
    assert_eq!(stock[2].cycle_id.as_ref(), Some(&report.cycle_id));
}
