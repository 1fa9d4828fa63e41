// ===============================
// src/domain.rs
// ===============================
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One catalog entry, e.g. one sandwich variety.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemType(String);

impl ItemType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered item catalog. Order is the output order of every row built here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    items: Vec<ItemType>,
}

impl Catalog {
    /// Fails on an empty catalog, blank names or duplicates.
    pub fn new<I, S>(names: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut items: Vec<ItemType> = Vec::new();
        for n in names {
            let name: String = n.into();
            let name = name.trim();
            if name.is_empty() {
                return Err("item names must not be blank".to_string());
            }
            let item = ItemType::new(name);
            if items.contains(&item) {
                return Err(format!("duplicate item '{item}'"));
            }
            items.push(item);
        }
        if items.is_empty() {
            return Err("catalog needs at least one item".to_string());
        }
        Ok(Self { items })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[ItemType] {
        &self.items
    }

    pub fn contains(&self, item: &ItemType) -> bool {
        self.items.contains(item)
    }

    /// Example input line: 10,20,30,...
    pub fn example_line(&self) -> String {
        (1..=self.items.len())
            .map(|i| (i * 10).to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// One value for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCell {
    pub item: ItemType,
    pub value: i64,
}

/// A keyed row: every value carries its item, kept in insertion (catalog) order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemRow {
    cells: Vec<ItemCell>,
}

impl ItemRow {
    /// Zip catalog order with `values`. Caller guarantees equal lengths.
    pub fn from_catalog(catalog: &Catalog, values: &[i64]) -> Self {
        debug_assert_eq!(catalog.len(), values.len());
        Self {
            cells: catalog
                .items()
                .iter()
                .zip(values)
                .map(|(item, v)| ItemCell { item: item.clone(), value: *v })
                .collect(),
        }
    }

    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (ItemType, i64)>,
    {
        Self {
            cells: pairs
                .into_iter()
                .map(|(item, value)| ItemCell { item, value })
                .collect(),
        }
    }

    pub fn get(&self, item: &ItemType) -> Option<i64> {
        self.cells.iter().find(|c| &c.item == item).map(|c| c.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ItemType, i64)> {
        self.cells.iter().map(|c| (&c.item, c.value))
    }

    pub fn items(&self) -> impl Iterator<Item = &ItemType> {
        self.cells.iter().map(|c| &c.item)
    }

    pub fn values(&self) -> Vec<i64> {
        self.cells.iter().map(|c| c.value).collect()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl fmt::Display for ItemRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(i, v)| format!("{i}={v}")).collect();
        write!(f, "{}", parts.join(", "))
    }
}

pub type SalesRecord = ItemRow;
pub type StockRecord = ItemRow;
pub type SurplusRecord = ItemRow;
pub type StockForecast = ItemRow;

/// Per item, the most recent sales values (oldest first), in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SalesHistoryWindow {
    pub columns: Vec<(ItemType, Vec<i64>)>,
}

impl SalesHistoryWindow {
    pub fn get(&self, item: &ItemType) -> Option<&[i64]> {
        self.columns
            .iter()
            .find(|(i, _)| i == item)
            .map(|(_, v)| v.as_slice())
    }
}

/// The three logical tables of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Sales,
    Surplus,
    Stock,
}

impl Table {
    pub const ALL: [Table; 3] = [Table::Sales, Table::Surplus, Table::Stock];

    pub fn name(&self) -> &'static str {
        match self {
            Table::Sales => "sales",
            Table::Surplus => "surplus",
            Table::Stock => "stock",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Idempotency key shared by the rows one cycle appends.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CycleId(String);

impl CycleId {
    /// sha256(values || started_at), hex encoded.
    pub fn derive(sales: &SalesRecord, started_at: DateTime<Utc>) -> Self {
        let mut h = Sha256::new();
        for (item, v) in sales.iter() {
            h.update(item.as_str().as_bytes());
            h.update(b"=");
            h.update(v.to_string().as_bytes());
            h.update(b";");
        }
        h.update(started_at.to_rfc3339().as_bytes());
        Self(hex::encode(h.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex chars, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl fmt::Display for CycleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of one finished cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleReport {
    pub cycle_id: CycleId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub sales: SalesRecord,
    pub surplus: SurplusRecord,
    pub forecast: StockForecast,
}

/// Line written by the cycle recorder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    Done(CycleReport),
    Failed {
        ts: DateTime<Utc>,
        state: String,
        kind: String,
        message: String,
    },
}
