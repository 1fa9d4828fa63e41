// ===============================
// src/surplus.rs
// ===============================
use crate::domain::{Catalog, SalesRecord, StockRecord, SurplusRecord, Table};
use crate::error::PipelineError;
use crate::validator::Strictness;

/// `surplus[item] = stock[item] - sales[item]`, paired by item key.
///
/// Positive = waste, negative = stock-out; nothing is clamped. The result
/// follows catalog order. A stock row missing a catalog item is a
/// `ShapeMismatch`; unknown extra items are only an error in strict mode.
pub fn compute_surplus(
    catalog: &Catalog,
    sales: &SalesRecord,
    prior_stock: &StockRecord,
    strictness: Strictness,
) -> Result<SurplusRecord, PipelineError> {
    if strictness == Strictness::Strict {
        if let Some(extra) = prior_stock.items().find(|&i| !catalog.contains(i)) {
            return Err(PipelineError::ShapeMismatch {
                table: Table::Stock,
                detail: format!("unexpected item '{extra}' in stock row"),
            });
        }
    }

    let mut out = Vec::with_capacity(catalog.len());
    for item in catalog.items() {
        let sold = sales.get(item).ok_or_else(|| PipelineError::ShapeMismatch {
            table: Table::Sales,
            detail: format!("sales row has no value for '{item}'"),
        })?;
        let stocked = prior_stock.get(item).ok_or_else(|| PipelineError::ShapeMismatch {
            table: Table::Stock,
            detail: format!(
                "stock row has {} values, missing '{item}'",
                prior_stock.len()
            ),
        })?;
        out.push((item.clone(), stocked.saturating_sub(sold)));
    }
    Ok(SurplusRecord::from_pairs(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ItemRow, ItemType};

    fn six() -> Catalog {
        Catalog::new(["bacon", "egg_salad", "ham", "chicken", "tuna", "turkey"]).unwrap()
    }

    #[test]
    fn scenario_a_elementwise_difference() {
        let cat = six();
        let sales = ItemRow::from_catalog(&cat, &[10, 20, 30, 40, 50, 60]);
        let stock = ItemRow::from_catalog(&cat, &[15, 20, 25, 50, 45, 70]);
        let surplus = compute_surplus(&cat, &sales, &stock, Strictness::Lenient).unwrap();
        assert_eq!(surplus.values(), vec![5, 0, -5, 10, -5, 10]);
    }

    #[test]
    fn every_index_is_stock_minus_sales() {
        let cat = six();
        let sales = ItemRow::from_catalog(&cat, &[3, -4, 0, 100, 7, 1]);
        let stock = ItemRow::from_catalog(&cat, &[0, 9, 0, 50, 7, -3]);
        let surplus = compute_surplus(&cat, &sales, &stock, Strictness::Lenient).unwrap();
        for item in cat.items() {
            assert_eq!(
                surplus.get(item).unwrap(),
                stock.get(item).unwrap() - sales.get(item).unwrap()
            );
        }
        // negatives kept
        assert_eq!(surplus.get(&ItemType::new("chicken")), Some(-50));
    }

    #[test]
    fn stock_in_different_column_order_still_pairs_by_item() {
        let cat = Catalog::new(["a", "b", "c"]).unwrap();
        let sales = ItemRow::from_catalog(&cat, &[1, 2, 3]);
        let stock = ItemRow::from_pairs([
            (ItemType::new("c"), 30),
            (ItemType::new("a"), 10),
            (ItemType::new("b"), 20),
        ]);
        let surplus = compute_surplus(&cat, &sales, &stock, Strictness::Lenient).unwrap();
        assert_eq!(surplus.values(), vec![9, 18, 27]);
        assert_eq!(surplus.items().next().unwrap().as_str(), "a");
    }

    #[test]
    fn short_stock_row_is_a_shape_mismatch() {
        let cat = six();
        let sales = ItemRow::from_catalog(&cat, &[1, 1, 1, 1, 1, 1]);
        let stock = ItemRow::from_pairs(
            cat.items().iter().take(5).map(|i| (i.clone(), 1)),
        );
        let err = compute_surplus(&cat, &sales, &stock, Strictness::Lenient).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ShapeMismatch { table: Table::Stock, .. }
        ));
    }

    #[test]
    fn extra_stock_item_only_fails_in_strict_mode() {
        let cat = Catalog::new(["a", "b"]).unwrap();
        let sales = ItemRow::from_catalog(&cat, &[1, 2]);
        let stock = ItemRow::from_pairs([
            (ItemType::new("a"), 5),
            (ItemType::new("b"), 5),
            (ItemType::new("zz"), 5),
        ]);
        assert!(compute_surplus(&cat, &sales, &stock, Strictness::Lenient).is_ok());
        assert!(compute_surplus(&cat, &sales, &stock, Strictness::Strict).is_err());
    }

    #[test]
    fn pure_and_repeatable() {
        let cat = six();
        let sales = ItemRow::from_catalog(&cat, &[10, 20, 30, 40, 50, 60]);
        let stock = ItemRow::from_catalog(&cat, &[15, 20, 25, 50, 45, 70]);
        let a = compute_surplus(&cat, &sales, &stock, Strictness::Lenient).unwrap();
        let b = compute_surplus(&cat, &sales, &stock, Strictness::Lenient).unwrap();
        assert_eq!(a, b);
    }
}
