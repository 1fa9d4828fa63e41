// ===============================
// src/forecast.rs
// ===============================
//
// Proyeksi stok berikutnya dari moving average penjualan:
//   projected = mean(window) * (1 + buffer), lalu dibulatkan.
//
// Dihitung sebagai pecahan integer (sum * (1e6 + buffer_ppm)) / (n * 1e6)
// supaya tie .5 benar-benar tie; f64 bikin 55 * 1.1 = 60.50000000000001.
// Buffer dibulatkan ke satuan ppm.
//
// Pembulatan default: half-to-even (banker's), sama dengan pembulatan
// nearest-integer sistem lama. Bisa diganti ke half-away-from-zero via ENV.
//
use crate::domain::{ItemType, SalesHistoryWindow, StockForecast};
use crate::error::ForecastError;

/// Tie-breaking rule for the projected quantity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Rounding {
    /// 2.5 -> 2, 3.5 -> 4
    #[default]
    HalfEven,
    /// 2.5 -> 3, -2.5 -> -3
    HalfAwayFromZero,
}

impl Rounding {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "half_even" | "bankers" | "even" => Some(Rounding::HalfEven),
            "half_away" | "half_away_from_zero" | "half_up" => Some(Rounding::HalfAwayFromZero),
            _ => None,
        }
    }

    /// Round `num / den` to an integer. `den` must be positive.
    pub fn apply(&self, num: i128, den: i128) -> i64 {
        debug_assert!(den > 0);
        let q = num.div_euclid(den);
        let twice_rem = 2 * num.rem_euclid(den);
        let r = if twice_rem < den {
            q
        } else if twice_rem > den {
            q + 1
        } else {
            match self {
                Rounding::HalfEven if q % 2 == 0 => q,
                Rounding::HalfEven => q + 1,
                // q + 0.5 with q < 0 is already the value away from zero
                Rounding::HalfAwayFromZero if q < 0 => q,
                Rounding::HalfAwayFromZero => q + 1,
            }
        };
        i64::try_from(r).unwrap_or(if r < 0 { i64::MIN } else { i64::MAX })
    }
}

/// What the orchestrator does when an item has no sales history yet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EmptyWindowPolicy {
    #[default]
    Fail,
    Zero,
}

impl EmptyWindowPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" | "error" => Some(EmptyWindowPolicy::Fail),
            "zero" | "0" => Some(EmptyWindowPolicy::Zero),
            _ => None,
        }
    }
}

const PPM: i128 = 1_000_000;

fn buffer_ppm(buffer: f64) -> i128 {
    (buffer * PPM as f64).round() as i128
}

/// Projected stock for one item.
pub fn project(
    item: &ItemType,
    values: &[i64],
    buffer: f64,
    rounding: Rounding,
) -> Result<i64, ForecastError> {
    if values.is_empty() {
        return Err(ForecastError::EmptyWindow { item: item.clone() });
    }
    let sum: i128 = values.iter().map(|&v| v as i128).sum();
    let num = sum * (PPM + buffer_ppm(buffer));
    let den = values.len() as i128 * PPM;
    Ok(rounding.apply(num, den))
}

/// Forecast every item of the window, in window (catalog) order.
pub fn forecast(
    window: &SalesHistoryWindow,
    buffer: f64,
    rounding: Rounding,
) -> Result<StockForecast, ForecastError> {
    let mut out = Vec::with_capacity(window.columns.len());
    for (item, values) in &window.columns {
        out.push((item.clone(), project(item, values, buffer, rounding)?));
    }
    Ok(StockForecast::from_pairs(out))
}

/// Like [`forecast`], but applies `policy` to items without history.
pub fn forecast_with_policy(
    window: &SalesHistoryWindow,
    buffer: f64,
    rounding: Rounding,
    policy: EmptyWindowPolicy,
) -> Result<StockForecast, ForecastError> {
    match policy {
        EmptyWindowPolicy::Fail => forecast(window, buffer, rounding),
        EmptyWindowPolicy::Zero => {
            let mut out = Vec::with_capacity(window.columns.len());
            for (item, values) in &window.columns {
                let qty = match project(item, values, buffer, rounding) {
                    Ok(q) => q,
                    Err(ForecastError::EmptyWindow { .. }) => {
                        tracing::warn!(item = %item, "no sales history, forecasting 0");
                        0
                    }
                };
                out.push((item.clone(), qty));
            }
            Ok(StockForecast::from_pairs(out))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(cols: Vec<(&str, Vec<i64>)>) -> SalesHistoryWindow {
        SalesHistoryWindow {
            columns: cols
                .into_iter()
                .map(|(n, v)| (ItemType::new(n), v))
                .collect(),
        }
    }

    #[test]
    fn scenario_d_ten_percent_buffer() {
        let w = window(vec![("bacon", vec![8, 12, 10, 9, 11])]);
        let f = forecast(&w, 0.10, Rounding::HalfEven).unwrap();
        assert_eq!(f.values(), vec![11]);
    }

    #[test]
    fn scenario_e_empty_window_is_an_error() {
        let w = window(vec![("bacon", vec![1, 2]), ("new_item", vec![])]);
        let err = forecast(&w, 0.10, Rounding::HalfEven).unwrap_err();
        assert_eq!(err, ForecastError::EmptyWindow { item: ItemType::new("new_item") });
    }

    #[test]
    fn zero_policy_fills_empty_windows() {
        let w = window(vec![("bacon", vec![10, 10]), ("new_item", vec![])]);
        let f = forecast_with_policy(&w, 0.10, Rounding::HalfEven, EmptyWindowPolicy::Zero)
            .unwrap();
        assert_eq!(f.values(), vec![11, 0]);
        assert!(
            forecast_with_policy(&w, 0.10, Rounding::HalfEven, EmptyWindowPolicy::Fail).is_err()
        );
    }

    #[test]
    fn short_window_uses_what_exists() {
        let w = window(vec![("bacon", vec![20])]);
        assert_eq!(forecast(&w, 0.10, Rounding::HalfEven).unwrap().values(), vec![22]);
    }

    #[test]
    fn rounding_rules_differ_only_on_ties() {
        assert_eq!(Rounding::HalfEven.apply(5, 2), 2);
        assert_eq!(Rounding::HalfAwayFromZero.apply(5, 2), 3);
        assert_eq!(Rounding::HalfEven.apply(7, 2), 4);
        assert_eq!(Rounding::HalfAwayFromZero.apply(7, 2), 4);
        assert_eq!(Rounding::HalfEven.apply(-5, 2), -2);
        assert_eq!(Rounding::HalfAwayFromZero.apply(-5, 2), -3);
        assert_eq!(Rounding::HalfEven.apply(12, 5), 2);
        assert_eq!(Rounding::HalfAwayFromZero.apply(13, 5), 3);
        assert_eq!(Rounding::HalfEven.apply(-13, 5), -3);
        // bukan ceiling
        assert_eq!(Rounding::HalfEven.apply(51, 5), 10);
    }

    #[test]
    fn ties_under_a_ten_percent_buffer_are_exact() {
        // 55 * 1.1 = 60.5, 95 * 1.1 = 104.5, 115 * 1.1 = 126.5
        let w = window(vec![("a", vec![55]), ("b", vec![95]), ("c", vec![115])]);
        assert_eq!(forecast(&w, 0.10, Rounding::HalfEven).unwrap().values(), vec![60, 104, 126]);
        assert_eq!(
            forecast(&w, 0.10, Rounding::HalfAwayFromZero).unwrap().values(),
            vec![61, 105, 127]
        );
    }

    #[test]
    fn half_even_matches_integer_reference_across_ties() {
        for m in (5..20_000i64).step_by(10) {
            // m * 11 / 10 always ends in .5 here
            let q = m * 11 / 10;
            let expected = if q % 2 == 0 { q } else { q + 1 };
            let w = window(vec![("x", vec![m])]);
            let got = forecast(&w, 0.10, Rounding::HalfEven).unwrap().values()[0];
            assert_eq!(got, expected, "m = {m}");
        }
    }

    #[test]
    fn tie_with_zero_buffer() {
        let w = window(vec![("a", vec![2, 3]), ("b", vec![3, 4])]);
        assert_eq!(forecast(&w, 0.0, Rounding::HalfEven).unwrap().values(), vec![2, 4]);
        assert_eq!(
            forecast(&w, 0.0, Rounding::HalfAwayFromZero).unwrap().values(),
            vec![3, 4]
        );
    }

    #[test]
    fn scaling_the_window_scales_the_forecast() {
        let base: Vec<i64> = vec![8, 12, 10, 9, 11];
        let f1 = forecast(&window(vec![("x", base.clone())]), 0.10, Rounding::HalfEven).unwrap();
        for factor in [2i64, 3, 7, 10] {
            let scaled: Vec<i64> = base.iter().map(|v| v * factor).collect();
            let fk = forecast(&window(vec![("x", scaled)]), 0.10, Rounding::HalfEven).unwrap();
            let expected = f1.values()[0] * factor;
            assert!((fk.values()[0] - expected).abs() <= factor);
        }
    }

    #[test]
    fn output_follows_window_order() {
        let w = window(vec![("z", vec![1]), ("a", vec![2]), ("m", vec![3])]);
        let f = forecast(&w, 0.0, Rounding::HalfEven).unwrap();
        let names: Vec<&str> = f.items().map(|i| i.as_str()).collect();
        assert_eq!(names, vec!["z", "a", "m"]);
    }

    #[test]
    fn forecast_is_pure() {
        let w = window(vec![("a", vec![5, 6, 7]), ("b", vec![0, 0, 1])]);
        assert_eq!(
            forecast(&w, 0.10, Rounding::HalfEven).unwrap(),
            forecast(&w, 0.10, Rounding::HalfEven).unwrap()
        );
    }
}
