//! Read-only rollups over the product store for the analytics and
//! inventory endpoints.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::ProductRecord;

const LOW_STOCK_BELOW: i64 = 10;
const HIGH_STOCK_ABOVE: i64 = 200;
const ALERT_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_products: usize,
    pub unique_categories: usize,
    pub avg_competitor_price: f64,
    pub avg_our_price: f64,
    pub total_inventory: i64,
    pub avg_demand_score: f64,
    pub price_range: PriceRange,
    pub categories: BTreeMap<String, usize>,
    pub total_potential_savings: f64,
    pub avg_savings_per_product: f64,
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Store-wide summary; `None` when the store is empty.
#[must_use]
pub fn summarize(products: &[ProductRecord]) -> Option<Summary> {
    if products.is_empty() {
        return None;
    }

    let mut categories: BTreeMap<String, usize> = BTreeMap::new();
    for p in products {
        *categories.entry(p.category.clone()).or_default() += 1;
    }

    let min = products
        .iter()
        .map(|p| p.competitor_price)
        .fold(f64::INFINITY, f64::min);
    let max = products
        .iter()
        .map(|p| p.competitor_price)
        .fold(f64::NEG_INFINITY, f64::max);
    let total_potential_savings: f64 = products.iter().map(ProductRecord::savings).sum();

    Some(Summary {
        total_products: products.len(),
        unique_categories: categories.len(),
        avg_competitor_price: mean(products.iter().map(|p| p.competitor_price)).unwrap_or(0.0),
        avg_our_price: mean(products.iter().map(|p| p.our_price)).unwrap_or(0.0),
        total_inventory: products.iter().map(|p| p.inventory).sum(),
        avg_demand_score: mean(products.iter().map(|p| p.demand_score)).unwrap_or(0.0),
        price_range: PriceRange { min, max },
        categories,
        total_potential_savings,
        avg_savings_per_product: mean(products.iter().map(ProductRecord::savings)).unwrap_or(0.0),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryPerformance {
    pub product_count: usize,
    pub avg_price: f64,
    pub total_inventory: i64,
    pub avg_demand: f64,
    /// Mean of `our_price / competitor_price`; rows with a zero competitor
    /// price are skipped.
    pub price_competitiveness: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trends {
    pub recent_products_added: usize,
    pub recent_avg_price: f64,
    pub price_change_trend: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataFreshness {
    pub latest_update: Option<DateTime<Utc>>,
    pub oldest_data: Option<DateTime<Utc>>,
    pub total_updates: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceReport {
    pub performance_by_category: BTreeMap<String, CategoryPerformance>,
    pub trends: Trends,
    pub data_freshness: DataFreshness,
}

/// Per-category rollups plus the 24-hour trend window ending at `now`.
/// `None` when the store is empty.
#[must_use]
pub fn performance(products: &[ProductRecord], now: DateTime<Utc>) -> Option<PerformanceReport> {
    if products.is_empty() {
        return None;
    }

    let mut grouped: BTreeMap<&str, Vec<&ProductRecord>> = BTreeMap::new();
    for p in products {
        grouped.entry(p.category.as_str()).or_default().push(p);
    }

    let performance_by_category = grouped
        .into_iter()
        .map(|(category, rows)| {
            let perf = CategoryPerformance {
                product_count: rows.len(),
                avg_price: mean(rows.iter().map(|p| p.competitor_price)).unwrap_or(0.0),
                total_inventory: rows.iter().map(|p| p.inventory).sum(),
                avg_demand: mean(rows.iter().map(|p| p.demand_score)).unwrap_or(0.0),
                price_competitiveness: mean(
                    rows.iter()
                        .filter(|p| p.competitor_price > 0.0)
                        .map(|p| p.our_price / p.competitor_price),
                ),
            };
            (category.to_owned(), perf)
        })
        .collect();

    let cutoff = now - Duration::days(1);
    let recent: Vec<&ProductRecord> = products.iter().filter(|p| p.timestamp > cutoff).collect();

    Some(PerformanceReport {
        performance_by_category,
        trends: Trends {
            recent_products_added: recent.len(),
            recent_avg_price: mean(recent.iter().map(|p| p.competitor_price)).unwrap_or(0.0),
            price_change_trend: "stable",
        },
        data_freshness: DataFreshness {
            latest_update: products.iter().map(|p| p.timestamp).max(),
            oldest_data: products.iter().map(|p| p.timestamp).min(),
            total_updates: products.len(),
        },
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryMetrics {
    pub total_products: usize,
    pub total_inventory: i64,
    pub avg_inventory_per_product: f64,
    pub low_stock_products: usize,
    pub out_of_stock_products: usize,
    pub high_inventory_products: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockAlert {
    pub id: String,
    pub product_name: String,
    pub inventory: i64,
    pub our_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryAlerts {
    pub low_stock_products: Vec<StockAlert>,
    pub high_inventory_products: Vec<StockAlert>,
}

fn alert(p: &ProductRecord) -> StockAlert {
    StockAlert {
        id: p.id.clone(),
        product_name: p.name.clone(),
        inventory: p.inventory,
        our_price: p.our_price,
    }
}

/// Stock metrics and the first ten low/high stock rows.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn inventory_status(products: &[&ProductRecord]) -> (InventoryMetrics, InventoryAlerts) {
    let total_inventory: i64 = products.iter().map(|p| p.inventory).sum();
    let low: Vec<&&ProductRecord> = products
        .iter()
        .filter(|p| p.inventory < LOW_STOCK_BELOW)
        .collect();
    let high: Vec<&&ProductRecord> = products
        .iter()
        .filter(|p| p.inventory > HIGH_STOCK_ABOVE)
        .collect();

    let avg = mean(products.iter().map(|p| p.inventory as f64)).unwrap_or(0.0);

    let metrics = InventoryMetrics {
        total_products: products.len(),
        total_inventory,
        avg_inventory_per_product: (avg * 10.0).round() / 10.0,
        low_stock_products: low.len(),
        out_of_stock_products: products.iter().filter(|p| p.inventory == 0).count(),
        high_inventory_products: high.len(),
    };
    let alerts = InventoryAlerts {
        low_stock_products: low.iter().take(ALERT_LIMIT).map(|p| alert(p)).collect(),
        high_inventory_products: high.iter().take(ALERT_LIMIT).map(|p| alert(p)).collect(),
    };
    (metrics, alerts)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 2, 12, 0, 0).unwrap()
    }

    fn row(id: &str, category: &str, competitor: f64, ours: f64, inventory: i64) -> ProductRecord {
        ProductRecord {
            category: category.to_owned(),
            disc: 0,
            id: id.to_owned(),
            name: format!("Product {id}"),
            competitor_price: competitor,
            our_price: ours,
            inventory,
            demand_score: 1.0,
            image_url: String::new(),
            timestamp: now() - Duration::hours(2),
            url: String::new(),
        }
    }

    #[test]
    fn empty_store_has_no_summary_or_report() {
        assert!(summarize(&[]).is_none());
        assert!(performance(&[], now()).is_none());
    }

    #[test]
    fn summary_aggregates_prices_and_savings() {
        let rows = vec![
            row("1", "phone", 1000.0, 900.0, 50),
            row("2", "phone", 3000.0, 2700.0, 5),
            row("3", "laptop", 2000.0, 2000.0, 250),
        ];
        let s = summarize(&rows).unwrap();
        assert_eq!(s.total_products, 3);
        assert_eq!(s.unique_categories, 2);
        assert_eq!(s.categories["phone"], 2);
        assert_eq!(s.total_inventory, 305);
        assert!((s.avg_competitor_price - 2000.0).abs() < 1e-9);
        assert!((s.price_range.min - 1000.0).abs() < 1e-9);
        assert!((s.price_range.max - 3000.0).abs() < 1e-9);
        assert!((s.total_potential_savings - 400.0).abs() < 1e-9);
    }

    #[test]
    fn performance_groups_by_category_and_skips_zero_price_ratio() {
        let mut stale = row("3", "laptop", 0.0, 10.0, 1);
        stale.timestamp = now() - Duration::days(3);
        let rows = vec![
            row("1", "phone", 1000.0, 900.0, 50),
            row("2", "phone", 1000.0, 800.0, 30),
            stale,
        ];
        let report = performance(&rows, now()).unwrap();
        let phone = &report.performance_by_category["phone"];
        assert_eq!(phone.product_count, 2);
        assert_eq!(phone.total_inventory, 80);
        assert!((phone.price_competitiveness.unwrap() - 0.85).abs() < 1e-9);
        assert!(report.performance_by_category["laptop"]
            .price_competitiveness
            .is_none());
        assert_eq!(report.trends.recent_products_added, 2);
        assert_eq!(report.data_freshness.total_updates, 3);
        assert_eq!(
            report.data_freshness.oldest_data,
            Some(now() - Duration::days(3))
        );
    }

    #[test]
    fn inventory_status_counts_and_caps_alerts() {
        let mut rows: Vec<ProductRecord> = (0..12)
            .map(|i| row(&i.to_string(), "phone", 100.0, 90.0, 0))
            .collect();
        rows.push(row("big", "phone", 100.0, 90.0, 300));
        let refs: Vec<&ProductRecord> = rows.iter().collect();

        let (metrics, alerts) = inventory_status(&refs);
        assert_eq!(metrics.total_products, 13);
        assert_eq!(metrics.low_stock_products, 12);
        assert_eq!(metrics.out_of_stock_products, 12);
        assert_eq!(metrics.high_inventory_products, 1);
        assert!((metrics.avg_inventory_per_product - 23.1).abs() < 1e-9);
        assert_eq!(alerts.low_stock_products.len(), 10);
        assert_eq!(alerts.high_inventory_products[0].id, "big");
    }
}
