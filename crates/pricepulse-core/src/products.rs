use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Column order of the product store file. Serialization of
/// [`ProductRecord`] follows the same order.
pub const PRODUCT_COLUMNS: [&str; 11] = [
    "type",
    "disc",
    "id",
    "product_name",
    "competitor_price",
    "our_price",
    "inventory",
    "demand_score",
    "img_url",
    "timestamp",
    "url",
];

/// One ingested competitor product.
///
/// Field names on the wire (`type`, `product_name`, `img_url`) match the
/// tabular file header so the same struct serves the store and the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Product type key the batch was ingested under, e.g. `"phone"`.
    #[serde(rename = "type")]
    pub category: String,
    /// 0-based position within its ingestion batch. A ranking signal only;
    /// it repeats across batches.
    pub disc: u32,
    pub id: String,
    #[serde(rename = "product_name")]
    pub name: String,
    pub competitor_price: f64,
    pub our_price: f64,
    pub inventory: i64,
    pub demand_score: f64,
    #[serde(rename = "img_url")]
    pub image_url: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub url: String,
}

impl ProductRecord {
    /// Case-insensitive category match used by the category filters.
    #[must_use]
    pub fn in_category(&self, category: &str) -> bool {
        self.category.eq_ignore_ascii_case(category)
    }

    /// `competitor_price - our_price`; negative when we are above the competitor.
    #[must_use]
    pub fn savings(&self) -> f64 {
        self.competitor_price - self.our_price
    }
}

/// Accepts RFC 3339 as well as offset-less ISO-8601 (read as UTC), which is
/// what older store files contain.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(serde::de::Error::custom)
}

/// Rows matching `category` (case-insensitive), or all rows when `None`.
#[must_use]
pub fn filter_by_category<'a>(
    products: &'a [ProductRecord],
    category: Option<&str>,
) -> Vec<&'a ProductRecord> {
    products
        .iter()
        .filter(|p| category.is_none_or(|c| p.in_category(c)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(category: &str) -> ProductRecord {
        ProductRecord {
            category: category.to_owned(),
            disc: 0,
            id: "1".to_owned(),
            name: "Sample".to_owned(),
            competitor_price: 1000.0,
            our_price: 900.0,
            inventory: 50,
            demand_score: 1.2,
            image_url: String::new(),
            timestamp: Utc::now(),
            url: String::new(),
        }
    }

    #[test]
    fn serializes_with_store_column_names() {
        let json = serde_json::to_value(record("phone")).expect("serialize");
        let keys: Vec<&str> = json
            .as_object()
            .expect("object")
            .keys()
            .map(String::as_str)
            .collect();
        for column in PRODUCT_COLUMNS {
            assert!(keys.contains(&column), "missing column {column}");
        }
    }

    #[test]
    fn category_filter_ignores_case() {
        let rows = vec![record("Phone"), record("laptop"), record("phone")];
        assert_eq!(filter_by_category(&rows, Some("PHONE")).len(), 2);
        assert_eq!(filter_by_category(&rows, None).len(), 3);
        assert!(filter_by_category(&rows, Some("tablet")).is_empty());
    }

    #[test]
    fn naive_timestamps_are_read_as_utc() {
        let mut json = serde_json::to_value(record("phone")).expect("serialize");
        json["timestamp"] = serde_json::json!("2024-05-01T10:30:00.123456");
        let parsed: ProductRecord = serde_json::from_value(json).expect("naive timestamp");
        assert_eq!(parsed.timestamp.to_rfc3339(), "2024-05-01T10:30:00.123456+00:00");
    }

    #[test]
    fn garbage_timestamp_is_rejected() {
        let mut json = serde_json::to_value(record("phone")).expect("serialize");
        json["timestamp"] = serde_json::json!("yesterday");
        assert!(serde_json::from_value::<ProductRecord>(json).is_err());
    }

    #[test]
    fn savings_is_competitor_minus_ours() {
        assert!((record("phone").savings() - 100.0).abs() < f64::EPSILON);
    }
}
