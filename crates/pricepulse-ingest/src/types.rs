//! Pricing API job payloads.
//!
//! Only the fields ingestion consumes are modelled. Everything else in a
//! job result stays as raw JSON.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Body of `GET jobs/{id}/download.json`. `results` is empty until the job
/// has finished.
#[derive(Debug, Default, Deserialize)]
pub struct JobDownload {
    #[serde(default)]
    pub results: Vec<JobResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobResult {
    #[serde(default)]
    pub content: Value,
}

/// One entry of `results[0].content.search_results`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchResultItem {
    #[serde(default)]
    pub name: Option<String>,
    /// Sent as a number or a numeric string depending on the source.
    #[serde(default, deserialize_with = "lenient_price")]
    pub min_price: Option<f64>,
    #[serde(default)]
    pub img_url: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    /// Upstream product id; blank or absent ids are replaced locally.
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
}

fn lenient_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Search hits from the first job result. Entries that are not objects are
/// skipped.
#[must_use]
pub fn search_results(results: &[JobResult]) -> Vec<SearchResultItem> {
    results
        .first()
        .and_then(|r| r.content.get("search_results"))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn results(content: Value) -> Vec<JobResult> {
        vec![JobResult { content }]
    }

    #[test]
    fn price_accepts_number_or_string() {
        let items = search_results(&results(json!({
            "search_results": [
                {"name": "A", "min_price": 52000},
                {"name": "B", "min_price": "25000.50"},
                {"name": "C", "min_price": "n/a"},
            ]
        })));
        assert_eq!(items[0].min_price, Some(52_000.0));
        assert_eq!(items[1].min_price, Some(25_000.5));
        assert_eq!(items[2].min_price, None);
    }

    #[test]
    fn blank_ids_are_dropped_and_numbers_stringified() {
        let items = search_results(&results(json!({
            "search_results": [{"id": ""}, {"id": 991}, {"id": "abc"}, {}]
        })));
        let ids: Vec<Option<String>> = items.into_iter().map(|i| i.id).collect();
        assert_eq!(
            ids,
            vec![None, Some("991".to_owned()), Some("abc".to_owned()), None]
        );
    }

    #[test]
    fn missing_search_results_yields_empty() {
        assert!(search_results(&[]).is_empty());
        assert!(search_results(&results(json!({"other": 1}))).is_empty());
        assert!(search_results(&results(json!({"search_results": "x"}))).is_empty());
    }

    #[test]
    fn non_object_entries_are_skipped() {
        let items = search_results(&results(json!({
            "search_results": [1, "two", {"name": "three"}]
        })));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name.as_deref(), Some("three"));
    }
}
