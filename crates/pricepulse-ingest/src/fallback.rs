//! Built-in sample catalog used when the pricing API cannot be reached.

use pricepulse_core::normalize_category;

/// One sample product: display name, competitor price, image URL.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub name: String,
    pub price: f64,
    pub image_url: String,
}

fn entry(name: &str, price: f64, image: &str) -> CatalogEntry {
    CatalogEntry {
        name: name.to_owned(),
        price,
        image_url: format!("https://example.com/{image}.jpg"),
    }
}

/// Sample products for `category`. Known categories get three branded
/// samples; anything else gets three generic placeholders named after it.
#[must_use]
pub fn fallback_catalog(category: &str) -> Vec<CatalogEntry> {
    match normalize_category(category).as_str() {
        "phone" => vec![
            entry("Sample iPhone 14", 52_000.0, "iphone"),
            entry("Sample Samsung Galaxy", 25_000.0, "samsung"),
            entry("Sample OnePlus", 35_000.0, "oneplus"),
        ],
        "laptop" => vec![
            entry("Sample MacBook Pro", 120_000.0, "macbook"),
            entry("Sample Dell XPS", 80_000.0, "dell"),
            entry("Sample HP Pavilion", 45_000.0, "hp"),
        ],
        "headphones" => vec![
            entry("Sample Sony WH-1000XM4", 25_000.0, "sony"),
            entry("Sample Bose QuietComfort", 28_000.0, "bose"),
            entry("Sample Apple AirPods", 18_000.0, "airpods"),
        ],
        "speakers" => vec![
            entry("Sample JBL Charge", 8_000.0, "jbl"),
            entry("Sample Bose SoundLink", 12_000.0, "bosespeaker"),
            entry("Sample Sony SRS", 6_000.0, "sonyspeaker"),
        ],
        "smart watches" => vec![
            entry("Sample Apple Watch", 35_000.0, "applewatch"),
            entry("Sample Samsung Galaxy Watch", 25_000.0, "samsungwatch"),
            entry("Sample Fitbit Versa", 15_000.0, "fitbit"),
        ],
        _ => vec![
            entry(&format!("Sample {category} Product 1"), 20_000.0, "product1"),
            entry(&format!("Sample {category} Product 2"), 15_000.0, "product2"),
            entry(&format!("Sample {category} Product 3"), 30_000.0, "product3"),
        ],
    }
}
