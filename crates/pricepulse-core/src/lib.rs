pub mod analytics;
pub mod app_config;
pub mod config;
pub mod discount;
pub mod error;
pub mod pricing;
pub mod pricing_config;
pub mod products;
pub mod signals;

pub use ab_test::{
    AbAnalysis, AbRegistry, AbTest, Arm, ArmCounters, ArmResults, EventKind, NewAbTest,
    Significance, TestStatus, Winner,
};
pub use analytics::{inventory_status, performance, summarize};
pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use discount::compute_discount;
pub use error::{ConfigError, CoreError};
pub use pricing::{compute_price, PriceQuote, PricingFactors, PricingStrategy};
pub use pricing_config::{validate_discount_bounds, PricingConfig};
pub use products::{filter_by_category, ProductRecord, PRODUCT_COLUMNS};
pub use signals::{normalize_category, simulate_demand, simulate_inventory};
