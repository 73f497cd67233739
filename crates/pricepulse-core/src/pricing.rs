//! Dynamic pricing: strategy-bounded base discount adjusted by inventory,
//! demand, and time-of-day factors.

use chrono::{DateTime, Timelike, Utc};
use serde::Serialize;

use crate::discount::compute_discount;
use crate::signals::round2;
use crate::{PricingConfig, ProductRecord};

const MIN_FINAL_DISCOUNT: f64 = 0.01;
const MAX_FINAL_DISCOUNT: f64 = 0.5;

/// Named discount-range override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PricingStrategy {
    /// Uses the configured `min_discount`/`max_discount`.
    Default,
    /// Fixed range `[0.10, 0.40]` for market penetration.
    Aggressive,
    /// Fixed range `[0.02, 0.15]` for premium positioning.
    Premium,
}

impl PricingStrategy {
    /// Parses a strategy name. Unrecognized names price like `Default`.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "aggressive" => Self::Aggressive,
            "premium" => Self::Premium,
            _ => Self::Default,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Aggressive => "aggressive",
            Self::Premium => "premium",
        }
    }

    /// Output discount range `(min, max)`. Strategy ranges replace the
    /// configured ones outright.
    #[must_use]
    pub fn discount_bounds(self, config: &PricingConfig) -> (f64, f64) {
        match self {
            Self::Default => (config.min_discount, config.max_discount),
            Self::Aggressive => (0.1, 0.4),
            Self::Premium => (0.02, 0.15),
        }
    }
}

/// Breakdown of the inputs that produced a [`PriceQuote`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PricingFactors {
    /// Base discount as a percentage, rounded to two decimals.
    pub base_discount: f64,
    pub inventory_factor: f64,
    pub demand_factor: f64,
    pub time_factor: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceQuote {
    /// Competitor price less the final discount, rounded to two decimals.
    pub price: f64,
    /// Final discount as a percentage, rounded to two decimals.
    pub discount_applied: f64,
    /// Final discount fraction, in `[0.01, 0.5]`.
    pub final_discount: f64,
    pub factors: PricingFactors,
}

/// Scarcity shrinks the discount, surplus grows it.
#[must_use]
pub fn inventory_factor(inventory: i64) -> f64 {
    if inventory < 10 {
        1.1
    } else if inventory > 200 {
        0.95
    } else {
        1.0
    }
}

#[must_use]
pub fn demand_factor(demand_score: f64) -> f64 {
    if demand_score > 2.0 {
        1.05
    } else if demand_score < 0.5 {
        0.9
    } else {
        1.0
    }
}

/// Peak hours 18-22 UTC and off-peak hours 2-6 UTC, both inclusive.
#[must_use]
pub fn time_factor(hour: u32) -> f64 {
    match hour {
        18..=22 => 1.02,
        2..=6 => 0.98,
        _ => 1.0,
    }
}

/// Compute the dynamic price for one product.
///
/// The rank is normalized against the configured discount bounds no matter
/// which strategy is used; the strategy only changes the output range. The
/// base discount is then divided by the product of the adjustment factors
/// and clamped to `[0.01, 0.5]`.
#[must_use]
pub fn compute_price(
    product: &ProductRecord,
    strategy: PricingStrategy,
    config: &PricingConfig,
    now: DateTime<Utc>,
) -> PriceQuote {
    let (min_discount, max_discount) = strategy.discount_bounds(config);
    let base_discount = compute_discount(
        f64::from(product.disc),
        config.min_discount,
        config.max_discount,
        min_discount,
        max_discount,
    );

    let inventory_factor = inventory_factor(product.inventory);
    let demand_factor = demand_factor(product.demand_score);
    let time_factor = time_factor(now.hour());

    let final_discount = (base_discount / (inventory_factor * demand_factor * time_factor))
        .clamp(MIN_FINAL_DISCOUNT, MAX_FINAL_DISCOUNT);

    PriceQuote {
        price: round2(product.competitor_price * (1.0 - final_discount)),
        discount_applied: round2(final_discount * 100.0),
        final_discount,
        factors: PricingFactors {
            base_discount: round2(base_discount * 100.0),
            inventory_factor,
            demand_factor,
            time_factor,
        },
    }
}

#[cfg(test)]
#[path = "pricing_test.rs"]
mod tests;
