//! Simulated inventory and demand signals.
//!
//! Stand-ins for real stock and demand feeds. Both are deterministic for a
//! given input (inventory is seeded from the integer price) apart from the
//! daily-cycle term in demand, which reads the supplied clock.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const BASE_INVENTORY: f64 = 100.0;
const MIN_INVENTORY: i64 = 1;
const MAX_INVENTORY: i64 = 500;
const MIN_DEMAND: f64 = 0.1;
const MAX_DEMAND: f64 = 3.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Lowercases and folds `smart-watches` / `smart_watches` onto `smart watches`.
#[must_use]
pub fn normalize_category(category: &str) -> String {
    category
        .trim()
        .to_lowercase()
        .replace(['-', '_'], " ")
}

/// Stock multiplier per product type.
fn type_modifier(category: &str) -> f64 {
    match normalize_category(category).as_str() {
        "phone" => 1.2,
        "laptop" => 0.8,
        "headphones" => 1.5,
        "speakers" => 0.9,
        "smart watches" => 1.1,
        _ => 1.0,
    }
}

/// Simulated stock count in `[1, 500]`.
///
/// Cheaper items get proportionally more stock (capped at 2x), scaled by a
/// per-category modifier and a repeatable factor in `[0.8, 1.2]` seeded
/// from the integer part of `price`.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn simulate_inventory(price: f64, category: &str) -> i64 {
    let price_factor = (10_000.0 / price.max(1_000.0)).clamp(0.1, 2.0);
    let mut rng = StdRng::seed_from_u64(price.max(0.0) as u64);
    let random_factor = 0.8 + 0.4 * rng.random::<f64>();

    let inventory =
        (BASE_INVENTORY * price_factor * type_modifier(category) * random_factor).round() as i64;
    inventory.clamp(MIN_INVENTORY, MAX_INVENTORY)
}

/// Category price band where demand peaks, and the band outside which it sags.
fn price_score(price: f64, category: &str) -> f64 {
    match normalize_category(category).as_str() {
        "phone" => {
            if (15_000.0..=30_000.0).contains(&price) {
                1.5
            } else if !(10_000.0..=50_000.0).contains(&price) {
                0.7
            } else {
                1.0
            }
        }
        "laptop" => {
            if (40_000.0..=80_000.0).contains(&price) {
                1.4
            } else if !(25_000.0..=120_000.0).contains(&price) {
                0.6
            } else {
                1.0
            }
        }
        _ => 1.0,
    }
}

/// Simulated demand score in `[0.1, 3.0]`, rounded to two decimals.
///
/// `position` is the item's 0-based rank in the search results; earlier
/// items score higher. A slow sine over `now` models a daily cycle.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn simulate_demand(price: f64, category: &str, position: u32, now: DateTime<Utc>) -> f64 {
    let position_score = (2.0 - f64::from(position) * 0.1).max(0.3);
    let now_seconds = now.timestamp_millis() as f64 / 1_000.0;
    let time_factor = 0.9 + 0.2 * (now_seconds / SECONDS_PER_DAY).sin();

    let score = position_score * price_score(price, category) * time_factor;
    round2(score.clamp(MIN_DEMAND, MAX_DEMAND))
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
