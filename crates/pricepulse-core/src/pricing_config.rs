use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Runtime-editable pricing parameters, persisted as a JSON document.
///
/// Loaded once at startup (created with defaults when absent), mutated in
/// place by the admin endpoint, and written back on every mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    pub max_discount: f64,
    pub min_discount: f64,
    pub enable_periodic_ingestion: bool,
    /// Seconds between periodic ingestion ticks.
    pub ingestion_interval: u64,
    /// Outer attempts per ingestion request before falling back.
    pub retry_attempts: u32,
    /// Initial back-off in seconds; doubles after every failed attempt.
    pub retry_delay: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            max_discount: 0.3,
            min_discount: 0.05,
            enable_periodic_ingestion: true,
            ingestion_interval: 3600,
            retry_attempts: 3,
            retry_delay: 2.0,
        }
    }
}

impl PricingConfig {
    /// Replace the discount bounds after checking `0 <= min <= max <= 1`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidDiscountBounds`] and leaves `self`
    /// untouched when the bounds are out of range or inverted.
    pub fn set_discount_bounds(&mut self, min: f64, max: f64) -> Result<(), CoreError> {
        validate_discount_bounds(min, max)?;
        self.min_discount = min;
        self.max_discount = max;
        Ok(())
    }
}

/// Checks `0 <= min <= max <= 1`. NaN fails every comparison and is rejected.
///
/// # Errors
///
/// Returns [`CoreError::InvalidDiscountBounds`] on violation.
pub fn validate_discount_bounds(min: f64, max: f64) -> Result<(), CoreError> {
    if 0.0 <= min && min <= max && max <= 1.0 {
        Ok(())
    } else {
        Err(CoreError::InvalidDiscountBounds { min, max })
    }
}
