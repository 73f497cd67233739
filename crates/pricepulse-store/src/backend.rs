use pricepulse_core::{AbRegistry, PricingConfig, ProductRecord};

use crate::StoreError;

/// Whole-document persistence for the three stores and the id counter.
///
/// Every call reads or writes the complete document; there is no partial
/// update. Callers serialize read-modify-write sequences themselves.
pub trait StoreBackend: Send + Sync {
    /// All product rows in file order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the products cannot be read or decoded.
    fn load_products(&self) -> Result<Vec<ProductRecord>, StoreError>;

    /// Replace every product row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails.
    fn save_products(&self, products: &[ProductRecord]) -> Result<(), StoreError>;

    /// Add rows after the existing ones.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails.
    fn append_products(&self, products: &[ProductRecord]) -> Result<(), StoreError>;

    /// Return the current counter value and persist `value + 1`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the counter cannot be read, parsed, or written.
    fn next_id(&self) -> Result<u64, StoreError>;

    /// `None` when no config has been written yet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if an existing document cannot be read.
    fn load_config(&self) -> Result<Option<PricingConfig>, StoreError>;

    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails.
    fn save_config(&self, config: &PricingConfig) -> Result<(), StoreError>;

    /// # Errors
    ///
    /// Returns [`StoreError`] if the registry cannot be read or decoded.
    fn load_ab_tests(&self) -> Result<AbRegistry, StoreError>;

    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails.
    fn save_ab_tests(&self, registry: &AbRegistry) -> Result<(), StoreError>;
}
