use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use chrono::{DateTime, Utc};
use pricepulse_core::{AbRegistry, CoreError, PricingConfig, ProductRecord};

use crate::{FileBackend, StoreBackend, StoreError};

/// Shared handle over the product table, pricing config, A/B registry and
/// id counter.
///
/// Reads always go back to the backend, so a read after a write in the same
/// process sees that write. Read-modify-write sequences are serialized
/// within this handle; a second process writing the same files can still
/// lose updates.
///
/// The pricing config is the exception: it is loaded once in
/// [`Store::open`] and then served from memory, written through on change.
pub struct Store {
    backend: Arc<dyn StoreBackend>,
    config: RwLock<PricingConfig>,
    write_lock: Mutex<()>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Store {
    /// Wrap `backend`, seeding the pricing config with defaults if the
    /// backend has none.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the config cannot be read or the defaults
    /// cannot be written.
    pub fn open(backend: Arc<dyn StoreBackend>) -> Result<Self, StoreError> {
        let config = if let Some(config) = backend.load_config()? {
            config
        } else {
            let config = PricingConfig::default();
            backend.save_config(&config)?;
            tracing::info!("pricing config initialised with defaults");
            config
        };

        Ok(Self {
            backend,
            config: RwLock::new(config),
            write_lock: Mutex::new(()),
        })
    }

    /// [`Store::open`] over a [`FileBackend`] rooted at `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the directory cannot be prepared.
    pub fn open_dir(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::open(Arc::new(FileBackend::open(dir)?))
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>, StoreError> {
        self.write_lock.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Current pricing config.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Poisoned`] if a writer panicked.
    pub fn config(&self) -> Result<PricingConfig, StoreError> {
        self.config
            .read()
            .map(|c| c.clone())
            .map_err(|_| StoreError::Poisoned)
    }

    /// Validate and persist new discount bounds, then swap them in.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Core`] with [`CoreError::InvalidDiscountBounds`]
    /// (config unchanged) or a backend error if the write fails.
    pub fn update_discount_bounds(&self, min: f64, max: f64) -> Result<PricingConfig, StoreError> {
        let _guard = self.lock()?;
        let mut next = self.config()?;
        next.set_discount_bounds(min, max)?;
        self.backend.save_config(&next)?;

        let mut current = self.config.write().map_err(|_| StoreError::Poisoned)?;
        *current = next.clone();
        Ok(next)
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the product table cannot be read.
    pub fn list_products(&self) -> Result<Vec<ProductRecord>, StoreError> {
        self.backend.load_products()
    }

    /// # Errors
    ///
    /// Returns [`StoreError::ProductNotFound`] when no row has `id`.
    pub fn get_product(&self, id: &str) -> Result<ProductRecord, StoreError> {
        self.list_products()?
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::ProductNotFound(id.to_owned()))
    }

    /// Next locally generated product id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the counter cannot be advanced.
    pub fn next_product_id(&self) -> Result<u64, StoreError> {
        let _guard = self.lock()?;
        self.backend.next_id()
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails.
    pub fn append_products(&self, products: &[ProductRecord]) -> Result<(), StoreError> {
        if products.is_empty() {
            return Ok(());
        }
        let _guard = self.lock()?;
        self.backend.append_products(products)
    }

    /// Insert `products`, replacing any stored row with the same id in place
    /// so ids stay unique. Within `products` a later row wins over an earlier
    /// one. Returns how many rows were replaced.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the table cannot be read or written.
    pub fn upsert_products(&self, products: &[ProductRecord]) -> Result<usize, StoreError> {
        if products.is_empty() {
            return Ok(0);
        }
        let _guard = self.lock()?;
        let mut rows = self.backend.load_products()?;
        let mut index: HashMap<String, usize> = rows
            .iter()
            .enumerate()
            .map(|(i, row)| (row.id.clone(), i))
            .collect();

        let mut replaced = 0;
        for product in products {
            if let Some(&i) = index.get(&product.id) {
                rows[i] = product.clone();
                replaced += 1;
            } else {
                index.insert(product.id.clone(), rows.len());
                rows.push(product.clone());
            }
        }

        if replaced == 0 {
            self.backend.append_products(products)?;
        } else {
            self.backend.save_products(&rows)?;
        }
        Ok(replaced)
    }

    /// Load every row, let `f` edit them, and write the table back.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the table cannot be read or written.
    pub fn update_products<T>(
        &self,
        f: impl FnOnce(&mut [ProductRecord]) -> T,
    ) -> Result<T, StoreError> {
        let _guard = self.lock()?;
        let mut products = self.backend.load_products()?;
        let out = f(&mut products);
        self.backend.save_products(&products)?;
        Ok(out)
    }

    /// Edit the first row with `id` and write the table back.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ProductNotFound`] (nothing written) when no row
    /// has `id`, or a backend error.
    pub fn update_product<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut ProductRecord) -> T,
    ) -> Result<T, StoreError> {
        let _guard = self.lock()?;
        let mut products = self.backend.load_products()?;
        let product = products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::ProductNotFound(id.to_owned()))?;
        let out = f(product);
        self.backend.save_products(&products)?;
        Ok(out)
    }

    /// The A/B registry with lapsed tests flipped to `completed`. The flip
    /// is persisted before returning.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the registry cannot be read or written.
    pub fn ab_tests(&self, now: DateTime<Utc>) -> Result<AbRegistry, StoreError> {
        let _guard = self.lock()?;
        let mut registry = self.backend.load_ab_tests()?;
        let expired = registry.expire_due(now);
        if expired > 0 {
            tracing::info!(expired, "A/B tests completed");
            self.backend.save_ab_tests(&registry)?;
        }
        Ok(registry)
    }

    /// Apply `f` to the registry (after lazy expiry) and persist the result.
    /// Nothing is written when `f` fails.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Core`] with the error from `f`, or a backend error.
    pub fn update_ab_tests<T>(
        &self,
        now: DateTime<Utc>,
        f: impl FnOnce(&mut AbRegistry) -> Result<T, CoreError>,
    ) -> Result<T, StoreError> {
        let _guard = self.lock()?;
        let mut registry = self.backend.load_ab_tests()?;
        registry.expire_due(now);
        let out = f(&mut registry)?;
        self.backend.save_ab_tests(&registry)?;
        Ok(out)
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
