use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use pricepulse_core::{AbRegistry, PricingConfig, ProductRecord};

use crate::{StoreBackend, StoreError};

#[derive(Debug)]
struct State {
    products: Vec<ProductRecord>,
    counter: u64,
    config: Option<PricingConfig>,
    ab_tests: AbRegistry,
}

/// In-process backend for tests. Starts empty with the counter at `1`.
///
/// [`MemoryBackend::fail_writes`] makes every subsequent write return
/// [`StoreError::WriteRejected`], for exercising persistence-failure paths.
#[derive(Debug)]
pub struct MemoryBackend {
    state: Mutex<State>,
    fail_writes: AtomicBool,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::with_products(Vec::new())
    }
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populated with `products`.
    #[must_use]
    pub fn with_products(products: Vec<ProductRecord>) -> Self {
        Self {
            state: Mutex::new(State {
                products,
                counter: 1,
                config: None,
                ab_tests: AbRegistry::default(),
            }),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn state(&self) -> Result<std::sync::MutexGuard<'_, State>, StoreError> {
        self.state.lock().map_err(|_| StoreError::Poisoned)
    }

    fn check_writable(&self, what: &str) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(StoreError::WriteRejected(what.to_owned()))
        } else {
            Ok(())
        }
    }
}

impl StoreBackend for MemoryBackend {
    fn load_products(&self) -> Result<Vec<ProductRecord>, StoreError> {
        Ok(self.state()?.products.clone())
    }

    fn save_products(&self, products: &[ProductRecord]) -> Result<(), StoreError> {
        self.check_writable("products")?;
        self.state()?.products = products.to_vec();
        Ok(())
    }

    fn append_products(&self, products: &[ProductRecord]) -> Result<(), StoreError> {
        self.check_writable("products")?;
        self.state()?.products.extend_from_slice(products);
        Ok(())
    }

    fn next_id(&self) -> Result<u64, StoreError> {
        self.check_writable("id counter")?;
        let mut state = self.state()?;
        let value = state.counter;
        state.counter += 1;
        Ok(value)
    }

    fn load_config(&self) -> Result<Option<PricingConfig>, StoreError> {
        Ok(self.state()?.config.clone())
    }

    fn save_config(&self, config: &PricingConfig) -> Result<(), StoreError> {
        self.check_writable("config")?;
        self.state()?.config = Some(config.clone());
        Ok(())
    }

    fn load_ab_tests(&self) -> Result<AbRegistry, StoreError> {
        Ok(self.state()?.ab_tests.clone())
    }

    fn save_ab_tests(&self, registry: &AbRegistry) -> Result<(), StoreError> {
        self.check_writable("ab tests")?;
        self.state()?.ab_tests = registry.clone();
        Ok(())
    }
}
