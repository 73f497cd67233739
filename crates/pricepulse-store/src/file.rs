//! Flat-file backend: a CSV product table, a plain-text id counter, and two
//! JSON documents, all in one data directory.

use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use pricepulse_core::{AbRegistry, PricingConfig, ProductRecord, PRODUCT_COLUMNS};

use crate::{StoreBackend, StoreError};

pub const PRODUCTS_FILE: &str = "pricing.csv";
pub const COUNTER_FILE: &str = "id_counter.txt";
pub const CONFIG_FILE: &str = "config.json";
pub const AB_TESTS_FILE: &str = "ab_tests.json";

const INITIAL_COUNTER: &str = "1";

#[derive(Debug, Clone)]
pub struct FileBackend {
    products: PathBuf,
    counter: PathBuf,
    config: PathBuf,
    ab_tests: PathBuf,
}

impl FileBackend {
    /// Open `dir`, creating it and any missing files: the product table with
    /// just its header row, the counter at `1`, and an empty A/B registry.
    /// The config file is left for [`crate::Store::open`] to seed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory or a seed file cannot be created.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;

        let backend = Self {
            products: dir.join(PRODUCTS_FILE),
            counter: dir.join(COUNTER_FILE),
            config: dir.join(CONFIG_FILE),
            ab_tests: dir.join(AB_TESTS_FILE),
        };

        if !backend.products.exists() {
            backend.save_products(&[])?;
        }
        if !backend.counter.exists() {
            write_file(&backend.counter, INITIAL_COUNTER)?;
        }
        if !backend.ab_tests.exists() {
            write_file(&backend.ab_tests, "{}")?;
        }

        tracing::debug!(dir = %dir.display(), "file store opened");
        Ok(backend)
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), StoreError> {
    fs::write(path, contents).map_err(|e| StoreError::io(path, e))
}

fn write_products(
    path: &Path,
    writer: &mut csv::Writer<fs::File>,
    products: &[ProductRecord],
) -> Result<(), StoreError> {
    for product in products {
        writer
            .serialize(product)
            .map_err(|e| StoreError::csv(path, e))?;
    }
    writer.flush().map_err(|e| StoreError::io(path, e))
}

impl StoreBackend for FileBackend {
    fn load_products(&self) -> Result<Vec<ProductRecord>, StoreError> {
        let mut reader = match csv::Reader::from_path(&self.products) {
            Ok(reader) => reader,
            Err(e) => match e.kind() {
                csv::ErrorKind::Io(io) if io.kind() == ErrorKind::NotFound => {
                    return Ok(Vec::new())
                }
                _ => return Err(StoreError::csv(&self.products, e)),
            },
        };

        reader
            .deserialize::<ProductRecord>()
            .map(|row| row.map_err(|e| StoreError::csv(&self.products, e)))
            .collect()
    }

    fn save_products(&self, products: &[ProductRecord]) -> Result<(), StoreError> {
        let file = fs::File::create(&self.products).map_err(|e| StoreError::io(&self.products, e))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer
            .write_record(PRODUCT_COLUMNS)
            .map_err(|e| StoreError::csv(&self.products, e))?;
        write_products(&self.products, &mut writer, products)
    }

    fn append_products(&self, products: &[ProductRecord]) -> Result<(), StoreError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.products)
            .map_err(|e| StoreError::io(&self.products, e))?;
        let is_empty = file
            .metadata()
            .map_err(|e| StoreError::io(&self.products, e))?
            .len()
            == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if is_empty {
            writer
                .write_record(PRODUCT_COLUMNS)
                .map_err(|e| StoreError::csv(&self.products, e))?;
        }
        write_products(&self.products, &mut writer, products)
    }

    fn next_id(&self) -> Result<u64, StoreError> {
        let raw = fs::read_to_string(&self.counter).map_err(|e| StoreError::io(&self.counter, e))?;
        let value: u64 = raw
            .trim()
            .parse()
            .map_err(|_| StoreError::InvalidCounter {
                path: self.counter.clone(),
                value: raw.trim().to_owned(),
            })?;
        write_file(&self.counter, &(value + 1).to_string())?;
        Ok(value)
    }

    fn load_config(&self) -> Result<Option<PricingConfig>, StoreError> {
        let raw = match fs::read_to_string(&self.config) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(&self.config, e)),
        };
        match serde_json::from_str(&raw) {
            Ok(config) => Ok(Some(config)),
            Err(e) => {
                tracing::warn!(
                    path = %self.config.display(),
                    error = %e,
                    "unreadable pricing config; reverting to defaults"
                );
                Ok(None)
            }
        }
    }

    fn save_config(&self, config: &PricingConfig) -> Result<(), StoreError> {
        let body = serde_json::to_string_pretty(config).map_err(|e| StoreError::json(&self.config, e))?;
        write_file(&self.config, &body)
    }

    fn load_ab_tests(&self) -> Result<AbRegistry, StoreError> {
        let raw = match fs::read_to_string(&self.ab_tests) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(AbRegistry::default()),
            Err(e) => return Err(StoreError::io(&self.ab_tests, e)),
        };
        serde_json::from_str(&raw).map_err(|e| StoreError::json(&self.ab_tests, e))
    }

    fn save_ab_tests(&self, registry: &AbRegistry) -> Result<(), StoreError> {
        let body =
            serde_json::to_string_pretty(registry).map_err(|e| StoreError::json(&self.ab_tests, e))?;
        write_file(&self.ab_tests, &body)
    }
}
