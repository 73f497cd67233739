use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Process-level settings read once at startup.
///
/// The mutable discount parameters live in [`crate::PricingConfig`] instead,
/// since those are persisted and edited at runtime.
#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Directory holding `pricing.csv`, `id_counter.txt`, `config.json` and `ab_tests.json`.
    pub data_dir: PathBuf,
    pub static_dir: PathBuf,
    pub priceapi_token: Option<String>,
    pub priceapi_base_url: String,
    pub priceapi_country: String,
    pub priceapi_source: String,
    pub priceapi_request_timeout_secs: u64,
    pub priceapi_poll_interval_secs: u64,
    pub priceapi_max_polls: u32,
    pub priceapi_specs_poll_interval_ms: u64,
    pub priceapi_specs_max_polls: u32,
    /// Categories re-ingested by the periodic ticker.
    pub tracked_categories: Vec<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("data_dir", &self.data_dir)
            .field("static_dir", &self.static_dir)
            .field(
                "priceapi_token",
                &self.priceapi_token.as_ref().map(|_| "[redacted]"),
            )
            .field("priceapi_base_url", &self.priceapi_base_url)
            .field("priceapi_country", &self.priceapi_country)
            .field("priceapi_source", &self.priceapi_source)
            .field(
                "priceapi_request_timeout_secs",
                &self.priceapi_request_timeout_secs,
            )
            .field(
                "priceapi_poll_interval_secs",
                &self.priceapi_poll_interval_secs,
            )
            .field("priceapi_max_polls", &self.priceapi_max_polls)
            .field(
                "priceapi_specs_poll_interval_ms",
                &self.priceapi_specs_poll_interval_ms,
            )
            .field("priceapi_specs_max_polls", &self.priceapi_specs_max_polls)
            .field("tracked_categories", &self.tracked_categories)
            .finish()
    }
}
