use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

pub const DEFAULT_TRACKED_CATEGORIES: &str = "phone,laptop,headphones,speakers,smart watches";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Parsing and validation are decoupled from the real environment so tests
/// can drive it with a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("PRICEPULSE_ENV", "development"));
    let bind_addr = parse_addr("PRICEPULSE_BIND_ADDR", "0.0.0.0:8000")?;
    let log_level = or_default("PRICEPULSE_LOG_LEVEL", "info");
    let data_dir = PathBuf::from(or_default("PRICEPULSE_DATA_DIR", "./data"));
    let static_dir = PathBuf::from(or_default("PRICEPULSE_STATIC_DIR", "./static"));

    let priceapi_token = lookup("PRICEAPI_TOKEN")
        .ok()
        .map(|t| t.trim().to_owned())
        .filter(|t| !t.is_empty());
    let priceapi_base_url = or_default("PRICEAPI_BASE_URL", "https://api.priceapi.com/v2/");
    let priceapi_country = or_default("PRICEAPI_COUNTRY", "in");
    let priceapi_source = or_default("PRICEAPI_SOURCE", "google_shopping");
    let priceapi_request_timeout_secs = parse_u64("PRICEAPI_REQUEST_TIMEOUT_SECS", "30")?;
    let priceapi_poll_interval_secs = parse_u64("PRICEAPI_POLL_INTERVAL_SECS", "10")?;
    let priceapi_max_polls = parse_u32("PRICEAPI_MAX_POLLS", "30")?;
    let priceapi_specs_poll_interval_ms = parse_u64("PRICEAPI_SPECS_POLL_INTERVAL_MS", "1500")?;
    let priceapi_specs_max_polls = parse_u32("PRICEAPI_SPECS_MAX_POLLS", "20")?;

    let tracked_categories = parse_categories(&or_default(
        "PRICEPULSE_TRACKED_CATEGORIES",
        DEFAULT_TRACKED_CATEGORIES,
    ));

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        data_dir,
        static_dir,
        priceapi_token,
        priceapi_base_url,
        priceapi_country,
        priceapi_source,
        priceapi_request_timeout_secs,
        priceapi_poll_interval_secs,
        priceapi_max_polls,
        priceapi_specs_poll_interval_ms,
        priceapi_specs_max_polls,
        tracked_categories,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

fn parse_categories(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
