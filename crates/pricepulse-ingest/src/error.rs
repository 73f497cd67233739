use pricepulse_store::StoreError;
use thiserror::Error;

/// Errors returned by the pricing API job client.
#[derive(Debug, Error)]
pub enum PriceApiError {
    /// Network or TLS failure, or a non-2xx status on job submission.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid pricing API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// The submission was accepted but the body carried no `job_id`.
    #[error("job creation returned no job_id")]
    MissingJobId { body: serde_json::Value },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures that escape an ingestion run. Upstream trouble never does; only
/// a store failure while writing fallback rows.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to persist fallback products: {0}")]
    Store(#[from] StoreError),
}
