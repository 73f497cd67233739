pub mod client;
pub mod error;
pub mod fallback;
pub mod ingestor;
pub mod types;

pub use client::{PollSettings, PriceApiClient, SpecsOutcome};
pub use error::{IngestError, PriceApiError};
pub use fallback::{fallback_catalog, CatalogEntry};
pub use ingestor::{backoff_schedule, AttemptOutcome, IngestReport, IngestSource, Ingestor};
pub use types::{search_results, JobDownload, JobResult, SearchResultItem};
