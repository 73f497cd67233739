//! Ingestion orchestrator: submit a search job, poll for results, and turn
//! the hits into product rows, retrying with exponential back-off and
//! degrading to the sample catalog once the attempts are spent.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use pricepulse_core::{simulate_demand, simulate_inventory, AppConfig, PricingConfig, ProductRecord};
use pricepulse_store::{Store, StoreError};
use serde::Serialize;

use crate::client::{PollSettings, PriceApiClient, SpecsOutcome};
use crate::error::{IngestError, PriceApiError};
use crate::fallback::fallback_catalog;
use crate::types::{search_results, SearchResultItem};

const FALLBACK_MESSAGE: &str = "Used fallback data due to API unavailability";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestSource {
    Api,
    Fallback,
}

/// Body returned for every ingestion request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestReport {
    pub status: &'static str,
    pub products_added: usize,
    pub source: IngestSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl IngestReport {
    fn api(products_added: usize) -> Self {
        Self {
            status: "success",
            products_added,
            source: IngestSource::Api,
            message: None,
        }
    }

    fn fallback(products_added: usize) -> Self {
        Self {
            status: "success",
            products_added,
            source: IngestSource::Fallback,
            message: Some(FALLBACK_MESSAGE),
        }
    }
}

/// Sleeps between consecutive attempts: `retry_delay` seconds, doubling
/// each time, with no sleep after the last attempt. A negative or
/// non-finite delay means no sleeping at all.
#[must_use]
pub fn backoff_schedule(retry_delay: f64, attempts: u32) -> Vec<Duration> {
    let mut delay = Duration::try_from_secs_f64(retry_delay).unwrap_or(Duration::ZERO);
    (1..attempts)
        .map(|_| {
            let current = delay;
            delay = delay.saturating_mul(2);
            current
        })
        .collect()
}

/// Where one pass through the job protocol left off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Rows were written; carries how many.
    Ingested(usize),
    /// This attempt failed and another may follow.
    NeedsRetry(String),
    /// No attempts left; the caller switches to the sample catalog.
    ExhaustedFallback(String),
}

pub struct Ingestor {
    store: Arc<Store>,
    client: Option<PriceApiClient>,
    search_poll: PollSettings,
    specs_poll: PollSettings,
}

impl Ingestor {
    /// Without a client every ingestion goes straight to the sample catalog
    /// and specs lookups report the API as unavailable.
    #[must_use]
    pub fn new(store: Arc<Store>, client: Option<PriceApiClient>) -> Self {
        Self {
            store,
            client,
            search_poll: PollSettings::SEARCH,
            specs_poll: PollSettings::SPECS,
        }
    }

    #[must_use]
    pub fn with_poll_settings(mut self, search: PollSettings, specs: PollSettings) -> Self {
        self.search_poll = search;
        self.specs_poll = specs;
        self
    }

    /// Build from process configuration. A missing API token yields an
    /// ingestor without a client.
    ///
    /// # Errors
    ///
    /// Returns [`PriceApiError`] if the HTTP client cannot be constructed.
    pub fn from_app_config(store: Arc<Store>, config: &AppConfig) -> Result<Self, PriceApiError> {
        let client = match &config.priceapi_token {
            Some(token) => Some(
                PriceApiClient::with_base_url(
                    token,
                    config.priceapi_request_timeout_secs,
                    &config.priceapi_base_url,
                )?
                .with_market(&config.priceapi_country, &config.priceapi_source),
            ),
            None => {
                tracing::warn!("PRICEAPI_TOKEN not set; ingestion will use sample data");
                None
            }
        };

        Ok(Self::new(store, client).with_poll_settings(
            PollSettings {
                interval: Duration::from_secs(config.priceapi_poll_interval_secs),
                max_polls: config.priceapi_max_polls,
            },
            PollSettings {
                interval: Duration::from_millis(config.priceapi_specs_poll_interval_ms),
                max_polls: config.priceapi_specs_max_polls,
            },
        ))
    }

    #[must_use]
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Ingest products for `term`. Upstream failures never surface here;
    /// they end in the sample catalog instead.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Store`] only if the pricing config cannot be
    /// read or the sample rows cannot be written.
    pub async fn ingest(&self, term: &str) -> Result<IngestReport, IngestError> {
        let outcome = match &self.client {
            Some(client) => {
                let config = self.store.config()?;
                self.run_attempts(client, term, &config).await
            }
            None => AttemptOutcome::ExhaustedFallback("no pricing API token configured".to_owned()),
        };

        match outcome {
            AttemptOutcome::Ingested(products_added) => {
                tracing::info!(term, products_added, source = "api", "ingestion complete");
                Ok(IngestReport::api(products_added))
            }
            AttemptOutcome::ExhaustedFallback(reason) | AttemptOutcome::NeedsRetry(reason) => {
                tracing::warn!(term, reason, "pricing API unavailable; using sample catalog");
                self.ingest_fallback(term)
            }
        }
    }

    async fn run_attempts(
        &self,
        client: &PriceApiClient,
        term: &str,
        config: &PricingConfig,
    ) -> AttemptOutcome {
        let attempts = config.retry_attempts;
        let mut delays = backoff_schedule(config.retry_delay, attempts).into_iter();
        let mut last_reason = "no attempts configured".to_owned();

        for attempt in 1..=attempts {
            match self.attempt(client, term).await {
                AttemptOutcome::NeedsRetry(reason) => {
                    if let Some(delay) = delays.next() {
                        tracing::warn!(
                            term,
                            attempt,
                            attempts,
                            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                            reason,
                            "ingestion attempt failed; retrying after back-off"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    last_reason = reason;
                }
                done => return done,
            }
        }
        AttemptOutcome::ExhaustedFallback(last_reason)
    }

    /// One pass: submit, poll, extract, persist.
    async fn attempt(&self, client: &PriceApiClient, term: &str) -> AttemptOutcome {
        let job_id = match client.create_search_job(term).await {
            Ok(job_id) => job_id,
            Err(e) => return AttemptOutcome::NeedsRetry(format!("job submission failed: {e}")),
        };

        let Some(results) = client.poll_results(&job_id, self.search_poll).await else {
            return AttemptOutcome::NeedsRetry(format!("job {job_id} produced no results in time"));
        };

        let items = search_results(&results);
        if items.is_empty() {
            return AttemptOutcome::NeedsRetry(format!("job {job_id} returned no search results"));
        }

        match self.persist_search_results(term, &items, Utc::now()) {
            Ok(count) => AttemptOutcome::Ingested(count),
            Err(e) => {
                tracing::error!(term, error = %e, "failed to persist ingested products");
                AttemptOutcome::NeedsRetry(format!("store write failed: {e}"))
            }
        }
    }

    fn persist_search_results(
        &self,
        term: &str,
        items: &[SearchResultItem],
        now: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        let mut rows = Vec::with_capacity(items.len());
        for (position, item) in (0u32..).zip(items) {
            let competitor_price = item.min_price.unwrap_or(0.0);
            let id = match &item.id {
                Some(id) => id.clone(),
                None => self.store.next_product_id()?.to_string(),
            };
            rows.push(ProductRecord {
                category: term.to_owned(),
                disc: position,
                id,
                name: item
                    .name
                    .clone()
                    .unwrap_or_else(|| format!("Unknown {term}")),
                competitor_price,
                our_price: competitor_price,
                inventory: simulate_inventory(competitor_price, term),
                demand_score: simulate_demand(competitor_price, term, position, now),
                image_url: item.img_url.clone().unwrap_or_default(),
                timestamp: now,
                url: item.url.clone().unwrap_or_default(),
            });
        }
        let replaced = self.store.upsert_products(&rows)?;
        if replaced > 0 {
            tracing::info!(term, replaced, "refreshed previously ingested products");
        }
        Ok(rows.len())
    }

    /// Write the sample catalog for `term`.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Store`] if ids cannot be allocated or rows written.
    pub fn ingest_fallback(&self, term: &str) -> Result<IngestReport, IngestError> {
        let now = Utc::now();
        let mut rows = Vec::new();
        for (position, entry) in (0u32..).zip(fallback_catalog(term)) {
            let id = self.store.next_product_id()?;
            rows.push(ProductRecord {
                category: term.to_owned(),
                disc: position,
                id: id.to_string(),
                name: entry.name,
                competitor_price: entry.price,
                our_price: entry.price,
                inventory: simulate_inventory(entry.price, term),
                demand_score: simulate_demand(entry.price, term, position, now),
                image_url: entry.image_url,
                timestamp: now,
                url: format!("https://example.com/product/{id}"),
            });
        }
        self.store.append_products(&rows)?;

        tracing::info!(term, products_added = rows.len(), source = "fallback", "ingestion complete");
        Ok(IngestReport::fallback(rows.len()))
    }

    /// Detailed specs for an upstream product id.
    pub async fn product_specs(&self, product_id: &str) -> SpecsOutcome {
        match &self.client {
            Some(client) => client.fetch_product_specs(product_id, self.specs_poll).await,
            None => SpecsOutcome::Unavailable("no pricing API token configured".to_owned()),
        }
    }
}
