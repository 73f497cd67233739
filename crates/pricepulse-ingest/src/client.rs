//! HTTP client for the pricing API's two-step job protocol.
//!
//! A job is submitted with a form POST to `jobs`, which answers with a
//! `job_id`. The caller then polls `jobs/{job_id}/download.json` until a
//! JSON body with a non-empty `results` array appears.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode, Url};
use serde_json::{json, Value};

use crate::error::PriceApiError;
use crate::types::{JobDownload, JobResult};

const DEFAULT_COUNTRY: &str = "in";
const DEFAULT_SOURCE: &str = "google_shopping";
/// Maximum age in seconds of cached upstream data the API may serve.
const MAX_AGE_SECS: &str = "43200";
const SEARCH_MAX_PAGES: &str = "9";

/// Poll budget for one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_polls: u32,
}

impl PollSettings {
    /// Search jobs: 30 polls, 10 s apart.
    pub const SEARCH: Self = Self {
        interval: Duration::from_secs(10),
        max_polls: 30,
    };

    /// Specs lookups: 20 polls, 1.5 s apart.
    pub const SPECS: Self = Self {
        interval: Duration::from_millis(1500),
        max_polls: 20,
    };
}

/// Result of a product specs lookup. Every variant is an answer for the
/// caller; none of them is raised as an error.
#[derive(Debug, Clone, PartialEq)]
pub enum SpecsOutcome {
    /// `results[0].content` of the finished job.
    Found(Value),
    /// The API did not hand out a job id; carries its response body.
    JobCreationFailed(Value),
    /// The poll budget ran out before results appeared.
    TimedOut { job_id: String },
    /// Transport failure before a job id was obtained.
    Unavailable(String),
}

impl SpecsOutcome {
    /// JSON body in the shape the HTTP layer returns.
    #[must_use]
    pub fn to_body(&self) -> Value {
        match self {
            Self::Found(data) => json!({ "status": "success", "data": data }),
            Self::JobCreationFailed(details) => {
                json!({ "error": "Job creation failed", "details": details })
            }
            Self::TimedOut { job_id } => {
                json!({ "error": "Job did not finish in time", "job_id": job_id })
            }
            Self::Unavailable(details) => {
                json!({ "error": "Pricing API unavailable", "details": details })
            }
        }
    }
}

/// Client for the pricing API.
///
/// Built with [`PriceApiClient::with_base_url`]; production passes the
/// configured `priceapi_base_url`, tests pass a mock server's address.
pub struct PriceApiClient {
    client: Client,
    token: String,
    base_url: Url,
    country: String,
    source: String,
}

impl std::fmt::Debug for PriceApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriceApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("country", &self.country)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl PriceApiClient {
    /// # Errors
    ///
    /// Returns [`PriceApiError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`PriceApiError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        token: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, PriceApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("pricepulse/0.1")
            .build()?;

        // Trailing slash so `join("jobs")` appends instead of replacing the
        // last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| PriceApiError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            token: token.to_owned(),
            base_url,
            country: DEFAULT_COUNTRY.to_owned(),
            source: DEFAULT_SOURCE.to_owned(),
        })
    }

    /// Override the market the jobs are run against.
    #[must_use]
    pub fn with_market(mut self, country: &str, source: &str) -> Self {
        country.clone_into(&mut self.country);
        source.clone_into(&mut self.source);
        self
    }

    fn join(&self, path: &str) -> Result<Url, PriceApiError> {
        self.base_url
            .join(path)
            .map_err(|e| PriceApiError::InvalidBaseUrl {
                url: format!("{}{path}", self.base_url),
                reason: e.to_string(),
            })
    }

    fn download_url(&self, job_id: &str) -> Result<Url, PriceApiError> {
        let mut url = self.join(&format!("jobs/{job_id}/download.json"))?;
        url.query_pairs_mut().append_pair("token", &self.token);
        Ok(url)
    }

    /// Submit a `search_results` job for `term`.
    ///
    /// # Errors
    ///
    /// - [`PriceApiError::Http`] on network failure or a non-2xx status.
    /// - [`PriceApiError::MissingJobId`] if the body has no `job_id`.
    pub async fn create_search_job(&self, term: &str) -> Result<String, PriceApiError> {
        self.submit_job(&[
            ("topic", "search_results"),
            ("key", "term"),
            ("max_pages", SEARCH_MAX_PAGES),
            ("sort_by", "ranking_descending"),
            ("condition", "new"),
            ("values", term),
        ])
        .await
    }

    /// Submit a `product_specs` job for an upstream product id.
    ///
    /// # Errors
    ///
    /// Same as [`PriceApiClient::create_search_job`].
    pub async fn create_specs_job(&self, product_id: &str) -> Result<String, PriceApiError> {
        self.submit_job(&[
            ("topic", "product_specs"),
            ("key", "id"),
            ("values", product_id),
        ])
        .await
    }

    async fn submit_job(&self, params: &[(&str, &str)]) -> Result<String, PriceApiError> {
        let mut form: Vec<(&str, &str)> = vec![
            ("token", self.token.as_str()),
            ("country", self.country.as_str()),
            ("source", self.source.as_str()),
            ("max_age", MAX_AGE_SECS),
        ];
        form.extend_from_slice(params);

        let response = self
            .client
            .post(self.join("jobs")?)
            .form(&form)
            .send()
            .await?
            .error_for_status()?;
        let body: Value = response.json().await?;

        match body.get("job_id") {
            Some(Value::String(id)) if !id.is_empty() => Ok(id.clone()),
            Some(Value::Number(id)) => Ok(id.to_string()),
            _ => Err(PriceApiError::MissingJobId { body }),
        }
    }

    /// One poll of the download endpoint. `Ok(None)` while the job is still
    /// running: any status other than 200, a non-JSON content type, or an
    /// empty `results` array.
    ///
    /// # Errors
    ///
    /// Returns [`PriceApiError::Http`] on network failure or
    /// [`PriceApiError::Deserialize`] for a malformed JSON body.
    pub async fn fetch_results(&self, job_id: &str) -> Result<Option<Vec<JobResult>>, PriceApiError> {
        let url = self.download_url(job_id)?;
        let response = self.client.get(url).send().await?;
        if response.status() != StatusCode::OK {
            return Ok(None);
        }
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("application/json"));
        if !is_json {
            return Ok(None);
        }

        let body = response.text().await?;
        let download: JobDownload =
            serde_json::from_str(&body).map_err(|e| PriceApiError::Deserialize {
                context: format!("download(job_id={job_id})"),
                source: e,
            })?;
        Ok((!download.results.is_empty()).then_some(download.results))
    }

    /// Poll until results appear or the budget is spent. Errors on
    /// individual polls count as "not ready yet".
    pub async fn poll_results(&self, job_id: &str, poll: PollSettings) -> Option<Vec<JobResult>> {
        for attempt in 1..=poll.max_polls {
            match self.fetch_results(job_id).await {
                Ok(Some(results)) => return Some(results),
                Ok(None) => tracing::debug!(job_id, attempt, "job results not ready"),
                Err(e) => tracing::debug!(job_id, attempt, error = %e, "job poll failed"),
            }
            if attempt < poll.max_polls {
                tokio::time::sleep(poll.interval).await;
            }
        }
        None
    }

    /// Look up detailed specs for an upstream product id.
    pub async fn fetch_product_specs(&self, product_id: &str, poll: PollSettings) -> SpecsOutcome {
        let job_id = match self.create_specs_job(product_id).await {
            Ok(job_id) => job_id,
            Err(PriceApiError::MissingJobId { body }) => {
                return SpecsOutcome::JobCreationFailed(body)
            }
            Err(PriceApiError::Http(e)) if e.is_status() => {
                return SpecsOutcome::JobCreationFailed(Value::String(e.to_string()))
            }
            Err(e) => {
                tracing::warn!(product_id, error = %e, "specs job submission failed");
                return SpecsOutcome::Unavailable(e.to_string());
            }
        };

        match self.poll_results(&job_id, poll).await {
            Some(results) => SpecsOutcome::Found(
                results
                    .into_iter()
                    .next()
                    .map(|r| r.content)
                    .unwrap_or_default(),
            ),
            None => {
                tracing::warn!(product_id, job_id, "specs job did not finish in time");
                SpecsOutcome::TimedOut { job_id }
            }
        }
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
