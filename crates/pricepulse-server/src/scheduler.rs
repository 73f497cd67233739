//! Background job scheduler.
//!
//! Owns the periodic ingestion of the tracked categories. The scheduler
//! handle lives in `main` and is shut down after the HTTP server drains.

use std::sync::Arc;
use std::time::Duration;

use pricepulse_core::AppConfig;
use pricepulse_ingest::Ingestor;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Builds and starts the background job scheduler.
///
/// When periodic ingestion is enabled in the pricing config, one cycle runs
/// right after startup and then one every `ingestion_interval` seconds.
/// Returns the running [`JobScheduler`] handle.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// a job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    ingestor: Arc<Ingestor>,
    config: Arc<AppConfig>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_ingestion_jobs(&scheduler, ingestor, &config).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

async fn register_ingestion_jobs(
    scheduler: &JobScheduler,
    ingestor: Arc<Ingestor>,
    config: &AppConfig,
) -> Result<(), JobSchedulerError> {
    let pricing = match ingestor.store().config() {
        Ok(pricing) => pricing,
        Err(e) => {
            tracing::error!(error = %e, "scheduler: cannot read pricing config; periodic ingestion off");
            return Ok(());
        }
    };
    if !pricing.enable_periodic_ingestion {
        tracing::info!("scheduler: periodic ingestion disabled");
        return Ok(());
    }
    if config.tracked_categories.is_empty() {
        tracing::info!("scheduler: no tracked categories; periodic ingestion off");
        return Ok(());
    }

    let runner = Arc::new(CycleRunner::new(ingestor, config.tracked_categories.clone()));
    let interval = Duration::from_secs(pricing.ingestion_interval.max(1));

    let startup = {
        let runner = Arc::clone(&runner);
        Job::new_one_shot_async(Duration::ZERO, move |_uuid, _lock| {
            let runner = Arc::clone(&runner);
            Box::pin(async move {
                runner.run().await;
            })
        })?
    };
    scheduler.add(startup).await?;

    let categories = runner.categories.len();
    let repeated = Job::new_repeated_async(interval, move |_uuid, _lock| {
        let runner = Arc::clone(&runner);
        Box::pin(async move {
            runner.run().await;
        })
    })?;
    scheduler.add(repeated).await?;

    tracing::info!(
        interval_secs = interval.as_secs(),
        categories,
        "scheduler: periodic ingestion registered"
    );
    Ok(())
}

/// Runs ingestion cycles one at a time. An activation that fires while a
/// cycle is still in progress waits for it to finish.
pub(crate) struct CycleRunner {
    ingestor: Arc<Ingestor>,
    categories: Vec<String>,
    running: Mutex<()>,
}

impl CycleRunner {
    pub(crate) fn new(ingestor: Arc<Ingestor>, categories: Vec<String>) -> Self {
        Self {
            ingestor,
            categories,
            running: Mutex::new(()),
        }
    }

    pub(crate) async fn run(&self) -> usize {
        let _running = match self.running.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                tracing::info!("scheduler: previous ingestion cycle still running; waiting");
                self.running.lock().await
            }
        };
        run_ingestion_cycle(&self.ingestor, &self.categories).await
    }
}

/// Ingest each category in turn. A failing category is logged and skipped.
/// Returns how many categories succeeded.
pub(crate) async fn run_ingestion_cycle(ingestor: &Ingestor, categories: &[String]) -> usize {
    tracing::info!(categories = categories.len(), "scheduler: starting ingestion cycle");
    let mut succeeded = 0;
    for category in categories {
        match ingestor.ingest(category).await {
            Ok(report) => {
                succeeded += 1;
                tracing::info!(
                    category = category.as_str(),
                    products_added = report.products_added,
                    source = ?report.source,
                    "scheduler: category ingested"
                );
            }
            Err(e) => {
                tracing::error!(category = category.as_str(), error = %e, "scheduler: ingestion failed");
            }
        }
    }
    tracing::info!(succeeded, "scheduler: ingestion cycle complete");
    succeeded
}
