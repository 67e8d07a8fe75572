//! Dependency initialization and wiring for the movies ETL.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::settings::{ConnectionMode, Settings};
use crate::enricher::MovieEnricher;
use crate::loader::SearchLoader;
use crate::pipeline::Pipeline;
use crate::producer::{ChangeSource, FilmWorkModified, GenreModified, PersonModified, SourceContext};
use crate::runner::{Runner, RunnerConfig};
use crate::state::CheckpointTracker;
use crate::transformer::MovieTransformer;
use crate::IndexingError;
use crate::EtlError;
use movies_etl_repository::{
    ContentRepository, OpenSearchProvider, PostgresContentRepository, RedisCheckpointStore,
};

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured runner ready to run.
    pub runner: Runner,
}

impl Dependencies {
    /// Connect to every backend and wire the pipelines.
    ///
    /// Backends that are unreachable are retried every
    /// `connection_retry_interval` in [`ConnectionMode::Retry`], or reported
    /// as a configuration error in [`ConnectionMode::FailFast`].
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(IndexingError)` - If initialization fails (only in fail-fast mode)
    pub async fn new(settings: Settings, shutdown: CancellationToken) -> Result<Self, IndexingError> {
        info!(
            opensearch_url = %settings.opensearch_url,
            redis_url = %settings.redis_url,
            index = %settings.index_config.alias,
            chunk_size = settings.chunk_size,
            change_order = ?settings.change_order,
            connection_mode = ?settings.connection_mode,
            "Initializing dependencies"
        );

        let mode = settings.connection_mode;
        let interval = settings.connection_retry_interval;
        let retry_policy = settings.retry_policy.clone().with_shutdown(shutdown.clone());

        let database_url = settings.database_url.as_str();
        let pool_size = settings.db_pool_size();
        let repository = connect_with_mode("PostgreSQL", mode, interval, || {
            PostgresContentRepository::connect(database_url, pool_size)
        })
        .await?;
        info!("PostgreSQL connection established");

        let (redis_url, state_key) = (settings.redis_url.as_str(), settings.state_key.as_str());
        let store = connect_with_mode("Redis", mode, interval, || {
            RedisCheckpointStore::connect(redis_url, state_key)
        })
        .await?;
        info!("Redis connection established");

        let (opensearch_url, index_config) = (settings.opensearch_url.as_str(), &settings.index_config);
        let policy = &retry_policy;
        let loader = connect_with_mode("OpenSearch", mode, interval, || async move {
            let provider = OpenSearchProvider::new(opensearch_url, index_config.clone()).await?;
            let loader = SearchLoader::new(Arc::new(provider), policy.clone());
            loader.check_ready().await?;
            Ok::<_, EtlError>(loader)
        })
        .await?;
        info!("OpenSearch connection established");

        let tracker = CheckpointTracker::load(Arc::new(store), retry_policy.clone())
            .await
            .map_err(|e| IndexingError::config(format!("Failed to load checkpoints: {}", e)))?;

        let repository: Arc<dyn ContentRepository> = Arc::new(repository);

        let context = SourceContext::new(
            Arc::new(tracker),
            repository.clone(),
            settings.chunk_size,
            settings.change_order,
        );
        let enricher = Arc::new(MovieEnricher::new(repository, retry_policy.clone()));
        let loader = Arc::new(loader);

        let sources: Vec<Box<dyn ChangeSource>> = vec![
            Box::new(PersonModified::new(context.clone())),
            Box::new(GenreModified::new(context.clone())),
            Box::new(FilmWorkModified::new(context)),
        ];
        let pipelines = sources
            .into_iter()
            .map(|source| Pipeline::new(source, enricher.clone(), MovieTransformer::new(), loader.clone()))
            .collect();

        let runner = Runner::new(
            pipelines,
            RunnerConfig {
                poll_interval: settings.poll_interval,
                parallel: settings.parallel_pipelines,
            },
            shutdown,
        );

        Ok(Self { runner })
    }
}

/// Call `connect` until it succeeds, or once in fail-fast mode.
async fn connect_with_mode<T, E, F, Fut>(
    backend: &str,
    mode: ConnectionMode,
    retry_interval: Duration,
    mut connect: F,
) -> Result<T, IndexingError>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    loop {
        match connect().await {
            Ok(connection) => return Ok(connection),
            Err(e) => match mode {
                ConnectionMode::FailFast => {
                    return Err(IndexingError::config(format!(
                        "Failed to connect to {}: {}",
                        backend, e
                    )));
                }
                ConnectionMode::Retry => {
                    warn!(
                        backend = backend,
                        error = %e,
                        retry_interval_secs = retry_interval.as_secs(),
                        "Failed to connect, retrying..."
                    );
                    sleep(retry_interval).await;
                }
            },
        }
    }
}
