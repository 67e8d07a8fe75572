//! Runtime settings read from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

use crate::retry::RetryPolicy;
use crate::IndexingError;
use movies_etl_repository::opensearch::{IndexConfig, INDEX_NAME};
use movies_etl_repository::{ChangeFeed, ChangeOrder};

/// Default PostgreSQL pool size.
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

/// Default Redis URL.
const DEFAULT_REDIS_URL: &str = "redis://localhost:6379/0";

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default connection retry interval in seconds.
const DEFAULT_RETRY_INTERVAL_SECS: u64 = 15;

/// Default pause between passes in seconds.
const DEFAULT_CHECK_INTERVAL_SECS: f64 = 10.0;

/// Default number of change records per chunk.
const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Default backoff: first delay, growth factor and ceiling.
const DEFAULT_BACKOFF_START_SECS: f64 = 0.1;
const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;
const DEFAULT_BACKOFF_BORDER_SECS: f64 = 10.0;

/// Default bound on a single external call in seconds.
const DEFAULT_CALL_TIMEOUT_SECS: f64 = 30.0;

/// What to do when a backend is unreachable at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Fail immediately if connection fails.
    FailFast,
    /// Retry the connection until it succeeds.
    Retry,
}

impl FromStr for ConnectionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fail-fast" | "failfast" | "fail_fast" => Ok(Self::FailFast),
            "retry" => Ok(Self::Retry),
            other => Err(format!("unknown connection mode '{}'", other)),
        }
    }
}

/// All settings needed to build the ETL.
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub db_max_connections: u32,
    pub redis_url: String,
    /// Key of the checkpoint hash.
    pub state_key: String,
    pub opensearch_url: String,
    pub index_config: IndexConfig,
    pub connection_mode: ConnectionMode,
    pub connection_retry_interval: Duration,
    pub poll_interval: Duration,
    pub chunk_size: usize,
    pub change_order: ChangeOrder,
    pub parallel_pipelines: bool,
    pub retry_policy: RetryPolicy,
}

impl Settings {
    /// Read settings from the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `DATABASE_URL`: PostgreSQL connection string (required)
    /// - `DB_MAX_CONNECTIONS`: Pool size, raised to [`Settings::db_pool_size`] (default: 5)
    /// - `REDIS_URL`: Checkpoint store (default: redis://localhost:6379/0)
    /// - `ETL_STATE_KEY`: Key of the checkpoint hash (default: etl)
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `MOVIES_INDEX`: Index alias (default: movies)
    /// - `MOVIES_INDEX_VERSION`: Index version number (default: 0)
    /// - `OPENSEARCH_CONNECTION_MODE`: "fail-fast" or "retry" (default: retry)
    /// - `OPENSEARCH_RETRY_INTERVAL_SECS`: Startup retry interval (default: 15)
    /// - `CHECK_INTERVAL_SEC`: Pause between passes (default: 10)
    /// - `CHUNK_SIZE`: Change records per chunk (default: 1000)
    /// - `ETL_CHANGE_ORDER`: "desc" or "asc" (default: desc)
    /// - `ETL_PARALLEL_PIPELINES`: Run pipelines concurrently (default: false)
    /// - `BACKOFF_START_SECS`, `BACKOFF_FACTOR`, `BACKOFF_BORDER_SECS`: Retry backoff (default: 0.1, 2, 10)
    /// - `ETL_CALL_TIMEOUT_SECS`: Bound on one external call, 0 disables (default: 30)
    pub fn from_env() -> Result<Self, IndexingError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, IndexingError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars { lookup };

        let database_url = vars
            .string("DATABASE_URL")
            .ok_or_else(|| IndexingError::config("DATABASE_URL is not set"))?;

        let chunk_size = vars.parsed("CHUNK_SIZE", DEFAULT_CHUNK_SIZE);
        if chunk_size == 0 {
            return Err(IndexingError::config("CHUNK_SIZE must be greater than zero"));
        }

        let factor = vars.parsed("BACKOFF_FACTOR", DEFAULT_BACKOFF_FACTOR);
        if !factor.is_finite() || factor < 1.0 {
            return Err(IndexingError::config("BACKOFF_FACTOR must be at least 1"));
        }

        let call_timeout = vars.seconds("ETL_CALL_TIMEOUT_SECS", DEFAULT_CALL_TIMEOUT_SECS);
        let retry_policy = RetryPolicy {
            base: vars.seconds("BACKOFF_START_SECS", DEFAULT_BACKOFF_START_SECS),
            factor,
            ceiling: vars.seconds("BACKOFF_BORDER_SECS", DEFAULT_BACKOFF_BORDER_SECS),
            max_attempts: None,
            call_timeout: (!call_timeout.is_zero()).then_some(call_timeout),
            shutdown: None,
        };

        let index_config = IndexConfig::new(
            vars.string("MOVIES_INDEX")
                .unwrap_or_else(|| INDEX_NAME.to_string()),
            vars.parsed("MOVIES_INDEX_VERSION", 0),
        );

        Ok(Self {
            database_url,
            db_max_connections: vars.parsed("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS),
            redis_url: vars
                .string("REDIS_URL")
                .unwrap_or_else(|| DEFAULT_REDIS_URL.to_string()),
            state_key: vars
                .string("ETL_STATE_KEY")
                .unwrap_or_else(|| movies_etl_repository::redis::DEFAULT_STATE_KEY.to_string()),
            opensearch_url: vars
                .string("OPENSEARCH_URL")
                .unwrap_or_else(|| DEFAULT_OPENSEARCH_URL.to_string()),
            index_config,
            connection_mode: vars.parsed("OPENSEARCH_CONNECTION_MODE", ConnectionMode::Retry),
            connection_retry_interval: Duration::from_secs(
                vars.parsed("OPENSEARCH_RETRY_INTERVAL_SECS", DEFAULT_RETRY_INTERVAL_SECS),
            ),
            poll_interval: vars.seconds("CHECK_INTERVAL_SEC", DEFAULT_CHECK_INTERVAL_SECS),
            chunk_size,
            change_order: vars.parsed("ETL_CHANGE_ORDER", ChangeOrder::Descending),
            parallel_pipelines: vars.flag("ETL_PARALLEL_PIPELINES"),
            retry_policy,
        })
    }

    /// Connections the content store pool actually gets.
    ///
    /// Each open change stream pins one connection until it is drained, and
    /// enrichment needs one more. In parallel mode every feed has a stream
    /// open at the same time.
    pub fn db_pool_size(&self) -> u32 {
        let open_streams = if self.parallel_pipelines {
            ChangeFeed::ALL.len() as u32
        } else {
            1
        };
        self.db_max_connections.max(open_streams + 1)
    }
}

/// Typed access to variables, falling back to defaults on bad values.
struct Vars<F> {
    lookup: F,
}

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Non-empty value of `key`.
    fn string(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn parsed<T: FromStr>(&self, key: &str, default: T) -> T {
        match self.string(key) {
            None => default,
            Some(value) => value.parse().unwrap_or_else(|_| {
                warn!(variable = key, value = %value, "Invalid value, using default");
                default
            }),
        }
    }

    /// A non-negative number of seconds, fractions allowed.
    fn seconds(&self, key: &str, default: f64) -> Duration {
        let secs = self.parsed(key, default);
        Duration::try_from_secs_f64(secs).unwrap_or_else(|_| {
            warn!(variable = key, value = secs, "Invalid duration, using default");
            Duration::from_secs_f64(default)
        })
    }

    fn flag(&self, key: &str) -> bool {
        match self.string(key).map(|v| v.to_lowercase()) {
            None => false,
            Some(value) => match value.as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    warn!(variable = key, value = %value, "Invalid flag, using false");
                    false
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, IndexingError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let settings = settings(&[("DATABASE_URL", "postgres://localhost/movies")]).unwrap();

        assert_eq!(settings.db_max_connections, 5);
        assert_eq!(settings.redis_url, "redis://localhost:6379/0");
        assert_eq!(settings.state_key, "etl");
        assert_eq!(settings.index_config.alias, "movies");
        assert_eq!(settings.connection_mode, ConnectionMode::Retry);
        assert_eq!(settings.poll_interval, Duration::from_secs(10));
        assert_eq!(settings.chunk_size, 1000);
        assert_eq!(settings.change_order, ChangeOrder::Descending);
        assert!(!settings.parallel_pipelines);
        assert_eq!(settings.retry_policy.base, Duration::from_millis(100));
        assert_eq!(settings.retry_policy.factor, 2.0);
        assert_eq!(settings.retry_policy.ceiling, Duration::from_secs(10));
        assert_eq!(settings.retry_policy.call_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_pool_size_leaves_room_for_enrichment() {
        let sequential = settings(&[
            ("DATABASE_URL", "postgres://db/movies"),
            ("DB_MAX_CONNECTIONS", "1"),
        ])
        .unwrap();
        assert_eq!(sequential.db_pool_size(), 2);

        let parallel = settings(&[
            ("DATABASE_URL", "postgres://db/movies"),
            ("DB_MAX_CONNECTIONS", "2"),
            ("ETL_PARALLEL_PIPELINES", "true"),
        ])
        .unwrap();
        assert_eq!(parallel.db_pool_size(), 4);

        let roomy = settings(&[
            ("DATABASE_URL", "postgres://db/movies"),
            ("DB_MAX_CONNECTIONS", "10"),
            ("ETL_PARALLEL_PIPELINES", "true"),
        ])
        .unwrap();
        assert_eq!(roomy.db_pool_size(), 10);
    }

    #[test]
    fn test_missing_database_url() {
        assert!(matches!(settings(&[]), Err(IndexingError::ConfigError(_))));
    }

    #[test]
    fn test_overrides() {
        let settings = settings(&[
            ("DATABASE_URL", "postgres://db/movies"),
            ("CHUNK_SIZE", "100"),
            ("CHECK_INTERVAL_SEC", "2.5"),
            ("ETL_CHANGE_ORDER", "asc"),
            ("ETL_PARALLEL_PIPELINES", "true"),
            ("OPENSEARCH_CONNECTION_MODE", "fail-fast"),
            ("ETL_CALL_TIMEOUT_SECS", "0"),
            ("MOVIES_INDEX", "films"),
        ])
        .unwrap();

        assert_eq!(settings.chunk_size, 100);
        assert_eq!(settings.poll_interval, Duration::from_millis(2500));
        assert_eq!(settings.change_order, ChangeOrder::Ascending);
        assert!(settings.parallel_pipelines);
        assert_eq!(settings.connection_mode, ConnectionMode::FailFast);
        assert_eq!(settings.retry_policy.call_timeout, None);
        assert_eq!(settings.index_config.alias, "films");
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let settings = settings(&[
            ("DATABASE_URL", "postgres://db/movies"),
            ("CHUNK_SIZE", "lots"),
            ("ETL_CHANGE_ORDER", "sideways"),
            ("CHECK_INTERVAL_SEC", "-3"),
        ])
        .unwrap();

        assert_eq!(settings.chunk_size, 1000);
        assert_eq!(settings.change_order, ChangeOrder::Descending);
        assert_eq!(settings.poll_interval, Duration::from_secs(10));
    }

    #[test]
    fn test_zero_chunk_size_is_rejected() {
        let result = settings(&[("DATABASE_URL", "postgres://db/movies"), ("CHUNK_SIZE", "0")]);
        assert!(matches!(result, Err(IndexingError::ConfigError(_))));
    }

    #[test]
    fn test_shrinking_backoff_is_rejected() {
        let result = settings(&[("DATABASE_URL", "postgres://db/movies"), ("BACKOFF_FACTOR", "0.5")]);
        assert!(matches!(result, Err(IndexingError::ConfigError(_))));
    }
}
