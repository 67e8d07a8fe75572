//! PostgreSQL-backed content repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::{StreamExt, TryStreamExt};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use tracing::{debug, info};
use uuid::Uuid;

use super::queries;
use crate::errors::ContentRepositoryError;
use crate::interfaces::{ChangeStream, ContentRepository};
use crate::types::{ChangeFeed, ChangeOrder};
use movies_etl_shared::{ChangeRecord, FilmWorkAggregate, PersonCredit};

/// Row returned by the enrichment query.
#[derive(Debug, sqlx::FromRow)]
struct FilmWorkRow {
    id: Uuid,
    title: Option<String>,
    description: Option<String>,
    rating: Option<f64>,
    persons: Json<Vec<PersonCredit>>,
    genres: Vec<String>,
}

impl From<FilmWorkRow> for FilmWorkAggregate {
    fn from(row: FilmWorkRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            rating: row.rating,
            persons: row.persons.0,
            genres: row.genres,
        }
    }
}

/// PostgreSQL-backed content repository.
///
/// Change streams and enrichment queries share one connection pool. Every
/// open change stream keeps a connection busy while chunks are enriched, so
/// the pool needs one connection per concurrent stream plus one.
pub struct PostgresContentRepository {
    pool: sqlx::PgPool,
}

impl PostgresContentRepository {
    /// Creates a repository over an existing pool.
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    /// Connects to `url` with a pool of at most `max_connections`.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, ContentRepositoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(2))
            .connect(url)
            .await?;

        info!(max_connections = max_connections.max(2), "Connected to content store");
        Ok(Self { pool })
    }
}

#[async_trait]
impl ContentRepository for PostgresContentRepository {
    fn changed_film_works(
        &self,
        feed: ChangeFeed,
        since: DateTime<Utc>,
        order: ChangeOrder,
    ) -> ChangeStream<'_> {
        debug!(feed = %feed, since = %since, order = ?order, "Opening change stream");

        sqlx::query_as::<_, (Uuid, DateTime<Utc>)>(queries::change_query(feed, order))
            .bind(since)
            .fetch(&self.pool)
            .map_ok(|(film_work_id, modified)| ChangeRecord::new(film_work_id, modified))
            .map_err(ContentRepositoryError::from)
            .boxed()
    }

    async fn film_works_by_ids(
        &self,
        ids: &[Uuid],
    ) -> Result<Vec<FilmWorkAggregate>, ContentRepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<FilmWorkRow> = sqlx::query_as(queries::FILM_WORKS_BY_IDS)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        debug!(
            requested = ids.len(),
            found = rows.len(),
            "Loaded film work aggregates"
        );

        Ok(rows.into_iter().map(FilmWorkAggregate::from).collect())
    }
}
