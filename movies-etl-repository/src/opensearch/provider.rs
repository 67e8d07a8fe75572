//! OpenSearch provider implementation.
//!
//! This module provides the concrete implementation of `SearchIndexProvider`
//! using the OpenSearch Rust crate.

use async_trait::async_trait;
use opensearch::{
    http::request::JsonBody,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesExistsParts},
    BulkParts, OpenSearch,
};
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::errors::{is_retryable_status, SearchIndexError};
use crate::interfaces::SearchIndexProvider;
use crate::opensearch::index_config::{get_index_settings, IndexConfig};
use crate::types::BulkUpsertSummary;
use movies_etl_shared::MovieDocument;

/// OpenSearch provider implementation.
///
/// Writes movie documents through the index alias with the `_bulk` API.
///
/// # Example
///
/// ```ignore
/// use movies_etl_repository::opensearch::IndexConfig;
/// let provider = OpenSearchProvider::new("http://localhost:9200", IndexConfig::default()).await?;
/// provider.ensure_index_exists().await?;
/// provider.bulk_upsert_documents(&documents).await?;
/// ```
pub struct OpenSearchProvider {
    client: OpenSearch,
    index_config: IndexConfig,
}

impl OpenSearchProvider {
    /// Create a new OpenSearch provider connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    /// * `index_config` - The index configuration containing alias and version
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchProvider)` - A new provider instance
    /// * `Err(SearchIndexError)` - If connection setup fails
    pub async fn new(url: &str, index_config: IndexConfig) -> Result<Self, SearchIndexError> {
        let parsed_url =
            Url::parse(url).map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(
            url = %url,
            alias = %index_config.alias,
            version = index_config.version,
            "Created OpenSearch provider"
        );

        Ok(Self {
            client,
            index_config,
        })
    }

    /// Build the newline-delimited `_bulk` body: one `index` action per
    /// document followed by its source.
    fn bulk_body(documents: &[MovieDocument]) -> Result<Vec<JsonBody<Value>>, SearchIndexError> {
        let mut body: Vec<JsonBody<Value>> = Vec::with_capacity(documents.len() * 2);
        for doc in documents {
            let source = serde_json::to_value(doc)
                .map_err(|e| SearchIndexError::serialization(e.to_string()))?;
            body.push(json!({ "index": { "_id": doc.document_id() } }).into());
            body.push(source.into());
        }
        Ok(body)
    }

    /// Interpret a `_bulk` response.
    ///
    /// Any failed item fails the whole batch. The failure is retryable only
    /// if every failed item was throttled or hit a server error.
    fn summarize_bulk_response(
        total: usize,
        response: &Value,
    ) -> Result<BulkUpsertSummary, SearchIndexError> {
        let items = response["items"]
            .as_array()
            .ok_or_else(|| SearchIndexError::parse("bulk response has no items"))?;

        let mut created = 0;
        let mut updated = 0;
        let mut failed = 0;
        let mut retryable = true;
        let mut first_error: Option<String> = None;

        for item in items {
            let action = &item["index"];
            if action.get("error").is_some_and(|e| !e.is_null()) {
                failed += 1;
                let status = action["status"]
                    .as_u64()
                    .and_then(|s| u16::try_from(s).ok());
                retryable &= status.is_some_and(is_retryable_status);
                if first_error.is_none() {
                    first_error = Some(format!(
                        "{}: {}",
                        action["_id"].as_str().unwrap_or("<unknown>"),
                        action["error"]
                    ));
                }
                continue;
            }
            match action["result"].as_str() {
                Some("created") => created += 1,
                _ => updated += 1,
            }
        }

        if failed > 0 {
            return Err(SearchIndexError::PartialBulkFailure {
                total,
                failed,
                first_error: first_error.unwrap_or_default(),
                retryable,
            });
        }

        if items.len() != total {
            return Err(SearchIndexError::parse(format!(
                "bulk response has {} items for {} documents",
                items.len(),
                total
            )));
        }

        Ok(BulkUpsertSummary {
            total,
            created,
            updated,
        })
    }
}

#[async_trait]
impl SearchIndexProvider for OpenSearchProvider {
    async fn ensure_index_exists(&self) -> Result<(), SearchIndexError> {
        let alias = self.index_config.alias.as_str();

        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[alias]))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let status = response.status_code();
        if status.is_success() {
            debug!(alias = %alias, "Search index already exists");
            return Ok(());
        }
        if status.as_u16() != 404 {
            return Err(SearchIndexError::rejected(
                status.as_u16(),
                format!("index existence check for '{}'", alias),
            ));
        }

        let index_name = self.index_config.versioned_index_name();
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(&index_name))
            .body(get_index_settings(alias))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            // Another instance may have created it between the two calls.
            if error_body.contains("resource_already_exists_exception") {
                warn!(index = %index_name, "Search index was created concurrently");
                return Ok(());
            }
            error!(status = %status, body = %error_body, "Index creation failed");
            return Err(SearchIndexError::rejected(
                status.as_u16(),
                format!("index creation: {}", error_body),
            ));
        }

        info!(index = %index_name, alias = %alias, "Created search index");
        Ok(())
    }

    async fn bulk_upsert_documents(
        &self,
        documents: &[MovieDocument],
    ) -> Result<BulkUpsertSummary, SearchIndexError> {
        if documents.is_empty() {
            return Ok(BulkUpsertSummary::default());
        }

        let body = Self::bulk_body(documents)?;

        let response = self
            .client
            .bulk(BulkParts::Index(&self.index_config.alias))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchIndexError::bulk_index(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Bulk request failed");
            return Err(SearchIndexError::rejected(status.as_u16(), error_body));
        }

        let response_body: Value = response
            .json()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;

        let summary = Self::summarize_bulk_response(documents.len(), &response_body)?;
        debug!(
            total = summary.total,
            created = summary.created,
            updated = summary.updated,
            "Bulk upsert completed"
        );
        Ok(summary)
    }
}
