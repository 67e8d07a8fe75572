//! OpenSearch index configuration and mappings.
//!
//! This module defines the index settings and mappings for the movies index.

use serde_json::{json, Value};

/// The base name of the search index (without version).
pub const INDEX_NAME: &str = "movies";

/// Configuration for the search index.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// The alias name for the search index (used for all operations).
    pub alias: String,
    /// The version number for the index (e.g., 0 for "movies_v0").
    pub version: u32,
}

impl IndexConfig {
    /// Create a new index configuration.
    ///
    /// # Arguments
    ///
    /// * `alias` - The index alias name
    /// * `version` - The version number
    pub fn new(alias: impl Into<String>, version: u32) -> Self {
        Self {
            alias: alias.into(),
            version,
        }
    }

    /// The concrete index the alias points at (e.g. `movies_v0`).
    pub fn versioned_index_name(&self) -> String {
        format!("{}_v{}", self.alias, self.version)
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self::new(INDEX_NAME, 0)
    }
}

fn person_refs() -> Value {
    json!({
        "type": "nested",
        "dynamic": "strict",
        "properties": {
            "id": { "type": "keyword" },
            "name": { "type": "text" }
        }
    })
}

/// Get the index settings and mappings for the movies index.
///
/// Analysis uses the backend defaults. The mapping is strict so a document
/// with an unexpected field is rejected instead of silently widening the
/// schema. The alias is attached at creation time.
pub fn get_index_settings(alias: &str) -> Value {
    json!({
        "settings": {
            "refresh_interval": "1s",
            "number_of_shards": 1,
            "number_of_replicas": 1
        },
        "aliases": {
            alias: {}
        },
        "mappings": {
            "dynamic": "strict",
            "properties": {
                "id": { "type": "keyword" },
                "title": {
                    "type": "text",
                    "fields": {
                        "raw": { "type": "keyword" }
                    }
                },
                "description": { "type": "text" },
                "rating": { "type": "float" },
                "genre": { "type": "keyword" },
                "actors_names": { "type": "text" },
                "directors_names": { "type": "text" },
                "writers_names": { "type": "text" },
                "actors": person_refs(),
                "directors": person_refs(),
                "writers": person_refs()
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_settings_structure() {
        let settings = get_index_settings("movies");
        let properties = &settings["mappings"]["properties"];

        assert!(settings["settings"]["number_of_shards"].is_number());
        assert!(settings["aliases"]["movies"].is_object());
        assert_eq!(settings["mappings"]["dynamic"], "strict");

        for field in [
            "id",
            "title",
            "description",
            "rating",
            "genre",
            "actors_names",
            "directors_names",
            "writers_names",
        ] {
            assert!(properties[field].is_object(), "missing mapping for {field}");
        }

        for field in ["actors", "directors", "writers"] {
            assert_eq!(properties[field]["type"], "nested");
        }
    }

    #[test]
    fn test_versioned_index_name() {
        assert_eq!(IndexConfig::default().versioned_index_name(), "movies_v0");
        assert_eq!(IndexConfig::new("films", 3).versioned_index_name(), "films_v3");
    }
}
