//! Movie document types for the search index.
//!
//! This module defines the document structure that is indexed in the search engine.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A person reference nested in a movie document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PersonRef {
    pub id: Uuid,
    pub name: String,
}

/// Document representation for the search index.
///
/// One document per film work, addressed by the film work id. Person names
/// are partitioned by role so each list can be searched and boosted
/// independently.
///
/// # Fields
///
/// - `id`: Film work identifier, also used as the index document id
/// - `title`: Film title (primary search field)
/// - `description`: Optional description text
/// - `rating`: Optional rating
/// - `genre`: Genre names
/// - `actors_names` / `directors_names` / `writers_names`: Flat name lists per role
/// - `actors` / `directors` / `writers`: Person references per role
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieDocument {
    pub id: Uuid,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    pub genre: Vec<String>,
    pub actors_names: Vec<String>,
    pub directors_names: Vec<String>,
    pub writers_names: Vec<String>,
    pub actors: Vec<PersonRef>,
    pub directors: Vec<PersonRef>,
    pub writers: Vec<PersonRef>,
}

impl MovieDocument {
    /// Create a document with no genres or credits.
    ///
    /// # Example
    ///
    /// ```
    /// use movies_etl_shared::MovieDocument;
    /// use uuid::Uuid;
    ///
    /// let doc = MovieDocument::new(Uuid::new_v4(), "Solaris");
    /// assert!(doc.actors_names.is_empty());
    /// ```
    pub fn new(id: Uuid, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: None,
            rating: None,
            genre: Vec::new(),
            actors_names: Vec::new(),
            directors_names: Vec::new(),
            writers_names: Vec::new(),
            actors: Vec::new(),
            directors: Vec::new(),
            writers: Vec::new(),
        }
    }

    /// The document ID used in the search index.
    pub fn document_id(&self) -> String {
        self.id.to_string()
    }
}
