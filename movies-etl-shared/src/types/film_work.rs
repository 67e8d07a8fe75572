//! Denormalized film work aggregate.
//!
//! The enricher loads one [`FilmWorkAggregate`] per film work, joining the
//! person and genre link tables into flat collections.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role a person plays in a film work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonRole {
    Actor,
    Director,
    Writer,
}

impl PersonRole {
    /// Parse a role as stored in `content.person_film_work.role`.
    ///
    /// The admin application stores writers as `screenwriter`; both spellings
    /// map to [`PersonRole::Writer`]. Unknown roles yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "actor" => Some(Self::Actor),
            "director" => Some(Self::Director),
            "writer" | "screenwriter" => Some(Self::Writer),
            _ => None,
        }
    }
}

/// One (person, role) association of a film work.
///
/// The role is kept as the raw column value; it is nullable in the content
/// store and interpreted by the transformer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonCredit {
    pub id: Uuid,
    pub role: Option<String>,
    pub full_name: String,
}

/// A film work together with its denormalized associations.
///
/// Scalar fields are optional because the aggregate mirrors what the query
/// returned; the transformer decides which of them are required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilmWorkAggregate {
    pub id: Uuid,
    pub title: Option<String>,
    pub description: Option<String>,
    pub rating: Option<f64>,
    pub persons: Vec<PersonCredit>,
    pub genres: Vec<String>,
}

impl FilmWorkAggregate {
    /// Create an aggregate with no associations.
    pub fn new(id: Uuid, title: impl Into<String>) -> Self {
        Self {
            id,
            title: Some(title.into()),
            description: None,
            rating: None,
            persons: Vec::new(),
            genres: Vec::new(),
        }
    }

    /// Add a person credit.
    pub fn with_person(mut self, id: Uuid, role: &str, full_name: impl Into<String>) -> Self {
        self.persons.push(PersonCredit {
            id,
            role: Some(role.to_string()),
            full_name: full_name.into(),
        });
        self
    }

    /// Add a genre name.
    pub fn with_genre(mut self, name: impl Into<String>) -> Self {
        self.genres.push(name.into());
        self
    }
}
