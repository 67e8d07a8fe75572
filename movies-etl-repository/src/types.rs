//! Request and response types for repository operations.

use std::fmt;
use std::str::FromStr;

/// Source table whose modifications trigger reindexing of film works.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeFeed {
    /// `content.person`, resolved to film works through `person_film_work`.
    Person,
    /// `content.genre`, resolved to film works through `genre_film_work`.
    Genre,
    /// `content.film_work` itself.
    FilmWork,
}

impl ChangeFeed {
    /// Every feed, one per watched table.
    pub const ALL: [ChangeFeed; 3] = [Self::Person, Self::Genre, Self::FilmWork];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Genre => "genre",
            Self::FilmWork => "film_work",
        }
    }
}

impl fmt::Display for ChangeFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order in which change records are streamed, by modification timestamp.
///
/// `Descending` yields the most recently modified rows first. Combined with
/// advancing the checkpoint to each chunk's maximum, a failure after the first
/// chunk leaves older rows of later chunks below the checkpoint, so they are
/// not picked up again until they are modified anew. `Ascending` avoids this:
/// each chunk's maximum is a safe resume point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChangeOrder {
    #[default]
    Descending,
    Ascending,
}

impl ChangeOrder {
    /// SQL keyword for `ORDER BY`.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Descending => "DESC",
            Self::Ascending => "ASC",
        }
    }
}

impl FromStr for ChangeOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "desc" | "descending" => Ok(Self::Descending),
            "asc" | "ascending" => Ok(Self::Ascending),
            other => Err(format!("unknown change order '{}'", other)),
        }
    }
}

/// Summary of a successful bulk upsert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkUpsertSummary {
    /// Number of documents written.
    pub total: usize,
    /// Number of documents the backend reported as newly created.
    pub created: usize,
    /// Number of documents the backend reported as replaced.
    pub updated: usize,
}
