//! Change detection types.
//!
//! A change source reports which film works need reindexing as a sequence of
//! [`ChangeRecord`]s grouped into [`Chunk`]s.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use uuid::Uuid;

/// A single detected change: the film work to reindex and the modification
/// timestamp of the row that triggered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeRecord {
    /// Film work identifier. Person and genre changes are already resolved
    /// to the film works that reference them.
    pub film_work_id: Uuid,
    /// Modification timestamp of the changed source row.
    pub modified: DateTime<Utc>,
}

impl ChangeRecord {
    /// Create a new change record.
    pub fn new(film_work_id: Uuid, modified: DateTime<Utc>) -> Self {
        Self {
            film_work_id,
            modified,
        }
    }
}

/// An ordered, bounded batch of change records processed as one unit.
///
/// A chunk may name the same film work more than once when several link rows
/// point at it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    records: Vec<ChangeRecord>,
}

impl Chunk {
    /// Wrap a batch of records, preserving their order.
    pub fn new(records: Vec<ChangeRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The greatest modification timestamp in the chunk.
    ///
    /// Returns `None` for an empty chunk.
    pub fn max_modified(&self) -> Option<DateTime<Utc>> {
        self.records.iter().map(|r| r.modified).max()
    }

    /// Distinct film work identifiers referenced by the chunk.
    pub fn film_work_ids(&self) -> BTreeSet<Uuid> {
        self.records.iter().map(|r| r.film_work_id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_max_modified() {
        let chunk = Chunk::new(vec![
            ChangeRecord::new(Uuid::new_v4(), ts(5)),
            ChangeRecord::new(Uuid::new_v4(), ts(9)),
            ChangeRecord::new(Uuid::new_v4(), ts(3)),
        ]);

        assert_eq!(chunk.max_modified(), Some(ts(9)));
    }

    #[test]
    fn test_max_modified_empty() {
        assert_eq!(Chunk::new(Vec::new()).max_modified(), None);
    }

    #[test]
    fn test_film_work_ids_are_distinct() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let chunk = Chunk::new(vec![
            ChangeRecord::new(a, ts(3)),
            ChangeRecord::new(a, ts(2)),
            ChangeRecord::new(b, ts(1)),
        ]);

        let ids = chunk.film_work_ids();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&a));
        assert!(ids.contains(&b));
        assert_eq!(chunk.len(), 3);
    }
}
