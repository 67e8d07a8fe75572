//! Transformer module for the movies ETL.
//!
//! Turns film work aggregates into the documents stored in the search index.

use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::errors::EtlError;
use movies_etl_shared::{FilmWorkAggregate, MovieDocument, PersonRef, PersonRole};

/// Converts aggregates to [`MovieDocument`]s. Stateless.
#[derive(Debug, Default, Clone, Copy)]
pub struct MovieTransformer;

/// People credited in one role, keyed by id so repeated credits collapse.
#[derive(Default)]
struct RoleCredits {
    people: BTreeMap<Uuid, String>,
}

impl RoleCredits {
    fn add(&mut self, id: Uuid, name: &str) {
        self.people.insert(id, name.to_string());
    }

    /// One name per person, aligned with [`RoleCredits::refs`]. Namesakes
    /// appear once each.
    fn names(&self) -> Vec<String> {
        self.refs().into_iter().map(|person| person.name).collect()
    }

    /// People sorted by name, then id.
    fn refs(&self) -> Vec<PersonRef> {
        let mut refs: Vec<PersonRef> = self
            .people
            .iter()
            .map(|(id, name)| PersonRef {
                id: *id,
                name: name.clone(),
            })
            .collect();
        refs.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        refs
    }
}

impl MovieTransformer {
    pub fn new() -> Self {
        Self
    }

    /// Transform a batch of aggregates.
    ///
    /// Fails the whole batch with [`EtlError::DataIntegrity`] when any
    /// aggregate has no usable title.
    #[instrument(skip(self, aggregates), fields(aggregate_count = aggregates.len()))]
    pub fn transform(
        &self,
        aggregates: Vec<FilmWorkAggregate>,
    ) -> Result<Vec<MovieDocument>, EtlError> {
        let documents = aggregates
            .into_iter()
            .map(|aggregate| self.transform_one(aggregate))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(document_count = documents.len(), "Transformed aggregates");
        Ok(documents)
    }

    fn transform_one(&self, aggregate: FilmWorkAggregate) -> Result<MovieDocument, EtlError> {
        let title = match aggregate.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => {
                return Err(EtlError::data_integrity(format!(
                    "film work {} has no title",
                    aggregate.id
                )))
            }
        };

        let mut actors = RoleCredits::default();
        let mut directors = RoleCredits::default();
        let mut writers = RoleCredits::default();

        for credit in &aggregate.persons {
            match credit.role.as_deref().and_then(PersonRole::parse) {
                Some(PersonRole::Actor) => actors.add(credit.id, &credit.full_name),
                Some(PersonRole::Director) => directors.add(credit.id, &credit.full_name),
                Some(PersonRole::Writer) => writers.add(credit.id, &credit.full_name),
                None => warn!(
                    film_work_id = %aggregate.id,
                    person_id = %credit.id,
                    role = ?credit.role,
                    "Skipping credit with unknown role"
                ),
            }
        }

        let genre: Vec<String> = aggregate
            .genres
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        Ok(MovieDocument {
            id: aggregate.id,
            title,
            description: aggregate.description,
            rating: aggregate.rating,
            genre,
            actors_names: actors.names(),
            directors_names: directors.names(),
            writers_names: writers.names(),
            actors: actors.refs(),
            directors: directors.refs(),
            writers: writers.refs(),
        })
    }
}
