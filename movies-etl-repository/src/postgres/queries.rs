//! SQL used by the PostgreSQL content repository.

use crate::types::{ChangeFeed, ChangeOrder};

macro_rules! person_changes {
    ($order:literal) => {
        concat!(
            "SELECT pfw.film_work_id, p.modified ",
            "FROM content.person p ",
            "INNER JOIN content.person_film_work pfw ON pfw.person_id = p.id ",
            "WHERE p.modified > $1 ",
            "ORDER BY p.modified ",
            $order,
            ", pfw.film_work_id"
        )
    };
}

macro_rules! genre_changes {
    ($order:literal) => {
        concat!(
            "SELECT gfw.film_work_id, g.modified ",
            "FROM content.genre g ",
            "INNER JOIN content.genre_film_work gfw ON gfw.genre_id = g.id ",
            "WHERE g.modified > $1 ",
            "ORDER BY g.modified ",
            $order,
            ", gfw.film_work_id"
        )
    };
}

macro_rules! film_work_changes {
    ($order:literal) => {
        concat!(
            "SELECT fw.id, fw.modified ",
            "FROM content.film_work fw ",
            "WHERE fw.modified > $1 ",
            "ORDER BY fw.modified ",
            $order,
            ", fw.id"
        )
    };
}

/// Change-detection query for `feed`, returning `(film_work_id, modified)`
/// rows with `modified > $1`.
pub(crate) fn change_query(feed: ChangeFeed, order: ChangeOrder) -> &'static str {
    match (feed, order) {
        (ChangeFeed::Person, ChangeOrder::Descending) => person_changes!("DESC"),
        (ChangeFeed::Person, ChangeOrder::Ascending) => person_changes!("ASC"),
        (ChangeFeed::Genre, ChangeOrder::Descending) => genre_changes!("DESC"),
        (ChangeFeed::Genre, ChangeOrder::Ascending) => genre_changes!("ASC"),
        (ChangeFeed::FilmWork, ChangeOrder::Descending) => film_work_changes!("DESC"),
        (ChangeFeed::FilmWork, ChangeOrder::Ascending) => film_work_changes!("ASC"),
    }
}

/// Denormalized film works for `$1 = uuid[]`, one row per existing id.
pub(crate) const FILM_WORKS_BY_IDS: &str = r#"
SELECT
    fw.id,
    fw.title,
    fw.description,
    fw.rating,
    COALESCE(
        json_agg(
            DISTINCT jsonb_build_object(
                'id', p.id,
                'role', pfw.role,
                'full_name', p.full_name
            )
        ) FILTER (WHERE p.id IS NOT NULL),
        '[]'::json
    ) AS persons,
    COALESCE(
        array_agg(DISTINCT g.name::text) FILTER (WHERE g.id IS NOT NULL),
        '{}'::text[]
    ) AS genres
FROM content.film_work fw
LEFT JOIN content.person_film_work pfw ON pfw.film_work_id = fw.id
LEFT JOIN content.person p ON p.id = pfw.person_id
LEFT JOIN content.genre_film_work gfw ON gfw.film_work_id = fw.id
LEFT JOIN content.genre g ON g.id = gfw.genre_id
WHERE fw.id = ANY($1)
GROUP BY fw.id
"#;
