use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

/// Watermark used when a source has never been checkpointed.
///
/// `0001-01-01T00:00:00Z`, the earliest instant PostgreSQL `timestamptz`
/// and the checkpoint format can both represent.
pub fn min_watermark() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(-62_135_596_800, 0).unwrap_or_default()
}

/// Render a watermark for the checkpoint store.
///
/// Microsecond precision matches `timestamptz`, so a parsed value compares
/// exactly against the rows it was taken from.
pub fn format_watermark(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored watermark.
///
/// Accepts RFC 3339 as well as the space separated form PostgreSQL prints
/// (`2021-06-16 20:14:09.221855+00:00`). A value without offset is read as UTC.
pub fn parse_watermark(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
