use thiserror::Error;

/// Represents errors that can occur within the content repository.
///
/// This enum consolidates error conditions specific to the relational content
/// store, such as SQLx errors during change detection or enrichment.
#[derive(Debug, Error)]
pub enum ContentRepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Invalid row: {0}")]
    InvalidRow(String),
}

impl ContentRepositoryError {
    /// Whether retrying the same query may succeed.
    ///
    /// Connection-level failures are transient; decoding and constraint
    /// failures are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::DatabaseError(e) => matches!(
                e,
                sqlx::Error::Io(_)
                    | sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::WorkerCrashed
                    | sqlx::Error::Tls(_)
                    | sqlx::Error::Protocol(_)
            ),
            Self::InvalidRow(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ContentRepositoryError::from(sqlx::Error::PoolTimedOut).is_transient());
        assert!(ContentRepositoryError::from(sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "reset"
        )))
        .is_transient());
        assert!(!ContentRepositoryError::from(sqlx::Error::RowNotFound).is_transient());
        assert!(!ContentRepositoryError::InvalidRow("null id".to_string()).is_transient());
    }
}
