use std::path::PathBuf;

use thiserror::Error;

use crate::model::RouteId;

/// Convenient result alias for the Routebook library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Raised when a route identity does not exist in the store.
    #[error("route {id} not found")]
    RouteNotFound { id: RouteId },

    /// Raised when an aggregate query has no qualifying route.
    #[error("no routes found")]
    NoQualifyingRoute,

    /// Raised when a caller asks to sort by a field outside the allow-list.
    #[error("unknown sort field '{field}'; expected one of: {}", crate::query::SortField::NAMES.join(", "))]
    InvalidQueryField { field: String },

    /// Wrapper for SQLite errors.
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    /// Raised when the directory holding the database cannot be prepared.
    #[error("failed to prepare database directory {path}: {source}")]
    DatabaseDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Whether this error means "no such record" rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::RouteNotFound { .. } | Error::NoQualifyingRoute)
    }
}
