//! Service configuration read from the environment.
//!
//! # Environment Variables
//!
//! - `ROUTEBOOK_DATABASE_PATH`: SQLite file path (default: `routebook.db`);
//!   the literal `:memory:` selects a private in-memory store
//! - `SERVICE_PORT`: HTTP port (default: 8080)

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default database file, relative to the working directory.
pub const DEFAULT_DATABASE_PATH: &str = "routebook.db";

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 8080;

/// Where the route store lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatabaseLocation {
    /// Private in-memory database, discarded on shutdown.
    InMemory,
    /// SQLite database file.
    File(PathBuf),
}

impl DatabaseLocation {
    /// Parse a configured path; `:memory:` selects the in-memory store.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            ":memory:" => DatabaseLocation::InMemory,
            "" => DatabaseLocation::File(PathBuf::from(DEFAULT_DATABASE_PATH)),
            path => DatabaseLocation::File(PathBuf::from(path)),
        }
    }
}

impl fmt::Display for DatabaseLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseLocation::InMemory => f.write_str(":memory:"),
            DatabaseLocation::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Runtime configuration for the HTTP service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub database: DatabaseLocation,
    pub port: u16,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            database: DatabaseLocation::File(PathBuf::from(DEFAULT_DATABASE_PATH)),
            port: DEFAULT_PORT,
        }
    }
}

impl ServiceConfig {
    /// Create configuration from environment variables.
    ///
    /// An unparsable `SERVICE_PORT` falls back to the default.
    pub fn from_env() -> Self {
        let database = std::env::var("ROUTEBOOK_DATABASE_PATH")
            .map(|v| DatabaseLocation::parse(&v))
            .unwrap_or_else(|_| DatabaseLocation::File(PathBuf::from(DEFAULT_DATABASE_PATH)));

        let port = std::env::var("SERVICE_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        Self { database, port }
    }
}
