//! Application state for the HTTP service.
//!
//! This module provides the shared state structure that axum handlers use to
//! reach the route store.

use std::sync::Arc;

use routebook_lib::{Error as LibError, Result as LibResult, RouteStore};
use tokio::task::JoinError;

use crate::config::DatabaseLocation;

/// Error during application state initialization.
#[derive(Debug)]
pub enum AppStateError {
    /// Failed to open or initialise the route store.
    StoreOpen {
        location: DatabaseLocation,
        source: LibError,
    },
}

impl std::fmt::Display for AppStateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StoreOpen { location, source } => {
                write!(f, "failed to open route store at {}: {}", location, source)
            }
        }
    }
}

impl std::error::Error for AppStateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::StoreOpen { source, .. } => Some(source),
        }
    }
}

/// Shared application state for all axum handlers.
///
/// This struct is cheaply cloneable (using `Arc` internally) and should be
/// shared via axum's `State` extractor.
///
/// # Example
///
/// ```ignore
/// use axum::{Router, routing::get, extract::State};
/// use routebook_service_shared::{AppState, DatabaseLocation};
///
/// async fn handler(State(state): State<AppState>) {
///     let store = state.store();
///     // ... query the store
/// }
///
/// let state = AppState::open(&DatabaseLocation::InMemory).unwrap();
/// let app = Router::new()
///     .route("/routes", get(handler))
///     .with_state(state);
/// ```
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: RouteStore,
    location: DatabaseLocation,
}

impl AppState {
    /// Open the route store at the configured location.
    pub fn open(location: &DatabaseLocation) -> Result<Self, AppStateError> {
        tracing::info!(database = %location, "opening route store");

        let opened = match location {
            DatabaseLocation::InMemory => RouteStore::open_in_memory(),
            DatabaseLocation::File(path) => RouteStore::open(path),
        };
        let store = opened.map_err(|source| AppStateError::StoreOpen {
            location: location.clone(),
            source,
        })?;

        if let Ok(routes) = store.count_routes() {
            tracing::info!(routes, "route store ready");
        }

        Ok(Self::from_store(store, location.clone()))
    }

    /// Create application state around an already-open store.
    ///
    /// This is useful for testing.
    pub fn from_store(store: RouteStore, location: DatabaseLocation) -> Self {
        Self {
            inner: Arc::new(AppStateInner { store, location }),
        }
    }

    /// Access the route store.
    pub fn store(&self) -> &RouteStore {
        &self.inner.store
    }

    /// Run a store operation on tokio's blocking pool.
    ///
    /// SQLite calls block on disk I/O and on the store's mutex, so handlers
    /// go through here instead of calling [`AppState::store`] on a runtime
    /// worker. The outer error means the task panicked or was cancelled.
    pub async fn with_store<T, F>(&self, op: F) -> Result<LibResult<T>, JoinError>
    where
        F: FnOnce(&RouteStore) -> LibResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let state = self.clone();
        tokio::task::spawn_blocking(move || op(state.store())).await
    }

    /// Where the store lives.
    pub fn database(&self) -> &DatabaseLocation {
        &self.inner.location
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("database", &self.inner.location)
            .finish()
    }
}
