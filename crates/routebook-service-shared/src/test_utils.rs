//! Test utilities for handler testing.
//!
//! Every call builds a fresh in-memory store, so tests never share rows.

use routebook_lib::{LocationInput, RouteInput, RouteStore};

use crate::config::DatabaseLocation;
use crate::state::AppState;

/// Empty in-memory state.
///
/// # Panics
///
/// Panics if SQLite cannot open an in-memory database.
pub fn test_state() -> AppState {
    let store = RouteStore::open_in_memory()
        .unwrap_or_else(|e| panic!("failed to open in-memory store: {}", e));
    AppState::from_store(store, DatabaseLocation::InMemory)
}

/// Routes inserted by [`seeded_state`], in id order starting at 1.
///
/// Location 1 sits at (1, 2, 3), location 2 at (5, -, 0) and location 3 at
/// (-4, -4, -), giving coordinate sums of 6, 5 and -8.
pub fn fixture_routes() -> Vec<RouteInput> {
    let l1 = LocationInput {
        id: Some(1),
        ..LocationInput::at(1, 2, 3)
    };
    let l2 = LocationInput {
        id: Some(2),
        x: Some(5),
        y: None,
        z: Some(0),
    };
    let l3 = LocationInput {
        id: Some(3),
        x: Some(-4),
        y: Some(-4),
        z: None,
    };

    vec![
        RouteInput::new("North Ridge", 12.0)
            .with_from(l1.clone())
            .with_to(l2.clone()),
        RouteInput::new("South Ridge", 4.5)
            .with_from(l2.clone())
            .with_to(l3.clone()),
        RouteInput::new("Harbour Loop", 30.0)
            .with_from(l1.clone())
            .with_to(l3.clone()),
        RouteInput::new("ridge walk", 7.25).with_from(l3),
        RouteInput::new("Orphan Spur", 1.0).with_to(l1.clone()),
        RouteInput::new("Delta Ferry", 4.5).with_from(l2).with_to(l1),
    ]
}

/// In-memory state holding [`fixture_routes`].
pub fn seeded_state() -> AppState {
    let state = test_state();
    for route in fixture_routes() {
        state
            .store()
            .insert_route(&route)
            .unwrap_or_else(|e| panic!("failed to seed route {:?}: {}", route.name, e));
    }
    state
}

/// Generate a unique request ID for testing.
pub fn test_request_id() -> String {
    format!("test-{}", uuid::Uuid::now_v7())
}
