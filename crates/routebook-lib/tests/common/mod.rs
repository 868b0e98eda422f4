#![allow(dead_code)]

use routebook_lib::{LocationInput, Route, RouteInput, RouteStore};

pub fn empty_store() -> RouteStore {
    RouteStore::open_in_memory().expect("in-memory store opens")
}

/// Location with explicit identity and coordinates.
pub fn location(id: i64, x: Option<i32>, y: Option<i32>, z: Option<i32>) -> LocationInput {
    LocationInput {
        id: Some(id),
        x,
        y,
        z,
    }
}

/// Store seeded with a small catalogue:
///
/// | name          | from | to | distance |
/// |---------------|------|----|----------|
/// | North Ridge   | 1    | 2  | 12.0     |
/// | South Ridge   | 2    | 3  | 4.5      |
/// | Harbour Loop  | 1    | 3  | 30.0     |
/// | ridge walk    | 3    | -  | 7.25     |
/// | Orphan Spur   | -    | 1  | 1.0      |
/// | Delta Ferry   | 2    | 1  | 4.5      |
pub fn seeded_store() -> (RouteStore, Vec<Route>) {
    let store = empty_store();
    let l1 = location(1, Some(1), Some(2), Some(3));
    let l2 = location(2, Some(5), None, Some(0));
    let l3 = location(3, Some(-4), Some(-4), None);

    let inputs = vec![
        RouteInput::new("North Ridge", 12.0)
            .with_from(l1.clone())
            .with_to(l2.clone()),
        RouteInput::new("South Ridge", 4.5)
            .with_from(l2.clone())
            .with_to(l3.clone()),
        RouteInput::new("Harbour Loop", 30.0)
            .with_from(l1.clone())
            .with_to(l3.clone()),
        RouteInput::new("ridge walk", 7.25).with_from(l3.clone()),
        RouteInput::new("Orphan Spur", 1.0).with_to(l1.clone()),
        RouteInput::new("Delta Ferry", 4.5)
            .with_from(l2.clone())
            .with_to(l1.clone()),
    ];

    let routes = inputs
        .iter()
        .map(|input| store.insert_route(input).expect("seed route inserts"))
        .collect();
    (store, routes)
}

pub fn names(routes: &[Route]) -> Vec<&str> {
    routes.iter().map(|r| r.name.as_str()).collect()
}
