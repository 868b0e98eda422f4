mod common;

use common::{empty_store, location, seeded_store};
use routebook_lib::{RouteInput, RouteStore};

fn store_with(inputs: &[RouteInput]) -> RouteStore {
    let store = empty_store();
    for input in inputs {
        store.insert_route(input).expect("route inserts");
    }
    store
}

#[test]
fn max_from_score_prefers_highest_coordinate_sum() {
    let store = store_with(&[
        RouteInput::new("five", 1.0).with_from(location(10, Some(5), None, Some(0))),
        RouteInput::new("six", 1.0).with_from(location(11, Some(1), Some(2), Some(3))),
    ]);

    let best = store
        .route_with_max_from_score()
        .expect("query succeeds")
        .expect("a route qualifies");
    assert_eq!(best.name, "six");
    assert_eq!(best.from.as_ref().map(|l| l.score()), Some(6));
}

#[test]
fn max_from_score_never_selects_missing_from() {
    let store = store_with(&[
        RouteInput::new("nowhere", 1.0).with_to(location(1, Some(1000), Some(1000), Some(1000))),
        RouteInput::new("negative", 1.0).with_from(location(2, Some(-3), None, None)),
    ]);

    let best = store.route_with_max_from_score().unwrap().unwrap();
    assert_eq!(best.name, "negative");
}

#[test]
fn max_from_score_is_none_without_qualifying_routes() {
    assert!(empty_store().route_with_max_from_score().unwrap().is_none());

    let store = store_with(&[RouteInput::new("nowhere", 1.0)]);
    assert!(store.route_with_max_from_score().unwrap().is_none());
}

#[test]
fn max_from_score_tie_returns_one_of_the_tied_routes() {
    let (store, seeded) = seeded_store();
    let best = store.route_with_max_from_score().unwrap().unwrap();

    let top_score = seeded
        .iter()
        .filter_map(|r| r.from.as_ref().map(|l| l.score()))
        .max()
        .unwrap();
    assert_eq!(best.from.as_ref().map(|l| l.score()), Some(top_score));
    assert!(["North Ridge", "Harbour Loop"].contains(&best.name.as_str()));
}

#[test]
fn max_from_score_handles_extreme_coordinates() {
    let store = store_with(&[
        RouteInput::new("max", 1.0).with_from(location(
            1,
            Some(i32::MAX),
            Some(i32::MAX),
            Some(i32::MAX),
        )),
        RouteInput::new("small", 1.0).with_from(location(2, Some(1), None, None)),
    ]);

    let best = store.route_with_max_from_score().unwrap().unwrap();
    assert_eq!(best.name, "max");
}

#[test]
fn distance_count_is_strictly_below_threshold() {
    let store = store_with(&[
        RouteInput::new("a", 1.0),
        RouteInput::new("b", 2.5),
        RouteInput::new("c", 3.0),
    ]);

    assert_eq!(store.count_routes_with_distance_below(3.0).unwrap(), 2);
    assert_eq!(store.count_routes_with_distance_below(3.0001).unwrap(), 3);
    assert_eq!(store.count_routes_with_distance_below(1.0).unwrap(), 0);
}

#[test]
fn distance_count_on_empty_store_is_zero() {
    assert_eq!(
        empty_store().count_routes_with_distance_below(100.0).unwrap(),
        0
    );
}

#[test]
fn distance_count_on_seeded_store() {
    let (store, _) = seeded_store();
    assert_eq!(store.count_routes_with_distance_below(4.5).unwrap(), 1);
    assert_eq!(store.count_routes_with_distance_below(7.25).unwrap(), 3);
    assert_eq!(store.count_routes().unwrap(), 6);
}
