use serde::{Deserialize, Serialize};

/// Numeric identifier for a route.
pub type RouteId = i64;

/// Numeric identifier for a location.
pub type LocationId = i64;

/// A point with three optional integer coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub z: Option<i32>,
}

impl Location {
    /// Sum of the coordinates, each absent coordinate counting as zero.
    ///
    /// Widened to `i64` so three extreme `i32` values cannot overflow.
    pub fn score(&self) -> i64 {
        [self.x, self.y, self.z]
            .into_iter()
            .map(|coordinate| coordinate.map_or(0, i64::from))
            .sum()
    }
}

/// A named connection between two locations with an associated distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: RouteId,
    pub name: String,
    pub from: Option<Location>,
    pub to: Option<Location>,
    pub distance: f64,
}

/// Location payload accepted on writes.
///
/// Without an `id` the store allocates a new location. With an `id` the
/// store creates that location or overwrites its coordinates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<LocationId>,
    #[serde(default)]
    pub x: Option<i32>,
    #[serde(default)]
    pub y: Option<i32>,
    #[serde(default)]
    pub z: Option<i32>,
}

impl LocationInput {
    /// Convenience constructor for a fresh location with all coordinates set.
    pub fn at(x: i32, y: i32, z: i32) -> Self {
        Self {
            id: None,
            x: Some(x),
            y: Some(y),
            z: Some(z),
        }
    }
}

/// Route payload accepted by insert and full-replace update.
///
/// Any `id` present in a JSON body is ignored; identities are assigned by the
/// store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteInput {
    pub name: String,
    #[serde(default)]
    pub from: Option<LocationInput>,
    #[serde(default)]
    pub to: Option<LocationInput>,
    pub distance: f64,
}

impl RouteInput {
    pub fn new(name: impl Into<String>, distance: f64) -> Self {
        Self {
            name: name.into(),
            from: None,
            to: None,
            distance,
        }
    }

    pub fn with_from(mut self, from: LocationInput) -> Self {
        self.from = Some(from);
        self
    }

    pub fn with_to(mut self, to: LocationInput) -> Self {
        self.to = Some(to);
        self
    }
}
