//! Routebook library entry points.
//!
//! This crate holds the route catalogue's data model, the query builder that
//! turns optional listing parameters into a [`QuerySpec`], and the SQLite-backed
//! [`RouteStore`] that executes those specs alongside plain CRUD and the two
//! aggregate queries. Higher-level consumers (the HTTP service) should only
//! depend on the items exported here instead of reimplementing behavior.
//!

#![deny(warnings)]

pub mod error;
pub mod model;
pub mod query;
pub mod store;

pub use error::{Error, Result};
pub use model::{Location, LocationId, LocationInput, Route, RouteId, RouteInput};
pub use query::{Page, Predicate, QuerySpec, RouteQuery, Sort, SortDirection, SortField};
pub use store::RouteStore;
