//! Query composition for route listings.
//!
//! A [`RouteQuery`] carries the optional filter, sort, and pagination inputs a
//! caller supplied. [`QuerySpec::compose`] turns it into an immutable
//! [`QuerySpec`]: an ordered list of conjunctive [`Predicate`]s, exactly one
//! [`Sort`], and a [`Page`] window. Execution happens in
//! [`crate::store::RouteStore::query_routes`].

use std::fmt;

use crate::error::{Error, Result};
use crate::model::{LocationId, Route};

/// Page number used when the caller gives none (pages are one-based).
pub const DEFAULT_PAGE: i64 = 1;

/// Page size used when the caller gives none.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Sort field used when the caller gives none.
pub const DEFAULT_SORT: &str = "id";

/// Caller-supplied listing parameters, all optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub name: Option<String>,
    pub from_location_id: Option<LocationId>,
    pub to_location_id: Option<LocationId>,
    pub min_distance: Option<f64>,
    pub max_distance: Option<f64>,
}

/// A single filter condition over one field of a route.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Case-sensitive, unanchored substring match on the name.
    NameContains(String),
    /// The `from` location has this identity.
    FromLocation(LocationId),
    /// The `to` location has this identity.
    ToLocation(LocationId),
    /// `distance >= bound`.
    DistanceAtLeast(f64),
    /// `distance <= bound`.
    DistanceAtMost(f64),
}

impl Predicate {
    /// Evaluate the predicate against an in-memory route.
    ///
    /// The store evaluates the same conditions in SQL; this is the reference
    /// semantics.
    pub fn matches(&self, route: &Route) -> bool {
        match self {
            Predicate::NameContains(needle) => route.name.contains(needle.as_str()),
            Predicate::FromLocation(id) => route.from.as_ref().is_some_and(|l| l.id == *id),
            Predicate::ToLocation(id) => route.to.as_ref().is_some_and(|l| l.id == *id),
            Predicate::DistanceAtLeast(bound) => route.distance >= *bound,
            Predicate::DistanceAtMost(bound) => route.distance <= *bound,
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::NameContains(needle) => write!(f, "name contains '{needle}'"),
            Predicate::FromLocation(id) => write!(f, "from.id = {id}"),
            Predicate::ToLocation(id) => write!(f, "to.id = {id}"),
            Predicate::DistanceAtLeast(bound) => write!(f, "distance >= {bound}"),
            Predicate::DistanceAtMost(bound) => write!(f, "distance <= {bound}"),
        }
    }
}

/// Route fields a listing may be ordered by.
///
/// `From` and `To` order by the referenced location's identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    Name,
    Distance,
    From,
    To,
}

impl SortField {
    /// Accepted spellings, in declaration order.
    pub const NAMES: [&'static str; 5] = ["id", "name", "distance", "from", "to"];

    /// Resolve a caller-supplied field name against the allow-list.
    ///
    /// Names are matched exactly, like entity attribute names.
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "id" => Ok(SortField::Id),
            "name" => Ok(SortField::Name),
            "distance" => Ok(SortField::Distance),
            "from" => Ok(SortField::From),
            "to" => Ok(SortField::To),
            other => Err(Error::InvalidQueryField {
                field: other.to_string(),
            }),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Name => "name",
            SortField::Distance => "distance",
            SortField::From => "from",
            SortField::To => "to",
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordering direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Interpret an `order` parameter.
    ///
    /// Only `desc` (any case) selects descending; every other value, including
    /// unrecognised ones, is ascending.
    pub fn from_order(order: &str) -> Self {
        if order.eq_ignore_ascii_case("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => f.write_str("asc"),
            SortDirection::Desc => f.write_str("desc"),
        }
    }
}

/// A sort key and its direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for Sort {
    fn default() -> Self {
        Self {
            field: SortField::Id,
            direction: SortDirection::Asc,
        }
    }
}

/// Zero-based pagination window.
///
/// Values are not clamped: a page or size below one yields a zero or negative
/// window and the store decides what that means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: i64,
    pub limit: i64,
}

impl Page {
    /// Window for a one-based page number and a page size.
    pub fn from_page_and_size(page: i64, size: i64) -> Self {
        Self {
            offset: page.saturating_sub(1).saturating_mul(size),
            limit: size,
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::from_page_and_size(DEFAULT_PAGE, DEFAULT_PAGE_SIZE)
    }
}

/// Immutable description of a route listing: filters, ordering, window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySpec {
    predicates: Vec<Predicate>,
    sort: Sort,
    page: Page,
}

impl QuerySpec {
    /// Build a spec from caller parameters.
    ///
    /// One predicate is appended per present filter, in the order name, from,
    /// to, minimum distance, maximum distance. An empty name adds nothing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidQueryField`] when `sort` names a field outside
    /// [`SortField::NAMES`]. Nothing else is rejected.
    pub fn compose(query: &RouteQuery) -> Result<Self> {
        let mut predicates = Vec::new();

        if let Some(name) = query.name.as_deref().filter(|n| !n.is_empty()) {
            predicates.push(Predicate::NameContains(name.to_string()));
        }
        if let Some(id) = query.from_location_id {
            predicates.push(Predicate::FromLocation(id));
        }
        if let Some(id) = query.to_location_id {
            predicates.push(Predicate::ToLocation(id));
        }
        if let Some(min) = query.min_distance {
            predicates.push(Predicate::DistanceAtLeast(min));
        }
        if let Some(max) = query.max_distance {
            predicates.push(Predicate::DistanceAtMost(max));
        }

        let field = SortField::parse(query.sort.as_deref().unwrap_or(DEFAULT_SORT))?;
        let direction = query
            .order
            .as_deref()
            .map(SortDirection::from_order)
            .unwrap_or_default();

        let page = Page::from_page_and_size(
            query.page.unwrap_or(DEFAULT_PAGE),
            query.size.unwrap_or(DEFAULT_PAGE_SIZE),
        );

        Ok(Self {
            predicates,
            sort: Sort { field, direction },
            page,
        })
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn sort(&self) -> Sort {
        self.sort
    }

    pub fn page(&self) -> Page {
        self.page
    }

    /// Whether a route satisfies every predicate. Ordering and window are
    /// not considered.
    pub fn matches(&self, route: &Route) -> bool {
        self.predicates.iter().all(|p| p.matches(route))
    }
}
