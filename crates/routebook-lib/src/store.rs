use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::{Location, LocationId, LocationInput, Route, RouteId, RouteInput};
use crate::query::{Predicate, QuerySpec, SortDirection, SortField};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS locations (
        id INTEGER PRIMARY KEY,
        x INTEGER,
        y INTEGER,
        z INTEGER
    );
    CREATE TABLE IF NOT EXISTS routes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        from_location_id INTEGER REFERENCES locations(id),
        to_location_id INTEGER REFERENCES locations(id),
        distance REAL NOT NULL
    );
    CREATE INDEX IF NOT EXISTS routes_distance ON routes(distance);
    CREATE INDEX IF NOT EXISTS routes_from_location ON routes(from_location_id);
    CREATE INDEX IF NOT EXISTS routes_to_location ON routes(to_location_id);
";

/// Column order must stay in sync with [`row_to_route`].
const SELECT_ROUTES: &str = "
    SELECT r.id, r.name, r.distance,
           f.id, f.x, f.y, f.z,
           t.id, t.x, t.y, t.z
    FROM routes r
    LEFT JOIN locations f ON f.id = r.from_location_id
    LEFT JOIN locations t ON t.id = r.to_location_id";

/// Coordinate columns folded into the derived `from` score.
const SCORE_COLUMNS: [&str; 3] = ["x", "y", "z"];

/// SQLite-backed persistence for routes and their locations.
///
/// The connection sits behind a mutex so one store can be shared by every
/// request handler. Each operation is a single statement or a single
/// transaction.
///
/// Every method blocks on SQLite I/O and on the mutex. Async callers should
/// run them on a blocking thread, as `AppState::with_store` does with
/// `tokio::task::spawn_blocking`.
#[derive(Debug)]
pub struct RouteStore {
    connection: Mutex<Connection>,
}

impl RouteStore {
    /// Open (or create) a store at `path` and apply the schema.
    ///
    /// Missing parent directories are created.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| Error::DatabaseDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let connection = Connection::open(path)?;
        info!(path = %path.display(), "opened route store");
        Self::with_connection(connection)
    }

    /// Open a private, empty in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        let connection = Connection::open_in_memory()?;
        debug!("opened in-memory route store");
        Self::with_connection(connection)
    }

    fn with_connection(connection: Connection) -> Result<Self> {
        connection.execute_batch("PRAGMA foreign_keys = ON;")?;
        connection.execute_batch(SCHEMA)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    // A panic while holding the lock cannot leave a half-applied statement
    // behind: uncommitted transactions roll back when dropped.
    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.connection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Lookup a route by identity.
    pub fn find_route(&self, id: RouteId) -> Result<Option<Route>> {
        let connection = self.lock();
        select_route(&connection, id)
    }

    /// Insert a new route, upserting its locations, and return the stored
    /// record with its assigned identity.
    pub fn insert_route(&self, input: &RouteInput) -> Result<Route> {
        let mut connection = self.lock();
        let tx = connection.transaction()?;

        let from_id = upsert_optional_location(&tx, input.from.as_ref())?;
        let to_id = upsert_optional_location(&tx, input.to.as_ref())?;
        tx.execute(
            "INSERT INTO routes (name, from_location_id, to_location_id, distance)
             VALUES (?1, ?2, ?3, ?4)",
            params![input.name, from_id, to_id, input.distance],
        )?;
        let id = tx.last_insert_rowid();
        let route = select_route(&tx, id)?.ok_or(Error::RouteNotFound { id })?;
        tx.commit()?;

        debug!(route_id = id, "inserted route");
        Ok(route)
    }

    /// Replace every field of an existing route.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RouteNotFound`] if no route has this identity; nothing
    /// is written in that case.
    pub fn update_route(&self, id: RouteId, input: &RouteInput) -> Result<Route> {
        let mut connection = self.lock();
        let tx = connection.transaction()?;

        if !route_exists(&tx, id)? {
            return Err(Error::RouteNotFound { id });
        }

        let from_id = upsert_optional_location(&tx, input.from.as_ref())?;
        let to_id = upsert_optional_location(&tx, input.to.as_ref())?;
        tx.execute(
            "UPDATE routes
             SET name = ?1, from_location_id = ?2, to_location_id = ?3, distance = ?4
             WHERE id = ?5",
            params![input.name, from_id, to_id, input.distance, id],
        )?;
        let route = select_route(&tx, id)?.ok_or(Error::RouteNotFound { id })?;
        tx.commit()?;

        debug!(route_id = id, "updated route");
        Ok(route)
    }

    /// Delete a route. Referenced locations are kept.
    pub fn delete_route(&self, id: RouteId) -> Result<()> {
        let connection = self.lock();
        let removed = connection.execute("DELETE FROM routes WHERE id = ?1", [id])?;
        if removed == 0 {
            return Err(Error::RouteNotFound { id });
        }
        debug!(route_id = id, "deleted route");
        Ok(())
    }

    /// Execute a composed listing query.
    ///
    /// Routes sharing a sort key come back in ascending identity order, so
    /// identical specs over an unchanged store return identical pages. A
    /// negative offset behaves like zero and a negative limit means no limit.
    pub fn query_routes(&self, spec: &QuerySpec) -> Result<Vec<Route>> {
        let (sql, values) = listing_sql(spec);
        debug!(sql = %sql, predicates = spec.predicates().len(), "querying routes");

        let connection = self.lock();
        let mut stmt = connection.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), row_to_route)?;

        let mut routes = Vec::new();
        for entry in rows {
            routes.push(entry?);
        }
        Ok(routes)
    }

    /// The route whose `from` location has the highest coordinate sum.
    ///
    /// Routes without a `from` location never qualify. When several routes
    /// share the highest score, which one is returned is unspecified.
    pub fn route_with_max_from_score(&self) -> Result<Option<Route>> {
        let sql = format!(
            "{SELECT_ROUTES} WHERE f.id IS NOT NULL ORDER BY {score} DESC LIMIT 1",
            score = score_expression("f")
        );

        let connection = self.lock();
        let route = connection
            .query_row(&sql, [], row_to_route)
            .optional()?;
        Ok(route)
    }

    /// Number of routes whose distance is strictly below `threshold`.
    pub fn count_routes_with_distance_below(&self, threshold: f64) -> Result<u64> {
        let connection = self.lock();
        let count: i64 = connection.query_row(
            "SELECT COUNT(*) FROM routes WHERE distance < ?1",
            [threshold],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    /// Total number of stored routes.
    pub fn count_routes(&self) -> Result<u64> {
        let connection = self.lock();
        let count: i64 = connection.query_row("SELECT COUNT(*) FROM routes", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }
}

fn select_route(connection: &Connection, id: RouteId) -> Result<Option<Route>> {
    let sql = format!("{SELECT_ROUTES} WHERE r.id = ?1");
    let route = connection
        .query_row(&sql, [id], row_to_route)
        .optional()?;
    Ok(route)
}

fn route_exists(connection: &Connection, id: RouteId) -> Result<bool> {
    let mut stmt = connection.prepare("SELECT 1 FROM routes WHERE id = ?1 LIMIT 1")?;
    let mut rows = stmt.query([id])?;
    Ok(rows.next()?.is_some())
}

fn upsert_optional_location(
    connection: &Connection,
    location: Option<&LocationInput>,
) -> Result<Option<LocationId>> {
    location
        .map(|location| upsert_location(connection, location))
        .transpose()
}

fn upsert_location(connection: &Connection, location: &LocationInput) -> Result<LocationId> {
    match location.id {
        Some(id) => {
            connection.execute(
                "INSERT INTO locations (id, x, y, z) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET x = excluded.x, y = excluded.y, z = excluded.z",
                params![id, location.x, location.y, location.z],
            )?;
            Ok(id)
        }
        None => {
            connection.execute(
                "INSERT INTO locations (x, y, z) VALUES (?1, ?2, ?3)",
                params![location.x, location.y, location.z],
            )?;
            Ok(connection.last_insert_rowid())
        }
    }
}

/// Render a spec as SQL plus positional parameters.
fn listing_sql(spec: &QuerySpec) -> (String, Vec<Value>) {
    let mut clauses = Vec::with_capacity(spec.predicates().len());
    let mut values = Vec::with_capacity(spec.predicates().len() + 2);

    for predicate in spec.predicates() {
        let (clause, value) = match predicate {
            // instr() is case-sensitive and treats '%' and '_' literally,
            // unlike SQLite's LIKE.
            Predicate::NameContains(needle) => ("instr(r.name, ?) > 0", Value::Text(needle.clone())),
            Predicate::FromLocation(id) => ("r.from_location_id = ?", Value::Integer(*id)),
            Predicate::ToLocation(id) => ("r.to_location_id = ?", Value::Integer(*id)),
            Predicate::DistanceAtLeast(bound) => ("r.distance >= ?", Value::Real(*bound)),
            Predicate::DistanceAtMost(bound) => ("r.distance <= ?", Value::Real(*bound)),
        };
        clauses.push(clause);
        values.push(value);
    }

    let mut sql = SELECT_ROUTES.to_string();
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }

    let sort = spec.sort();
    let direction = match sort.direction {
        SortDirection::Asc => "ASC",
        SortDirection::Desc => "DESC",
    };
    sql.push_str(&format!(
        " ORDER BY {column} {direction}",
        column = sort_column(sort.field)
    ));
    if sort.field != SortField::Id {
        sql.push_str(", r.id ASC");
    }

    sql.push_str(" LIMIT ? OFFSET ?");
    let page = spec.page();
    values.push(Value::Integer(page.limit));
    values.push(Value::Integer(page.offset));

    (sql, values)
}

fn sort_column(field: SortField) -> &'static str {
    match field {
        SortField::Id => "r.id",
        SortField::Name => "r.name",
        SortField::Distance => "r.distance",
        SortField::From => "r.from_location_id",
        SortField::To => "r.to_location_id",
    }
}

/// `COALESCE(a.x, 0) + COALESCE(a.y, 0) + COALESCE(a.z, 0)` for table alias `a`.
fn score_expression(alias: &str) -> String {
    SCORE_COLUMNS
        .iter()
        .map(|column| format!("COALESCE({alias}.{column}, 0)"))
        .collect::<Vec<_>>()
        .join(" + ")
}

fn row_to_route(row: &Row<'_>) -> rusqlite::Result<Route> {
    Ok(Route {
        id: row.get(0)?,
        name: row.get(1)?,
        distance: row.get(2)?,
        from: location_at(row, 3)?,
        to: location_at(row, 7)?,
    })
}

fn location_at(row: &Row<'_>, start: usize) -> rusqlite::Result<Option<Location>> {
    let id: Option<LocationId> = row.get(start)?;
    id.map(|id| {
        Ok(Location {
            id,
            x: row.get(start + 1)?,
            y: row.get(start + 2)?,
            z: row.get(start + 3)?,
        })
    })
    .transpose()
}
