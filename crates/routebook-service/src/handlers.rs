use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use tracing::{info, warn};

use routebook_lib::{
    Error as LibError, QuerySpec, Result as LibResult, Route, RouteId, RouteInput, RouteQuery,
    RouteStore,
};
use routebook_service_shared::{
    from_lib_error, record_query_rejected, record_route_written, record_routes_listed, ApiPath,
    ApiQuery, AppState, CountResponse, ListRoutesParams, ProblemDetails, RequestId, ValidatedJson,
};

type HandlerResult<T> = Result<T, ProblemDetails>;

/// Map a library error to a problem response, logging server-side failures.
fn problem(error: LibError, request_id: &RequestId) -> ProblemDetails {
    let problem = from_lib_error(&error, request_id.as_str());
    if problem.status >= 500 {
        tracing::error!(request_id = %request_id, error = %error, "store operation failed");
    }
    problem
}

/// Run `op` against the store on the blocking pool and map its errors.
async fn run_store<T, F>(state: &AppState, request_id: &RequestId, op: F) -> HandlerResult<T>
where
    F: FnOnce(&RouteStore) -> LibResult<T> + Send + 'static,
    T: Send + 'static,
{
    match state.with_store(op).await {
        Ok(result) => result.map_err(|e| problem(e, request_id)),
        Err(err) => {
            tracing::error!(request_id = %request_id, error = %err, "store task did not complete");
            Err(ProblemDetails::internal_error(
                "store task did not complete",
                request_id.as_str(),
            ))
        }
    }
}

/// Handle `GET /routes`.
pub async fn list_routes(
    State(state): State<AppState>,
    request_id: RequestId,
    ApiQuery(params): ApiQuery<ListRoutesParams>,
) -> HandlerResult<Json<Vec<Route>>> {
    let query = RouteQuery::from(params);
    let spec = QuerySpec::compose(&query).map_err(|e| {
        warn!(request_id = %request_id, error = %e, "rejected listing query");
        record_query_rejected("invalid_sort_field");
        problem(e, &request_id)
    })?;

    let predicates = spec.predicates().len();
    let sort = spec.sort();
    let routes = run_store(&state, &request_id, move |store| store.query_routes(&spec)).await?;

    info!(
        request_id = %request_id,
        predicates,
        sort = %sort.field,
        returned = routes.len(),
        "listed routes"
    );
    record_routes_listed(routes.len());

    Ok(Json(routes))
}

/// Handle `GET /routes/{id}`.
pub async fn get_route(
    State(state): State<AppState>,
    request_id: RequestId,
    ApiPath(id): ApiPath<RouteId>,
) -> HandlerResult<Json<Route>> {
    run_store(&state, &request_id, move |store| {
        store
            .find_route(id)?
            .ok_or(LibError::RouteNotFound { id })
    })
    .await
    .map(Json)
}

/// Handle `POST /routes`; answers 201 with a `Location` header.
pub async fn create_route(
    State(state): State<AppState>,
    request_id: RequestId,
    ValidatedJson(input): ValidatedJson<RouteInput>,
) -> HandlerResult<impl IntoResponse> {
    let route = run_store(&state, &request_id, move |store| store.insert_route(&input)).await?;

    info!(request_id = %request_id, route_id = route.id, "route created");
    record_route_written("create");

    let location = format!("/routes/{}", route.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(route)))
}

/// Handle `PUT /routes/{id}`.
pub async fn update_route(
    State(state): State<AppState>,
    request_id: RequestId,
    ApiPath(id): ApiPath<RouteId>,
    ValidatedJson(input): ValidatedJson<RouteInput>,
) -> HandlerResult<Json<Route>> {
    let route =
        run_store(&state, &request_id, move |store| store.update_route(id, &input)).await?;

    info!(request_id = %request_id, route_id = id, "route updated");
    record_route_written("update");

    Ok(Json(route))
}

/// Handle `DELETE /routes/{id}`.
pub async fn delete_route(
    State(state): State<AppState>,
    request_id: RequestId,
    ApiPath(id): ApiPath<RouteId>,
) -> HandlerResult<StatusCode> {
    run_store(&state, &request_id, move |store| store.delete_route(id)).await?;

    info!(request_id = %request_id, route_id = id, "route deleted");
    record_route_written("delete");

    Ok(StatusCode::NO_CONTENT)
}

/// Handle `GET /routes/from/max`.
///
/// When several routes share the top score, which one is returned is not
/// specified.
pub async fn route_with_max_from_score(
    State(state): State<AppState>,
    request_id: RequestId,
) -> HandlerResult<Json<Route>> {
    let route = run_store(&state, &request_id, |store| {
        store
            .route_with_max_from_score()?
            .ok_or(LibError::NoQualifyingRoute)
    })
    .await?;

    info!(
        request_id = %request_id,
        route_id = route.id,
        score = route.from.as_ref().map(|from| from.score()),
        "selected route with highest origin score"
    );

    Ok(Json(route))
}

/// Handle `GET /routes/distance/lower/{value}/count`.
pub async fn count_routes_below(
    State(state): State<AppState>,
    request_id: RequestId,
    ApiPath(threshold): ApiPath<f64>,
) -> HandlerResult<Json<CountResponse>> {
    let count = run_store(&state, &request_id, move |store| {
        store.count_routes_with_distance_below(threshold)
    })
    .await?;

    info!(request_id = %request_id, threshold, count, "counted routes below threshold");

    Ok(Json(CountResponse { count }))
}
