//! Request types and validation for HTTP endpoints.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize};

use routebook_lib::{LocationId, LocationInput, RouteInput, RouteQuery};

use crate::problem::{FieldViolation, ProblemDetails};

/// Validation trait for request types.
///
/// Implementations report every violated rule at once so callers can fix a
/// payload in one round trip.
pub trait Validate {
    /// Collect all rule violations; empty when the value is valid.
    fn violations(&self) -> Vec<FieldViolation>;

    /// Validate the request, returning an error if invalid.
    ///
    /// The `request_id` is used to populate the `instance` field of any
    /// returned `ProblemDetails`.
    ///
    /// Returns a boxed `ProblemDetails` to avoid large `Result::Err` variants.
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        let violations = self.violations();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(Box::new(ProblemDetails::validation_failed(
                violations, request_id,
            )))
        }
    }
}

impl Validate for RouteInput {
    fn violations(&self) -> Vec<FieldViolation> {
        let mut violations = Vec::new();

        if self.name.trim().is_empty() {
            violations.push(FieldViolation::new("name", "must not be blank"));
        }

        if !self.distance.is_finite() {
            violations.push(FieldViolation::new("distance", "must be a finite number"));
        } else if self.distance < 0.0 {
            violations.push(FieldViolation::new("distance", "must be at least 0"));
        }

        check_location("from", self.from.as_ref(), &mut violations);
        check_location("to", self.to.as_ref(), &mut violations);

        violations
    }
}

fn check_location(
    field: &str,
    location: Option<&LocationInput>,
    violations: &mut Vec<FieldViolation>,
) {
    if let Some(id) = location.and_then(|l| l.id) {
        if id <= 0 {
            violations.push(FieldViolation::new(
                format!("{field}.id"),
                "must be a positive identifier",
            ));
        }
    }
}

/// Query parameters accepted by `GET /routes`.
///
/// Field names follow the public API (`fromLocationId`, ...). A parameter sent
/// with an empty value (`?page=`) counts as absent and falls back to its
/// default. The name filter may be sent as `name` or `nameFilter`; when both
/// are present `name` wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRoutesParams {
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub name_filter: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub from_location_id: Option<LocationId>,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub to_location_id: Option<LocationId>,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub min_distance: Option<f64>,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub max_distance: Option<f64>,
}

/// Read a query value as text and parse it, treating `""` as absent.
///
/// Query strings carry every value as text, so parsing goes through
/// [`FromStr`] rather than the deserializer's typed paths.
fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) if raw.is_empty() => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(de::Error::custom),
    }
}

impl From<ListRoutesParams> for RouteQuery {
    fn from(params: ListRoutesParams) -> Self {
        RouteQuery {
            page: params.page,
            size: params.size,
            sort: params.sort,
            order: params.order,
            name: params.name.or(params.name_filter),
            from_location_id: params.from_location_id,
            to_location_id: params.to_location_id,
            min_distance: params.min_distance,
            max_distance: params.max_distance,
        }
    }
}

/// Body of `GET /routes/distance/lower/{value}/count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::Uri;

    fn valid_route() -> RouteInput {
        RouteInput::new("Ridge", 4.0)
            .with_from(LocationInput::at(1, 2, 3))
            .with_to(LocationInput {
                id: Some(7),
                ..LocationInput::default()
            })
    }

    #[test]
    fn test_route_input_valid() {
        assert!(valid_route().violations().is_empty());
        assert!(valid_route().validate("test").is_ok());
    }

    #[test]
    fn test_route_input_zero_distance_is_valid() {
        let route = RouteInput::new("Ridge", 0.0);
        assert!(route.validate("test").is_ok());
    }

    #[test]
    fn test_route_input_blank_name() {
        let route = RouteInput {
            name: "   ".to_string(),
            ..valid_route()
        };
        let err = route.validate("test").unwrap_err();
        assert_eq!(err.errors, vec![FieldViolation::new("name", "must not be blank")]);
        assert_eq!(err.instance.as_deref(), Some("test"));
    }

    #[test]
    fn test_route_input_negative_distance() {
        let route = RouteInput {
            distance: -1.0,
            ..valid_route()
        };
        let err = route.validate("test").unwrap_err();
        assert_eq!(err.errors[0].field, "distance");
    }

    #[test]
    fn test_route_input_non_finite_distance() {
        let route = RouteInput {
            distance: f64::NAN,
            ..valid_route()
        };
        let violations = route.violations();
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("finite"));
    }

    #[test]
    fn test_route_input_reports_every_violation() {
        let route = RouteInput {
            name: String::new(),
            distance: -3.0,
            from: Some(LocationInput {
                id: Some(0),
                ..LocationInput::default()
            }),
            to: Some(LocationInput {
                id: Some(-4),
                ..LocationInput::default()
            }),
        };
        let fields: Vec<_> = route
            .violations()
            .into_iter()
            .map(|v| v.field)
            .collect();
        assert_eq!(fields, ["name", "distance", "from.id", "to.id"]);
    }

    fn parse_query(query: &str) -> ListRoutesParams {
        let uri: Uri = format!("/routes?{query}").parse().unwrap();
        let Query(params) = Query::<ListRoutesParams>::try_from_uri(&uri).unwrap();
        params
    }

    #[test]
    fn test_list_params_api_names() {
        let params = parse_query("page=2&nameFilter=Ridge&fromLocationId=3&minDistance=1.5");

        assert_eq!(params.page, Some(2));
        assert_eq!(params.name_filter.as_deref(), Some("Ridge"));
        assert_eq!(params.from_location_id, Some(3));
        assert_eq!(params.min_distance, Some(1.5));
        assert!(params.size.is_none());
    }

    #[test]
    fn test_list_params_blank_values_are_absent() {
        let params = parse_query("page=&size=&sort=&minDistance=&toLocationId=&name=");
        assert_eq!(params, ListRoutesParams::default());

        let query = RouteQuery::from(params);
        assert!(query.page.is_none());
        assert!(query.sort.is_none());
    }

    #[test]
    fn test_list_params_reject_unparsable_number() {
        let uri: Uri = "/routes?page=two".parse().unwrap();
        assert!(Query::<ListRoutesParams>::try_from_uri(&uri).is_err());
    }

    #[test]
    fn test_name_takes_precedence_over_name_filter() {
        let params = parse_query("name=North&nameFilter=South");
        assert_eq!(RouteQuery::from(params).name.as_deref(), Some("North"));

        let params = parse_query("nameFilter=South");
        assert_eq!(RouteQuery::from(params).name.as_deref(), Some("South"));
    }

    #[test]
    fn test_list_params_into_route_query() {
        let params = ListRoutesParams {
            sort: Some("distance".to_string()),
            order: Some("desc".to_string()),
            to_location_id: Some(8),
            max_distance: Some(10.0),
            ..ListRoutesParams::default()
        };
        let query = RouteQuery::from(params);

        assert_eq!(query.sort.as_deref(), Some("distance"));
        assert_eq!(query.order.as_deref(), Some("desc"));
        assert_eq!(query.to_location_id, Some(8));
        assert_eq!(query.max_distance, Some(10.0));
        assert!(query.page.is_none());
    }

    #[test]
    fn test_count_response_serialization() {
        let json = serde_json::to_string(&CountResponse { count: 2 }).unwrap();
        assert_eq!(json, r#"{"count":2}"#);
    }
}
