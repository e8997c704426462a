use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Json;
use axum::Router;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::engine::search::query;
use crate::error::AppError;
use crate::models::interval::Span;
use crate::models::search::SearchCriteria;
use crate::models::unit::Transmission;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/search/data", get(search_data))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub driver: bool,
    pub seats: Option<u8>,
    pub transmission: Option<Transmission>,
    pub substitutes: Option<bool>,
}

impl SearchParams {
    fn into_criteria(self) -> Result<SearchCriteria, AppError> {
        let (Some(from), Some(to)) = (self.from, self.to) else {
            return Err(AppError::InvalidFilter(
                "both `from` and `to` are required".to_string(),
            ));
        };

        Ok(SearchCriteria {
            window: Span::new(from, to),
            location: self.location.filter(|l| !l.trim().is_empty()),
            category: self.category.filter(|c| !c.trim().is_empty()),
            driver_required: self.driver,
            min_seats: self.seats,
            transmission: self.transmission,
            allow_substitutes: self.substitutes.unwrap_or(true),
        })
    }
}

async fn search_data(
    State(state): State<Arc<AppState>>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Response {
    let criteria = params
        .map_err(|rejection| AppError::InvalidFilter(rejection.body_text()))
        .and_then(|Query(params)| params.into_criteria());

    let result = match criteria {
        Ok(criteria) => query(&state, criteria).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(result) => Json(result).into_response(),
        Err(err @ (AppError::InvalidFilter(_) | AppError::Timeout(_))) => err.into_response(),
        Err(err) => {
            error!(error = %err, "search request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch system data" })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::{TimeZone, Utc};
    use serde_json::Value;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::api::rest::router;
    use crate::catalog::{CatalogData, StaticSource};
    use crate::engine::resolver::SearchPolicy;
    use crate::models::category::{Category, Partner};
    use crate::models::interval::Span;
    use crate::models::unit::{Capabilities, FleetUnit, Transmission, UnitStatus};
    use crate::state::AppState;

    fn state() -> Arc<AppState> {
        let data = CatalogData {
            categories: vec![Category {
                id: Uuid::from_u128(1),
                name: "Vans".to_string(),
                rank: 0,
                parent_id: None,
            }],
            partners: vec![Partner {
                id: Uuid::from_u128(100),
                name: "partner".to_string(),
                priority: 1,
            }],
            units: vec![FleetUnit {
                id: Uuid::from_u128(10),
                name: "van".to_string(),
                category_id: Uuid::from_u128(1),
                partner_id: Uuid::from_u128(100),
                location: "HAM".to_string(),
                daily_rate: 120,
                capabilities: Capabilities {
                    seats: 9,
                    transmission: Transmission::Manual,
                    driver_included: true,
                },
                status: UnitStatus::Active,
            }],
        };
        Arc::new(
            AppState::new(
                Arc::new(StaticSource::new(data)),
                SearchPolicy::default(),
                Duration::from_millis(50),
            )
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn expired_deadline_maps_to_504() {
        let state = state();
        let unit = Uuid::from_u128(10);
        let day = |d| Utc.with_ymd_and_hms(2024, 3, d, 0, 0, 0).unwrap();
        state
            .availability
            .reserve_interval(unit, Span::new(day(10), day(11)))
            .await
            .unwrap();

        let timeline = state.availability.timeline(unit).unwrap();
        let _writer = timeline.write().await;

        let request = Request::builder()
            .uri("/api/search/data?from=2024-03-01T00:00:00Z&to=2024-03-02T00:00:00Z")
            .body(Body::empty())
            .unwrap();
        let response = router(state.clone()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["error"].as_str().unwrap().contains("50 ms"));
        assert!(body.get("offers").is_none());
    }
}
