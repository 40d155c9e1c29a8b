//! Axum REST API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::error;

use crate::db::{self, FundQuery};
use crate::errors::IndexerError;
use crate::events::{ContributionRecord, EventRecord, FundRecord, RequestRecord};

#[derive(Clone)]
pub struct ApiState {
    pub pool: SqlitePool,
}

// ─────────────────────────────────────────────────────────
// Response shapes
// ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct EventsResponse {
    pub fund_id: i64,
    pub count: usize,
    pub events: Vec<EventRecord>,
}

#[derive(Serialize)]
pub struct AllEventsResponse {
    pub count: usize,
    pub events: Vec<EventRecord>,
}

#[derive(Serialize)]
pub struct FundsResponse {
    pub count: usize,
    pub funds: Vec<FundRecord>,
}

/// A fund together with its spending requests.
#[derive(Serialize)]
pub struct FundDetail {
    #[serde(flatten)]
    pub fund: FundRecord,
    pub requests: Vec<RequestRecord>,
}

#[derive(Serialize)]
pub struct ContributionsResponse {
    pub fund_id: i64,
    pub count: usize,
    pub contributions: Vec<ContributionRecord>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}

fn internal_error(e: IndexerError) -> Response {
    error!("API query failed: {e}");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /events`
///
/// Returns all indexed events across all funds.
pub async fn get_all_events(State(state): State<Arc<ApiState>>) -> Response {
    match db::get_all_events(&state.pool).await {
        Ok(events) => {
            let count = events.len();
            Json(AllEventsResponse { count, events }).into_response()
        }
        Err(e) => internal_error(e),
    }
}

/// `GET /funds?search=&sort_by=&order=`
pub async fn list_funds(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<FundQuery>,
) -> Response {
    match db::list_funds(&state.pool, &query).await {
        Ok(funds) => {
            let count = funds.len();
            Json(FundsResponse { count, funds }).into_response()
        }
        Err(e) => internal_error(e),
    }
}

/// `GET /funds/:id`
pub async fn get_fund(State(state): State<Arc<ApiState>>, Path(fund_id): Path<i64>) -> Response {
    let fund = match db::get_fund(&state.pool, fund_id).await {
        Ok(Some(fund)) => fund,
        Ok(None) => {
            return error_response(StatusCode::NOT_FOUND, format!("fund {fund_id} not found"))
        }
        Err(e) => return internal_error(e),
    };

    match db::get_requests(&state.pool, fund_id).await {
        Ok(requests) => Json(FundDetail { fund, requests }).into_response(),
        Err(e) => internal_error(e),
    }
}

/// `GET /funds/:id/events`
///
/// Returns all indexed events for the given fund, oldest first.
pub async fn get_fund_events(
    State(state): State<Arc<ApiState>>,
    Path(fund_id): Path<i64>,
) -> Response {
    match db::get_events_for_fund(&state.pool, fund_id).await {
        Ok(events) => {
            let count = events.len();
            Json(EventsResponse {
                fund_id,
                count,
                events,
            })
            .into_response()
        }
        Err(e) => internal_error(e),
    }
}

/// `GET /funds/:id/contributions`
pub async fn get_fund_contributions(
    State(state): State<Arc<ApiState>>,
    Path(fund_id): Path<i64>,
) -> Response {
    match db::get_contributions(&state.pool, fund_id).await {
        Ok(contributions) => {
            let count = contributions.len();
            Json(ContributionsResponse {
                fund_id,
                count,
                contributions,
            })
            .into_response()
        }
        Err(e) => internal_error(e),
    }
}
