use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gumshoe_service::{
	FeaturedResponse, OverrideRecord, OverrideRequest, OverviewResponse, RankRequest,
	RankResponse, RecalculateResponse, ServiceError,
};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/detectives", get(list_detectives))
		.route("/v1/services/featured-home", get(featured_home_services))
		.with_state(state)
}

pub fn admin_router(state: AppState) -> Router {
	Router::new()
		.route("/v1/admin/visibility", get(visibility_overview))
		.route("/v1/admin/visibility/{detective_id}", patch(set_override))
		.route("/v1/admin/visibility/{detective_id}/recalculate", post(recalculate_score))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

#[derive(Debug, Deserialize)]
struct ListingParams {
	country: Option<String>,
	city: Option<String>,
	q: Option<String>,
	limit: Option<u32>,
}

/// Session handling lives in front of this service; a request without an
/// `Authorization` header is treated as anonymous and may be served from the
/// cache.
fn is_anonymous(headers: &HeaderMap) -> bool {
	!headers.contains_key(header::AUTHORIZATION)
}

async fn list_detectives(
	State(state): State<AppState>,
	headers: HeaderMap,
	Query(params): Query<ListingParams>,
) -> Result<Json<RankResponse>, ApiError> {
	let request = RankRequest {
		country: params.country,
		city: params.city,
		query: params.q,
		limit: params.limit,
		anonymous: is_anonymous(&headers),
	};
	let response = state.service.rank_detectives(request).await?;

	Ok(Json(response))
}

async fn featured_home_services(
	State(state): State<AppState>,
	headers: HeaderMap,
) -> Result<Json<FeaturedResponse>, ApiError> {
	let response = state.service.featured_home_services(is_anonymous(&headers)).await?;

	Ok(Json(response))
}

async fn visibility_overview(
	State(state): State<AppState>,
) -> Result<Json<OverviewResponse>, ApiError> {
	let response = state.service.visibility_overview().await?;

	Ok(Json(response))
}

async fn set_override(
	State(state): State<AppState>,
	Path(detective_id): Path<Uuid>,
	Json(payload): Json<OverrideRequest>,
) -> Result<Json<OverrideRecord>, ApiError> {
	let response = state.service.set_override(detective_id, payload).await?;

	Ok(Json(response))
}

async fn recalculate_score(
	State(state): State<AppState>,
	Path(detective_id): Path<Uuid>,
) -> Result<Json<RecalculateResponse>, ApiError> {
	let response = state.service.recalculate_score(detective_id).await?;

	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}

impl ApiError {
	fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { status, error_code: error_code.into(), message: message.into() }
	}
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		let message = err.to_string();

		match err {
			ServiceError::InvalidRequest { .. } =>
				Self::new(StatusCode::UNPROCESSABLE_ENTITY, "INVALID_REQUEST", message),
			ServiceError::NotFound { .. } =>
				Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message),
			ServiceError::Storage { .. } =>
				Self::new(StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR", message),
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}
