use axum::{
	Json, Router,
	extract::{Path, Query, State},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::get,
};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::state::AppState;
use blend_service::{
	BackendCount, Error, FacetCounts, MergedWindow, ParamBag, Query as SearchQuery, ResultSet,
	SearchRequest, Warning,
};

const DEFAULT_LIMIT: usize = 20;
const MAX_LIMIT: usize = 100;
const MAX_OFFSET: usize = 10_000;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/search", get(search))
		.route("/v1/records/{id}", get(record))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn search(
	State(state): State<AppState>,
	Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<SearchResponse>, ApiError> {
	let request_id = Uuid::new_v4();
	let req = parse_search_request(pairs)?;

	tracing::debug!(%request_id, offset = req.offset, limit = req.limit, "Blended search requested.");

	let window = state.blender.search(req).await?;

	Ok(Json(SearchResponse::new(request_id, window)))
}

async fn record(
	State(state): State<AppState>,
	Path(id): Path<String>,
	Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<ResultSet>, ApiError> {
	let response = state.blender.retrieve(&id, &ParamBag::from_pairs(pairs)).await?;

	Ok(Json(response))
}

fn parse_search_request(pairs: Vec<(String, String)>) -> Result<SearchRequest, ApiError> {
	let mut query = SearchQuery::default();
	let mut offset = 0;
	let mut limit = DEFAULT_LIMIT;
	let mut params = ParamBag::new();

	for (key, value) in pairs {
		match key.as_str() {
			"lookfor" => query.text = value,
			"type" => query.handler = Some(value).filter(|handler| !handler.is_empty()),
			"offset" => offset = parse_count("offset", &value, MAX_OFFSET)?,
			"limit" => limit = parse_count("limit", &value, MAX_LIMIT)?,
			_ => params.add(key, value),
		}
	}

	Ok(SearchRequest::new(query, offset, limit).with_params(params))
}

fn parse_count(name: &str, value: &str, max: usize) -> Result<usize, ApiError> {
	match value.parse::<usize>() {
		Ok(count) if count <= max => Ok(count),
		Ok(_) => Err(json_error(
			StatusCode::BAD_REQUEST,
			"invalid_request",
			format!("{name} must be at most {max}."),
		)),
		Err(_) => Err(json_error(
			StatusCode::BAD_REQUEST,
			"invalid_request",
			format!("{name} must be a non-negative integer."),
		)),
	}
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
	request_id: Uuid,
	source_id: String,
	total: usize,
	offset: usize,
	records: Vec<RecordView>,
	warnings: Vec<WarningView>,
	backend_counts: Vec<BackendCount>,
	facets: FacetCounts,
}
impl SearchResponse {
	fn new(request_id: Uuid, window: MergedWindow) -> Self {
		let warnings = window
			.warnings
			.iter()
			.map(|warning| WarningView { message: warning.message(), warning: warning.clone() })
			.collect();
		let records = window
			.entries
			.into_iter()
			.map(|entry| RecordView {
				position: entry.position,
				backend_id: entry.backend_id,
				id: entry.record.id,
				data: entry.record.payload,
			})
			.collect();

		Self {
			request_id,
			source_id: window.source_id,
			total: window.total,
			offset: window.offset,
			records,
			warnings,
			backend_counts: window.backend_counts,
			facets: window.facets,
		}
	}
}

#[derive(Debug, Serialize)]
struct RecordView {
	position: usize,
	backend_id: String,
	id: String,
	data: Value,
}

#[derive(Debug, Serialize)]
struct WarningView {
	message: String,
	#[serde(flatten)]
	warning: Warning,
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

impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		match err {
			Error::InvalidBackendFilter { .. } =>
				json_error(StatusCode::BAD_REQUEST, "invalid_backend_filter", err.to_string()),
			Error::Backend { .. } =>
				json_error(StatusCode::BAD_GATEWAY, "backend_failure", err.to_string()),
			Error::Configuration { .. } => {
				tracing::error!(error = %err, "Blender misconfigured.");

				json_error(StatusCode::INTERNAL_SERVER_ERROR, "configuration_error", err.to_string())
			},
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}

pub fn json_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
	ApiError::new(status, code, message)
}
