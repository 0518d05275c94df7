use axum::{
	Router,
	body::{self, Body},
	http::{Request, StatusCode},
};
use serde_json::Value;
use tower::util::ServiceExt;

use blend_api::{routes, state::AppState};
use blend_config::{FacetField, FacetKind, FacetMapping};
use blend_service::{BackendError, BlendSettings};
use blend_testkit::ScriptedBackend;

fn app(backends: Vec<ScriptedBackend>) -> Router {
	let backends = backends.into_iter().map(ScriptedBackend::into_arc).collect::<Vec<_>>();
	let settings = BlendSettings::default().with_block_size(2).with_facet_delimiter("::");
	let blender = blend_testkit::blender(&backends, settings);

	routes::router(AppState::from_blender(blender))
}

fn healthy() -> Vec<ScriptedBackend> {
	vec![
		ScriptedBackend::new("local").with_label("Local").with_records(3),
		ScriptedBackend::new("articles").with_label("Articles").with_records(3),
	]
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
	let response = app
		.oneshot(Request::builder().uri(uri).body(Body::empty()).expect("Failed to build request."))
		.await
		.expect("Failed to call router.");
	let status = response.status();
	let body = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read response body.");
	let json = if body.is_empty() {
		Value::Null
	} else {
		serde_json::from_slice(&body).expect("Failed to parse response.")
	};

	(status, json)
}

#[tokio::test]
async fn health_ok() {
	let (status, _) = get(app(healthy()), "/health").await;

	assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn search_returns_blended_window() {
	let (status, json) = get(app(healthy()), "/v1/search?lookfor=history&limit=4").await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["source_id"], "Blender");
	assert_eq!(json["total"], 6);
	assert_eq!(json["offset"], 0);
	assert!(json["request_id"].is_string());

	let ids = json["records"]
		.as_array()
		.expect("records must be an array")
		.iter()
		.map(|record| record["id"].as_str().unwrap_or_default().to_string())
		.collect::<Vec<_>>();

	assert_eq!(ids, vec!["local1", "local2", "articles1", "articles2"]);
	assert_eq!(json["records"][2]["position"], 2);
	assert_eq!(json["records"][2]["backend_id"], "articles");
	assert_eq!(json["backend_counts"][1]["value"], "articles::Articles");
	assert_eq!(json["backend_counts"][1]["count"], 3);
}

#[tokio::test]
async fn search_honors_backend_filter() {
	let (status, json) =
		get(app(healthy()), "/v1/search?lookfor=history&fq=blender_backend%3A%22articles%22").await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["total"], 3);
	assert_eq!(json["records"][0]["backend_id"], "articles");
}

#[tokio::test]
async fn unknown_backend_filter_is_bad_request() {
	let (status, json) =
		get(app(healthy()), "/v1/search?lookfor=history&fq=blender_backend%3A%22zzz%22").await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json["error_code"], "invalid_backend_filter");
}

#[tokio::test]
async fn partial_failure_is_reported_as_warning() {
	let backends = vec![
		ScriptedBackend::new("local").with_label("Local").with_records(3),
		ScriptedBackend::new("articles")
			.with_label("Articles")
			.failing(BackendError::unavailable("maintenance")),
	];
	let (status, json) = get(app(backends), "/v1/search?lookfor=history").await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["warnings"][0]["code"], "search_backend_partial_failure");
	assert_eq!(json["warnings"][0]["backends"][0], "Articles");
}

#[tokio::test]
async fn total_failure_is_bad_gateway() {
	let backends = vec![
		ScriptedBackend::new("local").failing(BackendError::unavailable("down")),
		ScriptedBackend::new("articles").failing(BackendError::unavailable("down")),
	];
	let (status, json) = get(app(backends), "/v1/search?lookfor=history").await;

	assert_eq!(status, StatusCode::BAD_GATEWAY);
	assert_eq!(json["error_code"], "backend_failure");
}

#[tokio::test]
async fn invalid_offset_is_rejected() {
	let (status, json) = get(app(healthy()), "/v1/search?lookfor=history&offset=abc").await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json["error_code"], "invalid_request");
}

#[tokio::test]
async fn oversized_limit_is_rejected() {
	let (status, json) = get(app(healthy()), "/v1/search?lookfor=history&limit=5000").await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json["error_code"], "invalid_request");
	assert_eq!(json["message"], "limit must be at most 100.");
}

#[tokio::test]
async fn search_reports_merged_facets() {
	let backends = vec![
		ScriptedBackend::new("local")
			.with_label("Local")
			.with_records(3)
			.with_facet("format", &[("Book", 3)]),
		ScriptedBackend::new("articles")
			.with_label("Articles")
			.with_records(3)
			.with_facet("format", &[("Book", 1), ("Article", 2)]),
	];
	let format = FacetField {
		kind: FacetKind::Normal,
		mappings: ["local", "articles"]
			.into_iter()
			.map(|id| {
				let mapping = FacetMapping { field: "format".to_string(), ..Default::default() };

				(id.to_string(), mapping)
			})
			.collect(),
	};
	let backends = backends.into_iter().map(ScriptedBackend::into_arc).collect::<Vec<_>>();
	let settings = BlendSettings::default().with_block_size(2).with_facet_field("format", format);
	let app = routes::router(AppState::from_blender(blend_testkit::blender(&backends, settings)));
	let (status, json) = get(app, "/v1/search?lookfor=history").await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["facets"]["format"][0][0], "Book");
	assert_eq!(json["facets"]["format"][0][1], 4);
	assert_eq!(json["facets"]["format"][1][0], "Article");
}

#[tokio::test]
async fn record_lookup_returns_owning_backend_result() {
	let (status, json) = get(app(healthy()), "/v1/records/articles2").await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["source_id"], "articles");
	assert_eq!(json["records"][0]["id"], "articles2");
}
