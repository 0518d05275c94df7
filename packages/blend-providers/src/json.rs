//! Client for backends that speak the generic JSON search contract.
//!
//! `GET {api_base}{search_path}?lookfor=..&type=..&offset=..&limit=..&<params>` and
//! `GET {api_base}{record_path}/{id}?<params>` both answer with
//! `{ "total": n, "records": [{ "id": "..", .. }], "errors": [".."] }`, optionally with
//! `"facets": { "<field>": [["<value>", <count>], ..] }`.

use std::time::Duration;

use reqwest::{Client, Url};
use serde_json::Value;

use crate::{Error, Result};
use blend_config::BackendConfig;
use blend_domain::{ParamBag, Query, RawRecord, ResultSet};

#[derive(Debug, Clone)]
pub struct JsonClient {
	backend_id: String,
	search_url: Url,
	record_url: Url,
	client: Client,
}
impl JsonClient {
	pub fn new(cfg: &BackendConfig) -> Result<Self> {
		let headers = crate::auth_headers(cfg.api_key.as_deref(), &cfg.default_headers)?;
		let client = Client::builder()
			.timeout(Duration::from_millis(cfg.timeout_ms))
			.default_headers(headers)
			.build()?;

		Ok(Self {
			backend_id: cfg.id.clone(),
			search_url: join_url(&cfg.api_base, &cfg.search_path)?,
			record_url: join_url(&cfg.api_base, &cfg.record_path)?,
			client,
		})
	}

	pub fn backend_id(&self) -> &str {
		&self.backend_id
	}

	pub async fn search(
		&self,
		query: &Query,
		offset: usize,
		limit: usize,
		params: &ParamBag,
	) -> Result<ResultSet> {
		let mut pairs = vec![
			("lookfor".to_string(), query.text.clone()),
			("offset".to_string(), offset.to_string()),
			("limit".to_string(), limit.to_string()),
		];

		if let Some(handler) = query.handler.as_ref() {
			pairs.push(("type".to_string(), handler.clone()));
		}

		pairs.extend(params.to_pairs());

		let res = self.client.get(self.search_url.clone()).query(&pairs).send().await?;
		let json: Value = res.error_for_status()?.json().await?;

		parse_result_set(&self.backend_id, json)
	}

	pub async fn retrieve(&self, id: &str, params: &ParamBag) -> Result<ResultSet> {
		let mut url = self.record_url.clone();

		url.path_segments_mut()
			.map_err(|_| Error::InvalidConfig {
				message: format!("Record URL for backend {} cannot take a path.", self.backend_id),
			})?
			.pop_if_empty()
			.push(id);

		let res = self.client.get(url).query(&params.to_pairs()).send().await?;
		let json: Value = res.error_for_status()?.json().await?;

		parse_result_set(&self.backend_id, json)
	}
}

fn join_url(api_base: &str, path: &str) -> Result<Url> {
	let raw = format!("{}{}", api_base.trim_end_matches('/'), path);

	Url::parse(&raw)
		.map_err(|err| Error::InvalidConfig { message: format!("Invalid backend URL {raw}: {err}.") })
}

fn parse_result_set(backend_id: &str, json: Value) -> Result<ResultSet> {
	let total = json
		.get("total")
		.and_then(Value::as_u64)
		.ok_or_else(|| invalid_response("Search response is missing a numeric total."))?;
	let items = json
		.get("records")
		.and_then(Value::as_array)
		.ok_or_else(|| invalid_response("Search response is missing records array."))?;
	let mut records = Vec::with_capacity(items.len());

	for item in items {
		let id = match item.get("id") {
			Some(Value::String(id)) => id.clone(),
			Some(Value::Number(id)) => id.to_string(),
			_ => return Err(invalid_response("Search record is missing an id.")),
		};

		records.push(RawRecord::new(backend_id, id, item.clone()));
	}

	let mut set = ResultSet::new(backend_id, records, total as usize);

	if let Some(errors) = json.get("errors").and_then(Value::as_array) {
		for error in errors {
			let Some(message) = error.as_str() else {
				return Err(invalid_response("Search response errors must be strings."));
			};

			set = set.with_error(message);
		}
	}

	if let Some(facets) = json.get("facets").and_then(Value::as_object) {
		for (field, entries) in facets {
			set = set.with_facet(field.as_str(), parse_facet_counts(entries)?);
		}
	}

	Ok(set)
}

fn parse_facet_counts(entries: &Value) -> Result<Vec<(String, usize)>> {
	let entries = entries
		.as_array()
		.ok_or_else(|| invalid_response("Search response facet must be an array of pairs."))?;
	let mut counts = Vec::with_capacity(entries.len());

	for entry in entries {
		let (value, count) = match entry.as_array().map(Vec::as_slice) {
			Some([Value::String(value), Value::Number(count)]) => (value.clone(), count.as_u64()),
			Some([Value::Number(value), Value::Number(count)]) =>
				(value.to_string(), count.as_u64()),
			_ => (String::new(), None),
		};
		let Some(count) = count else {
			return Err(invalid_response("Search response facet entries must be [value, count]."));
		};

		counts.push((value, count as usize));
	}

	Ok(counts)
}

fn invalid_response(message: &str) -> Error {
	Error::InvalidResponse { message: message.to_string() }
}
