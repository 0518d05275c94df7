use serde_json::json;

use blend_domain::{ParamBag, Query, RawRecord, ResultSet};

#[test]
fn result_set_errors_default_to_empty() {
	let value = json!({
		"source_id": "local",
		"records": [{ "backend_id": "local", "id": "r1", "payload": { "title": "One" } }],
		"total": 41
	});
	let set: ResultSet = serde_json::from_value(value).expect("Failed to decode result set.");

	assert_eq!(set.total, 41);
	assert_eq!(set.len(), 1);
	assert!(set.errors.is_empty());
	assert!(set.facets.is_empty());
	assert_eq!(set.records[0], RawRecord::new("local", "r1", json!({ "title": "One" })));
}

#[test]
fn empty_result_set_keeps_source() {
	let set = ResultSet::empty("articles").with_error("Index is rebuilding.");

	assert!(set.is_empty());
	assert_eq!(set.source_id, "articles");
	assert_eq!(set.errors, vec!["Index is rebuilding.".to_string()]);
}

#[test]
fn facet_counts_decode_as_value_count_pairs() {
	let value = json!({
		"source_id": "local",
		"records": [],
		"total": 7,
		"facets": { "format": [["Book", 5], ["eBook", 2]] }
	});
	let set: ResultSet = serde_json::from_value(value).expect("Failed to decode result set.");

	assert_eq!(
		set.facets["format"],
		vec![("Book".to_string(), 5), ("eBook".to_string(), 2)]
	);
}

#[test]
fn query_round_trips_handler() {
	let query = Query::new("rust").with_handler("Title");
	let encoded = serde_json::to_value(&query).expect("Failed to encode query.");

	assert_eq!(encoded, json!({ "text": "rust", "handler": "Title" }));
}

#[test]
fn param_bag_flattens_in_order() {
	let mut bag = ParamBag::new();

	bag.add("fq", "format:Book");
	bag.add("facet.field", "format");
	bag.add("fq", "language:fi");

	let flattened: Vec<(&str, &str)> = bag.iter().collect();

	assert_eq!(
		flattened,
		vec![("fq", "format:Book"), ("fq", "language:fi"), ("facet.field", "format")]
	);
}
