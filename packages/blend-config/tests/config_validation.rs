use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use blend_config::{AdaptiveBlockSize, Config, Error, FacetKind, FacetMapping};

const SAMPLE_CONFIG_TEMPLATE_TOML: &str = include_str!("fixtures/sample_config.template.toml");

fn sample_toml() -> String {
	SAMPLE_CONFIG_TEMPLATE_TOML.to_string()
}

fn sample_toml_with_blending(key: &str, value: Value) -> String {
	let mut root: Value =
		toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.");
	let blending = root
		.as_table_mut()
		.and_then(|table| table.get_mut("blending"))
		.and_then(Value::as_table_mut)
		.expect("Template config must include [blending].");

	blending.insert(key.to_string(), value);

	toml::to_string(&root).expect("Failed to render template config.")
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("blend_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn base_config() -> Config {
	toml::from_str(&sample_toml()).expect("Failed to parse test config.")
}

#[test]
fn sample_config_loads() {
	let path = write_temp_config(sample_toml());
	let result = blend_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let cfg = result.expect("Expected sample config to load.");

	assert_eq!(cfg.blending.block_size, 10);
	assert_eq!(cfg.blending.backend_timeout_ms, 8_000);
	assert_eq!(
		cfg.blending.adaptive_block_sizes,
		vec![AdaptiveBlockSize { min_total: 5_000, max_total: 100_000, block_size: 5 }]
	);
	assert_eq!(cfg.facets.delimiter.as_deref(), Some("::"));
	assert_eq!(
		cfg.enabled_backends().map(|backend| backend.id.as_str()).collect::<Vec<_>>(),
		vec!["local", "articles"]
	);
	assert_eq!(cfg.backends[0].search_path, "/search");
	assert_eq!(cfg.backends[1].record_path, "/record");
	assert_eq!(cfg.backends[1].default_headers.get("x-client").and_then(|v| v.as_str()), Some("blend"));
}

#[test]
fn facet_fields_parse_with_types_and_mappings() {
	let cfg = base_config();
	let format = &cfg.facets.fields["format"];

	assert_eq!(format.kind, FacetKind::Normal);
	assert_eq!(
		format.mappings["articles"],
		FacetMapping {
			field: "content_type".to_string(),
			values: [("Journal Article".to_string(), "Article".to_string())].into_iter().collect(),
		}
	);
	assert_eq!(cfg.facets.fields["building"].kind, FacetKind::Hierarchical);
	assert_eq!(cfg.facets.fields["fulltext"].kind, FacetKind::Boolean);
	assert!(!cfg.facets.fields["fulltext"].mappings.contains_key("local"));
	assert!(blend_config::validate(&cfg).is_ok());
}

#[test]
fn facet_mappings_must_reference_declared_backends() {
	let mut cfg = base_config();
	let mapping = FacetMapping { field: "format".to_string(), values: Default::default() };

	cfg.facets
		.fields
		.get_mut("format")
		.expect("Template config must map the format facet.")
		.mappings
		.insert("missing".to_string(), mapping);

	let err = blend_config::validate(&cfg).expect_err("Expected unknown backend error.");

	assert!(err.to_string().contains("maps unknown backend missing"), "Unexpected error: {err}");
}

#[test]
fn backend_facet_name_is_reserved() {
	let mut cfg = base_config();
	let format = cfg.facets.fields["format"].clone();

	cfg.facets.fields.insert("blender_backend".to_string(), format);

	let err = blend_config::validate(&cfg).expect_err("Expected reserved name error.");

	assert!(err.to_string().contains("is empty or reserved"), "Unexpected error: {err}");
}

#[test]
fn blending_section_defaults_when_omitted() {
	let mut root: Value =
		toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.");

	root.as_table_mut().expect("Template config must be a table.").remove("blending");

	let cfg: Config =
		toml::from_str(&toml::to_string(&root).expect("Failed to render config."))
			.expect("Failed to parse config without [blending].");

	assert_eq!(cfg.blending.block_size, 10);
	assert!(cfg.blending.initial_results.is_empty());
	assert_eq!(cfg.blending.backend_timeout_ms, 10_000);
	assert!(blend_config::validate(&cfg).is_ok());
}

#[test]
fn block_size_must_be_positive() {
	let path = write_temp_config(sample_toml_with_blending("block_size", Value::Integer(0)));
	let result = blend_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let err = result.expect_err("Expected block size validation error.");

	assert!(
		err.to_string().contains("blending.block_size must be greater than zero."),
		"Unexpected error: {err}"
	);
}

#[test]
fn initial_results_must_reference_enabled_backends() {
	let payload = sample_toml_with_blending(
		"initial_results",
		Value::Array(vec![Value::String("missing".to_string())]),
	);
	let path = write_temp_config(payload);
	let result = blend_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let err = result.expect_err("Expected initial_results validation error.");

	assert!(
		err.to_string().contains("unknown or disabled backend missing"),
		"Unexpected error: {err}"
	);
}

#[test]
fn adaptive_ranges_are_validated() {
	let mut cfg = base_config();

	cfg.blending.adaptive_block_sizes =
		vec![AdaptiveBlockSize { min_total: 5_000, max_total: 100, block_size: 5 }];

	let err = blend_config::validate(&cfg).expect_err("Expected inverted range error.");

	assert!(err.to_string().contains("min_total less than or equal to max_total"));

	cfg.blending.adaptive_block_sizes =
		vec![AdaptiveBlockSize { min_total: 5, max_total: 10, block_size: 0 }];

	let err = blend_config::validate(&cfg).expect_err("Expected zero block size error.");

	assert!(err.to_string().contains("block_size greater than zero"));
}

#[test]
fn duplicate_backend_ids_are_rejected() {
	let mut cfg = base_config();
	let duplicate = cfg.backends[0].clone();

	cfg.backends.push(duplicate);

	let err = blend_config::validate(&cfg).expect_err("Expected duplicate id error.");

	assert!(matches!(err, Error::Validation { .. }));
	assert!(err.to_string().contains("declared more than once"), "Unexpected error: {err}");
}

#[test]
fn backend_ids_must_not_contain_the_delimiter() {
	let mut cfg = base_config();

	cfg.backends[0].id = "lo::cal".to_string();
	cfg.blending.initial_results.clear();

	let err = blend_config::validate(&cfg).expect_err("Expected delimiter error.");

	assert!(err.to_string().contains("must not contain the facet delimiter"));
}

#[test]
fn at_least_one_backend_must_be_enabled() {
	let mut cfg = base_config();

	cfg.blending.initial_results.clear();

	for backend in &mut cfg.backends {
		backend.enabled = false;
	}

	let err = blend_config::validate(&cfg).expect_err("Expected enabled backend error.");

	assert!(err.to_string().contains("At least one enabled backend is required."));
}

#[test]
fn blank_delimiter_is_normalized_away() {
	let mut root: Value =
		toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.");
	let facets = root
		.as_table_mut()
		.and_then(|table| table.get_mut("facets"))
		.and_then(Value::as_table_mut)
		.expect("Template config must include [facets].");

	facets.insert("delimiter".to_string(), Value::String("  ".to_string()));

	let path = write_temp_config(toml::to_string(&root).expect("Failed to render config."));
	let result = blend_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let cfg = result.expect("Expected config with blank delimiter to load.");

	assert!(cfg.facets.delimiter.is_none());
}

#[test]
fn missing_file_reports_read_error() {
	let mut path = env::temp_dir();

	path.push("blend_config_test_does_not_exist.toml");

	let err = blend_config::load(&path).expect_err("Expected read error.");

	assert!(matches!(err, Error::ReadConfig { .. }));
}
