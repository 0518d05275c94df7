use serde::{Deserialize, Serialize};

/// Ordered, multi-valued request parameters.
///
/// Keys keep their first insertion order. Values under one key keep insertion order and
/// [`ParamBag::add`] skips values that are already present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamBag {
	entries: Vec<(String, Vec<String>)>,
}
impl ParamBag {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_pairs<I, K, V>(pairs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		let mut bag = Self::new();

		for (key, value) in pairs {
			bag.add(key, value);
		}

		bag
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn get(&self, key: &str) -> Option<&[String]> {
		self.entries.iter().find(|(name, _)| name == key).map(|(_, values)| values.as_slice())
	}

	pub fn first(&self, key: &str) -> Option<&str> {
		self.get(key).and_then(|values| values.first()).map(String::as_str)
	}

	pub fn contains(&self, key: &str, value: &str) -> bool {
		self.get(key).map(|values| values.iter().any(|v| v == value)).unwrap_or(false)
	}

	/// Appends `value` under `key` unless it is already present.
	pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
		let key = key.into();
		let value = value.into();

		match self.entries.iter_mut().find(|(name, _)| *name == key) {
			Some((_, values)) => {
				if !values.contains(&value) {
					values.push(value);
				}
			},
			None => self.entries.push((key, vec![value])),
		}
	}

	/// Replaces every value under `key`.
	pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
		let key = key.into();
		let value = value.into();

		match self.entries.iter_mut().find(|(name, _)| *name == key) {
			Some((_, values)) => *values = vec![value],
			None => self.entries.push((key, vec![value])),
		}
	}

	pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
		let index = self.entries.iter().position(|(name, _)| name == key)?;

		Some(self.entries.remove(index).1)
	}

	/// Keeps only the values under `key` for which `keep` returns true. A key left without
	/// values is dropped.
	pub fn retain_values<F>(&mut self, key: &str, mut keep: F)
	where
		F: FnMut(&str) -> bool,
	{
		let Some(index) = self.entries.iter().position(|(name, _)| name == key) else {
			return;
		};
		let values = &mut self.entries[index].1;

		values.retain(|value| keep(value.as_str()));

		if values.is_empty() {
			self.entries.remove(index);
		}
	}

	/// Adds every value of `other`, deduplicating per key.
	pub fn merge(&mut self, other: &ParamBag) {
		for (key, value) in other.iter() {
			self.add(key, value);
		}
	}

	/// Flattened `(key, value)` pairs in order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.entries
			.iter()
			.flat_map(|(key, values)| values.iter().map(move |value| (key.as_str(), value.as_str())))
	}

	pub fn to_pairs(&self) -> Vec<(String, String)> {
		self.iter().map(|(key, value)| (key.to_string(), value.to_string())).collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn add_deduplicates_values_per_key() {
		let mut bag = ParamBag::new();

		bag.add("fq", "format:Book");
		bag.add("fq", "format:Book");
		bag.add("fq", "language:en");

		assert_eq!(bag.get("fq"), Some(&["format:Book".to_string(), "language:en".to_string()][..]));
	}

	#[test]
	fn keys_keep_insertion_order() {
		let bag = ParamBag::from_pairs([("sort", "year"), ("fq", "a"), ("sort", "title")]);

		assert_eq!(
			bag.to_pairs(),
			vec![
				("sort".to_string(), "year".to_string()),
				("sort".to_string(), "title".to_string()),
				("fq".to_string(), "a".to_string()),
			]
		);
	}

	#[test]
	fn set_replaces_all_values() {
		let mut bag = ParamBag::from_pairs([("rows", "10"), ("rows", "20")]);

		bag.set("rows", "5");

		assert_eq!(bag.first("rows"), Some("5"));
		assert_eq!(bag.get("rows").map(<[String]>::len), Some(1));
	}

	#[test]
	fn retain_values_drops_empty_keys() {
		let mut bag = ParamBag::from_pairs([("fq", "a"), ("fq", "b"), ("q", "x")]);

		bag.retain_values("fq", |value| value == "b");

		assert_eq!(bag.get("fq"), Some(&["b".to_string()][..]));

		bag.retain_values("fq", |_| false);

		assert!(bag.get("fq").is_none());
		assert!(bag.contains("q", "x"));
	}

	#[test]
	fn merge_adds_missing_values_only() {
		let mut bag = ParamBag::from_pairs([("fq", "a")]);
		let other = ParamBag::from_pairs([("fq", "a"), ("fq", "b"), ("facet.field", "format")]);

		bag.merge(&other);

		assert_eq!(bag.get("fq").map(<[String]>::len), Some(2));
		assert!(bag.contains("facet.field", "format"));
	}

	#[test]
	fn remove_returns_previous_values() {
		let mut bag = ParamBag::from_pairs([("fq", "a")]);

		assert_eq!(bag.remove("fq"), Some(vec!["a".to_string()]));
		assert!(bag.is_empty());
		assert_eq!(bag.remove("fq"), None);
	}
}
