use super::GeoValue;
use std::fmt::Debug;

/// Feature attributes in insertion order.
///
/// Inserting an existing key replaces its value in place, keeping the original position.
#[derive(Clone, Default, PartialEq)]
pub struct GeoProperties {
	properties: Vec<(String, GeoValue)>,
}

impl GeoProperties {
	#[must_use]
	pub fn new() -> GeoProperties {
		GeoProperties { properties: Vec::new() }
	}

	pub fn insert(&mut self, key: String, value: GeoValue) {
		if let Some(entry) = self.properties.iter_mut().find(|(k, _)| *k == key) {
			entry.1 = value;
		} else {
			self.properties.push((key, value));
		}
	}

	pub fn remove(&mut self, key: &str) -> Option<GeoValue> {
		let index = self.properties.iter().position(|(k, _)| k == key)?;
		Some(self.properties.remove(index).1)
	}

	#[must_use]
	pub fn get(&self, key: &str) -> Option<&GeoValue> {
		self.properties.iter().find(|(k, _)| k == key).map(|(_, v)| v)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&String, &GeoValue)> + '_ {
		self.properties.iter().map(|(k, v)| (k, v))
	}

	/// Iterates all entries whose value is not [`GeoValue::Null`].
	pub fn iter_non_null(&self) -> impl Iterator<Item = (&String, &GeoValue)> + '_ {
		self.iter().filter(|(_, v)| !v.is_null())
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.properties.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.properties.is_empty()
	}
}

impl IntoIterator for GeoProperties {
	type Item = (String, GeoValue);
	type IntoIter = std::vec::IntoIter<(String, GeoValue)>;
	fn into_iter(self) -> Self::IntoIter {
		self.properties.into_iter()
	}
}

impl From<Vec<(&str, GeoValue)>> for GeoProperties {
	fn from(value: Vec<(&str, GeoValue)>) -> Self {
		value.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
	}
}

impl FromIterator<(String, GeoValue)> for GeoProperties {
	fn from_iter<T: IntoIterator<Item = (String, GeoValue)>>(iter: T) -> Self {
		let mut properties = GeoProperties::new();
		for (k, v) in iter {
			properties.insert(k, v);
		}
		properties
	}
}

impl Debug for GeoProperties {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_map().entries(self.iter()).finish()
	}
}
