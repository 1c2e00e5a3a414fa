use crate::geo::{GeoProperties, GeoValue};
use anyhow::{Context, Result, anyhow, ensure};
use std::{collections::HashMap, fmt::Debug, hash::Hash};

/// An interning table: entries keep their first-seen order and are addressed by index.
#[derive(Clone, PartialEq)]
pub struct TagDictionary<T>
where
	T: Clone + Eq + Hash,
{
	list: Vec<T>,
	map: HashMap<T, u32>,
}

impl<T> TagDictionary<T>
where
	T: Clone + Debug + Eq + Hash,
{
	#[must_use]
	pub fn new(list: Vec<T>) -> TagDictionary<T> {
		let map = list.iter().enumerate().map(|(i, e)| (e.clone(), i as u32)).collect();
		TagDictionary { list, map }
	}

	/// Returns the index of `entry`, appending it first if it is new.
	pub fn add(&mut self, entry: T) -> u32 {
		if let Some(index) = self.map.get(&entry) {
			return *index;
		}
		let index = self.list.len() as u32;
		self.map.insert(entry.clone(), index);
		self.list.push(entry);
		index
	}

	pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
		self.list.iter()
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.list.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.list.is_empty()
	}

	pub fn find(&self, entry: &T) -> Result<u32> {
		self
			.map
			.get(entry)
			.ok_or_else(|| anyhow!("entry '{entry:?}' not found"))
			.copied()
	}

	pub fn get(&self, id: u32) -> Result<&T> {
		self
			.list
			.get(id as usize)
			.ok_or_else(|| anyhow!("id '{id:?}' not found"))
	}
}

impl<T: Clone + Debug + Eq + Hash> Default for TagDictionary<T> {
	fn default() -> TagDictionary<T> {
		TagDictionary::new(vec![])
	}
}

impl<T> Debug for TagDictionary<T>
where
	T: Clone + Debug + Eq + Hash,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_list().entries(&self.list).finish()
	}
}

/// The key and value dictionaries of one layer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropertyManager {
	pub key: TagDictionary<String>,
	pub val: TagDictionary<GeoValue>,
}

impl PropertyManager {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add_key(&mut self, key: String) -> u32 {
		self.key.add(key)
	}

	pub fn add_val(&mut self, value: GeoValue) -> u32 {
		self.val.add(value)
	}

	pub fn iter_key(&self) -> impl Iterator<Item = &String> + '_ {
		self.key.iter()
	}

	pub fn iter_val(&self) -> impl Iterator<Item = &GeoValue> + '_ {
		self.val.iter()
	}

	/// Interns all non-null properties and returns the alternating key/value index list.
	pub fn encode_tag_ids(&mut self, properties: &GeoProperties) -> Vec<u32> {
		let mut tag_ids: Vec<u32> = Vec::with_capacity(properties.len() * 2);

		for (key, val) in properties.iter_non_null() {
			tag_ids.push(self.key.add(key.clone()));
			tag_ids.push(self.val.add(val.clone()));
		}

		tag_ids
	}

	pub fn decode_tag_ids(&self, tag_ids: &[u32]) -> Result<GeoProperties> {
		ensure!(tag_ids.len().is_multiple_of(2), "Tag IDs must be even");
		let mut properties = GeoProperties::new();

		for pair in tag_ids.chunks_exact(2) {
			properties.insert(
				self.key.get(pair[0]).context("Failed to get property key")?.to_owned(),
				self.val.get(pair[1]).context("Failed to get property value")?.clone(),
			);
		}
		Ok(properties)
	}
}
