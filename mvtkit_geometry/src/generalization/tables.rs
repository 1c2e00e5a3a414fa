//! Per-level tables mapping zoom levels to simplification factors.
//!
//! # Example YAML
//! ```yaml
//! default_level: mid
//! tables:
//!   low:
//!     1: 0.5
//!     12: 0.05
//!   mid:
//!     1: 1.0
//!     12: 0.25
//! ```

use super::{MAX_ZOOM, MIN_ZOOM};
use anyhow::{Context, Result, bail, ensure};
use serde::Deserialize;
use std::{
	collections::BTreeMap,
	fmt::{self, Display},
	fs::File,
	io::{BufReader, Read},
	path::Path,
	str::FromStr,
};

/// How aggressively geometries are simplified.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum GeneralizationLevel {
	Low,
	#[default]
	Mid,
	High,
}

impl GeneralizationLevel {
	#[must_use]
	pub fn as_str(&self) -> &'static str {
		match self {
			GeneralizationLevel::Low => "low",
			GeneralizationLevel::Mid => "mid",
			GeneralizationLevel::High => "high",
		}
	}
}

impl FromStr for GeneralizationLevel {
	type Err = anyhow::Error;

	fn from_str(text: &str) -> Result<Self> {
		Ok(match text.trim().to_lowercase().as_str() {
			"low" => GeneralizationLevel::Low,
			"mid" => GeneralizationLevel::Mid,
			"high" => GeneralizationLevel::High,
			_ => bail!("unknown generalization level '{text}', use \"low\", \"mid\" or \"high\""),
		})
	}
}

impl Display for GeneralizationLevel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Zoom level → simplification factor.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct GeneralizationTable(BTreeMap<u8, f64>);

impl GeneralizationTable {
	#[must_use]
	pub fn get(&self, zoom: i32) -> Option<f64> {
		u8::try_from(zoom).ok().and_then(|zoom| self.0.get(&zoom).copied())
	}

	pub fn insert(&mut self, zoom: u8, factor: f64) {
		self.0.insert(zoom, factor);
	}

	pub fn iter(&self) -> impl Iterator<Item = (u8, f64)> + '_ {
		self.0.iter().map(|(zoom, factor)| (*zoom, *factor))
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	fn validate(&self) -> Result<()> {
		for (zoom, factor) in self.iter() {
			ensure!(
				(MIN_ZOOM..=MAX_ZOOM).contains(&i32::from(zoom)),
				"zoom level {zoom} is outside of {MIN_ZOOM}..={MAX_ZOOM}"
			);
			ensure!(
				factor.is_finite() && factor >= 0.0,
				"factor {factor} of zoom level {zoom} must be a non-negative number"
			);
		}
		Ok(())
	}
}

impl From<&[f64]> for GeneralizationTable {
	/// Assigns the factors to the zoom levels 1, 2, 3, …
	fn from(factors: &[f64]) -> Self {
		GeneralizationTable(
			factors
				.iter()
				.zip((MIN_ZOOM as u8)..)
				.map(|(factor, zoom)| (zoom, *factor))
				.collect(),
		)
	}
}

const LOW: [f64; 20] = [
	0.5, 0.5, 0.5, 0.5, 0.25, 0.25, 0.25, 0.25, 0.1, 0.1, 0.1, 0.1, 0.05, 0.05, 0.05, 0.05, 0.0, 0.0, 0.0, 0.0,
];
const MID: [f64; 20] = [
	1.0, 1.0, 1.0, 1.0, 0.5, 0.5, 0.5, 0.5, 0.25, 0.25, 0.25, 0.25, 0.1, 0.1, 0.1, 0.1, 0.05, 0.05, 0.05, 0.05,
];
const HIGH: [f64; 20] = [
	2.0, 2.0, 2.0, 2.0, 1.0, 1.0, 1.0, 1.0, 0.5, 0.5, 0.5, 0.5, 0.25, 0.25, 0.25, 0.25, 0.1, 0.1, 0.1, 0.1,
];

/// The tables of all levels, shared read-only between encodes.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GeneralizationTables {
	/// Used when a request names no level or an unknown one.
	#[serde(default)]
	pub default_level: GeneralizationLevel,

	pub tables: BTreeMap<GeneralizationLevel, GeneralizationTable>,
}

impl Default for GeneralizationTables {
	fn default() -> Self {
		GeneralizationTables {
			default_level: GeneralizationLevel::Mid,
			tables: BTreeMap::from([
				(GeneralizationLevel::Low, GeneralizationTable::from(&LOW[..])),
				(GeneralizationLevel::Mid, GeneralizationTable::from(&MID[..])),
				(GeneralizationLevel::High, GeneralizationTable::from(&HIGH[..])),
			]),
		}
	}
}

impl GeneralizationTables {
	pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
		let tables: GeneralizationTables =
			serde_yaml_ng::from_reader(reader).context("Failed to parse generalization tables")?;
		tables.validate()?;
		Ok(tables)
	}

	#[allow(clippy::should_implement_trait)]
	pub fn from_str(text: &str) -> Result<Self> {
		let tables: GeneralizationTables =
			serde_yaml_ng::from_str(text).context("Failed to parse generalization tables")?;
		tables.validate()?;
		Ok(tables)
	}

	pub fn from_path(path: &Path) -> Result<Self> {
		let file = File::open(path).with_context(|| format!("Failed to open {path:?}"))?;
		GeneralizationTables::from_reader(BufReader::new(file)).with_context(|| format!("Failed to read {path:?}"))
	}

	#[must_use]
	pub fn table(&self, level: GeneralizationLevel) -> Option<&GeneralizationTable> {
		self.tables.get(&level)
	}

	fn validate(&self) -> Result<()> {
		for (level, table) in &self.tables {
			table
				.validate()
				.with_context(|| format!("Invalid table for generalization level '{level}'"))?;
		}
		ensure!(
			self.tables.contains_key(&self.default_level),
			"no table for the default generalization level '{}'",
			self.default_level
		);
		Ok(())
	}
}
