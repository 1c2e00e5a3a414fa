//! A single layer of a vector tile.
//!
//! Field order on the wire:
//!  * field 1: `name` (string)
//!  * field 2: repeated `feature` (embedded message)
//!  * field 3: repeated `keys` (string)
//!  * field 4: repeated `values` (embedded message)
//!  * field 5: `extent` (varint)
//!  * field 15: `version` (varint)
//!
//! Extent and version are always written, even when they match the protocol defaults.

use super::{feature::VectorTileFeature, property_manager::PropertyManager, value::GeoValuePBF};
use crate::geo::{GeoFeature, GeoProperties, GeoValue};
use anyhow::{Context, Result, anyhow, bail};
use byteorder::LE;
use mvtkit_core::{
	Blob,
	io::{ValueReader, ValueWriter, ValueWriterBlob},
};

pub const DEFAULT_EXTENT: u32 = 4096;
pub const DEFAULT_VERSION: u32 = 2;

#[derive(Clone, Debug, PartialEq)]
pub struct VectorTileLayer {
	pub name: String,
	pub features: Vec<VectorTileFeature>,
	pub property_manager: PropertyManager,
	pub extent: u32,
	pub version: u32,
}

impl VectorTileLayer {
	#[must_use]
	pub fn new(name: String, extent: u32, version: u32) -> VectorTileLayer {
		VectorTileLayer {
			name,
			features: vec![],
			property_manager: PropertyManager::default(),
			extent,
			version,
		}
	}

	/// A layer with extent 4096 and version 2.
	#[must_use]
	pub fn new_standard(name: &str) -> VectorTileLayer {
		VectorTileLayer::new(name.to_string(), DEFAULT_EXTENT, DEFAULT_VERSION)
	}

	/// Reads a layer message. Missing `extent` and `version` fields fall back to 4096 and 1.
	pub fn read(reader: &mut dyn ValueReader<'_, LE>) -> Result<VectorTileLayer> {
		let mut extent = DEFAULT_EXTENT;
		let mut features: Vec<VectorTileFeature> = Vec::new();
		let mut name = None;
		let mut property_manager = PropertyManager::new();
		let mut version = 1;

		while reader.has_remaining() {
			match reader.read_pbf_key().context("Failed to read PBF key")? {
				(1, 2) => name = Some(reader.read_pbf_string().context("Failed to read layer name")?),
				(2, 2) => features.push(
					VectorTileFeature::read(
						reader
							.get_pbf_sub_reader()
							.context("Failed to get PBF sub-reader for feature")?
							.as_mut(),
					)
					.context("Failed to read VectorTileFeature")?,
				),
				(3, 2) => {
					property_manager.add_key(reader.read_pbf_string().context("Failed to read property key")?);
				}
				(4, 2) => {
					property_manager.add_val(
						GeoValue::read(
							reader
								.get_pbf_sub_reader()
								.context("Failed to get PBF sub-reader for property value")?
								.as_mut(),
						)
						.context("Failed to read GeoValue")?,
					);
				}
				(5, 0) => extent = u32::try_from(reader.read_varint().context("Failed to read extent")?)?,
				(15, 0) => version = u32::try_from(reader.read_varint().context("Failed to read version")?)?,
				(f, w) => bail!("Unexpected combination of field number ({f}) and wire type ({w})"),
			}
		}

		Ok(VectorTileLayer {
			name: name
				.ok_or(anyhow!("Layer name is required"))
				.context("Failed to get layer name")?,
			features,
			property_manager,
			extent,
			version,
		})
	}

	pub fn to_blob(&self) -> Result<Blob> {
		let mut writer = ValueWriterBlob::new_le();

		writer
			.write_pbf_key(1, 2)
			.context("Failed to write PBF key for layer name")?;
		writer
			.write_pbf_string(&self.name)
			.context("Failed to write layer name")?;

		for feature in &self.features {
			writer
				.write_pbf_key(2, 2)
				.context("Failed to write PBF key for feature")?;
			writer
				.write_pbf_blob(&feature.to_blob().context("Failed to convert feature to blob")?)
				.context("Failed to write feature blob")?;
		}

		for key in self.property_manager.iter_key() {
			writer
				.write_pbf_key(3, 2)
				.context("Failed to write PBF key for property key")?;
			writer.write_pbf_string(key).context("Failed to write property key")?;
		}

		for value in self.property_manager.iter_val() {
			writer
				.write_pbf_key(4, 2)
				.context("Failed to write PBF key for property value")?;
			writer
				.write_pbf_blob(&value.to_blob().context("Failed to convert property value to blob")?)
				.context("Failed to write property value blob")?;
		}

		writer
			.write_pbf_key(5, 0)
			.context("Failed to write PBF key for extent")?;
		writer
			.write_varint(u64::from(self.extent))
			.context("Failed to write extent")?;

		writer
			.write_pbf_key(15, 0)
			.context("Failed to write PBF key for version")?;
		writer
			.write_varint(u64::from(self.version))
			.context("Failed to write version")?;

		Ok(writer.into_blob())
	}

	/// Interns `properties` and appends a feature referencing them.
	pub fn add_feature(&mut self, properties: &GeoProperties, mut feature: VectorTileFeature) {
		feature.tag_ids = self.property_manager.encode_tag_ids(properties);
		self.features.push(feature);
	}

	pub fn decode_tag_ids(&self, tag_ids: &[u32]) -> Result<GeoProperties> {
		self.property_manager.decode_tag_ids(tag_ids)
	}

	/// Decodes all features with geometries in extent units.
	pub fn to_features(&self) -> Result<Vec<GeoFeature>> {
		self
			.features
			.iter()
			.map(|feature| {
				Ok(GeoFeature::with_properties(
					feature.to_geometry()?,
					self.decode_tag_ids(&feature.tag_ids)?,
				))
			})
			.collect::<Result<Vec<_>>>()
			.context("Failed to convert VectorTileFeatures to GeoFeatures")
	}
}
