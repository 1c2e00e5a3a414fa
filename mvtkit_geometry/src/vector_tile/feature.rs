use super::{command::decode_geometry, geometry_type::GeomType};
use crate::geo::Geometry;
use anyhow::{Context, Result, bail};
use byteorder::LE;
use mvtkit_core::{
	Blob,
	io::{ValueReader, ValueWriter, ValueWriterBlob},
};

/// A feature as stored in a layer: tag indices into the layer dictionaries, the geometry type and the
/// encoded command stream. Features never carry an id.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VectorTileFeature {
	pub tag_ids: Vec<u32>,
	pub geom_type: GeomType,
	pub geometry: Vec<u32>,
}

impl VectorTileFeature {
	#[must_use]
	pub fn new(tag_ids: Vec<u32>, geom_type: GeomType, geometry: Vec<u32>) -> Self {
		Self {
			tag_ids,
			geom_type,
			geometry,
		}
	}

	/// Decodes a feature message. An id field is read and discarded.
	pub fn read(reader: &mut dyn ValueReader<'_, LE>) -> Result<VectorTileFeature> {
		let mut f = VectorTileFeature::default();

		while reader.has_remaining() {
			match reader.read_pbf_key().context("Failed to read PBF key")? {
				(1, 0) => {
					reader.read_varint().context("Failed to read feature ID")?;
				}
				(2, 2) => f.tag_ids = reader.read_pbf_packed_uint32().context("Failed to read tag IDs")?,
				(3, 0) => f.geom_type = GeomType::from(reader.read_varint().context("Failed to read geometry type")?),
				(4, 2) => f.geometry = reader.read_pbf_packed_uint32().context("Failed to read geometry data")?,
				(f, w) => bail!("Unexpected combination of field number ({f}) and wire type ({w})"),
			}
		}

		Ok(f)
	}

	pub fn to_blob(&self) -> Result<Blob> {
		let mut writer = ValueWriterBlob::new_le();

		if !self.tag_ids.is_empty() {
			writer
				.write_pbf_key(2, 2)
				.context("Failed to write PBF key for tag IDs")?;
			writer
				.write_pbf_packed_uint32(&self.tag_ids)
				.context("Failed to write tag IDs")?;
		}

		writer
			.write_pbf_key(3, 0)
			.context("Failed to write PBF key for geometry type")?;
		writer
			.write_varint(self.geom_type.as_u64())
			.context("Failed to write geometry type")?;

		if !self.geometry.is_empty() {
			writer
				.write_pbf_key(4, 2)
				.context("Failed to write PBF key for geometry data")?;
			writer
				.write_pbf_packed_uint32(&self.geometry)
				.context("Failed to write geometry data")?;
		}

		Ok(writer.into_blob())
	}

	/// Decodes the command stream into a geometry in extent units.
	pub fn to_geometry(&self) -> Result<Geometry> {
		decode_geometry(self.geom_type, &self.geometry).context("Failed to decode feature geometry")
	}
}
