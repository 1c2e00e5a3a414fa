use super::layer::VectorTileLayer;
use anyhow::{Context, Result, bail};
use byteorder::LE;
use mvtkit_core::{
	Blob,
	io::{ValueReader, ValueReaderSlice, ValueWriter, ValueWriterBlob, ValueWriterStream},
};
use std::io::Write;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct VectorTile {
	pub layers: Vec<VectorTileLayer>,
}

impl VectorTile {
	#[must_use]
	pub fn new(layers: Vec<VectorTileLayer>) -> VectorTile {
		VectorTile { layers }
	}

	pub fn from_blob(blob: &Blob) -> Result<VectorTile> {
		let mut reader = ValueReaderSlice::new_le(blob.as_slice());

		let mut tile = VectorTile::default();
		while reader.has_remaining() {
			match reader.read_pbf_key().context("Failed to read PBF key")? {
				(3, 2) => {
					tile.layers.push(
						VectorTileLayer::read(
							reader
								.get_pbf_sub_reader()
								.context("Failed to get PBF sub-reader")?
								.as_mut(),
						)
						.context("Failed to read VectorTileLayer")?,
					);
				}
				(f, w) => bail!("Unexpected combination of field number ({f}) and wire type ({w})"),
			}
		}

		Ok(tile)
	}

	pub fn to_blob(&self) -> Result<Blob> {
		let mut writer = ValueWriterBlob::new_le();
		self.write_layers(&mut writer)?;
		Ok(writer.into_blob())
	}

	/// Streams the serialized tile into `sink`. A tile without layers writes nothing.
	pub fn write_to<W: Write>(&self, sink: W) -> Result<()> {
		let mut writer = ValueWriterStream::new_le(sink);
		self.write_layers(&mut writer)?;
		writer.flush().context("Failed to flush vector tile output")
	}

	fn write_layers(&self, writer: &mut impl ValueWriter<LE>) -> Result<()> {
		for layer in &self.layers {
			writer.write_pbf_key(3, 2).context("Failed to write PBF key")?;
			writer
				.write_pbf_blob(&layer.to_blob().context("Failed to convert VectorTileLayer to blob")?)
				.context("Failed to write PBF blob")?;
		}
		Ok(())
	}

	#[must_use]
	pub fn find_layer(&self, name: &str) -> Option<&VectorTileLayer> {
		self.layers.iter().find(|layer| layer.name == name)
	}

	pub fn find_layer_mut(&mut self, name: &str) -> Option<&mut VectorTileLayer> {
		self.layers.iter_mut().find(|layer| layer.name == name)
	}
}
