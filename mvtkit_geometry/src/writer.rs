//! Encodes features given in world coordinates into a single vector tile.
//!
//! [`MvtWriter`] ties the pieces together: it projects every feature onto the tile grid with a
//! [`TileProjector`], resolves the simplification factor with a [`GeneralizationResolver`] and feeds the
//! result into a [`VectorTileEncoder`].
//!
//! ```
//! use mvtkit_core::TileCoord;
//! use mvtkit_geometry::{geo::{GeoFeature, Geometry}, writer::{MvtWriter, WriterOptions}};
//!
//! let bbox = TileCoord::new(2, 2, 1).unwrap().to_geo_bbox().unwrap();
//! let mut writer = MvtWriter::new(bbox, WriterOptions::default()).unwrap();
//! let mut feature = GeoFeature::new(Geometry::new_point([10.0, 50.0]));
//! feature.set_property("name", "somewhere");
//! writer.add_features("places", &[feature]).unwrap();
//! assert!(!writer.encode().unwrap().is_empty());
//! ```

use crate::{
	generalization::{GeneralizationLevel, GeneralizationResolver, GeneralizationTables, Resolution, scale_denominator},
	geo::GeoFeature,
	projection::TileProjector,
	vector_tile::{DEFAULT_EXTENT, DEFAULT_VERSION, EncoderOptions, VectorTileEncoder},
};
use anyhow::{Context, Result};
use log::debug;
use mvtkit_core::{Blob, BoundingBox, Crs};
use std::{io::Write, sync::Arc};

#[derive(Clone, Debug, PartialEq)]
pub struct WriterOptions {
	pub tile_size: u32,
	pub buffer: u32,
	pub extent: u32,
	pub version: u32,
	/// Overrides the generalization tables when set.
	pub simplification_factor: Option<f64>,
	pub generalization_level: Option<GeneralizationLevel>,
	/// Render scale denominator. Derived from the source bounding box when missing.
	pub scale_denominator: Option<f64>,
	pub generalization_tables: Arc<GeneralizationTables>,
	pub small_geometry_threshold: f64,
	pub avoid_empty_output: bool,
	pub empty_layer_name: String,
}

impl Default for WriterOptions {
	fn default() -> Self {
		WriterOptions {
			tile_size: 256,
			buffer: 10,
			extent: DEFAULT_EXTENT,
			version: DEFAULT_VERSION,
			simplification_factor: None,
			generalization_level: None,
			scale_denominator: None,
			generalization_tables: Arc::new(GeneralizationTables::default()),
			small_geometry_threshold: 0.05,
			avoid_empty_output: false,
			empty_layer_name: String::from("empty"),
		}
	}
}

#[derive(Debug)]
pub struct MvtWriter {
	crs: Crs,
	projector: TileProjector,
	resolution: Resolution,
	encoder: VectorTileEncoder,
}

impl MvtWriter {
	/// Creates a writer for the tile covering `source_bbox`. Features are expected in the coordinate
	/// reference system of `source_bbox`.
	///
	/// # Errors
	///
	/// Fails if the bounding box or the tile size is degenerate.
	pub fn new(source_bbox: BoundingBox, options: WriterOptions) -> Result<MvtWriter> {
		let crs = source_bbox.crs();
		let projector = TileProjector::new(source_bbox, options.tile_size, options.tile_size, options.buffer)
			.context("Failed to create the tile projector")?;

		let scale = options
			.scale_denominator
			.unwrap_or_else(|| scale_denominator(projector.source_bbox().width() / f64::from(options.tile_size)));
		let resolution = GeneralizationResolver::new(options.generalization_tables.clone()).resolve(
			scale,
			options.simplification_factor,
			options.generalization_level,
		);
		debug!("encoding tile {:?} with {resolution:?}", projector.source_bbox());

		let encoder = VectorTileEncoder::new(EncoderOptions {
			extent: options.extent,
			tile_size: options.tile_size,
			buffer: options.buffer,
			simplification_factor: resolution.factor,
			small_geometry_threshold: options.small_geometry_threshold,
			version: options.version,
			avoid_empty_output: options.avoid_empty_output,
			empty_layer_name: options.empty_layer_name,
		})
		.context("Failed to create the vector tile encoder")?;

		Ok(MvtWriter {
			crs,
			projector,
			resolution,
			encoder,
		})
	}

	#[must_use]
	pub fn projector(&self) -> &TileProjector {
		&self.projector
	}

	/// The bounding box data sources should be queried with, including the buffer.
	#[must_use]
	pub fn query_bbox(&self) -> &BoundingBox {
		self.projector.buffered_source_bbox()
	}

	#[must_use]
	pub fn resolution(&self) -> Resolution {
		self.resolution
	}

	#[must_use]
	pub fn encoder(&self) -> &VectorTileEncoder {
		&self.encoder
	}

	/// Projects and encodes a single feature. Returns the number of encoded features.
	///
	/// # Errors
	///
	/// Fails with a [`TileError::Projection`](crate::error::TileError::Projection) if the geometry
	/// cannot be projected. The tile should be discarded then.
	pub fn add_feature(&mut self, layer_name: &str, feature: &GeoFeature) -> Result<usize> {
		let geometry = self
			.projector
			.project(&feature.geometry, self.crs)
			.with_context(|| format!("Failed to project {} in layer '{layer_name}'", feature.geometry.type_name()))?;
		Ok(self.encoder.add_feature(layer_name, &feature.properties, &geometry))
	}

	/// Projects and encodes all `features` into the layer `layer_name`. Returns the number of encoded
	/// features.
	pub fn add_features<'a>(
		&mut self,
		layer_name: &str,
		features: impl IntoIterator<Item = &'a GeoFeature>,
	) -> Result<usize> {
		let mut added = 0;
		for feature in features {
			added += self.add_feature(layer_name, feature)?;
		}
		debug!("layer '{layer_name}' now has {added} new feature(s)");
		Ok(added)
	}

	pub fn encode(&self) -> Result<Blob> {
		self.encoder.encode()
	}

	pub fn write_to<W: Write>(&self, sink: W) -> Result<()> {
		self.encoder.write_to(sink)
	}
}
