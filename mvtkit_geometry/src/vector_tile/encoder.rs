//! Builds a complete vector tile from features given in tile pixels.
//!
//! Every feature runs through the [`GeometryFilter`], each surviving geometry is turned into a command
//! stream and appended to its layer. Layers are created on the first feature that survives filtering and
//! are written in creation order.

use super::{
	command::encode_geometry,
	feature::VectorTileFeature,
	geometry_type::GeomType,
	layer::{DEFAULT_EXTENT, DEFAULT_VERSION, VectorTileLayer},
	tile::VectorTile,
};
use crate::{
	error::TileError,
	geo::{GeoProperties, Geometry},
	pipeline::GeometryFilter,
};
use anyhow::{Context, Result, bail, ensure};
use log::{debug, trace};
use mvtkit_core::{Blob, BoundingBox, Crs};
use std::{collections::HashMap, io::Write};

#[derive(Clone, Debug, PartialEq)]
pub struct EncoderOptions {
	/// Resolution of the integer grid of every layer.
	pub extent: u32,
	/// Width and height of the tile in pixels. Input coordinates are given in this unit.
	pub tile_size: u32,
	/// Pixels around the tile that survive clipping.
	pub buffer: u32,
	/// Smallest triangle area in square pixels a vertex must span to survive simplification, zero disables it.
	pub simplification_factor: f64,
	/// Polygons with a smaller area and lines with a smaller length are dropped, zero disables the check.
	pub small_geometry_threshold: f64,
	/// Either 1 or 2.
	pub version: u32,
	/// Writes a single empty layer instead of zero bytes when no feature survives.
	pub avoid_empty_output: bool,
	pub empty_layer_name: String,
}

impl Default for EncoderOptions {
	fn default() -> Self {
		EncoderOptions {
			extent: DEFAULT_EXTENT,
			tile_size: 256,
			buffer: 10,
			simplification_factor: 0.1,
			small_geometry_threshold: 0.05,
			version: DEFAULT_VERSION,
			avoid_empty_output: false,
			empty_layer_name: String::from("empty"),
		}
	}
}

#[derive(Debug)]
pub struct VectorTileEncoder {
	options: EncoderOptions,
	filter: GeometryFilter,
	scale: f64,
	tile: VectorTile,
	layer_index: HashMap<String, usize>,
}

impl VectorTileEncoder {
	/// Creates an encoder for a single tile.
	///
	/// # Errors
	///
	/// Fails with [`TileError::DegenerateBounds`] if the tile size or the extent is zero, and if the
	/// version is neither 1 nor 2.
	pub fn new(options: EncoderOptions) -> Result<VectorTileEncoder> {
		if options.tile_size == 0 || options.extent == 0 {
			bail!(TileError::DegenerateBounds {
				what: if options.tile_size == 0 { "tile size" } else { "extent" },
				width: f64::from(options.tile_size),
				height: f64::from(options.extent),
			});
		}
		ensure!(
			options.version == 1 || options.version == 2,
			"vector tile version must be 1 or 2, got {}",
			options.version
		);

		let size = f64::from(options.tile_size);
		let buffer = f64::from(options.buffer);
		let clip_bbox = BoundingBox::new(-buffer, -buffer, size + buffer, size + buffer, Crs::WebMercator)
			.context("Failed to build the clip bounding box")?;
		let filter = GeometryFilter::new(
			clip_bbox,
			options.simplification_factor,
			options.small_geometry_threshold,
		);

		Ok(VectorTileEncoder {
			scale: f64::from(options.extent) / size,
			options,
			filter,
			tile: VectorTile::default(),
			layer_index: HashMap::new(),
		})
	}

	#[must_use]
	pub fn options(&self) -> &EncoderOptions {
		&self.options
	}

	/// Filters and encodes `geometry` into the layer `layer_name`. Returns the number of features that
	/// were added, which can be more than one for decomposed multi polygons and collections.
	pub fn add_feature(&mut self, layer_name: &str, properties: &GeoProperties, geometry: &Geometry) -> usize {
		let mut added = 0;
		for geometry in self.filter.filter(geometry, layer_name) {
			let commands = encode_geometry(&geometry, self.scale);
			if commands.is_empty() {
				debug!(
					"dropping {} that collapses on the tile grid in layer '{layer_name}'",
					geometry.type_name()
				);
				continue;
			}
			let feature = VectorTileFeature::new(vec![], GeomType::from(&geometry), commands);
			self.layer_mut(layer_name).add_feature(properties, feature);
			added += 1;
		}
		trace!("added {added} feature(s) to layer '{layer_name}'");
		added
	}

	fn layer_mut(&mut self, name: &str) -> &mut VectorTileLayer {
		let index = match self.layer_index.get(name) {
			Some(index) => *index,
			None => {
				let index = self.tile.layers.len();
				self.tile.layers.push(VectorTileLayer::new(
					name.to_string(),
					self.options.extent,
					self.options.version,
				));
				self.layer_index.insert(name.to_string(), index);
				index
			}
		};
		&mut self.tile.layers[index]
	}

	#[must_use]
	pub fn layer_count(&self) -> usize {
		self.tile.layers.len()
	}

	#[must_use]
	pub fn feature_count(&self) -> usize {
		self.tile.layers.iter().map(|layer| layer.features.len()).sum()
	}

	#[must_use]
	pub fn tile(&self) -> &VectorTile {
		&self.tile
	}

	fn empty_shell(&self) -> VectorTile {
		VectorTile::new(vec![VectorTileLayer::new(
			self.options.empty_layer_name.clone(),
			self.options.extent,
			self.options.version,
		)])
	}

	/// Serializes the tile.
	pub fn encode(&self) -> Result<Blob> {
		if self.tile.layers.is_empty() && self.options.avoid_empty_output {
			return self.empty_shell().to_blob().context("Failed to encode empty vector tile");
		}
		self.tile.to_blob().context("Failed to encode vector tile")
	}

	/// Serializes the tile straight into `sink`.
	pub fn write_to<W: Write>(&self, sink: W) -> Result<()> {
		if self.tile.layers.is_empty() && self.options.avoid_empty_output {
			return self
				.empty_shell()
				.write_to(sink)
				.context("Failed to write empty vector tile");
		}
		self.tile.write_to(sink).context("Failed to write vector tile")
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::geo::{GeoFeature, GeoValue};
	use pretty_assertions::assert_eq;
	use rstest::rstest;

	fn encoder() -> VectorTileEncoder {
		VectorTileEncoder::new(EncoderOptions::default()).unwrap()
	}

	fn square(x: f64, y: f64, size: f64) -> Geometry {
		Geometry::new_polygon(vec![vec![[x, y], [x + size, y], [x + size, y + size], [x, y + size], [x, y]]])
	}

	#[test]
	fn empty_output_is_zero_bytes() -> Result<()> {
		let encoder = encoder();
		assert!(encoder.encode()?.is_empty());
		let mut buffer: Vec<u8> = Vec::new();
		encoder.write_to(&mut buffer)?;
		assert!(buffer.is_empty());
		Ok(())
	}

	#[test]
	fn avoid_empty_output_writes_an_empty_layer() -> Result<()> {
		let encoder = VectorTileEncoder::new(EncoderOptions {
			avoid_empty_output: true,
			..EncoderOptions::default()
		})?;
		let blob = encoder.encode()?;
		assert_eq!(blob.as_hex(), "1a 0c 0a 05 65 6d 70 74 79 28 80 20 78 02");
		let mut buffer: Vec<u8> = Vec::new();
		encoder.write_to(&mut buffer)?;
		assert_eq!(buffer, blob.into_vec());
		Ok(())
	}

	#[test]
	fn avoid_empty_output_is_ignored_when_features_exist() -> Result<()> {
		let mut encoder = VectorTileEncoder::new(EncoderOptions {
			avoid_empty_output: true,
			empty_layer_name: String::from("nothing"),
			..EncoderOptions::default()
		})?;
		encoder.add_feature("pois", &GeoProperties::new(), &Geometry::new_point([1.0, 2.0]));
		let tile = VectorTile::from_blob(&encoder.encode()?)?;
		assert_eq!(tile.layers.len(), 1);
		assert_eq!(tile.layers[0].name, "pois");
		Ok(())
	}

	#[test]
	fn polygon_end_to_end() -> Result<()> {
		let mut encoder = encoder();
		let properties = GeoProperties::from(vec![("name", GeoValue::from("lake")), ("depth", GeoValue::from(3u32))]);
		assert_eq!(encoder.add_feature("water", &properties, &square(10.0, 10.0, 10.0)), 1);

		let tile = VectorTile::from_blob(&encoder.encode()?)?;
		let layer = tile.find_layer("water").unwrap();
		assert_eq!(layer.extent, 4096);
		assert_eq!(layer.version, 2);
		assert_eq!(layer.features.len(), 1);

		let feature = &layer.features[0];
		assert_eq!(feature.geom_type, GeomType::Polygon);
		assert_eq!(feature.tag_ids, vec![0, 0, 1, 1]);
		assert_eq!(feature.geometry, vec![9, 320, 320, 26, 320, 0, 0, 320, 319, 0, 15]);
		assert_eq!(
			layer.to_features()?,
			vec![GeoFeature::with_properties(
				Geometry::new_polygon(vec![vec![
					[160.0, 160.0],
					[320.0, 160.0],
					[320.0, 320.0],
					[160.0, 320.0],
					[160.0, 160.0]
				]]),
				properties
			)]
		);
		Ok(())
	}

	#[test]
	fn closed_triangle_uses_two_line_tos() -> Result<()> {
		let mut encoder = encoder();
		let triangle = Geometry::new_polygon(vec![vec![[10.0, 10.0], [100.0, 10.0], [10.0, 100.0], [10.0, 10.0]]]);
		encoder.add_feature("shapes", &GeoProperties::new(), &triangle);
		let geometry = &encoder.tile().layers[0].features[0].geometry;
		assert_eq!(geometry[0], command_header(1, 1));
		assert_eq!(geometry[3], command_header(2, 2));
		assert_eq!(geometry.last(), Some(&command_header(7, 1)));
		assert_eq!(geometry.len(), 9);
		Ok(())
	}

	fn command_header(id: u32, count: u32) -> u32 {
		super::super::command::command(id, count)
	}

	#[rstest]
	#[case([128.0, 128.0], 1)]
	#[case([-9.0, 265.0], 1)]
	#[case([300.0, 128.0], 0)]
	#[case([128.0, -11.0], 0)]
	fn points_inside_and_outside_the_tile(#[case] xy: [f64; 2], #[case] expected: usize) -> Result<()> {
		let mut encoder = encoder();
		assert_eq!(encoder.add_feature("pois", &GeoProperties::new(), &Geometry::new_point(xy)), expected);
		assert_eq!(encoder.layer_count(), expected);
		assert_eq!(encoder.feature_count(), expected);
		Ok(())
	}

	#[test]
	fn layers_keep_insertion_order_and_share_dictionaries() -> Result<()> {
		let mut encoder = encoder();
		let a = GeoProperties::from(vec![("kind", GeoValue::from("bench"))]);
		let b = GeoProperties::from(vec![("kind", GeoValue::from("tree")), ("note", GeoValue::Null)]);
		encoder.add_feature("pois", &a, &Geometry::new_point([1.0, 1.0]));
		encoder.add_feature("roads", &a, &Geometry::new_line_string(vec![[0.0, 0.0], [50.0, 50.0]]));
		encoder.add_feature("pois", &b, &Geometry::new_point([2.0, 2.0]));
		encoder.add_feature("pois", &a, &Geometry::new_point([3.0, 3.0]));

		let names: Vec<&str> = encoder.tile().layers.iter().map(|l| l.name.as_str()).collect();
		assert_eq!(names, vec!["pois", "roads"]);

		let pois = &encoder.tile().layers[0];
		let tags: Vec<Vec<u32>> = pois.features.iter().map(|f| f.tag_ids.clone()).collect();
		assert_eq!(tags, vec![vec![0, 0], vec![0, 1], vec![0, 0]]);
		assert_eq!(pois.property_manager.key.len(), 1);
		assert_eq!(pois.property_manager.val.len(), 2);
		assert_eq!(encoder.feature_count(), 4);
		Ok(())
	}

	#[test]
	fn multi_polygon_becomes_several_features() -> Result<()> {
		let mut encoder = encoder();
		let geometry = Geometry::new_multi_polygon(vec![
			vec![vec![[10.0, 10.0], [20.0, 10.0], [20.0, 20.0], [10.0, 20.0], [10.0, 10.0]]],
			vec![vec![[50.0, 50.0], [60.0, 50.0], [60.0, 60.0], [50.0, 60.0], [50.0, 50.0]]],
		]);
		assert_eq!(encoder.add_feature("landuse", &GeoProperties::new(), &geometry), 2);
		assert_eq!(encoder.layer_count(), 1);
		Ok(())
	}

	#[test]
	fn collapsed_polygon_creates_no_layer() -> Result<()> {
		let mut encoder = VectorTileEncoder::new(EncoderOptions {
			extent: 16,
			simplification_factor: 0.0,
			small_geometry_threshold: 0.0,
			..EncoderOptions::default()
		})?;
		assert_eq!(encoder.add_feature("water", &GeoProperties::new(), &square(100.0, 100.0, 1.0)), 0);
		assert_eq!(encoder.layer_count(), 0);
		Ok(())
	}

	#[test]
	fn extent_and_version_are_configurable() -> Result<()> {
		let mut encoder = VectorTileEncoder::new(EncoderOptions {
			extent: 512,
			version: 1,
			..EncoderOptions::default()
		})?;
		encoder.add_feature("pois", &GeoProperties::new(), &Geometry::new_point([128.0, 64.0]));
		let tile = VectorTile::from_blob(&encoder.encode()?)?;
		assert_eq!(tile.layers[0].extent, 512);
		assert_eq!(tile.layers[0].version, 1);
		assert_eq!(tile.layers[0].features[0].geometry, vec![9, 512, 256]);
		Ok(())
	}

	#[rstest]
	#[case(EncoderOptions { tile_size: 0, ..EncoderOptions::default() })]
	#[case(EncoderOptions { extent: 0, ..EncoderOptions::default() })]
	fn degenerate_options(#[case] options: EncoderOptions) {
		let error = VectorTileEncoder::new(options).unwrap_err();
		assert!(matches!(
			error.downcast_ref::<TileError>(),
			Some(TileError::DegenerateBounds { .. })
		));
	}

	#[test]
	fn unsupported_version() {
		assert!(
			VectorTileEncoder::new(EncoderOptions {
				version: 3,
				..EncoderOptions::default()
			})
			.is_err()
		);
	}

	#[test]
	fn parallel_encoders_agree() -> Result<()> {
		fn encode() -> Result<Vec<u8>> {
			let mut encoder = VectorTileEncoder::new(EncoderOptions::default())?;
			for i in 0..20_i32 {
				let offset = f64::from(i) * 10.0;
				let properties = GeoProperties::from(vec![("index", GeoValue::from(i))]);
				encoder.add_feature("shapes", &properties, &square(offset, offset, 8.0));
				encoder.add_feature(
					"lines",
					&properties,
					&Geometry::new_line_string(vec![[offset, 0.0], [offset, 300.0]]),
				);
			}
			Ok(encoder.encode()?.into_vec())
		}

		let expected = encode()?;
		let results = std::thread::scope(|scope| {
			let handles: Vec<_> = (0..4).map(|_| scope.spawn(encode)).collect();
			handles.into_iter().map(|h| h.join().unwrap()).collect::<Result<Vec<_>>>()
		})?;
		assert!(results.iter().all(|r| *r == expected));
		Ok(())
	}
}
