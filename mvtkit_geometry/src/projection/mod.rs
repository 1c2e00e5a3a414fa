//! Projection of world coordinates onto the pixel grid of a single tile.
//!
//! The source bounding box is mapped onto `0..tile_width` × `0..tile_height`. A buffer of `n` pixels grows
//! both boxes symmetrically, so the target becomes `-n..tile_width + n` and the source grows by the
//! equivalent distance in world units. The y axis is flipped: world y grows northwards, tile y grows
//! downwards from the top-left origin.
//!
//! ```
//! use mvtkit_core::{BoundingBox, Crs};
//! use mvtkit_geometry::projection::TileProjector;
//!
//! let bbox = BoundingBox::new(0.0, 0.0, 512.0, 512.0, Crs::WebMercator).unwrap();
//! let projector = TileProjector::new(bbox, 256, 256, 0).unwrap();
//! assert_eq!(projector.transform_xy(0.0, 512.0), (0.0, 0.0));
//! assert_eq!(projector.transform_xy(512.0, 0.0), (256.0, 256.0));
//! ```

use crate::{error::TileError, geo::Geometry};
use anyhow::{Context, Result, bail};
use geo::Coord;
use log::trace;
use mvtkit_core::{BoundingBox, Crs};

#[derive(Clone, Debug, PartialEq)]
pub struct TileProjector {
	source_bbox: BoundingBox,
	buffered_source_bbox: BoundingBox,
	target_bbox: BoundingBox,
	x_scale: f64,
	y_scale: f64,
}

fn ensure_extent(what: &'static str, width: f64, height: f64) -> Result<()> {
	if !(width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite()) {
		bail!(TileError::DegenerateBounds { what, width, height });
	}
	Ok(())
}

impl TileProjector {
	/// Creates a projector for `source_bbox`, a tile of `tile_width` × `tile_height` pixels and a buffer
	/// of `buffer` pixels on each side.
	///
	/// Geographic source boxes are converted to Web Mercator first, so the scale is computed in an
	/// equidistant system.
	///
	/// # Errors
	///
	/// Fails with [`TileError::DegenerateBounds`] if the source or the tile has no area, and with
	/// [`TileError::Projection`] if the source box cannot be converted to Web Mercator.
	pub fn new(source_bbox: BoundingBox, tile_width: u32, tile_height: u32, buffer: u32) -> Result<TileProjector> {
		let tile_width = f64::from(tile_width);
		let tile_height = f64::from(tile_height);
		ensure_extent("target tile", tile_width, tile_height)?;

		let crs = source_bbox.crs();
		let (x_min, y_min) = to_mercator(crs, source_bbox.x_min(), source_bbox.y_min())?;
		let (x_max, y_max) = to_mercator(crs, source_bbox.x_max(), source_bbox.y_max())?;
		let source_bbox = BoundingBox::new(x_min, y_min, x_max, y_max, Crs::WebMercator)
			.context("Failed to build the source bounding box")?;
		ensure_extent("source bbox", source_bbox.width(), source_bbox.height())?;

		let buffer = f64::from(buffer);
		let buffered_source_bbox = source_bbox.expanded(
			source_bbox.width() * buffer / tile_width,
			source_bbox.height() * buffer / tile_height,
		);
		let target_bbox = BoundingBox::new(
			-buffer,
			-buffer,
			tile_width + buffer,
			tile_height + buffer,
			Crs::WebMercator,
		)?;

		let x_scale = target_bbox.width() / buffered_source_bbox.width();
		let y_scale = target_bbox.height() / buffered_source_bbox.height();
		trace!("projector for {source_bbox:?}: scale {x_scale} x {y_scale}, target {target_bbox:?}");

		Ok(TileProjector {
			source_bbox,
			buffered_source_bbox,
			target_bbox,
			x_scale,
			y_scale,
		})
	}

	/// The unbuffered source box in Web Mercator.
	#[must_use]
	pub fn source_bbox(&self) -> &BoundingBox {
		&self.source_bbox
	}

	/// The source box grown by the buffer. Data sources should be queried with this box.
	#[must_use]
	pub fn buffered_source_bbox(&self) -> &BoundingBox {
		&self.buffered_source_bbox
	}

	/// The target box in tile pixels, including the buffer.
	#[must_use]
	pub fn target_bbox(&self) -> &BoundingBox {
		&self.target_bbox
	}

	#[must_use]
	pub fn scale(&self) -> (f64, f64) {
		(self.x_scale, self.y_scale)
	}

	/// Maps a Web Mercator coordinate onto the tile grid.
	#[must_use]
	pub fn transform_xy(&self, x: f64, y: f64) -> (f64, f64) {
		let source = &self.buffered_source_bbox;
		let target = &self.target_bbox;
		(
			target.x_min() + (x - source.x_min()) * self.x_scale,
			target.y_min() + (target.height() - (y - source.y_min()) * self.y_scale),
		)
	}

	/// Maps a tile grid coordinate back onto Web Mercator.
	#[must_use]
	pub fn inverse_xy(&self, x: f64, y: f64) -> (f64, f64) {
		let source = &self.buffered_source_bbox;
		let target = &self.target_bbox;
		(
			source.x_min() + (x - target.x_min()) / self.x_scale,
			source.y_min() + (target.height() - (y - target.y_min())) / self.y_scale,
		)
	}

	/// Projects a geometry given in `crs` onto the tile grid. The input is left untouched.
	///
	/// # Errors
	///
	/// Fails with [`TileError::Projection`] if any coordinate cannot be converted to Web Mercator.
	pub fn project(&self, geometry: &Geometry, crs: Crs) -> Result<Geometry> {
		geometry.try_map_coords(&|c: Coord<f64>| {
			let (x, y) = to_mercator(crs, c.x, c.y)?;
			let (x, y) = self.transform_xy(x, y);
			Ok(Coord { x, y })
		})
	}
}

fn to_mercator(crs: Crs, x: f64, y: f64) -> Result<(f64, f64)> {
	match crs.to_web_mercator(x, y) {
		Some(coord) => Ok(coord),
		None => bail!(TileError::Projection {
			x,
			y,
			crs: crs.to_string()
		}),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use approx::assert_relative_eq;
	use mvtkit_core::TileCoord;
	use rstest::rstest;

	fn bbox(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> BoundingBox {
		BoundingBox::new(x_min, y_min, x_max, y_max, Crs::WebMercator).unwrap()
	}

	#[test]
	fn corners_without_buffer() -> Result<()> {
		let projector = TileProjector::new(bbox(100.0, 200.0, 612.0, 712.0), 256, 256, 0)?;
		assert_eq!(projector.scale(), (0.5, 0.5));
		assert_eq!(projector.transform_xy(100.0, 712.0), (0.0, 0.0));
		assert_eq!(projector.transform_xy(612.0, 200.0), (256.0, 256.0));
		assert_eq!(projector.transform_xy(356.0, 456.0), (128.0, 128.0));
		assert_eq!(projector.transform_xy(100.0, 200.0), (0.0, 256.0));
		Ok(())
	}

	#[test]
	fn corners_with_buffer() -> Result<()> {
		let projector = TileProjector::new(bbox(0.0, 0.0, 2560.0, 2560.0), 256, 256, 10)?;
		assert_eq!(projector.buffered_source_bbox().as_array(), [-100.0, -100.0, 2660.0, 2660.0]);
		assert_eq!(projector.target_bbox().as_array(), [-10.0, -10.0, 266.0, 266.0]);
		assert_relative_eq!(projector.scale().0, 0.1);
		let (x, y) = projector.transform_xy(0.0, 2560.0);
		assert_relative_eq!(x, 0.0, epsilon = 1e-9);
		assert_relative_eq!(y, 0.0, epsilon = 1e-9);
		let (x, y) = projector.transform_xy(-100.0, -100.0);
		assert_relative_eq!(x, -10.0, epsilon = 1e-9);
		assert_relative_eq!(y, 266.0, epsilon = 1e-9);
		Ok(())
	}

	#[test]
	fn non_square_tiles() -> Result<()> {
		let projector = TileProjector::new(bbox(0.0, 0.0, 100.0, 50.0), 512, 256, 0)?;
		assert_eq!(projector.scale(), (5.12, 5.12));
		assert_eq!(projector.transform_xy(100.0, 0.0), (512.0, 256.0));
		Ok(())
	}

	#[rstest]
	#[case(bbox(5.0, 0.0, 5.0, 10.0), 256, 256)]
	#[case(bbox(0.0, 3.0, 10.0, 3.0), 256, 256)]
	#[case(bbox(0.0, 0.0, 10.0, 10.0), 0, 256)]
	#[case(bbox(0.0, 0.0, 10.0, 10.0), 256, 0)]
	fn degenerate_bounds(#[case] source: BoundingBox, #[case] width: u32, #[case] height: u32) {
		let error = TileProjector::new(source, width, height, 10).unwrap_err();
		assert!(matches!(
			error.downcast_ref::<TileError>(),
			Some(TileError::DegenerateBounds { .. })
		));
	}

	#[rstest]
	#[case(0.0, 0.0)]
	#[case(-100.0, 2660.0)]
	#[case(1234.5678, 17.25)]
	#[case(2560.0, -3.5)]
	fn round_trip(#[case] x: f64, #[case] y: f64) -> Result<()> {
		let projector = TileProjector::new(bbox(0.0, 0.0, 2560.0, 2560.0), 256, 256, 10)?;
		let (tx, ty) = projector.transform_xy(x, y);
		let (wx, wy) = projector.inverse_xy(tx, ty);
		assert_relative_eq!(wx, x, epsilon = 1e-6);
		assert_relative_eq!(wy, y, epsilon = 1e-6);
		Ok(())
	}

	#[test]
	fn project_is_stable() -> Result<()> {
		let projector = TileProjector::new(bbox(0.0, 0.0, 512.0, 512.0), 256, 256, 0)?;
		let input = Geometry::new_polygon(vec![vec![[0.0, 0.0], [256.0, 0.0], [256.0, 256.0]]]);
		let first = projector.project(&input, Crs::WebMercator)?;
		let second = projector.project(&input, Crs::WebMercator)?;
		assert_eq!(first, second);
		assert_eq!(
			first,
			Geometry::new_polygon(vec![vec![[0.0, 256.0], [128.0, 256.0], [128.0, 128.0]]])
		);
		assert_eq!(input.coord_count(), 4);
		Ok(())
	}

	#[test]
	fn project_wgs84() -> Result<()> {
		let tile = TileCoord::new(1, 1, 0)?;
		let projector = TileProjector::new(tile.to_geo_bbox()?, 256, 256, 0)?;
		assert_relative_eq!(projector.source_bbox().x_min(), 0.0, epsilon = 1e-6);

		let Geometry::Point(point) = projector.project(&Geometry::new_point([90.0, 0.0]), Crs::Wgs84)? else {
			bail!("expected a point");
		};
		assert_relative_eq!(point.x(), 128.0, epsilon = 1e-6);
		assert_relative_eq!(point.y(), 256.0, epsilon = 1e-6);
		Ok(())
	}

	#[test]
	fn project_fails_at_the_pole() -> Result<()> {
		let projector = TileProjector::new(TileCoord::new(0, 0, 0)?.to_mercator_bbox()?, 256, 256, 0)?;
		let error = projector
			.project(&Geometry::new_line_string(vec![[0.0, 0.0], [0.0, 90.0]]), Crs::Wgs84)
			.unwrap_err();
		assert_eq!(
			error.downcast_ref::<TileError>(),
			Some(&TileError::Projection {
				x: 0.0,
				y: 90.0,
				crs: String::from("EPSG:4326")
			})
		);
		Ok(())
	}
}
