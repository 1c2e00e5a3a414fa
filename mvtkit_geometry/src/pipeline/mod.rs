//! Per-feature geometry filtering in tile pixel space.
//!
//! [`GeometryFilter::filter`] turns one projected geometry into zero or more geometries ready for command
//! encoding. The steps are, in order:
//!
//! 1. Multi polygons and geometry collections are decomposed, each part runs through the whole pipeline.
//! 2. Polygons with an area and line strings with a length below the small geometry threshold are dropped.
//! 3. Geometries are clipped against the buffered tile rectangle. A polygon falling apart into several
//!    pieces is decomposed again.
//! 4. Empty results are dropped.
//! 5. Geometries are simplified with a topology-preserving Visvalingam-Whyatt.
//! 6. If a simplified polygon is invalid, interior rings that run into other rings are removed.
//!
//! Failures of single steps never abort the tile: clipping and simplification fall back to their input.

mod clip;
mod repair;
mod simplify;

pub use clip::{Clipped, clip_geometry};
pub use repair::repair_polygon;
pub use simplify::simplify_geometry;

use crate::{error::TileError, geo::Geometry};
use anyhow::{Result, anyhow};
use clip::drop_non_positive;
use geo::{Area, Coord, Euclidean, Length, Validation};
use log::{debug, trace, warn};
use mvtkit_core::BoundingBox;
use std::panic::{AssertUnwindSafe, catch_unwind};

#[derive(Clone, Debug, PartialEq)]
pub struct GeometryFilter {
	clip_bbox: BoundingBox,
	simplification_factor: f64,
	small_geometry_threshold: f64,
}

impl GeometryFilter {
	/// Creates a filter clipping against `clip_bbox`, given in tile pixels.
	///
	/// A `simplification_factor` or `small_geometry_threshold` of zero or less disables that step.
	#[must_use]
	pub fn new(clip_bbox: BoundingBox, simplification_factor: f64, small_geometry_threshold: f64) -> Self {
		Self {
			clip_bbox,
			simplification_factor,
			small_geometry_threshold,
		}
	}

	#[must_use]
	pub fn clip_bbox(&self) -> &BoundingBox {
		&self.clip_bbox
	}

	#[must_use]
	pub fn simplification_factor(&self) -> f64 {
		self.simplification_factor
	}

	#[must_use]
	pub fn small_geometry_threshold(&self) -> f64 {
		self.small_geometry_threshold
	}

	/// Runs `geometry` through the pipeline. `layer` is only used for diagnostics.
	#[must_use]
	pub fn filter(&self, geometry: &Geometry, layer: &str) -> Vec<Geometry> {
		let mut result = Vec::new();
		self.filter_into(geometry, layer, &mut result);
		result
	}

	fn filter_into(&self, geometry: &Geometry, layer: &str, result: &mut Vec<Geometry>) {
		match geometry {
			Geometry::MultiPolygon(polygons) => {
				for polygon in &polygons.0 {
					self.filter_into(&Geometry::Polygon(polygon.clone()), layer, result);
				}
			}
			Geometry::GeometryCollection(geometries) => {
				for geometry in geometries {
					self.filter_into(geometry, layer, result);
				}
			}
			_ => {
				if let Some(geometry) = self.filter_single(geometry, layer, result) {
					result.push(geometry);
				}
			}
		}
	}

	/// Filters a geometry that is not a collection. Pieces that have to be decomposed again are fed back
	/// into `result` directly.
	fn filter_single(&self, geometry: &Geometry, layer: &str, result: &mut Vec<Geometry>) -> Option<Geometry> {
		if geometry.is_empty() {
			trace!("dropping empty {} in layer '{layer}'", geometry.type_name());
			return None;
		}

		if self.small_geometry_threshold > 0.0 && is_small(geometry, self.small_geometry_threshold) {
			debug!(
				"dropping {} below the small geometry threshold {} in layer '{layer}'",
				geometry.type_name(),
				self.small_geometry_threshold
			);
			return None;
		}

		let clipped = match clip_geometry(geometry, &self.clip_bbox) {
			Ok(Clipped::Outside) => {
				trace!("dropping {} outside of the tile in layer '{layer}'", geometry.type_name());
				return None;
			}
			Ok(Clipped::Inside) => geometry.clone(),
			Ok(Clipped::Partial(multi @ Geometry::MultiPolygon(_))) => {
				self.filter_into(&multi, layer, result);
				return None;
			}
			Ok(Clipped::Partial(clipped)) => clipped,
			Err(error) => {
				warn!(
					"{}",
					TileError::ClipFailure {
						layer: layer.to_string(),
						geometry_type: geometry.type_name(),
						reason: format!("{error:#}"),
					}
				);
				geometry.clone()
			}
		};

		if clipped.is_empty() {
			trace!("dropping {} that is empty after clipping in layer '{layer}'", geometry.type_name());
			return None;
		}

		if self.simplification_factor <= 0.0 {
			return Some(clipped);
		}

		let simplified = match simplify_geometry(&clipped, self.simplification_factor) {
			Ok(simplified) => simplified,
			Err(error) => {
				warn!(
					"{}",
					TileError::SimplifyFailure {
						layer: layer.to_string(),
						geometry_type: clipped.type_name(),
						reason: format!("{error:#}"),
					}
				);
				match clipped {
					Geometry::LineString(line) => {
						let line = drop_non_positive(&line);
						if line.0.len() < 2 {
							debug!("dropping LineString without usable coordinates in layer '{layer}'");
							return None;
						}
						Geometry::LineString(line)
					}
					other => other,
				}
			}
		};

		Some(match simplified {
			Geometry::Polygon(polygon) if !polygon.is_valid() => match repair_polygon(&polygon, layer) {
				Some(repaired) => Geometry::Polygon(repaired),
				None => Geometry::Polygon(polygon),
			},
			other => other,
		})
	}
}

fn is_small(geometry: &Geometry, threshold: f64) -> bool {
	match geometry {
		Geometry::Polygon(polygon) => polygon.unsigned_area() < threshold,
		Geometry::LineString(line) => Euclidean.length(line) < threshold,
		_ => false,
	}
}

fn is_finite(geometry: &Geometry) -> bool {
	geometry
		.try_map_coords(&|c: Coord<f64>| {
			if c.x.is_finite() && c.y.is_finite() {
				Ok(c)
			} else {
				Err(anyhow!("non-finite coordinate"))
			}
		})
		.is_ok()
}

/// Runs `f`, turning a panic of a `geo` algorithm into an error.
///
/// The panic still reaches the installed panic hook, so with the default hook every caught panic is also
/// printed to stderr next to the warning logged by the caller.
fn guarded<T>(what: &str, f: impl FnOnce() -> T) -> Result<T> {
	catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
		let reason = payload
			.downcast_ref::<&str>()
			.map(|s| (*s).to_string())
			.or_else(|| payload.downcast_ref::<String>().cloned())
			.unwrap_or_else(|| String::from("unknown panic"));
		anyhow!("{what} panicked: {reason}")
	})
}
