//! Clipping of tile-local geometries against the (buffered) tile rectangle.
//!
//! Points are kept or dropped with a covers test. Lines are cut with [`BooleanOps::clip`], polygons are
//! intersected with the rectangle. Geometries whose bounding box lies completely inside the rectangle are
//! returned unchanged, those completely outside are dropped without running the boolean engine.

use super::{guarded, is_finite};
use crate::geo::Geometry;
use anyhow::{Result, bail};
use geo::{BooleanOps, BoundingRect, Coord, LineString, MultiLineString, MultiPoint, Point, Polygon, Rect};
use log::trace;
use mvtkit_core::BoundingBox;

/// Result of clipping a single geometry.
#[derive(Debug, PartialEq)]
pub enum Clipped {
	/// Nothing of the geometry lies inside the rectangle.
	Outside,
	/// The geometry lies completely inside the rectangle and was not touched.
	Inside,
	/// The clipped remainder.
	Partial(Geometry),
}

fn to_rect(bbox: &BoundingBox) -> Rect<f64> {
	Rect::new(
		Coord {
			x: bbox.x_min(),
			y: bbox.y_min(),
		},
		Coord {
			x: bbox.x_max(),
			y: bbox.y_max(),
		},
	)
}

fn relation(bounds: Option<Rect<f64>>, clip: &Rect<f64>) -> Option<Clipped> {
	let bounds = bounds?;
	let (min, max) = (bounds.min(), bounds.max());
	if max.x < clip.min().x || min.x > clip.max().x || max.y < clip.min().y || min.y > clip.max().y {
		return Some(Clipped::Outside);
	}
	if min.x >= clip.min().x && max.x <= clip.max().x && min.y >= clip.min().y && max.y <= clip.max().y {
		return Some(Clipped::Inside);
	}
	None
}

fn clip_lines(lines: MultiLineString<f64>, clip: &Rect<f64>) -> Result<Clipped> {
	let clip_poly = clip.to_polygon();
	let mut clipped = guarded("line clipping", || clip_poly.clip(&lines, false))?;
	clipped.0.retain(|line| line.0.len() >= 2);
	Ok(match clipped.0.len() {
		0 => Clipped::Outside,
		1 => Clipped::Partial(Geometry::LineString(clipped.0.remove(0))),
		_ => Clipped::Partial(Geometry::MultiLineString(clipped)),
	})
}

fn clip_polygon(polygon: &Polygon<f64>, clip: &Rect<f64>) -> Result<Clipped> {
	let clip_poly = clip.to_polygon();
	let mut result = guarded("polygon intersection", || polygon.intersection(&clip_poly))?;
	Ok(match result.0.len() {
		0 => Clipped::Outside,
		1 => Clipped::Partial(Geometry::Polygon(result.0.remove(0))),
		_ => Clipped::Partial(Geometry::MultiPolygon(result)),
	})
}

/// Clips `geometry` against `bbox`.
///
/// # Errors
///
/// Returns an error if the geometry contains non-finite coordinates or the boolean engine fails on it.
/// Callers are expected to fall back to the unclipped geometry in that case.
pub fn clip_geometry(geometry: &Geometry, bbox: &BoundingBox) -> Result<Clipped> {
	if !is_finite(geometry) {
		bail!("{} contains non-finite coordinates", geometry.type_name());
	}
	let clip = to_rect(bbox);

	let clipped = match geometry {
		Geometry::Point(point) => {
			if bbox.covers(point.x(), point.y()) {
				Clipped::Inside
			} else {
				Clipped::Outside
			}
		}
		Geometry::MultiPoint(points) => {
			let inside: Vec<Point<f64>> = points.0.iter().filter(|p| bbox.covers(p.x(), p.y())).copied().collect();
			if inside.is_empty() {
				Clipped::Outside
			} else if inside.len() == points.0.len() {
				Clipped::Inside
			} else {
				Clipped::Partial(Geometry::MultiPoint(MultiPoint::new(inside)))
			}
		}
		Geometry::LineString(line) => match relation(line.bounding_rect(), &clip) {
			Some(relation) => relation,
			None => clip_lines(MultiLineString::new(vec![line.clone()]), &clip)?,
		},
		Geometry::MultiLineString(lines) => match relation(lines.bounding_rect(), &clip) {
			Some(relation) => relation,
			None => clip_lines(lines.clone(), &clip)?,
		},
		Geometry::Polygon(polygon) => match relation(polygon.bounding_rect(), &clip) {
			Some(relation) => relation,
			None => clip_polygon(polygon, &clip)?,
		},
		Geometry::MultiPolygon(_) | Geometry::GeometryCollection(_) => {
			bail!("{} must be decomposed before clipping", geometry.type_name())
		}
	};
	trace!("clipped {} -> {clipped:?}", geometry.type_name());
	Ok(clipped)
}

/// Removes every coordinate that is not strictly positive on both axes.
///
/// Used on lines whose simplification failed, where such coordinates are treated as artifacts.
#[must_use]
pub fn drop_non_positive(line: &LineString<f64>) -> LineString<f64> {
	LineString::new(line.0.iter().filter(|c| c.x > 0.0 && c.y > 0.0).copied().collect())
}
