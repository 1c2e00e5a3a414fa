//! Topology-preserving Visvalingam-Whyatt simplification on top of [`SimplifyVwPreserve`].
//!
//! The tolerance is the smallest triangle area, in square units of the coordinates, that a vertex has to
//! span with its neighbours to survive. All rings of a polygon share one segment index, so a shortened
//! exterior does not run through a hole. Lines keep both endpoints, rings keep at least 4 coordinates.

use super::{guarded, is_finite};
use crate::geo::Geometry;
use anyhow::{Result, bail, ensure};
use geo::SimplifyVwPreserve;

/// Simplifies `geometry` with the given tolerance.
///
/// Points and multi points are returned unchanged.
///
/// # Errors
///
/// Fails if the geometry contains non-finite coordinates, if the simplifier panics, if a polygon exterior
/// collapses, or if the geometry is a collection that has to be decomposed first.
pub fn simplify_geometry(geometry: &Geometry, tolerance: f64) -> Result<Geometry> {
	ensure!(tolerance.is_finite() && tolerance >= 0.0, "invalid tolerance {tolerance}");
	ensure!(
		is_finite(geometry),
		"{} contains non-finite coordinates",
		geometry.type_name()
	);

	Ok(match geometry {
		Geometry::Point(_) | Geometry::MultiPoint(_) => geometry.clone(),
		Geometry::LineString(line) => {
			Geometry::LineString(guarded("simplification", || line.simplify_vw_preserve(tolerance))?)
		}
		Geometry::MultiLineString(lines) => {
			Geometry::MultiLineString(guarded("simplification", || lines.simplify_vw_preserve(tolerance))?)
		}
		Geometry::Polygon(polygon) => {
			let simplified = guarded("simplification", || polygon.simplify_vw_preserve(tolerance))?;
			ensure!(
				simplified.exterior().0.len() >= 4,
				"exterior collapsed to {} coordinates",
				simplified.exterior().0.len()
			);
			Geometry::Polygon(simplified)
		}
		Geometry::MultiPolygon(_) | Geometry::GeometryCollection(_) => {
			bail!("{} must be decomposed before simplification", geometry.type_name())
		}
	})
}
