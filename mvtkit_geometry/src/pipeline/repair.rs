use crate::error::TileError;
use geo::{Intersects, LineString, Polygon};
use log::info;

/// Drops every interior ring that touches or crosses the exterior ring or another interior ring.
///
/// Returns `None` if no ring had to be dropped. Each dropped ring is logged as a [`TileError::TopologyRepair`].
#[must_use]
pub fn repair_polygon(polygon: &Polygon<f64>, layer: &str) -> Option<Polygon<f64>> {
	let exterior = polygon.exterior();
	let interiors = polygon.interiors();

	let mut dropped = false;
	let mut kept: Vec<LineString<f64>> = Vec::with_capacity(interiors.len());
	for (index, ring) in interiors.iter().enumerate() {
		let reason = if ring.intersects(exterior) {
			Some(String::from("intersects the exterior ring"))
		} else {
			interiors
				.iter()
				.enumerate()
				.find(|(other, r)| *other != index && ring.intersects(*r))
				.map(|(other, _)| format!("intersects interior ring {other}"))
		};
		match reason {
			Some(reason) => {
				info!(
					"{}",
					TileError::TopologyRepair {
						layer: layer.to_string(),
						ring: index,
						reason,
					}
				);
				dropped = true;
			}
			None => kept.push(ring.clone()),
		}
	}

	dropped.then(|| Polygon::new(exterior.clone(), kept))
}
