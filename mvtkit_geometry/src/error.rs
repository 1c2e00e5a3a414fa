//! Typed errors and diagnostics of the encoding pipeline.
//!
//! `DegenerateBounds` and `Projection` abort the tile and reach the caller wrapped in an [`anyhow::Error`];
//! use `err.downcast_ref::<TileError>()` to inspect them. The remaining variants never abort anything:
//! they are formatted into log records when a single feature has to fall back or be repaired.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TileError {
	#[error("degenerate bounds: {what} has width {width} and height {height}")]
	DegenerateBounds { what: &'static str, width: f64, height: f64 },

	#[error("projection failed for coordinate ({x}, {y}) in {crs}")]
	Projection { x: f64, y: f64, crs: String },

	#[error("clipping {geometry_type} in layer '{layer}' failed, keeping it unclipped: {reason}")]
	ClipFailure {
		layer: String,
		geometry_type: &'static str,
		reason: String,
	},

	#[error("simplifying {geometry_type} in layer '{layer}' failed, keeping the original: {reason}")]
	SimplifyFailure {
		layer: String,
		geometry_type: &'static str,
		reason: String,
	},

	#[error("dropped interior ring {ring} of polygon in layer '{layer}': {reason}")]
	TopologyRepair { layer: String, ring: usize, reason: String },
}

impl TileError {
	/// Returns `true` for conditions that must abort the encoding of the whole tile.
	#[must_use]
	pub fn is_fatal(&self) -> bool {
		matches!(self, TileError::DegenerateBounds { .. } | TileError::Projection { .. })
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use anyhow::anyhow;

	#[test]
	fn messages() {
		let error = TileError::DegenerateBounds {
			what: "source bbox",
			width: 0.0,
			height: 2.5,
		};
		assert_eq!(error.to_string(), "degenerate bounds: source bbox has width 0 and height 2.5");

		let error = TileError::TopologyRepair {
			layer: String::from("water"),
			ring: 2,
			reason: String::from("intersects the exterior ring"),
		};
		assert_eq!(
			error.to_string(),
			"dropped interior ring 2 of polygon in layer 'water': intersects the exterior ring"
		);
	}

	#[test]
	fn fatal_classification() {
		assert!(
			TileError::Projection {
				x: 0.0,
				y: 90.0,
				crs: String::from("EPSG:4326")
			}
			.is_fatal()
		);
		assert!(
			!TileError::ClipFailure {
				layer: String::new(),
				geometry_type: "Polygon",
				reason: String::new()
			}
			.is_fatal()
		);
	}

	#[test]
	fn downcast_through_anyhow() {
		let error = anyhow!(TileError::Projection {
			x: 1.0,
			y: 2.0,
			crs: String::from("EPSG:4326"),
		})
		.context("Failed to project feature");
		assert!(matches!(
			error.downcast_ref::<TileError>(),
			Some(TileError::Projection { .. })
		));
	}
}
