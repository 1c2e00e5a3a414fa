//! Axis-aligned bounding boxes tagged with the coordinate reference system they are expressed in.
//!
//! A [`BoundingBox`] is immutable once constructed. Transformations such as [`BoundingBox::expanded`]
//! return a new instance.

use super::Crs;
use anyhow::{Context, Result, ensure};
use std::fmt::Debug;

#[derive(Clone, Copy, PartialEq)]
pub struct BoundingBox {
	x_min: f64,
	y_min: f64,
	x_max: f64,
	y_max: f64,
	crs: Crs,
}

impl BoundingBox {
	/// Creates a bounding box. Fails if any value is not finite or if a minimum exceeds its maximum.
	pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64, crs: Crs) -> Result<BoundingBox> {
		ensure!(
			x_min.is_finite() && y_min.is_finite() && x_max.is_finite() && y_max.is_finite(),
			"bounding box values must be finite: [{x_min}, {y_min}, {x_max}, {y_max}]"
		);
		ensure!(x_min <= x_max, "x_min ({x_min}) must be <= x_max ({x_max})");
		ensure!(y_min <= y_max, "y_min ({y_min}) must be <= y_max ({y_max})");
		Ok(BoundingBox {
			x_min,
			y_min,
			x_max,
			y_max,
			crs,
		})
	}

	/// Parses `"x_min,y_min,x_max,y_max"`.
	pub fn parse(text: &str, crs: Crs) -> Result<BoundingBox> {
		let values = text
			.split(',')
			.map(|part| part.trim().parse::<f64>())
			.collect::<Result<Vec<f64>, _>>()
			.with_context(|| format!("Failed to parse bounding box '{text}'"))?;
		ensure!(
			values.len() == 4,
			"bounding box must have 4 comma separated values, got {}",
			values.len()
		);
		BoundingBox::new(values[0], values[1], values[2], values[3], crs)
	}

	#[must_use]
	pub fn x_min(&self) -> f64 {
		self.x_min
	}

	#[must_use]
	pub fn y_min(&self) -> f64 {
		self.y_min
	}

	#[must_use]
	pub fn x_max(&self) -> f64 {
		self.x_max
	}

	#[must_use]
	pub fn y_max(&self) -> f64 {
		self.y_max
	}

	#[must_use]
	pub fn crs(&self) -> Crs {
		self.crs
	}

	#[must_use]
	pub fn width(&self) -> f64 {
		self.x_max - self.x_min
	}

	#[must_use]
	pub fn height(&self) -> f64 {
		self.y_max - self.y_min
	}

	/// Returns a copy grown by `dx` on the left and right and by `dy` on the top and bottom.
	#[must_use]
	pub fn expanded(&self, dx: f64, dy: f64) -> BoundingBox {
		BoundingBox {
			x_min: self.x_min - dx,
			y_min: self.y_min - dy,
			x_max: self.x_max + dx,
			y_max: self.y_max + dy,
			crs: self.crs,
		}
	}

	/// Covers test: points on the boundary count as inside.
	#[must_use]
	pub fn covers(&self, x: f64, y: f64) -> bool {
		x >= self.x_min && x <= self.x_max && y >= self.y_min && y <= self.y_max
	}

	#[must_use]
	pub fn as_array(&self) -> [f64; 4] {
		[self.x_min, self.y_min, self.x_max, self.y_max]
	}
}

impl Debug for BoundingBox {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(
			f,
			"BoundingBox({}: [{}, {}, {}, {}])",
			self.crs, self.x_min, self.y_min, self.x_max, self.y_max
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[test]
	fn new_and_accessors() -> Result<()> {
		let bbox = BoundingBox::new(-10.0, -5.0, 30.0, 15.0, Crs::WebMercator)?;
		assert_eq!(bbox.as_array(), [-10.0, -5.0, 30.0, 15.0]);
		assert_eq!(bbox.width(), 40.0);
		assert_eq!(bbox.height(), 20.0);
		assert_eq!(bbox.crs(), Crs::WebMercator);
		assert_eq!(format!("{bbox:?}"), "BoundingBox(EPSG:3857: [-10, -5, 30, 15])");
		Ok(())
	}

	#[rstest]
	#[case(1.0, 0.0, 0.0, 1.0)]
	#[case(0.0, 1.0, 1.0, 0.0)]
	#[case(f64::NAN, 0.0, 1.0, 1.0)]
	#[case(0.0, 0.0, f64::INFINITY, 1.0)]
	fn new_rejects_invalid(#[case] x_min: f64, #[case] y_min: f64, #[case] x_max: f64, #[case] y_max: f64) {
		assert!(BoundingBox::new(x_min, y_min, x_max, y_max, Crs::Wgs84).is_err());
	}

	#[test]
	fn zero_size_is_allowed() -> Result<()> {
		let bbox = BoundingBox::new(1.0, 1.0, 1.0, 1.0, Crs::Wgs84)?;
		assert_eq!(bbox.width(), 0.0);
		Ok(())
	}

	#[test]
	fn parse() -> Result<()> {
		let bbox = BoundingBox::parse("0, -1.5,2,3e1", Crs::Wgs84)?;
		assert_eq!(bbox.as_array(), [0.0, -1.5, 2.0, 30.0]);
		assert!(BoundingBox::parse("0,1,2", Crs::Wgs84).is_err());
		assert!(BoundingBox::parse("0,1,2,x", Crs::Wgs84).is_err());
		Ok(())
	}

	#[test]
	fn expanded_and_covers() -> Result<()> {
		let bbox = BoundingBox::new(0.0, 0.0, 10.0, 20.0, Crs::WebMercator)?.expanded(1.0, 2.0);
		assert_eq!(bbox.as_array(), [-1.0, -2.0, 11.0, 22.0]);
		assert!(bbox.covers(-1.0, 22.0));
		assert!(bbox.covers(5.0, 5.0));
		assert!(!bbox.covers(11.5, 5.0));
		assert!(!bbox.covers(5.0, -2.1));
		Ok(())
	}
}
