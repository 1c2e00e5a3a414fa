//! Slippy map tile coordinates (`z/x/y`) and their conversion into bounding boxes.
//!
//! The y axis counts from the north edge downwards, as in XYZ tile URLs.

use super::{BoundingBox, Crs, EARTH_RADIUS};
use anyhow::{Context, Result, ensure};
use std::{f64::consts::PI, fmt::Display, str::FromStr};

pub const MAX_ZOOM_LEVEL: u8 = 30;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileCoord {
	pub level: u8,
	pub x: u32,
	pub y: u32,
}

impl TileCoord {
	pub fn new(level: u8, x: u32, y: u32) -> Result<TileCoord> {
		ensure!(level <= MAX_ZOOM_LEVEL, "level ({level}) must be <= {MAX_ZOOM_LEVEL}");
		let max = 1u64 << level;
		ensure!(u64::from(x) < max, "x ({x}) must be < {max} at level {level}");
		ensure!(u64::from(y) < max, "y ({y}) must be < {max} at level {level}");
		Ok(TileCoord { level, x, y })
	}

	/// Returns the tile containing the given longitude/latitude, clamped to the valid tile range.
	pub fn from_geo(lon: f64, lat: f64, level: u8) -> Result<TileCoord> {
		ensure!(level <= MAX_ZOOM_LEVEL, "level ({level}) must be <= {MAX_ZOOM_LEVEL}");
		ensure!(lon.is_finite() && lat.is_finite(), "coordinates must be finite");
		let n = f64::from(1u32 << level);
		let lat_rad = lat.to_radians();

		let x = ((lon + 180.0) / 360.0 * n).floor();
		let y = ((1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * n).floor();

		let clamp = |v: f64| if v.is_nan() { 0.0 } else { v.clamp(0.0, n - 1.0) };
		TileCoord::new(level, clamp(x) as u32, clamp(y) as u32)
	}

	fn size(&self) -> f64 {
		f64::from(1u32 << self.level)
	}

	/// Bounding box in Web Mercator metres.
	pub fn to_mercator_bbox(&self) -> Result<BoundingBox> {
		let n = self.size();
		let x_of = |x: f64| EARTH_RADIUS * PI * (2.0 * x / n - 1.0);
		let y_of = |y: f64| EARTH_RADIUS * PI * (1.0 - 2.0 * y / n);
		let x = f64::from(self.x);
		let y = f64::from(self.y);
		BoundingBox::new(x_of(x), y_of(y + 1.0), x_of(x + 1.0), y_of(y), Crs::WebMercator)
	}

	/// Bounding box in WGS84 degrees.
	pub fn to_geo_bbox(&self) -> Result<BoundingBox> {
		let n = self.size();
		let lon_of = |x: f64| x / n * 360.0 - 180.0;
		let lat_of = |y: f64| (PI - 2.0 * PI * y / n).sinh().atan().to_degrees();
		let x = f64::from(self.x);
		let y = f64::from(self.y);
		BoundingBox::new(lon_of(x), lat_of(y + 1.0), lon_of(x + 1.0), lat_of(y), Crs::Wgs84)
	}

	/// Bounding box in the requested coordinate reference system.
	pub fn to_bbox(&self, crs: Crs) -> Result<BoundingBox> {
		match crs {
			Crs::WebMercator => self.to_mercator_bbox(),
			Crs::Wgs84 => self.to_geo_bbox(),
		}
	}
}

impl FromStr for TileCoord {
	type Err = anyhow::Error;

	/// Parses `"z/x/y"`.
	fn from_str(s: &str) -> Result<Self> {
		let parts: Vec<&str> = s.trim().split('/').collect();
		ensure!(parts.len() == 3, "tile coordinate must look like 'z/x/y', got '{s}'");
		let level = parts[0].parse::<u8>().context("Failed to parse tile level")?;
		let x = parts[1].parse::<u32>().context("Failed to parse tile x")?;
		let y = parts[2].parse::<u32>().context("Failed to parse tile y")?;
		TileCoord::new(level, x, y)
	}
}

impl Display for TileCoord {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}/{}/{}", self.level, self.x, self.y)
	}
}
