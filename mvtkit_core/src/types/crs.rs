//! Coordinate reference systems understood by the tile projector.
//!
//! Only two systems are needed: Web Mercator, which is the equidistant grid tiles are cut from, and
//! WGS84 longitude/latitude, which is converted to Web Mercator before projecting.

use anyhow::{Result, bail};
use std::{f64::consts::PI, fmt::Display, str::FromStr};

/// Equatorial radius of the spherical Mercator projection in metres.
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Latitude limit of the square Web Mercator world.
pub const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_779_806_59;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Crs {
	/// EPSG:3857, metres.
	#[default]
	WebMercator,
	/// EPSG:4326, degrees with longitude on the x axis.
	Wgs84,
}

impl Crs {
	#[must_use]
	pub fn code(&self) -> &'static str {
		match self {
			Crs::WebMercator => "EPSG:3857",
			Crs::Wgs84 => "EPSG:4326",
		}
	}

	/// Converts a coordinate in this system into Web Mercator metres.
	///
	/// Returns `None` if the result is not finite, e.g. for the poles in WGS84.
	#[must_use]
	pub fn to_web_mercator(&self, x: f64, y: f64) -> Option<(f64, f64)> {
		let (mx, my) = match self {
			Crs::WebMercator => (x, y),
			Crs::Wgs84 => {
				if y.abs() >= 90.0 {
					return None;
				}
				let mx = EARTH_RADIUS * x.to_radians();
				let my = EARTH_RADIUS * (PI / 4.0 + y.to_radians() / 2.0).tan().ln();
				(mx, my)
			}
		};
		(mx.is_finite() && my.is_finite()).then_some((mx, my))
	}

	/// Converts Web Mercator metres back into this system.
	#[must_use]
	pub fn from_web_mercator(&self, x: f64, y: f64) -> (f64, f64) {
		match self {
			Crs::WebMercator => (x, y),
			Crs::Wgs84 => (
				(x / EARTH_RADIUS).to_degrees(),
				(2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees(),
			),
		}
	}
}

impl FromStr for Crs {
	type Err = anyhow::Error;

	fn from_str(s: &str) -> Result<Self> {
		Ok(match s.trim().to_uppercase().as_str() {
			"EPSG:3857" | "EPSG:900913" | "EPSG:3785" | "3857" => Crs::WebMercator,
			"EPSG:4326" | "CRS:84" | "4326" => Crs::Wgs84,
			other => bail!("unknown coordinate reference system '{other}'"),
		})
	}
}

impl Display for Crs {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.code())
	}
}
