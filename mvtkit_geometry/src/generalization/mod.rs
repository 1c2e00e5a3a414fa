//! Resolves the simplification factor of a tile.
//!
//! An explicit factor always wins. Otherwise the render scale denominator is turned into a zoom level,
//! which is looked up in the table of the requested (or default) [`GeneralizationLevel`].

mod params;
mod tables;

pub use params::{
	DEFAULT_SMALL_GEOMETRY_THRESHOLD, GeneralizationParams, PARAM_GENERALIZATION_FACTOR, PARAM_GENERALIZATION_LEVEL,
	PARAM_SMALL_GEOMETRY_THRESHOLD,
};
pub use tables::{GeneralizationLevel, GeneralizationTable, GeneralizationTables};

use log::{debug, warn};
use std::sync::Arc;

pub const MIN_ZOOM: i32 = 1;
pub const MAX_ZOOM: i32 = 20;

/// Used whenever no table entry matches.
pub const FALLBACK_FACTOR: f64 = 0.1;

/// Ground resolution of zoom level 0 in meters per pixel.
const MAX_RESOLUTION: f64 = 156_543.03;
/// Pixels per meter of a 96 dpi display.
const PIXELS_PER_METER: f64 = 96.0 * 39.37;

/// Computes the zoom level of a scale denominator.
///
/// The ratio between the resolution of zoom level 0 and the resolution of `scale` is truncated to an
/// integer, its binary logarithm is rounded half up. Returns `None` for scales whose ratio is below 1 or
/// not a number, there is no meaningful zoom level for them.
#[must_use]
pub fn zoom_for_scale(scale: f64) -> Option<i32> {
	let ratio = (MAX_RESOLUTION / (scale / PIXELS_PER_METER)).trunc();
	if !(ratio.is_finite() && ratio >= 1.0) {
		return None;
	}
	Some((ratio.log2() + 0.5).floor() as i32)
}

/// The scale denominator of a map with the given ground resolution in meters per pixel.
#[must_use]
pub fn scale_denominator(meters_per_pixel: f64) -> f64 {
	meters_per_pixel * PIXELS_PER_METER
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Resolution {
	pub factor: f64,
	/// The zoom level the factor was looked up for. `None` if an explicit factor was used or the scale has
	/// no zoom level.
	pub zoom: Option<i32>,
}

impl Default for Resolution {
	fn default() -> Self {
		Resolution {
			factor: FALLBACK_FACTOR,
			zoom: None,
		}
	}
}

#[derive(Clone, Debug, Default)]
pub struct GeneralizationResolver {
	tables: Arc<GeneralizationTables>,
}

impl GeneralizationResolver {
	#[must_use]
	pub fn new(tables: Arc<GeneralizationTables>) -> GeneralizationResolver {
		GeneralizationResolver { tables }
	}

	#[must_use]
	pub fn tables(&self) -> &GeneralizationTables {
		&self.tables
	}

	pub fn resolve(&self, scale: f64, explicit_factor: Option<f64>, level: Option<GeneralizationLevel>) -> Resolution {
		if let Some(factor) = explicit_factor {
			debug!("using explicit generalization factor {factor}");
			return Resolution { factor, zoom: None };
		}

		let zoom = zoom_for_scale(scale);
		let level = level.unwrap_or(self.tables.default_level);

		let Some(zoom) = zoom.filter(|zoom| (MIN_ZOOM..=MAX_ZOOM).contains(zoom)) else {
			warn!(
				"computed zoom level ({zoom:?}) for scale {scale} is out of range, using default generalization ({FALLBACK_FACTOR})"
			);
			return Resolution {
				factor: FALLBACK_FACTOR,
				zoom,
			};
		};

		let table = match self.tables.table(level) {
			Some(table) => table,
			None => {
				warn!(
					"no generalization table for level '{level}', using the default level '{}'",
					self.tables.default_level
				);
				match self.tables.table(self.tables.default_level) {
					Some(table) => table,
					None => {
						return Resolution {
							factor: FALLBACK_FACTOR,
							zoom: Some(zoom),
						};
					}
				}
			}
		};

		let factor = table.get(zoom).unwrap_or_else(|| {
			warn!("generalization level '{level}' has no entry for zoom level {zoom}, using default generalization ({FALLBACK_FACTOR})");
			FALLBACK_FACTOR
		});
		debug!("resolved scale {scale} to zoom level {zoom} and generalization factor {factor} ({level})");
		Resolution {
			factor,
			zoom: Some(zoom),
		}
	}

	/// Like [`resolve`](Self::resolve), with the level given by name. Unknown names fall back to the
	/// default level.
	pub fn resolve_named(&self, scale: f64, explicit_factor: Option<f64>, level: Option<&str>) -> Resolution {
		let level = level.and_then(|name| match name.parse::<GeneralizationLevel>() {
			Ok(level) => Some(level),
			Err(error) => {
				warn!("{error}, using the default level '{}'", self.tables.default_level);
				None
			}
		});
		self.resolve(scale, explicit_factor, level)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use approx::assert_relative_eq;
	use rstest::rstest;

	/// Scale denominator of zoom level `z` at 96 dpi.
	fn scale_of_zoom(z: i32) -> f64 {
		MAX_RESOLUTION / 2f64.powi(z) * PIXELS_PER_METER
	}

	#[rstest]
	#[case(1)]
	#[case(5)]
	#[case(12)]
	#[case(20)]
	fn zoom_of_standard_scales(#[case] z: i32) {
		assert_eq!(zoom_for_scale(scale_of_zoom(z)), Some(z));
	}

	#[rstest]
	#[case(144_447.64, Some(12))]
	#[case(144_447.0, Some(12))]
	#[case(100_000.0, Some(13))]
	#[case(200_000.0, Some(12))]
	#[case(559_082_264.0, Some(0))]
	#[case(1e12, None)]
	#[case(0.0, None)]
	#[case(-5.0, None)]
	#[case(f64::NAN, None)]
	fn zoom_rounding(#[case] scale: f64, #[case] expected: Option<i32>) {
		assert_eq!(zoom_for_scale(scale), expected);
	}

	#[test]
	fn scale_of_a_resolution() {
		assert_relative_eq!(scale_denominator(1.0), 3779.52, epsilon = 1e-9);
		assert_eq!(zoom_for_scale(scale_denominator(MAX_RESOLUTION / 4096.0)), Some(12));
	}

	fn resolver() -> GeneralizationResolver {
		let mut tables = GeneralizationTables::default();
		tables
			.tables
			.get_mut(&GeneralizationLevel::High)
			.unwrap()
			.insert(12, 0.875);
		GeneralizationResolver::new(Arc::new(tables))
	}

	#[test]
	fn explicit_factor_wins() {
		let resolution = resolver().resolve(scale_of_zoom(12), Some(0.3), Some(GeneralizationLevel::High));
		assert_eq!(resolution, Resolution { factor: 0.3, zoom: None });
	}

	#[test]
	fn zoom_12_uses_the_table_entry() {
		let resolution = resolver().resolve(scale_of_zoom(12), None, Some(GeneralizationLevel::High));
		assert_eq!(
			resolution,
			Resolution {
				factor: 0.875,
				zoom: Some(12)
			}
		);
	}

	#[rstest]
	#[case(None, 0.25)]
	#[case(Some(GeneralizationLevel::Low), 0.1)]
	#[case(Some(GeneralizationLevel::Mid), 0.25)]
	fn levels(#[case] level: Option<GeneralizationLevel>, #[case] expected: f64) {
		assert_eq!(resolver().resolve(scale_of_zoom(9), None, level).factor, expected);
	}

	#[rstest]
	#[case(559_082_264.0, Some(0))]
	#[case(scale_of_zoom(22), Some(22))]
	#[case(1e12, None)]
	fn out_of_range_falls_back(#[case] scale: f64, #[case] zoom: Option<i32>) {
		assert_eq!(
			resolver().resolve(scale, None, None),
			Resolution {
				factor: FALLBACK_FACTOR,
				zoom
			}
		);
	}

	#[test]
	fn missing_entry_falls_back() -> anyhow::Result<()> {
		let tables = GeneralizationTables::from_str("tables:\n  mid:\n    3: 0.7\n")?;
		let resolver = GeneralizationResolver::new(Arc::new(tables));
		assert_eq!(resolver.resolve(scale_of_zoom(3), None, None).factor, 0.7);
		assert_eq!(resolver.resolve(scale_of_zoom(4), None, None).factor, FALLBACK_FACTOR);
		// the level has no table, so the default level is used
		assert_eq!(
			resolver.resolve(scale_of_zoom(3), None, Some(GeneralizationLevel::High)).factor,
			0.7
		);
		Ok(())
	}

	#[rstest]
	#[case(Some("HIGH"), 0.5)]
	#[case(Some("mid"), 0.25)]
	#[case(Some("extreme"), 0.25)]
	#[case(None, 0.25)]
	fn named_levels(#[case] name: Option<&str>, #[case] expected: f64) {
		assert_eq!(resolver().resolve_named(scale_of_zoom(10), None, name).factor, expected);
	}
}
