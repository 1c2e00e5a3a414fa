use super::GeneralizationLevel;
use log::warn;
use std::collections::HashMap;

pub const PARAM_GENERALIZATION_FACTOR: &str = "gen_factor";
pub const PARAM_GENERALIZATION_LEVEL: &str = "gen_level";
pub const PARAM_SMALL_GEOMETRY_THRESHOLD: &str = "small_geom_threshold";

pub const DEFAULT_SMALL_GEOMETRY_THRESHOLD: f64 = 0.05;

/// Generalization settings taken from request parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneralizationParams {
	pub gen_factor: Option<f64>,
	pub gen_level: Option<GeneralizationLevel>,
	pub small_geometry_threshold: f64,
}

impl Default for GeneralizationParams {
	fn default() -> Self {
		GeneralizationParams {
			gen_factor: None,
			gen_level: None,
			small_geometry_threshold: DEFAULT_SMALL_GEOMETRY_THRESHOLD,
		}
	}
}

fn parse_number(params: &HashMap<String, String>, key: &str) -> Option<f64> {
	let text = params.get(key)?;
	match text.trim().parse::<f64>() {
		Ok(value) if value.is_finite() => Some(value),
		_ => {
			warn!("ignoring parameter {key}={text:?}, it is not a number");
			None
		}
	}
}

impl GeneralizationParams {
	/// Reads `gen_factor`, `gen_level` and `small_geom_threshold`. Values that cannot be parsed are
	/// ignored with a warning. A level is only read when no factor is given.
	#[must_use]
	pub fn from_params(params: &HashMap<String, String>) -> GeneralizationParams {
		let gen_factor = parse_number(params, PARAM_GENERALIZATION_FACTOR);

		let gen_level = match (gen_factor, params.get(PARAM_GENERALIZATION_LEVEL)) {
			(None, Some(name)) => match name.parse::<GeneralizationLevel>() {
				Ok(level) => Some(level),
				Err(error) => {
					warn!("{error}, using the default level");
					None
				}
			},
			_ => None,
		};

		GeneralizationParams {
			gen_factor,
			gen_level,
			small_geometry_threshold: parse_number(params, PARAM_SMALL_GEOMETRY_THRESHOLD)
				.unwrap_or(DEFAULT_SMALL_GEOMETRY_THRESHOLD),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;
	use rstest::rstest;

	fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
		pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
	}

	#[rstest]
	#[case(&[], None, None, 0.05)]
	#[case(&[("gen_factor", "0.3")], Some(0.3), None, 0.05)]
	#[case(&[("gen_factor", "0.3"), ("gen_level", "high")], Some(0.3), None, 0.05)]
	#[case(&[("gen_factor", "abc"), ("gen_level", "HIGH")], None, Some(GeneralizationLevel::High), 0.05)]
	#[case(&[("gen_level", "unknown")], None, None, 0.05)]
	#[case(&[("small_geom_threshold", "0")], None, None, 0.0)]
	#[case(&[("small_geom_threshold", "-1.5")], None, None, -1.5)]
	#[case(&[("small_geom_threshold", "lots")], None, None, 0.05)]
	#[case(&[("gen_factor", "inf")], None, None, 0.05)]
	fn from_params(
		#[case] pairs: &[(&str, &str)],
		#[case] gen_factor: Option<f64>,
		#[case] gen_level: Option<GeneralizationLevel>,
		#[case] small_geometry_threshold: f64,
	) {
		assert_eq!(
			GeneralizationParams::from_params(&params(pairs)),
			GeneralizationParams {
				gen_factor,
				gen_level,
				small_geometry_threshold
			}
		);
	}
}
