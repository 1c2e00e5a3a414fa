//! Reads GeoJSON into [`GeoFeature`]s.
//!
//! Accepts a `FeatureCollection`, a single `Feature` or a bare geometry. Features without geometry are
//! skipped. Nested property values (arrays, objects) are kept as their JSON text.

use anyhow::{Context, Result, anyhow, bail, ensure};
use log::warn;
use mvtkit_geometry::geo::{GeoFeature, GeoProperties, GeoValue, Geometry};
use serde_json::{Map, Value};
use std::{fs::File, io::BufReader, path::Path};

pub fn read_features(path: &Path) -> Result<Vec<GeoFeature>> {
	let file = File::open(path).with_context(|| format!("Failed to open {path:?}"))?;
	let value: Value =
		serde_json::from_reader(BufReader::new(file)).with_context(|| format!("Failed to parse JSON in {path:?}"))?;
	parse_features(&value).with_context(|| format!("Failed to read GeoJSON from {path:?}"))
}

pub fn parse_features(value: &Value) -> Result<Vec<GeoFeature>> {
	let object = value.as_object().ok_or(anyhow!("GeoJSON must be an object"))?;
	match type_of(object)? {
		"FeatureCollection" => {
			let features = object
				.get("features")
				.and_then(Value::as_array)
				.ok_or(anyhow!("FeatureCollection must have a 'features' array"))?;
			let mut result = Vec::with_capacity(features.len());
			for (index, feature) in features.iter().enumerate() {
				if let Some(feature) = parse_feature(feature).with_context(|| format!("Failed to parse feature {index}"))? {
					result.push(feature);
				}
			}
			Ok(result)
		}
		"Feature" => Ok(parse_feature(value)?.into_iter().collect()),
		_ => Ok(vec![GeoFeature::new(parse_geometry(value)?)]),
	}
}

fn type_of(object: &Map<String, Value>) -> Result<&str> {
	object
		.get("type")
		.and_then(Value::as_str)
		.ok_or(anyhow!("GeoJSON object must have a 'type'"))
}

fn parse_feature(value: &Value) -> Result<Option<GeoFeature>> {
	let object = value.as_object().ok_or(anyhow!("feature must be an object"))?;
	ensure!(type_of(object)? == "Feature", "expected a Feature, got '{}'", type_of(object)?);

	let geometry = match object.get("geometry") {
		None | Some(Value::Null) => {
			warn!("skipping feature without geometry");
			return Ok(None);
		}
		Some(geometry) => parse_geometry(geometry)?,
	};

	let properties = match object.get("properties") {
		None | Some(Value::Null) => GeoProperties::new(),
		Some(Value::Object(map)) => map
			.iter()
			.map(|(key, value)| (key.clone(), parse_value(value)))
			.collect(),
		Some(other) => bail!("feature properties must be an object, got {other}"),
	};

	Ok(Some(GeoFeature::with_properties(geometry, properties)))
}

fn parse_value(value: &Value) -> GeoValue {
	match value {
		Value::Null => GeoValue::Null,
		Value::Bool(b) => GeoValue::Bool(*b),
		Value::Number(n) => {
			if let Some(v) = n.as_u64() {
				GeoValue::UInt(v)
			} else if let Some(v) = n.as_i64() {
				GeoValue::Int(v)
			} else {
				GeoValue::Double(n.as_f64().unwrap_or(f64::NAN))
			}
		}
		Value::String(s) => GeoValue::String(s.clone()),
		Value::Array(_) | Value::Object(_) => GeoValue::String(value.to_string()),
	}
}

fn parse_position(value: &Value) -> Result<[f64; 2]> {
	let array = value.as_array().ok_or(anyhow!("position must be an array"))?;
	ensure!(array.len() >= 2, "position must have at least 2 values");
	let x = array[0].as_f64().ok_or(anyhow!("position values must be numbers"))?;
	let y = array[1].as_f64().ok_or(anyhow!("position values must be numbers"))?;
	Ok([x, y])
}

fn parse_array<T>(value: &Value, parse: impl Fn(&Value) -> Result<T>) -> Result<Vec<T>> {
	value
		.as_array()
		.ok_or(anyhow!("coordinates must be an array"))?
		.iter()
		.map(parse)
		.collect()
}

fn parse_line(value: &Value) -> Result<Vec<[f64; 2]>> {
	parse_array(value, parse_position)
}

fn parse_rings(value: &Value) -> Result<Vec<Vec<[f64; 2]>>> {
	parse_array(value, parse_line)
}

pub fn parse_geometry(value: &Value) -> Result<Geometry> {
	let object = value.as_object().ok_or(anyhow!("geometry must be an object"))?;
	let geometry_type = type_of(object)?;

	if geometry_type == "GeometryCollection" {
		let geometries = object
			.get("geometries")
			.ok_or(anyhow!("GeometryCollection must have 'geometries'"))?;
		return Ok(Geometry::GeometryCollection(parse_array(geometries, parse_geometry)?));
	}

	let coordinates = object
		.get("coordinates")
		.ok_or(anyhow!("{geometry_type} must have 'coordinates'"))?;
	Ok(match geometry_type {
		"Point" => Geometry::new_point(parse_position(coordinates)?),
		"MultiPoint" => Geometry::new_multi_point(parse_line(coordinates)?),
		"LineString" => Geometry::new_line_string(parse_line(coordinates)?),
		"MultiLineString" => Geometry::new_multi_line_string(parse_rings(coordinates)?),
		"Polygon" => Geometry::new_polygon(parse_rings(coordinates)?),
		"MultiPolygon" => Geometry::new_multi_polygon(parse_array(coordinates, parse_rings)?),
		other => bail!("unknown geometry type '{other}'"),
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;
	use rstest::rstest;
	use serde_json::json;

	#[test]
	fn feature_collection() -> Result<()> {
		let value = json!({
			"type": "FeatureCollection",
			"features": [
				{
					"type": "Feature",
					"geometry": { "type": "Point", "coordinates": [7.27, 43.7] },
					"properties": { "name": "Nice", "population": 348085, "rank": -2, "area": 71.92, "capital": false, "note": null }
				},
				{ "type": "Feature", "geometry": null, "properties": {} },
				{
					"type": "Feature",
					"geometry": { "type": "LineString", "coordinates": [[0, 0], [1, 1]] },
					"properties": { "tags": ["a", "b"] }
				}
			]
		});
		let features = parse_features(&value)?;
		assert_eq!(features.len(), 2);
		assert_eq!(
			features[0],
			GeoFeature::with_properties(
				Geometry::new_point([7.27, 43.7]),
				GeoProperties::from(vec![
					("name", GeoValue::from("Nice")),
					("population", GeoValue::UInt(348_085)),
					("rank", GeoValue::Int(-2)),
					("area", GeoValue::Double(71.92)),
					("capital", GeoValue::Bool(false)),
					("note", GeoValue::Null),
				])
			)
		);
		assert_eq!(features[1].properties.get("tags"), Some(&GeoValue::from("[\"a\",\"b\"]")));
		Ok(())
	}

	#[test]
	fn properties_keep_file_order() -> Result<()> {
		let value: Value = serde_json::from_str(
			r#"{"type": "Feature", "geometry": {"type": "Point", "coordinates": [0, 0]}, "properties": {"zoo": 1, "avenue": 2, "market": 3}}"#,
		)?;
		let features = parse_features(&value)?;
		let keys: Vec<&String> = features[0].properties.iter().map(|(k, _)| k).collect();
		assert_eq!(keys, vec!["zoo", "avenue", "market"]);
		Ok(())
	}

	#[rstest]
	#[case(json!({"type": "Point", "coordinates": [1, 2]}), Geometry::new_point([1.0, 2.0]))]
	#[case(json!({"type": "MultiPoint", "coordinates": [[1, 2], [3, 4]]}), Geometry::new_multi_point(vec![[1.0, 2.0], [3.0, 4.0]]))]
	#[case(json!({"type": "MultiLineString", "coordinates": [[[1, 2], [3, 4]]]}), Geometry::new_multi_line_string(vec![vec![[1.0, 2.0], [3.0, 4.0]]]))]
	#[case(
		json!({"type": "Polygon", "coordinates": [[[0, 0], [4, 0], [0, 4], [0, 0]]]}),
		Geometry::new_polygon(vec![vec![[0.0, 0.0], [4.0, 0.0], [0.0, 4.0], [0.0, 0.0]]])
	)]
	#[case(
		json!({"type": "MultiPolygon", "coordinates": [[[[0, 0], [4, 0], [0, 4], [0, 0]]]]}),
		Geometry::new_multi_polygon(vec![vec![vec![[0.0, 0.0], [4.0, 0.0], [0.0, 4.0], [0.0, 0.0]]]])
	)]
	#[case(
		json!({"type": "GeometryCollection", "geometries": [{"type": "Point", "coordinates": [1, 2, 3]}]}),
		Geometry::GeometryCollection(vec![Geometry::new_point([1.0, 2.0])])
	)]
	fn geometries(#[case] value: Value, #[case] expected: Geometry) -> Result<()> {
		assert_eq!(parse_geometry(&value)?, expected);
		let features = parse_features(&value)?;
		assert_eq!(features, vec![GeoFeature::new(expected)]);
		Ok(())
	}

	#[rstest]
	#[case(json!([1, 2]), "GeoJSON must be an object")]
	#[case(json!({"coordinates": [1, 2]}), "must have a 'type'")]
	#[case(json!({"type": "Curve", "coordinates": []}), "unknown geometry type 'Curve'")]
	#[case(json!({"type": "Point", "coordinates": [1]}), "at least 2 values")]
	#[case(json!({"type": "Point"}), "Point must have 'coordinates'")]
	#[case(json!({"type": "FeatureCollection"}), "'features' array")]
	#[case(json!({"type": "FeatureCollection", "features": [{"type": "Point"}]}), "expected a Feature")]
	fn invalid(#[case] value: Value, #[case] message: &str) {
		let error = format!("{:#}", parse_features(&value).unwrap_err());
		assert!(error.contains(message), "{error}");
	}
}
