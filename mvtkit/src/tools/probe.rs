use anyhow::Result;
use mvtkit_core::{Blob, mime::MVT_MIME_TYPE};
use mvtkit_geometry::vector_tile::{GeomType, VectorTile, VectorTileLayer};
use std::{collections::BTreeMap, fmt::Write, path::PathBuf};

#[derive(clap::Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// vector tile you want to probe, uncompressed
	#[arg(required = true)]
	filename: PathBuf,

	/// also list every feature with its properties and geometry
	#[arg(long, short)]
	features: bool,
}

pub fn run(arguments: &Subcommand) -> Result<()> {
	eprintln!("probe {:?}", arguments.filename);

	let blob = Blob::load_from_file(&arguments.filename)?;
	print!("{}", describe(&blob, arguments.features)?);

	Ok(())
}

fn describe(blob: &Blob, list_features: bool) -> Result<String> {
	let tile = VectorTile::from_blob(blob)?;

	let mut text = String::new();
	writeln!(text, "type: {MVT_MIME_TYPE}")?;
	writeln!(text, "size: {} bytes", blob.len())?;
	writeln!(text, "layers: {}", tile.layers.len())?;

	for layer in &tile.layers {
		describe_layer(&mut text, layer, list_features)?;
	}

	Ok(text)
}

fn describe_layer(text: &mut String, layer: &VectorTileLayer, list_features: bool) -> Result<()> {
	writeln!(text, "layer {:?}:", layer.name)?;
	writeln!(text, "  version: {}", layer.version)?;
	writeln!(text, "  extent: {}", layer.extent)?;
	writeln!(text, "  features: {}", layer.features.len())?;

	let mut types = BTreeMap::<&str, usize>::new();
	for feature in &layer.features {
		*types.entry(geom_type_name(feature.geom_type)).or_default() += 1;
	}
	for (name, count) in types {
		writeln!(text, "    {name}: {count}")?;
	}

	let keys = layer.property_manager.iter_key().cloned().collect::<Vec<_>>();
	writeln!(text, "  keys: {}", keys.join(", "))?;
	let values = layer
		.property_manager
		.iter_val()
		.map(ToString::to_string)
		.collect::<Vec<_>>();
	writeln!(text, "  values: {}", values.join(", "))?;

	if list_features {
		for (index, feature) in layer.to_features()?.iter().enumerate() {
			writeln!(text, "  feature {index}:")?;
			for (key, value) in feature.properties.iter() {
				writeln!(text, "    {key}: {value}")?;
			}
			writeln!(text, "    geometry: {:?}", feature.geometry)?;
		}
	}

	Ok(())
}

fn geom_type_name(geom_type: GeomType) -> &'static str {
	match geom_type {
		GeomType::Unknown => "unknown",
		GeomType::Point => "point",
		GeomType::LineString => "linestring",
		GeomType::Polygon => "polygon",
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::tests::run_command;
	use mvtkit_geometry::{
		geo::{GeoProperties, GeoValue, Geometry},
		vector_tile::{EncoderOptions, VectorTileEncoder},
	};
	use pretty_assertions::assert_eq;
	use tempfile::tempdir;

	fn example() -> Result<Blob> {
		let mut encoder = VectorTileEncoder::new(EncoderOptions::default())?;
		encoder.add_feature(
			"pois",
			&GeoProperties::from(vec![("name", GeoValue::from("Nice"))]),
			&Geometry::new_point([128.0, 128.0]),
		);
		encoder.add_feature(
			"pois",
			&GeoProperties::from(vec![("name", GeoValue::from("Berlin"))]),
			&Geometry::new_point([64.0, 32.0]),
		);
		encoder.encode()
	}

	#[test]
	fn summary() -> Result<()> {
		let blob = example()?;
		assert_eq!(
			describe(&blob, false)?,
			format!(
				"type: application/vnd.mapbox-vector-tile\nsize: {} bytes\nlayers: 1\nlayer \"pois\":\n  version: 2\n  extent: 4096\n  features: 2\n    point: 2\n  keys: name\n  values: Nice, Berlin\n",
				blob.len()
			)
		);
		Ok(())
	}

	#[test]
	fn feature_list() -> Result<()> {
		let text = describe(&example()?, true)?;
		assert!(text.contains("  feature 1:\n    name: Berlin\n    geometry: "), "{text}");
		Ok(())
	}

	#[test]
	fn probe_file() -> Result<()> {
		let dir = tempdir()?;
		let path = dir.path().join("tile.pbf");
		example()?.save_to_file(&path)?;
		run_command(vec!["mvtkit", "probe", "-q", "--features", path.to_str().unwrap()])?;
		Ok(())
	}

	#[test]
	fn probe_garbage() -> Result<()> {
		let dir = tempdir()?;
		let path = dir.path().join("tile.pbf");
		Blob::from(vec![0x08, 0x01]).save_to_file(&path)?;
		assert!(run_command(vec!["mvtkit", "probe", path.to_str().unwrap()]).is_err());
		Ok(())
	}
}
