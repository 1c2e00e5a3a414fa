use crate::geojson::read_features;
use anyhow::{Context, Result, bail, ensure};
use clap::ArgGroup;
use log::info;
use mvtkit_core::{
	BoundingBox, Crs, TileCoord,
	mime::{MVT_MIME_TYPE, is_mvt_mime},
};
use mvtkit_geometry::{
	generalization::{
		GeneralizationParams, GeneralizationTables, PARAM_GENERALIZATION_FACTOR, PARAM_GENERALIZATION_LEVEL,
		PARAM_SMALL_GEOMETRY_THRESHOLD,
	},
	writer::{MvtWriter, WriterOptions},
};
use std::{
	collections::HashMap,
	fs::File,
	io::BufWriter,
	path::PathBuf,
	sync::Arc,
};

#[derive(clap::Args, Debug)]
#[command(
	arg_required_else_help = true,
	disable_version_flag = true,
	group(ArgGroup::new("area").required(true).args(["tile", "bbox"]))
)]
pub struct Subcommand {
	/// GeoJSON file with a FeatureCollection, a Feature or a geometry
	#[arg()]
	input_file: PathBuf,

	/// where to write the vector tile
	#[arg()]
	output_file: PathBuf,

	/// tile to encode
	#[arg(long, short, value_name = "z/x/y", display_order = 1)]
	tile: Option<TileCoord>,

	/// area to encode, in the coordinates of --crs
	#[arg(
		long,
		short,
		value_name = "x_min,y_min,x_max,y_max",
		allow_hyphen_values = true,
		display_order = 1
	)]
	bbox: Option<String>,

	/// coordinate reference system of the input features
	#[arg(long, value_name = "CRS", default_value = "EPSG:4326", display_order = 1)]
	crs: Crs,

	/// layer name, defaults to the name of the input file
	#[arg(long, short, display_order = 2)]
	layer: Option<String>,

	/// number of grid cells along one side of the tile
	#[arg(long, value_name = "int", default_value_t = 4096, display_order = 2)]
	extent: u32,

	/// tile size in pixels
	#[arg(long, value_name = "int", default_value_t = 256, display_order = 2)]
	tile_size: u32,

	/// buffer around the tile in pixels
	#[arg(long, value_name = "int", default_value_t = 10, display_order = 2)]
	buffer: u32,

	/// simplification tolerance in square pixels, overrides the generalization tables
	#[arg(long, value_name = "float", display_order = 3)]
	gen_factor: Option<String>,

	/// generalization level: low, mid or high
	#[arg(long, value_name = "LEVEL", display_order = 3)]
	gen_level: Option<String>,

	/// area in square pixels below which geometries are dropped
	#[arg(long, value_name = "float", display_order = 3)]
	small_geom_threshold: Option<String>,

	/// render scale denominator, derived from the tile size if missing
	#[arg(long, value_name = "float", display_order = 3)]
	scale: Option<f64>,

	/// YAML file with generalization tables
	#[arg(long, value_name = "FILE", display_order = 3)]
	gen_config: Option<PathBuf>,

	/// write an empty layer instead of an empty file if nothing was encoded
	#[arg(long, display_order = 4)]
	avoid_empty: bool,

	/// requested output MIME type
	#[arg(long, value_name = "MIME", default_value = MVT_MIME_TYPE, display_order = 4)]
	format: String,
}

pub fn run(arguments: &Subcommand) -> Result<()> {
	eprintln!("encode {:?} into {:?}", arguments.input_file, arguments.output_file);

	ensure!(
		is_mvt_mime(&arguments.format),
		"'{}' is not a vector tile format",
		arguments.format
	);

	let features = read_features(&arguments.input_file)?;
	let layer_name = get_layer_name(arguments)?;
	let mut writer = MvtWriter::new(get_bbox(arguments)?, get_options(arguments)?)?;

	let added = writer.add_features(&layer_name, &features)?;
	info!(
		"{added} of {} features encoded with generalization {:?}",
		features.len(),
		writer.resolution()
	);

	let file = File::create(&arguments.output_file)
		.with_context(|| format!("Failed to create {:?}", arguments.output_file))?;
	writer.write_to(BufWriter::new(file))?;

	eprintln!("finished encoding {added} features into layer '{layer_name}'");

	Ok(())
}

fn get_bbox(arguments: &Subcommand) -> Result<BoundingBox> {
	match (&arguments.tile, &arguments.bbox) {
		(Some(tile), None) => tile.to_bbox(arguments.crs),
		(None, Some(bbox)) => BoundingBox::parse(bbox, arguments.crs),
		_ => bail!("use either --tile or --bbox"),
	}
}

fn get_layer_name(arguments: &Subcommand) -> Result<String> {
	if let Some(layer) = &arguments.layer {
		return Ok(layer.clone());
	}
	arguments
		.input_file
		.file_stem()
		.and_then(|stem| stem.to_str())
		.map(str::to_string)
		.with_context(|| format!("Failed to derive a layer name from {:?}, use --layer", arguments.input_file))
}

fn get_options(arguments: &Subcommand) -> Result<WriterOptions> {
	let mut params = HashMap::new();
	for (key, value) in [
		(PARAM_GENERALIZATION_FACTOR, &arguments.gen_factor),
		(PARAM_GENERALIZATION_LEVEL, &arguments.gen_level),
		(PARAM_SMALL_GEOMETRY_THRESHOLD, &arguments.small_geom_threshold),
	] {
		if let Some(value) = value {
			params.insert(key.to_string(), value.clone());
		}
	}
	let params = GeneralizationParams::from_params(&params);

	let generalization_tables = match &arguments.gen_config {
		Some(path) => GeneralizationTables::from_path(path)?,
		None => GeneralizationTables::default(),
	};

	Ok(WriterOptions {
		tile_size: arguments.tile_size,
		buffer: arguments.buffer,
		extent: arguments.extent,
		simplification_factor: params.gen_factor,
		generalization_level: params.gen_level,
		scale_denominator: arguments.scale,
		generalization_tables: Arc::new(generalization_tables),
		small_geometry_threshold: params.small_geometry_threshold,
		avoid_empty_output: arguments.avoid_empty,
		..WriterOptions::default()
	})
}
