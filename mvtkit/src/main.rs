mod geojson;
mod tools;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{ErrorLevel, Verbosity};

#[derive(Parser, Debug)]
#[command(
	author,
	version,
	about,
	long_about = None,
	propagate_version = true,
	disable_help_subcommand = true,
)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	#[command(flatten)]
	verbose: Verbosity<ErrorLevel>,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// Encode GeoJSON features into a Mapbox Vector Tile
	Encode(tools::encode::Subcommand),

	/// Show the layers and features of a Mapbox Vector Tile
	Probe(tools::probe::Subcommand),
}

fn main() -> Result<()> {
	let cli = Cli::parse();

	env_logger::Builder::new()
		.filter_level(cli.verbose.log_level_filter())
		.format_timestamp(None)
		.init();

	run(cli)
}

fn run(cli: Cli) -> Result<()> {
	match &cli.command {
		Commands::Encode(arguments) => tools::encode::run(arguments),
		Commands::Probe(arguments) => tools::probe::run(arguments),
	}
}
