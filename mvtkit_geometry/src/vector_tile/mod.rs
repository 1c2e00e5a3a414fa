//! Mapbox Vector Tile (MVT) support.
//!
//! - [`command`]: the integer command stream of feature geometries.
//! - [`encoder`]: builds a tile from filtered features, see [`VectorTileEncoder`].
//! - `feature`, `layer`, `tile`: the protobuf messages, readable and writable.
//! - `property_manager`: the per-layer key and value dictionaries.
//! - `value`: typed MVT property values.

pub mod command;
pub mod encoder;
mod feature;
mod geometry_type;
mod layer;
mod property_manager;
mod tile;
mod value;

pub use encoder::{EncoderOptions, VectorTileEncoder};
pub use feature::VectorTileFeature;
pub use geometry_type::GeomType;
pub use layer::{DEFAULT_EXTENT, DEFAULT_VERSION, VectorTileLayer};
pub use property_manager::{PropertyManager, TagDictionary};
pub use tile::VectorTile;
pub use value::GeoValuePBF;
