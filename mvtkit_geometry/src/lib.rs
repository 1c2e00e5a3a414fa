//! Vector tile encoding pipeline.
//!
//! Features enter through [`writer::MvtWriter`], are projected by [`projection::TileProjector`],
//! filtered by [`pipeline::GeometryFilter`] and serialized by [`vector_tile::VectorTileEncoder`].
//! [`generalization`] turns scale denominators and qualitative levels into simplification factors.

pub mod error;
pub mod generalization;
pub mod geo;
pub mod pipeline;
pub mod projection;
pub mod vector_tile;
pub mod writer;

pub use error::TileError;
