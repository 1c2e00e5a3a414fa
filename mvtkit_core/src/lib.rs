//! Core primitives shared by the mvtkit crates.
//!
//! * [`io`] contains the protobuf-oriented value readers and writers.
//! * [`types`] contains [`Blob`], [`BoundingBox`], [`Crs`], [`TileCoord`] and the MIME registry.

pub mod io;
pub mod types;

pub use types::*;
