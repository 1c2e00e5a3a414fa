mod blob;
mod bounding_box;
mod crs;
pub mod mime;
mod tile_coord;

pub use blob::*;
pub use bounding_box::*;
pub use crs::*;
pub use tile_coord::*;
