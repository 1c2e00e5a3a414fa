//! Readers and writers for the little-endian protobuf primitives that make up a vector tile.

mod value_reader;
mod value_reader_slice;
mod value_writer;
mod value_writer_blob;
mod value_writer_stream;

pub use value_reader::*;
pub use value_reader_slice::*;
pub use value_writer::*;
pub use value_writer_blob::*;
pub use value_writer_stream::*;
