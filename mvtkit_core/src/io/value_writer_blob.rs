//! This module provides the `ValueWriterBlob` struct for writing values to an in-memory blob of data.
//!
//! # Examples
//!
//! ```rust
//! use mvtkit_core::io::{ValueWriter, ValueWriterBlob};
//! use anyhow::Result;
//!
//! fn main() -> Result<()> {
//!     let mut writer = ValueWriterBlob::new_le();
//!     writer.write_varint(1025)?;
//!     assert_eq!(writer.into_blob().into_vec(), vec![0b10000001, 0b00001000]);
//!     Ok(())
//! }
//! ```

use super::ValueWriter;
use crate::Blob;
use anyhow::Result;
use byteorder::{ByteOrder, LittleEndian};
use std::io::{Cursor, Write};
use std::marker::PhantomData;

/// A struct that provides writing capabilities to an in-memory blob using a specified byte order.
pub struct ValueWriterBlob<E: ByteOrder> {
	_phantom: PhantomData<E>,
	cursor: Cursor<Vec<u8>>,
}

impl<E: ByteOrder> ValueWriterBlob<E> {
	#[must_use]
	pub fn new() -> ValueWriterBlob<E> {
		ValueWriterBlob {
			_phantom: PhantomData,
			cursor: Cursor::new(Vec::new()),
		}
	}

	/// Converts the written data into a `Blob`.
	#[must_use]
	pub fn into_blob(self) -> Blob {
		Blob::from(self.cursor.into_inner())
	}
}

impl ValueWriterBlob<LittleEndian> {
	/// Creates a new `ValueWriterBlob` instance with little-endian byte order, as used by protobuf.
	#[must_use]
	pub fn new_le() -> ValueWriterBlob<LittleEndian> {
		ValueWriterBlob::new()
	}
}

impl<E: ByteOrder> Default for ValueWriterBlob<E> {
	fn default() -> Self {
		Self::new()
	}
}

impl<E: ByteOrder> ValueWriter<E> for ValueWriterBlob<E> {
	fn get_writer(&mut self) -> &mut dyn Write {
		&mut self.cursor
	}

	fn position(&mut self) -> Result<u64> {
		Ok(self.cursor.position())
	}
}
