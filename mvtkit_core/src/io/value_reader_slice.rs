//! This module provides the `ValueReaderSlice` struct for reading values from a byte slice.
//!
//! # Examples
//!
//! ```rust
//! use mvtkit_core::io::{ValueReader, ValueReaderSlice};
//! use anyhow::Result;
//!
//! fn main() -> Result<()> {
//!     let mut reader = ValueReaderSlice::new_le(&[0x0A, 0x02, b'h', b'i']);
//!     assert_eq!(reader.read_pbf_key()?, (1, 2));
//!     assert_eq!(reader.read_pbf_string()?, "hi");
//!     Ok(())
//! }
//! ```

use super::{SeekRead, ValueReader};
use anyhow::{Result, anyhow, bail};
use byteorder::{ByteOrder, LittleEndian};
use std::{io::Cursor, marker::PhantomData};

/// A struct that provides reading capabilities from a byte slice using a specified byte order.
pub struct ValueReaderSlice<'a, E: ByteOrder> {
	_phantom: PhantomData<E>,
	cursor: Cursor<&'a [u8]>,
	len: u64,
}

impl<'a, E: ByteOrder> ValueReaderSlice<'a, E> {
	#[must_use]
	pub fn new(slice: &'a [u8]) -> ValueReaderSlice<'a, E> {
		ValueReaderSlice {
			_phantom: PhantomData,
			len: slice.len() as u64,
			cursor: Cursor::new(slice),
		}
	}
}

impl<'a> ValueReaderSlice<'a, LittleEndian> {
	/// Creates a new `ValueReaderSlice` with little-endian byte order, as used by protobuf.
	#[must_use]
	pub fn new_le(slice: &'a [u8]) -> ValueReaderSlice<'a, LittleEndian> {
		ValueReaderSlice::new(slice)
	}
}

impl SeekRead for Cursor<&[u8]> {}

impl<'a, E: ByteOrder + 'a> ValueReader<'a, E> for ValueReaderSlice<'a, E> {
	fn get_reader(&mut self) -> &mut dyn SeekRead {
		&mut self.cursor
	}

	fn len(&self) -> u64 {
		self.len
	}

	fn position(&mut self) -> u64 {
		self.cursor.position()
	}

	fn get_sub_reader<'b>(&'b mut self, length: u64) -> Result<Box<dyn ValueReader<'b, E> + 'b>>
	where
		E: 'b,
	{
		let start = self.cursor.position();
		let end = start + length;
		if end > self.len {
			bail!("Requested sub-reader length exceeds remaining data");
		}

		self.cursor.set_position(end);
		Ok(Box::new(ValueReaderSlice {
			_phantom: PhantomData,
			len: length,
			cursor: Cursor::new(
				self
					.cursor
					.get_ref()
					.get(start as usize..end as usize)
					.ok_or(anyhow!("out of bounds"))?,
			),
		}))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_len() {
		let reader = ValueReaderSlice::new_le(&[0x80; 42]);
		assert_eq!(reader.len(), 42);
	}

	#[test]
	fn test_sub_reader() -> Result<()> {
		let data = [0x03, 0x08, 0x96, 0x01, 0xFF];
		let mut reader = ValueReaderSlice::new_le(&data);
		{
			let mut sub = reader.get_pbf_sub_reader()?;
			assert_eq!(sub.len(), 3);
			assert_eq!(sub.read_pbf_key()?, (1, 0));
			assert_eq!(sub.read_varint()?, 150);
			assert!(!sub.has_remaining());
		}
		assert_eq!(reader.position(), 4);
		assert_eq!(reader.remaining(), 1);
		Ok(())
	}

	#[test]
	fn test_sub_reader_too_long() {
		let mut reader = ValueReaderSlice::new_le(&[0x05, 0x01]);
		assert!(reader.get_pbf_sub_reader().is_err());
	}
}
