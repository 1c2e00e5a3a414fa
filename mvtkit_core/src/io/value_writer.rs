//! This module defines the `ValueWriter` trait for writing protobuf-encoded values.
//!
//! # Overview
//!
//! The `ValueWriter` trait provides an interface for writing varints, zigzag varints, floating-point numbers,
//! strings and Protocol Buffers fields to any destination. Implementations only supply the underlying
//! [`std::io::Write`] and the current position; all encoding logic lives in the provided methods.
//!
//! # Examples
//!
//! ```rust
//! use mvtkit_core::io::{ValueWriter, ValueWriterBlob};
//! use anyhow::Result;
//!
//! fn main() -> Result<()> {
//!     let mut writer = ValueWriterBlob::new_le();
//!     writer.write_pbf_key(1, 2)?;
//!     writer.write_pbf_string("roads")?;
//!     assert_eq!(writer.into_blob().as_slice(), b"\x0a\x05roads");
//!     Ok(())
//! }
//! ```

use super::ValueWriterBlob;
use crate::Blob;
use anyhow::{Context, Result};
use byteorder::{ByteOrder, WriteBytesExt};
use std::io::Write;

/// A trait for writing values to various destinations with support for different byte orders.
pub trait ValueWriter<E: ByteOrder> {
	/// Returns a mutable reference to the underlying writer.
	fn get_writer(&mut self) -> &mut dyn Write;

	/// Returns the number of bytes written so far.
	fn position(&mut self) -> Result<u64>;

	/// Returns `true` if nothing has been written yet.
	fn is_empty(&mut self) -> Result<bool> {
		Ok(self.position()? == 0)
	}

	/// Writes an unsigned variable-length integer (varint) to the writer.
	///
	/// # Errors
	///
	/// Returns an error if writing to the underlying writer fails.
	fn write_varint(&mut self, mut value: u64) -> Result<()> {
		while value >= 0x80 {
			#[allow(clippy::cast_possible_truncation)] // Safe: value & 0x7F always fits in u8
			self.get_writer().write_all(&[((value & 0x7F) as u8) | 0x80])?;
			value >>= 7;
		}
		#[allow(clippy::cast_possible_truncation)] // Safe: value always fits in u8 here
		self.get_writer().write_all(&[value as u8])?;
		Ok(())
	}

	/// Writes a signed variable-length integer (zigzag-encoded) to the writer.
	fn write_svarint(&mut self, value: i64) -> Result<()> {
		self.write_varint(((value << 1) ^ (value >> 63)) as u64)
	}

	fn write_u8(&mut self, value: u8) -> Result<()> {
		Ok(self.get_writer().write_u8(value)?)
	}

	/// Writes a 32-bit floating-point value using the specified byte order.
	fn write_f32(&mut self, value: f32) -> Result<()> {
		Ok(self.get_writer().write_f32::<E>(value)?)
	}

	/// Writes a 64-bit floating-point value using the specified byte order.
	fn write_f64(&mut self, value: f64) -> Result<()> {
		Ok(self.get_writer().write_f64::<E>(value)?)
	}

	/// Writes the contents of a [`Blob`] to the writer.
	fn write_blob(&mut self, blob: &Blob) -> Result<()> {
		self.get_writer().write_all(blob.as_slice())?;
		Ok(())
	}

	/// Writes a UTF-8 string as bytes to the writer.
	fn write_string(&mut self, text: &str) -> Result<()> {
		self.get_writer().write_all(text.as_bytes())?;
		Ok(())
	}

	/// Writes a Protocol Buffers (PBF) field key (field number and wire type) as a varint.
	///
	/// # Parameters
	///
	/// - `field_number`: The PBF field number.
	/// - `wire_type`: The PBF wire type (0 varint, 1 fixed64, 2 length-delimited, 5 fixed32).
	fn write_pbf_key(&mut self, field_number: u32, wire_type: u8) -> Result<()> {
		self
			.write_varint((u64::from(field_number) << 3) | u64::from(wire_type))
			.context("Failed to write PBF key")
	}

	/// Writes a packed repeated field of unsigned 32-bit integers in Protocol Buffers format.
	///
	/// The values are written as varints into a temporary buffer, which is then written
	/// length-prefixed.
	fn write_pbf_packed_uint32(&mut self, data: &[u32]) -> Result<()> {
		let mut writer = ValueWriterBlob::new_le();
		for &value in data {
			writer
				.write_varint(u64::from(value))
				.context("Failed to write varint for packed uint32")?;
		}
		self
			.write_pbf_blob(&writer.into_blob())
			.context("Failed to write packed uint32 blob")
	}

	/// Writes a Protocol Buffers (PBF) length-delimited blob.
	fn write_pbf_blob(&mut self, blob: &Blob) -> Result<()> {
		self
			.write_varint(blob.len())
			.context("Failed to write varint for blob length")?;
		self.write_blob(blob).context("Failed to write PBF blob")
	}

	/// Writes a Protocol Buffers (PBF) length-delimited UTF-8 string.
	fn write_pbf_string(&mut self, text: &str) -> Result<()> {
		self
			.write_varint(text.len() as u64)
			.context("Failed to write varint for string length")?;
		self.write_string(text).context("Failed to write PBF string")
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use byteorder::LittleEndian;
	use rstest::rstest;
	use std::io::Cursor;

	pub struct MockValueWriter {
		cursor: Cursor<Vec<u8>>,
	}

	impl MockValueWriter {
		pub fn new() -> Self {
			Self {
				cursor: Cursor::new(Vec::new()),
			}
		}

		pub fn into_inner(self) -> Vec<u8> {
			self.cursor.into_inner()
		}
	}

	impl ValueWriter<LittleEndian> for MockValueWriter {
		fn get_writer(&mut self) -> &mut dyn Write {
			&mut self.cursor
		}

		fn position(&mut self) -> Result<u64> {
			Ok(self.cursor.position())
		}
	}

	#[rstest]
	#[case(0, vec![0x00])]
	#[case(1, vec![0x01])]
	#[case(127, vec![0x7F])]
	#[case(128, vec![0x80, 0x01])]
	#[case(300, vec![0xAC, 0x02])]
	#[case(u64::MAX, vec![0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01])]
	fn test_write_varint(#[case] value: u64, #[case] expected: Vec<u8>) -> Result<()> {
		let mut writer = MockValueWriter::new();
		writer.write_varint(value)?;
		assert_eq!(writer.into_inner(), expected);
		Ok(())
	}

	#[rstest]
	#[case(0, vec![0])]
	#[case(-1, vec![1])]
	#[case(1, vec![2])]
	#[case(-75, vec![149, 1])]
	fn test_write_svarint(#[case] value: i64, #[case] expected: Vec<u8>) -> Result<()> {
		let mut writer = MockValueWriter::new();
		writer.write_svarint(value)?;
		assert_eq!(writer.into_inner(), expected);
		Ok(())
	}

	#[test]
	fn test_write_floats() -> Result<()> {
		let mut writer = MockValueWriter::new();
		writer.write_f32(1.0)?;
		writer.write_f64(1.0)?;
		assert_eq!(
			writer.into_inner(),
			vec![0x00, 0x00, 0x80, 0x3F, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xF0, 0x3F]
		);
		Ok(())
	}

	#[test]
	fn test_write_pbf_key() -> Result<()> {
		let mut writer = MockValueWriter::new();
		writer.write_pbf_key(15, 0)?;
		writer.write_pbf_key(3, 2)?;
		assert_eq!(writer.into_inner(), vec![0x78, 0x1A]);
		Ok(())
	}

	#[test]
	fn test_write_pbf_packed_uint32() -> Result<()> {
		let mut writer = MockValueWriter::new();
		writer.write_pbf_packed_uint32(&[100, 150, 300])?;
		assert_eq!(writer.into_inner(), vec![0x05, 0x64, 0x96, 0x01, 0xAC, 0x02]);
		Ok(())
	}

	#[test]
	fn test_write_pbf_string_and_blob() -> Result<()> {
		let mut writer = MockValueWriter::new();
		assert!(writer.is_empty()?);
		writer.write_pbf_string("hi")?;
		writer.write_pbf_blob(&Blob::from(vec![7u8]))?;
		assert_eq!(writer.position()?, 5);
		assert_eq!(writer.into_inner(), vec![0x02, b'h', b'i', 0x01, 0x07]);
		Ok(())
	}
}
