// This module defines the `ValueReader` trait for reading protobuf-encoded values.
//
// # Overview
//
// The `ValueReader` trait provides an interface for reading varints, zigzag varints, floating-point numbers,
// strings and Protocol Buffers fields. Implementations supply the underlying reader, its length and position,
// and a way to create sub-readers that are restricted to an embedded message.

use crate::Blob;
use anyhow::{Context, Result, bail, ensure};
use byteorder::{ByteOrder, ReadBytesExt};
use std::io::{Read, Seek};

/// A simple alias for types implementing both `Seek` and `Read`, used for convenience.
pub trait SeekRead: Seek + Read {}

/// A trait for reading values from various sources with support for different byte orders.
pub trait ValueReader<'a, E: ByteOrder + 'a> {
	/// Returns the underlying reader to access raw bytes.
	fn get_reader(&mut self) -> &mut dyn SeekRead;

	/// Returns the total length of the readable data.
	fn len(&self) -> u64;

	/// Returns the current position within the readable data.
	fn position(&mut self) -> u64;

	/// Checks if there is no data to read.
	fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Returns the number of bytes remaining to be read.
	fn remaining(&mut self) -> u64 {
		self.len() - self.position()
	}

	/// Checks if there are any bytes remaining to be read.
	fn has_remaining(&mut self) -> bool {
		self.remaining() > 0
	}

	/// Reads a variable-length unsigned integer (varint) from the data.
	///
	/// # Errors
	/// Returns an error if reading fails or the varint is too long (more than 70 bits).
	fn read_varint(&mut self) -> Result<u64> {
		let mut value = 0;
		let mut shift = 0;
		loop {
			let byte = self.get_reader().read_u8()?;
			value |= (u64::from(byte) & 0x7F) << shift;
			if byte & 0x80 == 0 {
				break;
			}
			shift += 7;
			if shift >= 70 {
				bail!("Varint too long");
			}
		}
		Ok(value)
	}

	/// Reads a variable-length signed integer (zigzag-encoded varint) from the data.
	fn read_svarint(&mut self) -> Result<i64> {
		let sint_value = self.read_varint()? as i64;
		Ok((sint_value >> 1) ^ -(sint_value & 1))
	}

	fn read_f32(&mut self) -> Result<f32> {
		Ok(self.get_reader().read_f32::<E>()?)
	}

	fn read_f64(&mut self) -> Result<f64> {
		Ok(self.get_reader().read_f64::<E>()?)
	}

	/// Reads `length` raw bytes.
	fn read_blob(&mut self, length: u64) -> Result<Blob> {
		let remaining = self.remaining();
		ensure!(length <= remaining, "cannot read {length} bytes, only {remaining} remaining");
		let mut vec = vec![0u8; usize::try_from(length)?];
		self
			.get_reader()
			.read_exact(&mut vec)
			.context("Failed to read blob")?;
		Ok(Blob::from(vec))
	}

	/// Reads `length` bytes and interprets them as UTF-8.
	fn read_string(&mut self, length: u64) -> Result<String> {
		let blob = self.read_blob(length)?;
		String::from_utf8(blob.into_vec()).context("Invalid UTF-8 string")
	}

	/// Reads a Protocol Buffers field key.
	///
	/// # Returns
	/// A tuple `(field_number, wire_type)`.
	fn read_pbf_key(&mut self) -> Result<(u32, u8)> {
		let value = self.read_varint().context("Failed to read varint for PBF key")?;
		Ok(((value >> 3) as u32, (value & 0x07) as u8))
	}

	/// Returns a sub-reader limited to the given length.
	fn get_sub_reader<'b>(&'b mut self, length: u64) -> Result<Box<dyn ValueReader<'b, E> + 'b>>
	where
		E: 'b;

	/// Returns a sub-reader for a Protocol Buffers embedded message.
	///
	/// Reads the length as a varint, then returns a sub-reader limited to that length.
	fn get_pbf_sub_reader<'b>(&'b mut self) -> Result<Box<dyn ValueReader<'b, E> + 'b>>
	where
		E: 'b,
	{
		let length = self
			.read_varint()
			.context("Failed to read varint for sub-reader length")?;
		self.get_sub_reader(length).context("Failed to get sub-reader")
	}

	/// Reads a packed repeated field of unsigned 32-bit integers from a Protocol Buffers message.
	fn read_pbf_packed_uint32(&mut self) -> Result<Vec<u32>> {
		let mut reader = self
			.get_pbf_sub_reader()
			.context("Failed to get PBF sub-reader for packed uint32")?;
		let mut values = Vec::new();
		while reader.has_remaining() {
			values.push(u32::try_from(
				reader
					.read_varint()
					.context("Failed to read varint for packed uint32")?,
			)?);
		}
		drop(reader);
		Ok(values)
	}

	/// Reads a Protocol Buffers string field.
	fn read_pbf_string(&mut self) -> Result<String> {
		let length = self.read_varint().context("Failed to read varint for string length")?;
		self.read_string(length).context("Failed to read PBF string")
	}
}

#[cfg(test)]
mod tests {
	use super::super::ValueReaderSlice;
	use super::*;

	#[test]
	fn test_is_empty() {
		assert!(ValueReaderSlice::new_le(&[]).is_empty());
		assert!(!ValueReaderSlice::new_le(&[0]).is_empty());
	}

	#[test]
	fn test_read_varint() {
		let mut reader = ValueReaderSlice::new_le(&[0xAC, 0x02]);
		assert_eq!(reader.read_varint().unwrap(), 300);
		assert!(!reader.has_remaining());
	}

	#[test]
	fn test_read_varint_too_long() {
		let mut reader = ValueReaderSlice::new_le(&[0x80; 11]);
		assert!(reader.read_varint().is_err());
	}

	#[test]
	fn test_read_svarint() {
		assert_eq!(ValueReaderSlice::new_le(&[0x96, 0x01]).read_svarint().unwrap(), 75);
		assert_eq!(ValueReaderSlice::new_le(&[0x95, 0x01]).read_svarint().unwrap(), -75);
	}

	#[test]
	fn test_read_floats() {
		let mut reader = ValueReaderSlice::new_le(&[0, 0, 0x80, 0x3F, 0, 0, 0, 0, 0, 0, 0xF0, 0x3F]);
		assert_eq!(reader.read_f32().unwrap(), 1.0);
		assert_eq!(reader.read_f64().unwrap(), 1.0);
	}

	#[test]
	fn test_read_pbf_key() {
		let mut reader = ValueReaderSlice::new_le(&[0x78]);
		assert_eq!(reader.read_pbf_key().unwrap(), (15, 0));
	}

	#[test]
	fn test_read_pbf_packed_uint32() {
		let mut reader = ValueReaderSlice::new_le(&[0x05, 0x64, 0x96, 0x01, 0xAC, 0x02]);
		assert_eq!(reader.read_pbf_packed_uint32().unwrap(), vec![100, 150, 300]);
	}

	#[test]
	fn test_read_pbf_string() {
		let mut reader = ValueReaderSlice::new_le(&[0x05, b'h', b'e', b'l', b'l', b'o']);
		assert_eq!(reader.read_pbf_string().unwrap(), "hello");
	}

	#[test]
	fn test_read_string_invalid_utf8() {
		let mut reader = ValueReaderSlice::new_le(&[0x02, 0xC3, 0x28]);
		assert!(reader.read_pbf_string().is_err());
	}

	#[test]
	fn test_read_blob_past_end() {
		let mut reader = ValueReaderSlice::new_le(&[0x01]);
		assert!(reader.read_blob(2).is_err());
	}
}
