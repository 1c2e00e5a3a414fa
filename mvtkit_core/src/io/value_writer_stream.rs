//! This module provides the `ValueWriterStream` struct for writing values straight into any
//! [`std::io::Write`], e.g. a file or a response body.
//!
//! # Examples
//!
//! ```rust
//! use mvtkit_core::io::{ValueWriter, ValueWriterStream};
//! use anyhow::Result;
//!
//! fn main() -> Result<()> {
//!     let mut buffer: Vec<u8> = Vec::new();
//!     let mut writer = ValueWriterStream::new_le(&mut buffer);
//!     writer.write_pbf_string("abc")?;
//!     writer.flush()?;
//!     drop(writer);
//!     assert_eq!(buffer, vec![3, b'a', b'b', b'c']);
//!     Ok(())
//! }
//! ```

use super::ValueWriter;
use anyhow::{Context, Result};
use byteorder::{ByteOrder, LittleEndian};
use std::io::Write;
use std::marker::PhantomData;

/// Counts the bytes passing through so that `position` works on non-seekable sinks.
struct CountingWriter<W: Write> {
	inner: W,
	written: u64,
}

impl<W: Write> Write for CountingWriter<W> {
	fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
		let n = self.inner.write(buf)?;
		self.written += n as u64;
		Ok(n)
	}

	fn flush(&mut self) -> std::io::Result<()> {
		self.inner.flush()
	}
}

/// A struct that provides writing capabilities to an arbitrary output stream using a specified byte order.
pub struct ValueWriterStream<E: ByteOrder, W: Write> {
	_phantom: PhantomData<E>,
	writer: CountingWriter<W>,
}

impl<E: ByteOrder, W: Write> ValueWriterStream<E, W> {
	#[must_use]
	pub fn new(writer: W) -> ValueWriterStream<E, W> {
		ValueWriterStream {
			_phantom: PhantomData,
			writer: CountingWriter {
				inner: writer,
				written: 0,
			},
		}
	}

	pub fn flush(&mut self) -> Result<()> {
		self.writer.flush().context("Failed to flush output stream")
	}

	/// Returns the wrapped writer.
	pub fn into_inner(self) -> W {
		self.writer.inner
	}
}

impl<W: Write> ValueWriterStream<LittleEndian, W> {
	#[must_use]
	pub fn new_le(writer: W) -> ValueWriterStream<LittleEndian, W> {
		ValueWriterStream::new(writer)
	}
}

impl<E: ByteOrder, W: Write> ValueWriter<E> for ValueWriterStream<E, W> {
	fn get_writer(&mut self) -> &mut dyn Write {
		&mut self.writer
	}

	fn position(&mut self) -> Result<u64> {
		Ok(self.writer.written)
	}
}
