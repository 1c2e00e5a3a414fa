//! This module provides the [`Blob`] struct, a wrapper around [`Vec<u8>`] holding encoded tile data.
//!
//! # Examples
//!
//! ```rust
//! use mvtkit_core::Blob;
//!
//! let blob = Blob::from(vec![0x1a, 0x00]);
//! assert_eq!(blob.len(), 2);
//! assert_eq!(blob.as_hex(), "1a 00");
//! ```

use anyhow::{Context, Result};
use std::fmt::Debug;
use std::path::Path;

/// A simple wrapper around [`Vec<u8>`] that provides additional methods for working with byte data.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Blob(Vec<u8>);

impl Blob {
	/// Creates an empty `Blob`.
	#[must_use]
	pub fn new_empty() -> Blob {
		Blob(Vec::new())
	}

	/// Returns a reference to the underlying bytes.
	#[must_use]
	pub fn as_slice(&self) -> &[u8] {
		self.0.as_slice()
	}

	/// Consumes the `Blob` and returns the underlying vector.
	#[must_use]
	pub fn into_vec(self) -> Vec<u8> {
		self.0
	}

	/// Formats the bytes as space separated lowercase hex, mostly useful in tests and debug output.
	#[must_use]
	pub fn as_hex(&self) -> String {
		self
			.0
			.iter()
			.map(|byte| format!("{byte:02x}"))
			.collect::<Vec<String>>()
			.join(" ")
	}

	/// Returns the length in bytes.
	#[must_use]
	pub fn len(&self) -> u64 {
		self.0.len() as u64
	}

	/// Returns `true` if the `Blob` contains no bytes.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn save_to_file(&self, path: &Path) -> Result<()> {
		std::fs::write(path, &self.0).with_context(|| format!("Failed to write blob to {path:?}"))
	}

	pub fn load_from_file(path: &Path) -> Result<Self> {
		let data = std::fs::read(path).with_context(|| format!("Failed to read blob from {path:?}"))?;
		Ok(Blob(data))
	}
}

impl From<Vec<u8>> for Blob {
	fn from(item: Vec<u8>) -> Self {
		Blob(item)
	}
}

impl From<&[u8]> for Blob {
	fn from(item: &[u8]) -> Self {
		Blob(item.to_vec())
	}
}

impl From<&str> for Blob {
	fn from(item: &str) -> Self {
		Blob(item.as_bytes().to_vec())
	}
}

impl Debug for Blob {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "Blob({}): {}", self.0.len(), self.as_hex())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn basic_accessors() {
		let blob = Blob::from(vec![0u8, 255, 16]);
		assert_eq!(blob.len(), 3);
		assert!(!blob.is_empty());
		assert_eq!(blob.as_slice(), &[0, 255, 16]);
		assert_eq!(blob.as_hex(), "00 ff 10");
		assert_eq!(format!("{blob:?}"), "Blob(3): 00 ff 10");
		assert_eq!(blob.into_vec(), vec![0, 255, 16]);
	}

	#[test]
	fn empty() {
		let blob = Blob::new_empty();
		assert_eq!(blob.len(), 0);
		assert!(blob.is_empty());
		assert_eq!(blob, Blob::default());
	}

	#[test]
	fn from_str_and_slice() {
		assert_eq!(Blob::from("AB").as_slice(), &[0x41, 0x42]);
		assert_eq!(Blob::from(&[1u8, 2][..]).len(), 2);
	}

	#[test]
	fn file_round_trip() -> Result<()> {
		let dir = std::env::temp_dir().join(format!("mvtkit_blob_{}", std::process::id()));
		std::fs::create_dir_all(&dir)?;
		let path = dir.join("blob.bin");
		Blob::from(vec![1u8, 2, 3]).save_to_file(&path)?;
		assert_eq!(Blob::load_from_file(&path)?.as_slice(), &[1, 2, 3]);
		std::fs::remove_dir_all(&dir)?;
		Ok(())
	}
}
