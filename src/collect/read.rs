/* src/collect/read.rs */

//!
//! Byte-capped file reads.

use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::AsyncReadExt;

/// Read failures from a capped read.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
	/// Permission or IO failure opening/reading the file.
	#[error("unreadable: {path:?}")]
	Unreadable {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
}

/// Result of a capped read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capped {
	pub bytes: Vec<u8>,
	/// True when the source held more than the cap and was cut short.
	pub truncated: bool,
}

/// Reads at most `max_bytes` from `path`, never allocating beyond the cap.
///
/// Oversized sources come back truncated rather than failing; callers
/// decide whether partial data is acceptable for their metric semantics.
pub async fn read_capped(path: &Path, max_bytes: usize) -> Result<Capped, IoError> {
	let unreadable = |source| IoError::Unreadable {
		path: path.to_path_buf(),
		source,
	};

	let file = File::open(path).await.map_err(unreadable)?;
	let len = file.metadata().await.map_err(unreadable)?.len();

	let mut bytes = Vec::with_capacity(len.min(max_bytes as u64) as usize);
	file.take(max_bytes as u64)
		.read_to_end(&mut bytes)
		.await
		.map_err(unreadable)?;

	Ok(Capped {
		truncated: len > max_bytes as u64,
		bytes,
	})
}
