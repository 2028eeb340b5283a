/* src/loader/source/file.rs */

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use super::super::Source;
use crate::config::ConfigError;

/// A file system source backed by tokio::fs, sandboxed to a root directory.
pub struct FileSource {
	root: PathBuf,
}

impl FileSource {
	/// Create a new FileSource rooted at the given path.
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	/// Resolves the key safely, ensuring it stays within the root directory.
	async fn resolve_secure(&self, key: &str) -> Result<PathBuf, ConfigError> {
		// A key must never climb out of the root.
		for component in std::path::Path::new(key).components() {
			if matches!(component, std::path::Component::ParentDir) {
				return Err(ConfigError::Invalid(format!(
					"configuration key escapes root: {}",
					key
				)));
			}
		}

		let canonical_root = fs::canonicalize(&self.root)
			.await
			.map_err(|e| ConfigError::Unreadable(e.to_string()))?;

		let path = self.root.join(key);
		match fs::canonicalize(&path).await {
			Ok(canonical_path) => {
				if canonical_path.starts_with(&canonical_root) {
					Ok(canonical_path)
				} else {
					Err(ConfigError::Invalid(format!(
						"configuration key escapes root: {}",
						key
					)))
				}
			}
			Err(e) => Err(ConfigError::Unreadable(e.to_string())),
		}
	}
}

#[async_trait]
impl Source for FileSource {
	async fn read(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
		let path = self.resolve_secure(key).await?;
		fs::read(path)
			.await
			.map_err(|e| ConfigError::Unreadable(e.to_string()))
	}

	async fn exists(&self, key: &str) -> bool {
		self.resolve_secure(key).await.is_ok()
	}

	fn describe(&self, key: &str) -> PathBuf {
		self.root.join(key)
	}
}
