/* src/loader/source/memory.rs */

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;

use super::super::Source;
use crate::config::ConfigError;

/// A simple in-memory source useful for testing and embedded environments.
#[derive(Default)]
pub struct MemorySource {
	data: BTreeMap<String, Vec<u8>>,
}

impl MemorySource {
	/// Creates a new empty MemorySource.
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts data into the source.
	pub fn insert(&mut self, key: &str, value: Vec<u8>) {
		self.data.insert(key.to_string(), value);
	}
}

#[async_trait]
impl Source for MemorySource {
	async fn read(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
		self.data
			.get(key)
			.cloned()
			.ok_or_else(|| ConfigError::Unreadable(format!("no such key: {}", key)))
	}

	async fn exists(&self, key: &str) -> bool {
		self.data.contains_key(key)
	}

	fn describe(&self, key: &str) -> PathBuf {
		PathBuf::from(key)
	}
}
