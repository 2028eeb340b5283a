/* src/loader/mod.rs */

//!
//! Format-agnostic, sandboxed configuration loading.
//!
//! A [`ConfigLoader`] combines one [`Source`] (where bytes come from) with
//! a list of [`ConfigFormat`]s (how bytes parse). Loading probes
//! `<base>.<ext>` per registered format, parses the first match, and runs
//! schema validation before the value is handed out, so an invalid document
//! never reaches the store.

mod format;
pub mod source;

pub use format::ConfigFormat;
pub use source::{FileSource, MemorySource};

use std::path::PathBuf;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::config::ConfigError;

/// A successfully loaded and validated document.
#[derive(Debug)]
pub struct Loaded<T> {
	pub value: T,
	/// Source path the document was read from, as reported by the source.
	pub path: PathBuf,
}

/// Abstract data source that retrieves raw bytes by key.
#[async_trait]
pub trait Source: Send + Sync {
	/// Read raw data as a vector of bytes.
	async fn read(&self, key: &str) -> Result<Vec<u8>, ConfigError>;

	/// Check if the resource exists at the given key.
	async fn exists(&self, key: &str) -> bool;

	/// Resolve the key to the path reported in [`Loaded::path`].
	fn describe(&self, key: &str) -> PathBuf;
}

/// Loads configuration documents from a source, probing registered formats.
pub struct ConfigLoader {
	source: Box<dyn Source>,
	formats: Vec<ConfigFormat>,
}

/// Builder for [`ConfigLoader`].
pub struct ConfigLoaderBuilder {
	source: Option<Box<dyn Source>>,
	formats: Vec<ConfigFormat>,
}

impl ConfigLoaderBuilder {
	pub fn new() -> Self {
		Self {
			source: None,
			formats: Vec::new(),
		}
	}

	pub fn source(mut self, source: impl Source + 'static) -> Self {
		self.source = Some(Box::new(source));
		self
	}

	pub fn format(mut self, format: ConfigFormat) -> Self {
		self.formats.push(format);
		self
	}

	pub fn build(self) -> Result<ConfigLoader, ConfigError> {
		let source = self
			.source
			.ok_or_else(|| ConfigError::Invalid("loader source is required".to_string()))?;
		if self.formats.is_empty() {
			return Err(ConfigError::Invalid(
				"at least one loader format is required".to_string(),
			));
		}
		Ok(ConfigLoader {
			source,
			formats: self.formats,
		})
	}
}

impl Default for ConfigLoaderBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigLoader {
	pub fn builder() -> ConfigLoaderBuilder {
		ConfigLoaderBuilder::new()
	}

	/// Probes `<base>.<ext>` for each registered format and loads the first
	/// match. Extra candidates are ignored with a warning.
	pub async fn load<T>(&self, base_name: &str) -> Result<Loaded<T>, ConfigError>
	where
		T: DeserializeOwned + Validate,
	{
		let mut found: Option<(String, ConfigFormat)> = None;

		for format in &self.formats {
			for ext in format.extensions() {
				let key = format!("{}.{}", base_name, ext);
				if self.source.exists(&key).await {
					if let Some((ref first_key, _)) = found {
						tracing::warn!(
							"multiple configuration documents found for '{}': using '{}', ignoring '{}'",
							base_name,
							first_key,
							key
						);
						continue;
					}
					found = Some((key, *format));
				}
			}
		}

		match found {
			Some((key, format)) => self.load_explicit(&key, format).await,
			None => Err(ConfigError::Unreadable(format!(
				"no configuration document found for '{}'",
				base_name
			))),
		}
	}

	/// Loads a specific key, selecting the parser by extension.
	pub async fn load_file<T>(&self, key: &str) -> Result<Loaded<T>, ConfigError>
	where
		T: DeserializeOwned + Validate,
	{
		let ext = key
			.rfind('.')
			.map(|idx| &key[idx + 1..])
			.ok_or_else(|| ConfigError::Invalid(format!("missing extension: {}", key)))?;

		for format in &self.formats {
			if format.extensions().contains(&ext) {
				return self.load_explicit(key, *format).await;
			}
		}
		Err(ConfigError::Invalid(format!(
			"no registered format handles '.{}'",
			ext
		)))
	}

	async fn load_explicit<T>(&self, key: &str, format: ConfigFormat) -> Result<Loaded<T>, ConfigError>
	where
		T: DeserializeOwned + Validate,
	{
		let bytes = self.source.read(key).await?;
		let value: T = format.parse(&bytes)?;
		value
			.validate()
			.map_err(|e| ConfigError::Invalid(e.to_string()))?;
		Ok(Loaded {
			value,
			path: self.source.describe(key),
		})
	}
}
