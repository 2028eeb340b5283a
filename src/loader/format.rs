/* src/loader/format.rs */

use serde::de::DeserializeOwned;

use crate::config::ConfigError;

/// Supported configuration document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
	/// JSON via `serde_json`.
	Json,
	/// TOML via `toml`.
	Toml,
}

impl ConfigFormat {
	/// File extensions this format claims.
	pub fn extensions(&self) -> &'static [&'static str] {
		match self {
			Self::Json => &["json"],
			Self::Toml => &["toml"],
		}
	}

	/// Parse the raw bytes into the target type.
	pub fn parse<T: DeserializeOwned>(&self, input: &[u8]) -> Result<T, ConfigError> {
		match self {
			Self::Json => {
				serde_json::from_slice(input).map_err(|e| ConfigError::Invalid(e.to_string()))
			}
			Self::Toml => {
				let s = std::str::from_utf8(input)
					.map_err(|e| ConfigError::Invalid(e.to_string()))?;
				toml::from_str(s).map_err(|e| ConfigError::Invalid(e.to_string()))
			}
		}
	}
}
