/* src/config/error.rs */

/// Errors produced while loading or validating a configuration.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
	/// The document parsed but failed schema or sanity validation,
	/// or it could not be parsed at all.
	#[error("invalid configuration: {0}")]
	Invalid(String),
	/// The document could not be read from its source.
	#[error("configuration unreadable: {0}")]
	Unreadable(String),
}
