/* src/engine/error.rs */

use thiserror::Error;

use crate::config::ConfigError;
use crate::signal::SignalError;

/// Errors that can occur in the engine controller.
#[derive(Debug, Error)]
pub enum EngineError {
	#[error("config error: {0}")]
	Config(#[from] ConfigError),

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("signal error: {0}")]
	Signal(#[from] SignalError),

	#[error("configuration not loaded yet, call load() before watch()")]
	NotLoaded,

	#[error("builder error: {0}")]
	Builder(String),
}
