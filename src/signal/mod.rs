use std::path::PathBuf;
use std::time::Duration;

mod watcher;
mod worker;

pub use watcher::Watcher;

/// Errors from the reload-signal watcher.
#[derive(thiserror::Error, Debug)]
pub enum SignalError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Notify error: {0}")]
    Notify(#[from] notify::Error),

    #[error("Invalid watch target: {0}")]
    Target(String),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, SignalError>;

/// Debounce behavior of the watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchConfig {
    /// Quiet period a burst of raw events must settle for before a single
    /// signal is emitted.
    pub debounce: Duration,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(500),
        }
    }
}

/// What happened to the watched file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// File was created.
    Create,
    /// File content was modified.
    Modify,
    /// File was removed.
    Remove,
}

/// A debounced change signal for the watched file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Event {
    pub path: PathBuf,
    pub kind: EventKind,
}
