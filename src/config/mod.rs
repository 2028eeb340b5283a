/* src/config/mod.rs */

//!
//! Typed engine configuration.
//!
//! A [`Config`] is an immutable snapshot: a reload produces a new,
//! independent instance, never an in-place mutation of one a registry is
//! still reading.

mod error;

pub use error::ConfigError;

use std::path::PathBuf;

use serde::Deserialize;
use validator::Validate;

/// Default ceiling for a single file read (64 KiB).
pub const DEFAULT_FILE_READ_CAP: usize = 64 * 1024;

/// Default ceiling for history objects visited per repository per cycle.
pub const DEFAULT_REVWALK_CAP: usize = 500;

/// A file-backed custom metric entry.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CustomFileSpec {
	/// Display label (e.g. "Server Log").
	#[validate(length(min = 1))]
	pub name: String,
	/// Path to the file, absolute or relative to the allowed root.
	#[validate(length(min = 1))]
	pub path: String,
	/// Metric identifier the sample is tagged with.
	#[validate(length(min = 1))]
	pub metric_id: String,
	/// If true, only the last line of the file is used.
	#[serde(default)]
	pub tail: bool,
	/// How the capped content parses into a value.
	#[serde(default)]
	pub format: ValueFormat,
}

/// How a custom file's content maps to a metric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueFormat {
	/// Keep the trimmed content as text.
	#[default]
	Text,
	/// Parse the trimmed content as a number.
	Number,
}

/// A Git repository entry to poll.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GitRepoSpec {
	/// Path to the local repository.
	#[validate(length(min = 1))]
	pub path: String,
	/// Metric identifier the per-repository sample is tagged with.
	#[validate(length(min = 1))]
	pub metric_id: String,
}

/// Git polling bounds.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GitSettings {
	/// Repositories to rotate over.
	#[serde(default)]
	#[validate(nested)]
	pub repos: Vec<GitRepoSpec>,
	/// Maximum repositories scanned per poll cycle.
	#[serde(default = "default_batch_cap")]
	#[validate(range(min = 1))]
	pub batch_cap: usize,
	/// Maximum history objects visited per repository per cycle.
	#[serde(default = "default_revwalk_cap")]
	#[validate(range(min = 1))]
	pub revwalk_cap: usize,
	/// Recency window, in hours, for the commit count metric.
	#[serde(default = "default_window_hours")]
	#[validate(range(min = 1))]
	pub window_hours: u32,
}

fn default_batch_cap() -> usize { 5 }
fn default_revwalk_cap() -> usize { DEFAULT_REVWALK_CAP }
fn default_window_hours() -> u32 { 24 }

impl Default for GitSettings {
	fn default() -> Self {
		Self {
			repos: Vec::new(),
			batch_cap: default_batch_cap(),
			revwalk_cap: default_revwalk_cap(),
			window_hours: default_window_hours(),
		}
	}
}

/// Scheduler cadence and per-source budgets.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PollingSettings {
	/// Interval between poll cycles, in milliseconds.
	#[serde(default = "default_interval_ms")]
	#[validate(range(min = 10))]
	pub interval_ms: u64,
	/// Hard timeout for a single collector's poll, in milliseconds.
	#[serde(default = "default_timeout_ms")]
	#[validate(range(min = 1))]
	pub collector_timeout_ms: u64,
	/// Byte ceiling for a single file read.
	#[serde(default = "default_file_read_cap")]
	#[validate(range(min = 1))]
	pub file_read_cap: usize,
	/// Root directory all polled paths must resolve inside.
	#[serde(default = "default_allowed_root")]
	pub allowed_root: PathBuf,
}

fn default_interval_ms() -> u64 { 1000 }
fn default_timeout_ms() -> u64 { 5000 }
fn default_file_read_cap() -> usize { DEFAULT_FILE_READ_CAP }

fn default_allowed_root() -> PathBuf {
	match std::env::var_os("HOME") {
		Some(home) => PathBuf::from(home),
		None => PathBuf::from("."),
	}
}

impl Default for PollingSettings {
	fn default() -> Self {
		Self {
			interval_ms: default_interval_ms(),
			collector_timeout_ms: default_timeout_ms(),
			file_read_cap: default_file_read_cap(),
			allowed_root: default_allowed_root(),
		}
	}
}

/// The full engine configuration snapshot.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct Config {
	/// File-backed custom metrics.
	#[serde(default)]
	#[validate(nested)]
	pub custom_files: Vec<CustomFileSpec>,
	/// Git repository metrics.
	#[serde(default)]
	#[validate(nested)]
	pub git: GitSettings,
	/// Scheduler and budget settings.
	#[serde(default)]
	#[validate(nested)]
	pub polling: PollingSettings,
}
