/* src/collect/mod.rs */

//!
//! Bounded metric collectors.
//!
//! A collector turns configured input into [`MetricSample`]s under explicit
//! budgets: every path is validated against the allowed root before it is
//! touched, file reads are byte-capped, and revision walks are
//! object-capped. Failures are per-source: one bad entry never aborts the
//! rest of a poll.

pub mod file;
pub mod git;
pub mod path;
pub mod read;

pub use file::FileCollector;
pub use git::GitCollector;
pub use path::PathError;
pub use read::IoError;

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

/// A non-empty metric identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MetricId(String);

impl MetricId {
	/// Creates a metric id, rejecting empty input.
	pub fn new(id: impl Into<String>) -> Option<Self> {
		let id = id.into();
		if id.is_empty() { None } else { Some(Self(id)) }
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for MetricId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// A collected metric value.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
	Float(f64),
	Int(i64),
	Text(String),
	None,
}

/// One sample produced by a poll.
///
/// Invariant: `value` is [`MetricValue::None`] whenever `source_ok` is
/// false, and `metric_id` is never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
	pub metric_id: MetricId,
	pub value: MetricValue,
	pub timestamp: DateTime<Utc>,
	/// False when the source could not be read or was rejected.
	pub source_ok: bool,
	/// True when the value reflects capped, partial data.
	pub truncated: bool,
}

impl MetricSample {
	/// A successful sample.
	pub fn ok(metric_id: MetricId, value: MetricValue, truncated: bool) -> Self {
		Self {
			metric_id,
			value,
			timestamp: Utc::now(),
			source_ok: true,
			truncated,
		}
	}

	/// A flagged failure sample: no value, `source_ok` false.
	pub fn failed(metric_id: MetricId) -> Self {
		Self {
			metric_id,
			value: MetricValue::None,
			timestamp: Utc::now(),
			source_ok: false,
			truncated: false,
		}
	}
}

/// Per-source collection failures.
///
/// These are caught and converted into flagged failure samples; they never
/// abort the poll cycle they occur in.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CollectError {
	/// The configured path did not resolve inside the allowed root.
	#[error("path rejected for {metric_id}: {path:?}")]
	Rejected { metric_id: MetricId, path: PathBuf },

	/// The source exists but could not be read or parsed.
	#[error("read failed for {metric_id}: {reason}")]
	IoFailure { metric_id: MetricId, reason: String },

	/// The repository could not be opened (missing, corrupt).
	#[error("repository unavailable for {metric_id}: {path:?}")]
	RepoUnavailable { metric_id: MetricId, path: PathBuf },

	/// The collector exceeded its per-poll time budget.
	#[error("poll timed out for {metric_id}")]
	Timeout { metric_id: MetricId },

	/// The byte cap destroyed the value (e.g. a capped numeric read).
	#[error("content truncated for {metric_id}")]
	Truncated { metric_id: MetricId },
}

impl CollectError {
	/// The metric the failed source was configured to feed.
	pub fn metric_id(&self) -> &MetricId {
		match self {
			Self::Rejected { metric_id, .. }
			| Self::IoFailure { metric_id, .. }
			| Self::RepoUnavailable { metric_id, .. }
			| Self::Timeout { metric_id }
			| Self::Truncated { metric_id } => metric_id,
		}
	}
}

/// The closed set of collector variants.
///
/// Extending the engine means adding a variant here, not plugging in
/// open-ended dynamic dispatch.
#[derive(Debug)]
pub enum Collector {
	File(FileCollector),
	Git(GitCollector),
}

impl Collector {
	/// Short identifier used in diagnostics.
	pub fn id(&self) -> &'static str {
		match self {
			Self::File(_) => "files",
			Self::Git(_) => "git",
		}
	}

	/// Metric ids this collector is configured to feed.
	pub fn metric_ids(&self) -> Vec<MetricId> {
		match self {
			Self::File(c) => c.metric_ids(),
			Self::Git(c) => c.metric_ids(),
		}
	}

	/// Runs one poll invocation, one result per source touched this cycle.
	pub async fn poll(&mut self) -> Vec<Result<MetricSample, CollectError>> {
		match self {
			Self::File(c) => c.poll().await,
			Self::Git(c) => c.poll().await,
		}
	}
}
