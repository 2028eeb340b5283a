/* src/collect/file.rs */

//!
//! Collector for configured custom files.

use std::path::{Path, PathBuf};

use super::{CollectError, MetricId, MetricSample, MetricValue, path, read};
use crate::config::{CustomFileSpec, ValueFormat};

/// Turns `CustomFileSpec` entries into metric samples.
///
/// Each spec is validated against the allowed root, read under the byte
/// cap, and parsed into the declared value format. Failures stay scoped to
/// their spec.
#[derive(Debug)]
pub struct FileCollector {
	specs: Vec<CustomFileSpec>,
	allowed_root: PathBuf,
	read_cap: usize,
}

impl FileCollector {
	pub fn new(specs: Vec<CustomFileSpec>, allowed_root: PathBuf, read_cap: usize) -> Self {
		// Empty metric ids are blocked by config validation; entries built
		// by hand without one are dropped here rather than polled blind.
		let specs = specs
			.into_iter()
			.filter(|s| {
				if s.metric_id.is_empty() {
					tracing::debug!("FileCollector: dropping entry '{}' with empty metric_id", s.name);
					false
				} else {
					true
				}
			})
			.collect();
		Self {
			specs,
			allowed_root,
			read_cap,
		}
	}

	pub fn metric_ids(&self) -> Vec<MetricId> {
		self.specs
			.iter()
			.filter_map(|s| MetricId::new(s.metric_id.clone()))
			.collect()
	}

	pub async fn poll(&mut self) -> Vec<Result<MetricSample, CollectError>> {
		let mut out = Vec::with_capacity(self.specs.len());
		for spec in &self.specs {
			out.push(poll_one(spec, &self.allowed_root, self.read_cap).await);
		}
		out
	}
}

async fn poll_one(
	spec: &CustomFileSpec,
	allowed_root: &Path,
	read_cap: usize,
) -> Result<MetricSample, CollectError> {
	// Non-empty by construction, see `FileCollector::new`.
	let metric_id = MetricId(spec.metric_id.clone());

	let candidate = Path::new(&spec.path);
	let resolved = path::validate(candidate, allowed_root).map_err(|e| {
		tracing::warn!(
			"FileCollector: access denied for '{}': {}",
			spec.name,
			e
		);
		CollectError::Rejected {
			metric_id: metric_id.clone(),
			path: candidate.to_path_buf(),
		}
	})?;

	let capped = read::read_capped(&resolved, read_cap)
		.await
		.map_err(|e| CollectError::IoFailure {
			metric_id: metric_id.clone(),
			reason: e.to_string(),
		})?;

	let content = String::from_utf8_lossy(&capped.bytes);
	let content = content.trim();
	let content = if spec.tail {
		content.lines().last().unwrap_or("")
	} else {
		content
	};

	let value = match spec.format {
		ValueFormat::Text => MetricValue::Text(content.to_string()),
		ValueFormat::Number => parse_number(content).ok_or_else(|| {
			if capped.truncated {
				// The cap cut the number short; report that, not a bogus value.
				CollectError::Truncated {
					metric_id: metric_id.clone(),
				}
			} else {
				CollectError::IoFailure {
					metric_id: metric_id.clone(),
					reason: "content is not numeric".to_string(),
				}
			}
		})?,
	};

	Ok(MetricSample::ok(metric_id, value, capped.truncated))
}

fn parse_number(content: &str) -> Option<MetricValue> {
	if let Ok(i) = content.parse::<i64>() {
		return Some(MetricValue::Int(i));
	}
	content.parse::<f64>().ok().map(MetricValue::Float)
}
