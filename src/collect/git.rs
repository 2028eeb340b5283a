/* src/collect/git.rs */

//!
//! Collector for Git repository metrics.
//!
//! Repositories are scanned in rotating batches so a poll cycle has bounded
//! cost regardless of how many are configured, and each revision walk stops
//! at a fixed object budget.

use std::path::{Path, PathBuf};

use chrono::Utc;
use git2::Repository;

use super::{CollectError, MetricId, MetricSample, MetricValue, path};
use crate::config::{GitRepoSpec, GitSettings};

/// Round-robin position over the configured repository list.
///
/// Owned exclusively by one collector instance; rebuilding the collector on
/// reload naturally resets rotation fairness for the new set.
#[derive(Debug, Default)]
pub(crate) struct RotationCursor {
	next: usize,
}

impl RotationCursor {
	/// Selects the next batch of indices, wrapping, and advances past it.
	fn select(&mut self, len: usize, batch_cap: usize) -> Vec<usize> {
		if len == 0 {
			return Vec::new();
		}
		let count = batch_cap.min(len);
		let picked = (0..count).map(|i| (self.next + i) % len).collect();
		self.next = (self.next + count) % len;
		picked
	}
}

/// What one budgeted walk of a repository produced.
#[derive(Debug, Clone, Copy)]
struct RepoScan {
	/// Commits whose author time falls inside the recency window.
	commits_in_window: i64,
	/// Author time of the newest commit, seconds since the epoch.
	latest_commit: Option<i64>,
	/// True when the walk stopped at the object budget.
	truncated: bool,
}

/// Polls a rotating subset of configured repositories per cycle.
#[derive(Debug)]
pub struct GitCollector {
	repos: Vec<GitRepoSpec>,
	batch_cap: usize,
	revwalk_cap: usize,
	window_hours: u32,
	allowed_root: PathBuf,
	cursor: RotationCursor,
}

impl GitCollector {
	pub fn new(settings: &GitSettings, allowed_root: PathBuf) -> Self {
		let repos = settings
			.repos
			.iter()
			.filter(|r| {
				if r.metric_id.is_empty() {
					tracing::debug!("GitCollector: dropping repo '{}' with empty metric_id", r.path);
					false
				} else {
					true
				}
			})
			.cloned()
			.collect();
		Self {
			repos,
			batch_cap: settings.batch_cap.max(1),
			revwalk_cap: settings.revwalk_cap.max(1),
			window_hours: settings.window_hours,
			allowed_root,
			cursor: RotationCursor::default(),
		}
	}

	pub fn metric_ids(&self) -> Vec<MetricId> {
		self.repos
			.iter()
			.filter_map(|r| MetricId::new(r.metric_id.clone()))
			.collect()
	}

	/// Polls the next rotation batch. A broken repository yields its own
	/// failure and rotation advances past it all the same.
	pub async fn poll(&mut self) -> Vec<Result<MetricSample, CollectError>> {
		let selected = self.cursor.select(self.repos.len(), self.batch_cap);
		let cutoff = (Utc::now() - chrono::Duration::hours(i64::from(self.window_hours))).timestamp();

		let mut out = Vec::with_capacity(selected.len());
		for idx in selected {
			let spec = self.repos[idx].clone();
			out.push(
				self.poll_repo(spec, cutoff).await,
			);
		}
		out
	}

	async fn poll_repo(
		&self,
		spec: GitRepoSpec,
		cutoff: i64,
	) -> Result<MetricSample, CollectError> {
		// Non-empty by construction, see `GitCollector::new`.
		let metric_id = MetricId(spec.metric_id.clone());
		let candidate = PathBuf::from(&spec.path);

		let resolved = path::validate(&candidate, &self.allowed_root).map_err(|e| {
			tracing::warn!("GitCollector: access denied for repo '{}': {}", spec.path, e);
			CollectError::Rejected {
				metric_id: metric_id.clone(),
				path: candidate.clone(),
			}
		})?;

		let cap = self.revwalk_cap;
		let scan_path = resolved.clone();
		let scan = tokio::task::spawn_blocking(move || scan_repo(&scan_path, cap, cutoff))
			.await
			.map_err(|e| CollectError::IoFailure {
				metric_id: metric_id.clone(),
				reason: e.to_string(),
			})?
			.map_err(|e| {
				tracing::warn!("GitCollector: cannot scan '{}': {}", spec.path, e);
				CollectError::RepoUnavailable {
					metric_id: metric_id.clone(),
					path: candidate,
				}
			})?;

		tracing::info!(
			"GitCollector: Polled {}",
			path::display_for_log(&resolved, &self.allowed_root)
		);
		if scan.truncated {
			tracing::debug!(
				"GitCollector: revision walk budget ({}) reached for {}",
				cap,
				spec.path
			);
		}

		let value = match scan.latest_commit {
			Some(_) => MetricValue::Int(scan.commits_in_window),
			// Empty repository: opened fine, nothing to count.
			None => MetricValue::Int(0),
		};
		Ok(MetricSample::ok(metric_id, value, scan.truncated))
	}
}

/// Walks ancestry from HEAD under the object budget.
fn scan_repo(path: &Path, budget: usize, cutoff: i64) -> Result<RepoScan, git2::Error> {
	let repo = Repository::open(path)?;
	let mut revwalk = repo.revwalk()?;
	revwalk.push_head()?;

	let mut visited = 0usize;
	let mut commits_in_window = 0i64;
	let mut latest_commit = None;
	let mut truncated = false;

	for oid in revwalk {
		if visited >= budget {
			truncated = true;
			break;
		}
		visited += 1;

		let Ok(oid) = oid else { continue };
		let Ok(commit) = repo.find_commit(oid) else { continue };

		let seconds = commit.time().seconds();
		if latest_commit.is_none() {
			// First yield is HEAD, the newest reachable commit.
			latest_commit = Some(seconds);
		}
		if seconds >= cutoff {
			commits_in_window += 1;
		}
	}

	Ok(RepoScan {
		commits_in_window,
		latest_commit,
		truncated,
	})
}

#[cfg(test)]
mod tests {
	use super::RotationCursor;

	#[test]
	fn cursor_wraps_round_robin() {
		let mut cursor = RotationCursor::default();
		assert_eq!(cursor.select(3, 1), vec![0]);
		assert_eq!(cursor.select(3, 1), vec![1]);
		assert_eq!(cursor.select(3, 1), vec![2]);
		assert_eq!(cursor.select(3, 1), vec![0]);
	}

	#[test]
	fn cursor_batches_and_wraps_partway() {
		let mut cursor = RotationCursor::default();
		assert_eq!(cursor.select(5, 2), vec![0, 1]);
		assert_eq!(cursor.select(5, 2), vec![2, 3]);
		assert_eq!(cursor.select(5, 2), vec![4, 0]);
	}

	#[test]
	fn cursor_caps_batch_at_list_length() {
		let mut cursor = RotationCursor::default();
		assert_eq!(cursor.select(2, 10), vec![0, 1]);
		assert_eq!(cursor.select(2, 10), vec![0, 1]);
	}

	#[test]
	fn cursor_empty_list_selects_nothing() {
		let mut cursor = RotationCursor::default();
		assert!(cursor.select(0, 5).is_empty());
	}
}
