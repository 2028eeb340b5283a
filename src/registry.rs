/* src/registry.rs */

//!
//! Generation-tagged collector sets.
//!
//! A [`CollectorRegistry`] is built whole from one configuration snapshot
//! and never mutated afterwards; a reload builds a replacement under the
//! next generation id and swaps it in. Results always carry the generation
//! they were produced under, so consumers can tell a late batch from a
//! superseded set apart from current data.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio::task::JoinSet;

use crate::collect::{
	CollectError, Collector, FileCollector, GitCollector, MetricId, MetricSample,
};
use crate::config::Config;

/// One per-source outcome carried on the metrics bus.
///
/// Failures are flagged samples, not omissions: `sample.source_ok` is false
/// and `error` names the cause, so consumers can distinguish "no data" from
/// "capped data" from "healthy".
#[derive(Debug, Clone)]
pub struct SourceResult {
	pub sample: MetricSample,
	pub error: Option<CollectError>,
}

impl SourceResult {
	fn from_poll(result: Result<MetricSample, CollectError>) -> Self {
		match result {
			Ok(sample) => Self {
				sample,
				error: None,
			},
			Err(error) => Self {
				sample: MetricSample::failed(error.metric_id().clone()),
				error: Some(error),
			},
		}
	}
}

/// The published results of one poll cycle.
#[derive(Debug, Clone)]
pub struct CycleBatch {
	/// Generation of the registry that produced the batch.
	pub generation: u64,
	pub completed_at: DateTime<Utc>,
	/// Per-source outcomes, in collector order.
	pub results: Vec<SourceResult>,
}

struct Slot {
	collector: Mutex<Collector>,
	/// Recorded at build time so a collector-level timeout can still be
	/// attributed to the metrics it was going to feed.
	metric_ids: Vec<MetricId>,
}

/// The live set of collectors built from one configuration snapshot.
pub struct CollectorRegistry {
	generation: u64,
	slots: Vec<Arc<Slot>>,
}

impl CollectorRegistry {
	/// Builds the collector set for `config` under the given generation id.
	pub fn build(config: &Config, generation: u64) -> Self {
		let mut slots = Vec::new();

		if !config.custom_files.is_empty() {
			let collector = Collector::File(FileCollector::new(
				config.custom_files.clone(),
				config.polling.allowed_root.clone(),
				config.polling.file_read_cap,
			));
			slots.push(Arc::new(Slot {
				metric_ids: collector.metric_ids(),
				collector: Mutex::new(collector),
			}));
		}

		if !config.git.repos.is_empty() {
			let collector = Collector::Git(GitCollector::new(
				&config.git,
				config.polling.allowed_root.clone(),
			));
			slots.push(Arc::new(Slot {
				metric_ids: collector.metric_ids(),
				collector: Mutex::new(collector),
			}));
		}

		Self { generation, slots }
	}

	pub fn generation(&self) -> u64 {
		self.generation
	}

	pub fn len(&self) -> usize {
		self.slots.len()
	}

	pub fn is_empty(&self) -> bool {
		self.slots.is_empty()
	}

	/// Runs one poll cycle: every collector polls concurrently, each under
	/// the per-collector timeout, and the batch is published whole.
	///
	/// A timed-out collector contributes one flagged failure per metric it
	/// was configured to feed; the cycle proceeds without it.
	pub async fn poll_all(&self, timeout: Duration) -> CycleBatch {
		let mut set: JoinSet<(usize, Vec<SourceResult>)> = JoinSet::new();

		for (idx, slot) in self.slots.iter().enumerate() {
			let slot = Arc::clone(slot);
			set.spawn(async move {
				let mut collector = slot.collector.lock().await;
				let results = match tokio::time::timeout(timeout, collector.poll()).await {
					Ok(results) => results.into_iter().map(SourceResult::from_poll).collect(),
					Err(_) => {
						tracing::warn!(
							"collector '{}' exceeded its {}ms poll budget",
							collector.id(),
							timeout.as_millis()
						);
						slot.metric_ids
							.iter()
							.map(|id| {
								SourceResult::from_poll(Err(CollectError::Timeout {
									metric_id: id.clone(),
								}))
							})
							.collect()
					}
				};
				(idx, results)
			});
		}

		let mut per_slot: Vec<Vec<SourceResult>> = (0..self.slots.len()).map(|_| Vec::new()).collect();
		while let Some(joined) = set.join_next().await {
			if let Ok((idx, results)) = joined {
				per_slot[idx] = results;
			}
		}

		CycleBatch {
			generation: self.generation,
			completed_at: Utc::now(),
			results: per_slot.into_iter().flatten().collect(),
		}
	}
}
