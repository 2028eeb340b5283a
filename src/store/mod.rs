/* src/store/mod.rs */

//!
//! Atomic configuration snapshot storage.
//!
//! [`ConfigStore`] holds the single current [`Config`] behind an
//! `ArcSwapOption`: reads are wait-free and always observe a complete,
//! consistent snapshot. A replacement swaps the whole snapshot at once and
//! bumps a monotonic version, so a torn intermediate state is impossible.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use arc_swap::ArcSwapOption;

use crate::config::Config;

/// Default event channel capacity.
pub const DEFAULT_EVENT_CAPACITY: usize = 100;

/// Metadata associated with the current configuration snapshot.
#[derive(Debug, Clone)]
pub struct Meta {
	/// Source the document was loaded from.
	pub source: PathBuf,
	/// Timestamp when the snapshot was installed.
	pub loaded_at: Instant,
	/// Version number, auto-incremented on each replacement.
	pub version: u64,
}

#[derive(Debug, Clone)]
struct Snapshot {
	config: Arc<Config>,
	meta: Meta,
}

/// Events emitted by the store on snapshot changes.
#[derive(Debug, Clone)]
pub enum StoreEvent {
	/// The initial configuration was installed.
	Loaded { value: Arc<Config>, meta: Meta },
	/// The configuration was atomically replaced.
	Replaced {
		old: Arc<Config>,
		new: Arc<Config>,
		meta: Meta,
	},
}

/// Thread-safe configuration holder with atomic replacement support.
///
/// Requires no locks on the read path; writers install a fully built
/// snapshot in a single swap.
pub struct ConfigStore {
	inner: ArcSwapOption<Snapshot>,
	version: AtomicU64,
	events: tokio::sync::broadcast::Sender<StoreEvent>,
}

impl ConfigStore {
	/// Creates a new empty store with default event channel capacity.
	pub fn new() -> Self {
		Self::with_event_capacity(DEFAULT_EVENT_CAPACITY)
	}

	/// Creates a new empty store with custom event channel capacity.
	///
	/// Note: Events may be dropped if subscribers process slower than
	/// the write rate and the channel fills up.
	pub fn with_event_capacity(capacity: usize) -> Self {
		Self {
			inner: ArcSwapOption::empty(),
			version: AtomicU64::new(0),
			events: tokio::sync::broadcast::channel(capacity).0,
		}
	}

	/// Returns the current configuration. This is a wait-free operation.
	pub fn current(&self) -> Option<Arc<Config>> {
		let snapshot = self.inner.load();
		snapshot.as_ref().map(|s| Arc::clone(&s.config))
	}

	/// Returns metadata for the current snapshot.
	pub fn meta(&self) -> Option<Meta> {
		let snapshot = self.inner.load();
		snapshot.as_ref().map(|s| s.meta.clone())
	}

	/// Returns the current snapshot version, or 0 if nothing is loaded.
	pub fn version(&self) -> u64 {
		self.inner
			.load()
			.as_ref()
			.map(|s| s.meta.version)
			.unwrap_or(0)
	}

	/// Returns true if no configuration has been installed yet.
	pub fn is_empty(&self) -> bool {
		self.inner.load().is_none()
	}

	/// Atomically installs a new configuration snapshot.
	///
	/// The previous snapshot stays valid for readers that already hold it;
	/// new readers observe the replacement immediately and completely.
	pub fn replace(&self, config: Config, source: PathBuf) -> Arc<Config> {
		let config = Arc::new(config);
		let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
		let meta = Meta {
			source,
			loaded_at: Instant::now(),
			version,
		};

		let snapshot = Arc::new(Snapshot {
			config: Arc::clone(&config),
			meta: meta.clone(),
		});

		let old = self.inner.swap(Some(snapshot));

		let event = match old {
			Some(old) => StoreEvent::Replaced {
				old: Arc::clone(&old.config),
				new: Arc::clone(&config),
				meta,
			},
			None => StoreEvent::Loaded {
				value: Arc::clone(&config),
				meta,
			},
		};
		let _ = self.events.send(event);

		config
	}

	/// Subscribes to store change events.
	pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<StoreEvent> {
		self.events.subscribe()
	}
}

impl Default for ConfigStore {
	fn default() -> Self {
		Self::new()
	}
}
