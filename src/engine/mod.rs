/* src/engine/mod.rs */

//!
//! The engine controller: configuration lifecycle, reload broadcasting,
//! and the poll scheduler.
//!
//! [`Engine`] ties the pieces together the same way for every deployment:
//! the loader produces validated [`Config`] snapshots, the store holds the
//! current one, a [`CollectorRegistry`] is derived from it under a fresh
//! generation id, and the scheduler polls that registry on a fixed cadence.
//! A reload builds the replacement registry off to the side and swaps it in
//! atomically. An invalid document refuses the reload and leaves the
//! running configuration untouched, and a cycle already in flight finishes
//! against the registry it started with.

mod bus;
mod error;

pub use bus::{BatchStream, DEFAULT_BUS_CAPACITY, MetricsBus};
pub use error::EngineError;
pub use crate::registry::{CycleBatch, SourceResult};

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use arc_swap::ArcSwap;
use tokio::sync::{Mutex, broadcast};
use tokio::task::AbortHandle;
use tokio::time::MissedTickBehavior;

use crate::config::Config;
use crate::loader::ConfigLoader;
use crate::registry::CollectorRegistry;
use crate::signal::{WatchConfig, Watcher};
use crate::store::ConfigStore;

/// Default reload event channel capacity.
pub const DEFAULT_RELOAD_CAPACITY: usize = 16;

/// Emitted after a reload completed and the new collector set went live.
#[derive(Debug, Clone)]
pub struct ReloadEvent {
	/// Generation of the registry built from the new configuration.
	pub generation: u64,
	/// Store version of the new snapshot.
	pub version: u64,
	pub config: Arc<Config>,
}

struct Shared {
	store: ConfigStore,
	loader: ConfigLoader,
	key: String,
	registry: ArcSwap<CollectorRegistry>,
	generation: AtomicU64,
	bus: MetricsBus,
	reload_tx: broadcast::Sender<ReloadEvent>,
	/// Serializes applies so the store swap and the registry swap always
	/// land as a pair. Reads stay lock-free.
	apply_lock: Mutex<()>,
}

impl Shared {
	/// Loads, validates, and atomically applies the configuration under a
	/// fresh generation. Nothing is swapped until the document has passed
	/// validation, so a failure leaves the previous state fully active.
	async fn apply(&self) -> Result<ReloadEvent, EngineError> {
		// Concurrent applies (watcher task plus a direct reload() call)
		// must not interleave between the two swaps.
		let _guard = self.apply_lock.lock().await;

		let loaded = self.loader.load::<Config>(&self.key).await?;

		let source_path = tokio::fs::canonicalize(&loaded.path)
			.await
			.unwrap_or(loaded.path);

		let config = self.store.replace(loaded.value, source_path);
		let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
		self.registry
			.store(Arc::new(CollectorRegistry::build(&config, generation)));

		Ok(ReloadEvent {
			generation,
			version: self.store.version(),
			config,
		})
	}
}

/// The metrics-collection engine.
pub struct Engine {
	inner: Arc<Shared>,
	watcher: Option<Arc<Watcher>>,
	abort_handle: Option<AbortHandle>,
}

impl Clone for Engine {
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
			watcher: self.watcher.clone(),
			abort_handle: self.abort_handle.clone(),
		}
	}
}

impl Drop for Engine {
	fn drop(&mut self) {
		if let Some(watcher) = self.watcher.take() {
			watcher.stop();
		}
		if let Some(handle) = self.abort_handle.take() {
			handle.abort();
		}
	}
}

/// Builder for [`Engine`].
pub struct EngineBuilder {
	loader: Option<ConfigLoader>,
	key: Option<String>,
	bus_capacity: usize,
}

impl EngineBuilder {
	pub fn new() -> Self {
		Self {
			loader: None,
			key: None,
			bus_capacity: DEFAULT_BUS_CAPACITY,
		}
	}

	pub fn loader(mut self, loader: ConfigLoader) -> Self {
		self.loader = Some(loader);
		self
	}

	/// Base name of the configuration document (without extension).
	pub fn key(mut self, key: impl Into<String>) -> Self {
		self.key = Some(key.into());
		self
	}

	pub fn bus_capacity(mut self, capacity: usize) -> Self {
		self.bus_capacity = capacity;
		self
	}

	pub fn build(self) -> Result<Engine, EngineError> {
		let loader = self
			.loader
			.ok_or_else(|| EngineError::Builder("loader is required".to_string()))?;
		let key = self
			.key
			.ok_or_else(|| EngineError::Builder("key is required".to_string()))?;

		Ok(Engine {
			inner: Arc::new(Shared {
				store: ConfigStore::new(),
				loader,
				key,
				// Generation 0: an empty set until load() installs the real one.
				registry: ArcSwap::from_pointee(CollectorRegistry::build(&Config::default(), 0)),
				generation: AtomicU64::new(0),
				bus: MetricsBus::new(self.bus_capacity),
				reload_tx: broadcast::channel(DEFAULT_RELOAD_CAPACITY).0,
				apply_lock: Mutex::new(()),
			}),
			watcher: None,
			abort_handle: None,
		})
	}
}

impl Default for EngineBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl Engine {
	pub fn builder() -> EngineBuilder {
		EngineBuilder::new()
	}

	/// Performs the initial configuration load.
	///
	/// This is the only fatal path: with no prior valid state to fall back
	/// to, an unreadable or invalid document is an error the caller must
	/// handle.
	pub async fn load(&self) -> Result<(), EngineError> {
		let event = self.inner.apply().await?;
		tracing::info!(
			"engine loaded configuration v{} (generation {})",
			event.version,
			event.generation
		);
		Ok(())
	}

	/// Re-reads the configuration and atomically swaps in the new collector
	/// set.
	///
	/// An invalid document refuses the reload: the store keeps reporting
	/// the previous version and the previous registry keeps polling. A poll
	/// cycle in flight when the swap lands completes against the old
	/// registry; its batch stays tagged with the old generation.
	pub async fn reload(&self) -> Result<ReloadEvent, EngineError> {
		match self.inner.apply().await {
			Ok(event) => {
				let _ = self.inner.reload_tx.send(event.clone());
				tracing::info!("Config reloaded and broadcast");
				Ok(event)
			}
			Err(e) => {
				tracing::warn!("reload refused, previous configuration stays active: {}", e);
				Err(e)
			}
		}
	}

	/// Returns the current configuration snapshot.
	pub fn config(&self) -> Option<Arc<Config>> {
		self.inner.store.current()
	}

	/// Returns the current store version (0 before the first load).
	pub fn version(&self) -> u64 {
		self.inner.store.version()
	}

	/// Returns the generation of the active collector registry.
	pub fn generation(&self) -> u64 {
		self.inner.registry.load().generation()
	}

	/// Subscribes to reload-completed events.
	pub fn subscribe_reloads(&self) -> broadcast::Receiver<ReloadEvent> {
		self.inner.reload_tx.subscribe()
	}

	/// The bus poll-cycle batches are published on.
	pub fn bus(&self) -> &MetricsBus {
		&self.inner.bus
	}

	/// Runs exactly one poll cycle against the active registry and
	/// publishes the batch.
	pub async fn poll_once(&self) -> CycleBatch {
		let registry = self.inner.registry.load_full();
		let timeout = self.collector_timeout();
		let batch = registry.poll_all(timeout).await;
		self.inner.bus.publish(batch.clone());
		batch
	}

	fn collector_timeout(&self) -> Duration {
		let millis = self
			.inner
			.store
			.current()
			.map(|c| c.polling.collector_timeout_ms)
			.unwrap_or(5000);
		Duration::from_millis(millis)
	}

	fn interval_ms(&self) -> u64 {
		self.inner
			.store
			.current()
			.map(|c| c.polling.interval_ms)
			.unwrap_or(1000)
	}

	/// Drives poll cycles at the configured cadence until the task running
	/// it is aborted.
	///
	/// Cycles never overlap: the cycle is awaited inline, and a cycle that
	/// outlasts the interval defers the next tick instead of running
	/// concurrently against the same registry.
	pub async fn run(&self) {
		let mut current_ms = self.interval_ms();
		let mut interval = tokio::time::interval(Duration::from_millis(current_ms));
		interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

		loop {
			interval.tick().await;
			self.poll_once().await;

			// Pick up a cadence change from a reload between cycles. The
			// replacement interval starts one full period out so the change
			// does not trigger an immediate extra cycle.
			let next_ms = self.interval_ms();
			if next_ms != current_ms {
				current_ms = next_ms;
				let period = Duration::from_millis(current_ms);
				interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
				interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
			}
		}
	}

	/// Attaches a filesystem watcher that drives [`Engine::reload`] on
	/// configuration file changes.
	///
	/// Must call `load()` first to establish the source path. Reload
	/// failures keep the previous configuration active; subscribe to
	/// reload events to observe successful swaps.
	pub async fn start_watching(&mut self, config: WatchConfig) -> Result<(), EngineError> {
		let meta = self.inner.store.meta().ok_or(EngineError::NotLoaded)?;

		let watcher = Watcher::new(meta.source, config)?;

		let mut rx = watcher.subscribe();
		let shared = self.inner.clone();

		let handle = tokio::spawn(async move {
			while let Ok(_event) = rx.recv().await {
				match shared.apply().await {
					Ok(event) => {
						let _ = shared.reload_tx.send(event);
						tracing::info!("Config reloaded and broadcast");
					}
					Err(e) => {
						tracing::warn!(
							"reload refused, previous configuration stays active: {}",
							e
						);
					}
				}
			}
		});

		self.abort_handle = Some(handle.abort_handle());
		self.watcher = Some(Arc::new(watcher));
		Ok(())
	}

	/// Attaches a filesystem watcher (consuming version).
	pub async fn watch(mut self, config: WatchConfig) -> Result<Self, EngineError> {
		self.start_watching(config).await?;
		Ok(self)
	}

	/// Stops the filesystem watcher.
	pub fn stop_watching(&mut self) {
		if let Some(watcher) = self.watcher.take() {
			watcher.stop();
		}
		if let Some(handle) = self.abort_handle.take() {
			handle.abort();
		}
	}
}
