/* src/lib.rs */

//!
//! A hardened metrics-collection engine with live configuration reloading.
//!
//! The crate integrates four components:
//!
//! - **store**: Thread-safe, atomic configuration snapshots.
//! - **loader**: Format-agnostic, sandboxed configuration loading.
//! - **signal**: Filesystem monitoring driving live reloads.
//! - **collect** / **registry** / **engine**: Bounded metric collectors
//!   (files, Git repositories), generation-tagged collector registries,
//!   and the scheduler that polls them on a fixed cadence.
//!
//! Every data source is polled under an explicit budget: file reads are
//! byte-capped, revision walks are object-capped, and every path is
//! validated against an allowed root before it is touched. A reload never
//! partially applies and never races an in-flight poll cycle: the new
//! collector set is swapped in atomically under a fresh generation id, and
//! late results from the superseded generation stay identifiable.
//!
//! ## Basic Usage
//!
//! See `demos/basic.rs` for a complete example.

pub mod collect;
pub mod config;
pub mod engine;
pub mod loader;
pub mod registry;
pub mod signal;
pub mod store;

pub use collect::{CollectError, Collector, MetricId, MetricSample, MetricValue};
pub use config::{Config, ConfigError, CustomFileSpec, GitRepoSpec};
pub use engine::{CycleBatch, Engine, EngineError, MetricsBus, ReloadEvent};
pub use registry::CollectorRegistry;
pub use store::ConfigStore;
