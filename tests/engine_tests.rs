/* tests/engine_tests.rs */

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tempfile::{TempDir, tempdir};
use vitals::config::ValueFormat;
use vitals::engine::Engine;
use vitals::loader::{ConfigFormat, ConfigLoader, FileSource};
use vitals::signal::WatchConfig;
use vitals::{CollectError, CollectorRegistry, Config, CustomFileSpec, MetricValue};

fn config_doc(root: &Path, interval_ms: u64) -> String {
	serde_json::json!({
		"custom_files": [
			{"name": "Status", "path": "status.txt", "metric_id": "status"}
		],
		"polling": {
			"interval_ms": interval_ms,
			"collector_timeout_ms": 1000,
			"allowed_root": root.to_str().unwrap()
		}
	})
	.to_string()
}

async fn engine_in(dir: &TempDir, interval_ms: u64) -> Engine {
	std::fs::write(dir.path().join("status.txt"), "running").unwrap();
	std::fs::write(
		dir.path().join("vitals.json"),
		config_doc(dir.path(), interval_ms),
	)
	.unwrap();

	let loader = ConfigLoader::builder()
		.source(FileSource::new(dir.path()))
		.format(ConfigFormat::Json)
		.build()
		.unwrap();

	let engine = Engine::builder()
		.loader(loader)
		.key("vitals")
		.build()
		.unwrap();
	engine.load().await.unwrap();
	engine
}

#[tokio::test]
async fn initial_load_builds_generation_one() {
	let dir = tempdir().unwrap();
	let engine = engine_in(&dir, 1000).await;

	assert_eq!(engine.version(), 1);
	assert_eq!(engine.generation(), 1);

	let batch = engine.poll_once().await;
	assert_eq!(batch.generation, 1);
	assert_eq!(batch.results.len(), 1);
	let result = &batch.results[0];
	assert!(result.sample.source_ok);
	assert_eq!(result.sample.value, MetricValue::Text("running".to_string()));
}

#[tokio::test]
async fn failed_sources_arrive_as_flagged_samples() {
	let dir = tempdir().unwrap();
	let engine = engine_in(&dir, 1000).await;
	std::fs::remove_file(dir.path().join("status.txt")).unwrap();

	let batch = engine.poll_once().await;
	let result = &batch.results[0];
	assert!(!result.sample.source_ok);
	assert_eq!(result.sample.value, MetricValue::None);
	assert!(result.error.is_some());
	assert_eq!(result.sample.metric_id.as_str(), "status");
}

#[tokio::test]
async fn invalid_reload_is_refused_and_previous_state_survives() {
	let dir = tempdir().unwrap();
	let engine = engine_in(&dir, 1000).await;
	let before = engine.poll_once().await;

	std::fs::write(dir.path().join("vitals.json"), "{broken").unwrap();

	assert!(engine.reload().await.is_err());
	assert_eq!(engine.version(), 1);
	assert_eq!(engine.generation(), 1);

	// The previous registry keeps producing the same samples.
	let after = engine.poll_once().await;
	assert_eq!(after.generation, 1);
	assert_eq!(
		after.results[0].sample.value,
		before.results[0].sample.value
	);
}

#[tokio::test]
async fn reloading_an_unchanged_config_bumps_generation_only() {
	let dir = tempdir().unwrap();
	let engine = engine_in(&dir, 1000).await;
	let before = engine.poll_once().await;

	let event = engine.reload().await.unwrap();
	assert_eq!(event.generation, 2);
	assert_eq!(event.version, 2);

	let after = engine.poll_once().await;
	assert_eq!(after.generation, 2);
	// Same configuration, same steady-state values.
	assert_eq!(
		after.results[0].sample.value,
		before.results[0].sample.value
	);
}

#[tokio::test]
async fn timed_out_collector_yields_flagged_failures_per_metric() {
	let dir = tempdir().unwrap();
	std::fs::write(dir.path().join("status.txt"), "running").unwrap();

	let mut config = Config::default();
	config.custom_files.push(CustomFileSpec {
		name: "Status".to_string(),
		path: "status.txt".to_string(),
		metric_id: "status".to_string(),
		tail: false,
		format: ValueFormat::Text,
	});
	config.polling.allowed_root = dir.path().to_path_buf();

	let registry = CollectorRegistry::build(&config, 7);
	// A zero budget elapses before the collector's first read completes.
	let batch = registry.poll_all(Duration::ZERO).await;

	assert_eq!(batch.generation, 7);
	assert_eq!(batch.results.len(), 1);
	let result = &batch.results[0];
	assert!(!result.sample.source_ok);
	assert_eq!(result.sample.value, MetricValue::None);
	assert_eq!(result.sample.metric_id.as_str(), "status");
	assert!(matches!(result.error, Some(CollectError::Timeout { .. })));
}

#[tokio::test]
async fn concurrent_reloads_keep_store_and_registry_in_lockstep() {
	let dir = tempdir().unwrap();
	let engine = Arc::new(engine_in(&dir, 1000).await);
	let mut reloads = engine.subscribe_reloads();

	let mut tasks = Vec::new();
	for _ in 0..8 {
		let engine = Arc::clone(&engine);
		tasks.push(tokio::spawn(async move { engine.reload().await }));
	}
	for task in tasks {
		task.await.unwrap().unwrap();
	}

	// Every published event pairs the store version with the generation of
	// the registry built from that same snapshot.
	for _ in 0..8 {
		let event = reloads.recv().await.unwrap();
		assert_eq!(event.version, event.generation);
	}
	assert_eq!(engine.version(), 9);
	assert_eq!(engine.generation(), 9);
}

#[tokio::test]
async fn reload_events_are_broadcast() {
	let dir = tempdir().unwrap();
	let engine = engine_in(&dir, 1000).await;
	let mut reloads = engine.subscribe_reloads();

	engine.reload().await.unwrap();

	let event = reloads.recv().await.unwrap();
	assert_eq!(event.generation, 2);
	assert_eq!(event.config.custom_files.len(), 1);
}

#[tokio::test]
async fn old_generation_batches_are_delivered_across_a_reload() {
	let dir = tempdir().unwrap();
	let engine = Arc::new(engine_in(&dir, 20).await);
	let mut batches = engine.bus().subscribe();

	let runner = {
		let engine = Arc::clone(&engine);
		tokio::spawn(async move { engine.run().await })
	};

	// First batch comes from the original registry.
	let first = batches.recv().await.unwrap();
	assert_eq!(first.generation, 1);

	engine.reload().await.unwrap();

	// Batches from the superseded generation are still delivered, tagged
	// as such; eventually the new collector set takes over.
	let mut saw_new = false;
	for _ in 0..100 {
		let batch = batches.recv().await.unwrap();
		assert!(batch.generation == 1 || batch.generation == 2);
		if batch.generation == 2 {
			saw_new = true;
			break;
		}
	}
	assert!(saw_new, "new generation never took over");

	runner.abort();
}

#[tokio::test]
async fn watcher_drives_reload_on_file_change() {
	let dir = tempdir().unwrap();
	let mut engine = engine_in(&dir, 1000).await;

	engine
		.start_watching(WatchConfig {
			debounce: Duration::from_millis(100),
		})
		.await
		.unwrap();

	// Rewrite the config with a different cadence.
	std::fs::write(dir.path().join("vitals.json"), config_doc(dir.path(), 333)).unwrap();

	// Wait for the debounced reload to land.
	for _ in 0..50 {
		tokio::time::sleep(Duration::from_millis(100)).await;
		if engine.version() >= 2 {
			break;
		}
	}

	assert!(engine.version() >= 2);
	assert_eq!(
		engine.config().unwrap().polling.interval_ms,
		333
	);
	engine.stop_watching();
}
