/* demos/basic.rs */

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use vitals::engine::Engine;
use vitals::loader::{ConfigFormat, ConfigLoader, FileSource};
use vitals::signal::WatchConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	// 0. Prepare a data directory with a config and a file to poll
	let dir = tempfile::tempdir()?;
	fs::write(dir.path().join("status.txt"), "all systems nominal\n")?;
	let config = serde_json::json!({
		"custom_files": [
			{"name": "Status", "path": "status.txt", "metric_id": "status"}
		],
		"polling": {
			"interval_ms": 1000,
			"allowed_root": dir.path().to_str().unwrap()
		}
	});
	fs::write(dir.path().join("vitals.json"), config.to_string())?;
	println!("Created {:?}", dir.path().join("vitals.json"));

	// 1. Loader rooted at the data directory
	let loader = ConfigLoader::builder()
		.source(FileSource::new(dir.path()))
		.format(ConfigFormat::Json)
		.build()?;

	// 2. Engine: initial load, then watch the config for live reloads
	let mut engine = Engine::builder().loader(loader).key("vitals").build()?;
	engine.load().await?;
	engine.start_watching(WatchConfig::default()).await?;

	// 3. Consume poll-cycle batches off the bus
	let mut batches = engine.bus().subscribe();
	let engine = Arc::new(engine);
	let runner = {
		let engine = Arc::clone(&engine);
		tokio::spawn(async move { engine.run().await })
	};

	println!("Polling for 10 seconds... (edit vitals.json to see a reload)");
	let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
	while tokio::time::Instant::now() < deadline {
		match tokio::time::timeout_at(deadline, batches.recv()).await {
			Ok(Ok(batch)) => {
				for result in &batch.results {
					println!(
						"[gen {}] {} = {:?} (ok: {}, truncated: {})",
						batch.generation,
						result.sample.metric_id,
						result.sample.value,
						result.sample.source_ok,
						result.sample.truncated,
					);
				}
			}
			_ => break,
		}
	}

	runner.abort();
	println!("Done.");
	Ok(())
}
