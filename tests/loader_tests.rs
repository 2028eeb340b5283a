/* tests/loader_tests.rs */

use tempfile::tempdir;
use vitals::config::{Config, ConfigError};
use vitals::loader::{ConfigFormat, ConfigLoader, FileSource, MemorySource};

fn memory_loader(key: &str, bytes: &[u8]) -> ConfigLoader {
	let mut source = MemorySource::new();
	source.insert(key, bytes.to_vec());
	ConfigLoader::builder()
		.source(source)
		.format(ConfigFormat::Json)
		.format(ConfigFormat::Toml)
		.build()
		.unwrap()
}

#[tokio::test]
async fn loads_json_by_extension_probing() {
	let loader = memory_loader(
		"vitals.json",
		br#"{"custom_files": [{"name": "Status", "path": "status.txt", "metric_id": "status"}]}"#,
	);

	let loaded = loader.load::<Config>("vitals").await.unwrap();
	assert_eq!(loaded.value.custom_files.len(), 1);
	assert_eq!(loaded.value.custom_files[0].metric_id, "status");
	// Unspecified sections fall back to defaults.
	assert_eq!(loaded.value.git.batch_cap, 5);
	assert_eq!(loaded.value.git.revwalk_cap, 500);
	assert_eq!(loaded.value.polling.file_read_cap, 64 * 1024);
}

#[tokio::test]
async fn loads_toml_by_extension_probing() {
	let loader = memory_loader(
		"vitals.toml",
		b"[[custom_files]]\nname = \"Status\"\npath = \"status.txt\"\nmetric_id = \"status\"\n",
	);

	let loaded = loader.load::<Config>("vitals").await.unwrap();
	assert_eq!(loaded.value.custom_files[0].name, "Status");
}

#[tokio::test]
async fn malformed_document_is_invalid() {
	let loader = memory_loader("vitals.json", b"{not json at all");
	match loader.load::<Config>("vitals").await {
		Err(ConfigError::Invalid(_)) => {}
		other => panic!("expected Invalid, got {:?}", other.map(|l| l.value)),
	}
}

#[tokio::test]
async fn schema_violation_is_invalid() {
	// Empty metric_id fails validation before the value is handed out.
	let loader = memory_loader(
		"vitals.json",
		br#"{"custom_files": [{"name": "Bad", "path": "x.txt", "metric_id": ""}]}"#,
	);
	match loader.load::<Config>("vitals").await {
		Err(ConfigError::Invalid(_)) => {}
		other => panic!("expected Invalid, got {:?}", other.map(|l| l.value)),
	}
}

#[tokio::test]
async fn missing_document_is_unreadable() {
	let loader = memory_loader("other.json", b"{}");
	match loader.load::<Config>("vitals").await {
		Err(ConfigError::Unreadable(_)) => {}
		other => panic!("expected Unreadable, got {:?}", other.map(|l| l.value)),
	}
}

#[tokio::test]
async fn file_source_refuses_keys_escaping_the_root() {
	let dir = tempdir().unwrap();
	let loader = ConfigLoader::builder()
		.source(FileSource::new(dir.path()))
		.format(ConfigFormat::Json)
		.build()
		.unwrap();

	match loader.load_file::<Config>("../outside/vitals.json").await {
		Err(ConfigError::Invalid(_)) => {}
		other => panic!("expected Invalid, got {:?}", other.map(|l| l.value)),
	}
}

#[tokio::test]
async fn file_source_round_trip() {
	let dir = tempdir().unwrap();
	tokio::fs::write(dir.path().join("vitals.json"), b"{}")
		.await
		.unwrap();

	let loader = ConfigLoader::builder()
		.source(FileSource::new(dir.path()))
		.format(ConfigFormat::Json)
		.build()
		.unwrap();

	let loaded = loader.load::<Config>("vitals").await.unwrap();
	assert!(loaded.value.custom_files.is_empty());
}
