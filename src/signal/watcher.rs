use std::path::PathBuf;

use notify::{RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use super::worker::debounce_events;
use super::{Event, Result, SignalError, WatchConfig};

/// Watches one file and emits debounced [`Event`]s when it changes.
///
/// The file's parent directory is registered with notify so that editors
/// replacing the file (rename-over) are still observed; raw events are
/// filtered back down to the one file by name.
pub struct Watcher {
    _internal_watcher: RecommendedWatcher,
    task_handle: JoinHandle<()>,
    event_tx: broadcast::Sender<Event>,
}

impl Watcher {
    /// Creates a watcher for `file` and starts monitoring immediately.
    #[must_use = "Watcher must be kept alive"]
    pub fn new(file: PathBuf, config: WatchConfig) -> Result<Self> {
        let (raw_tx, raw_rx) = mpsc::channel(100);

        let mut internal_watcher =
            notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
                let _ = raw_tx.blocking_send(res);
            })?;

        let watch_path = match file.parent() {
            Some(parent) if parent.as_os_str().is_empty() => PathBuf::from("."),
            Some(parent) => parent.to_path_buf(),
            None => file.clone(),
        };

        if !watch_path.exists() {
            return Err(SignalError::Target(format!(
                "path does not exist: {:?}",
                watch_path
            )));
        }

        internal_watcher.watch(&watch_path, RecursiveMode::NonRecursive)?;

        let (user_tx, _) = broadcast::channel(100);
        let tx_clone = user_tx.clone();

        let task_handle = tokio::spawn(async move {
            debounce_events(raw_rx, tx_clone, file, config).await;
        });

        Ok(Self {
            _internal_watcher: internal_watcher,
            task_handle,
            event_tx: user_tx,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    pub fn stop(&self) {
        self.task_handle.abort();
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        self.task_handle.abort();
    }
}
