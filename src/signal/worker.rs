use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, mpsc};

use super::{Event, EventKind, WatchConfig};

struct Pending {
    last_seen: Instant,
    kind: EventKind,
}

/// Collapses bursts of raw notify events on one file into single signals.
///
/// An editor save typically produces several raw events back to back
/// (truncate, write, rename-over); the reload pipeline should see one.
pub(crate) async fn debounce_events(
    mut raw_rx: mpsc::Receiver<notify::Result<notify::Event>>,
    user_tx: broadcast::Sender<Event>,
    file: PathBuf,
    config: WatchConfig,
) {
    let mut pending: Option<Pending> = None;

    let tick_rate = if config.debounce < Duration::from_millis(50) {
        config.debounce
    } else {
        config.debounce / 5
    };
    let mut interval = tokio::time::interval(tick_rate);

    loop {
        tokio::select! {
            maybe_event = raw_rx.recv() => {
                match maybe_event {
                    Some(Ok(event)) => absorb(event, &mut pending, &file),
                    Some(Err(e)) => tracing::error!("notify error: {:?}", e),
                    None => break,
                }
            }
            _ = interval.tick() => {
                let settled = pending
                    .as_ref()
                    .is_some_and(|p| p.last_seen.elapsed() >= config.debounce);
                if settled {
                    if let Some(p) = pending.take() {
                        let _ = user_tx.send(Event {
                            path: file.clone(),
                            kind: p.kind,
                        });
                    }
                }
            }
        }
    }
}

fn absorb(event: notify::Event, pending: &mut Option<Pending>, file: &Path) {
    use notify::EventKind as NK;
    let kind = match event.kind {
        NK::Create(_) => EventKind::Create,
        NK::Modify(_) => EventKind::Modify,
        NK::Remove(_) => EventKind::Remove,
        _ => return,
    };

    // The parent directory is what notify watches, so match by file name.
    if !event.paths.iter().any(|p| p.file_name() == file.file_name()) {
        return;
    }

    match pending {
        None => {
            *pending = Some(Pending {
                last_seen: Instant::now(),
                kind,
            });
        }
        Some(state) => {
            state.last_seen = Instant::now();
            state.kind = match (state.kind, kind) {
                // A create followed by writes is still one new file.
                (EventKind::Create, EventKind::Modify) => EventKind::Create,
                // A stray modify right after a remove is rename-over noise.
                (EventKind::Remove, EventKind::Modify) => EventKind::Remove,
                (_, EventKind::Remove) => EventKind::Remove,
                (_, k) => k,
            };
        }
    }
}
