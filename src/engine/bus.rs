/* src/engine/bus.rs */

//!
//! Fan-in channel carrying poll-cycle batches to downstream consumers.

use futures_util::Stream;
use tokio::sync::broadcast;

use crate::registry::CycleBatch;

/// Default batch channel capacity.
pub const DEFAULT_BUS_CAPACITY: usize = 64;

/// Broadcasts [`CycleBatch`]es to any number of consumers (the renderer,
/// loggers, tests). Batches are published whole, one per cycle; a consumer
/// that lags past the channel capacity loses oldest batches first.
///
/// Every batch carries the generation of the registry that produced it, so
/// consumers can detect and discard samples from a superseded collector set
/// arriving late across a reload.
#[derive(Debug, Clone)]
pub struct MetricsBus {
	tx: broadcast::Sender<CycleBatch>,
}

impl MetricsBus {
	pub fn new(capacity: usize) -> Self {
		Self {
			tx: broadcast::channel(capacity).0,
		}
	}

	pub fn subscribe(&self) -> broadcast::Receiver<CycleBatch> {
		self.tx.subscribe()
	}

	/// Publishes one cycle's batch. Send failures just mean nobody is
	/// listening yet.
	pub fn publish(&self, batch: CycleBatch) {
		let _ = self.tx.send(batch);
	}

	/// Returns the batches as a `futures` stream.
	pub fn stream(&self) -> BatchStream {
		BatchStream {
			inner: tokio_stream::wrappers::BroadcastStream::new(self.subscribe()),
		}
	}
}

impl Default for MetricsBus {
	fn default() -> Self {
		Self::new(DEFAULT_BUS_CAPACITY)
	}
}

/// Stream adapter over the bus.
pub struct BatchStream {
	inner: tokio_stream::wrappers::BroadcastStream<CycleBatch>,
}

impl Stream for BatchStream {
	type Item =
		std::result::Result<CycleBatch, tokio_stream::wrappers::errors::BroadcastStreamRecvError>;

	fn poll_next(
		mut self: std::pin::Pin<&mut Self>,
		cx: &mut std::task::Context<'_>,
	) -> std::task::Poll<Option<Self::Item>> {
		std::pin::Pin::new(&mut self.inner).poll_next(cx)
	}
}
