//! Event bus for inter-service communication.
//!
//! A thin wrapper over a tokio broadcast channel carrying order
//! lifecycle events. Publishing never blocks and does not require any
//! subscriber to exist; consumers that fall behind lose the oldest
//! events, which is acceptable for observability-style consumers.

use exchange_types::OrderEvent;
use tokio::sync::broadcast;

/// Default capacity of the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// In-process event bus for order lifecycle events.
#[derive(Clone)]
pub struct EventBus {
	sender: broadcast::Sender<OrderEvent>,
}

impl EventBus {
	/// Creates an event bus with the given channel capacity.
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	/// Subscribes to all events published after this call.
	pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
		self.sender.subscribe()
	}

	/// Publishes an event to all current subscribers.
	///
	/// Fails only when no subscriber exists, which callers routinely
	/// ignore with `.ok()`.
	pub fn publish(
		&self,
		event: OrderEvent,
	) -> Result<(), broadcast::error::SendError<OrderEvent>> {
		self.sender.send(event).map(|_| ())
	}
}

impl Default for EventBus {
	fn default() -> Self {
		Self::new(DEFAULT_CAPACITY)
	}
}
