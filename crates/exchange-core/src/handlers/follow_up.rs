//! Expiration follow-up handler.
//!
//! Runs when a scheduled follow-up fires. The task carries the state the
//! order was in when the schedule was made; if the order has moved on
//! since, the schedule is stale and the firing is a no-op. This keeps
//! the handler idempotent under at-least-once delivery, so superseded
//! schedules never need cancellation.

use crate::event_bus::EventBus;
use crate::{truncate_id, OrderError};
use exchange_storage::{OrderStore, StorageError};
use exchange_types::{FollowUpTask, OrderEvent};
use std::sync::Arc;
use tracing::instrument;

/// Reacts to fired expiration schedules.
pub struct FollowUpHandler {
	store: Arc<dyn OrderStore>,
	event_bus: EventBus,
}

impl FollowUpHandler {
	pub fn new(store: Arc<dyn OrderStore>, event_bus: EventBus) -> Self {
		Self { store, event_bus }
	}

	/// Handles one fired follow-up.
	///
	/// A missing order or a stale schedule resolves to `Ok`; only a
	/// failing storage backend is an error worth retrying.
	#[instrument(skip_all, fields(order_id = %truncate_id(&task.order_id), state = %task.state))]
	pub async fn handle(&self, task: FollowUpTask) -> Result<(), OrderError> {
		let order = match self.store.get_order(&task.order_id).await {
			Ok(order) => order,
			Err(StorageError::NotFound) => {
				tracing::warn!("follow-up fired for an unknown order");
				return Ok(());
			}
			Err(e) => return Err(OrderError::Storage(e)),
		};

		if order.state != task.state {
			tracing::debug!(current = %order.state, "follow-up is stale, ignoring");
			return Ok(());
		}

		self.event_bus
			.publish(OrderEvent::StateExpired {
				order_id: order.id.clone(),
				state: order.state,
			})
			.ok();
		tracing::info!("order state expired");
		Ok(())
	}
}
