//! Deferred-action module for the exchange system.
//!
//! This module is the boundary to the scheduling subsystem that fires
//! follow-up actions when an order state's time-to-live elapses. Firing
//! is at-least-once and there is no cancellation; a schedule superseded
//! by a later transition is detected as stale by the follow-up handler,
//! not removed here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use exchange_types::FollowUpTask;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod memory;
	pub mod tokio;
}

/// Errors that can occur when enqueuing a deferred action.
#[derive(Debug, Error)]
pub enum SchedulerError {
	/// Error that occurs when the scheduling subsystem rejected the
	/// request or is unavailable.
	#[error("Scheduler unavailable: {0}")]
	Unavailable(String),
}

/// Trait defining the interface to the deferred-action subsystem.
#[async_trait]
pub trait SchedulerInterface: Send + Sync {
	/// Enqueues a follow-up to fire at the given instant.
	async fn schedule(&self, fire_at: DateTime<Utc>, task: FollowUpTask)
		-> Result<(), SchedulerError>;
}

/// Service that fronts the configured scheduler backend.
pub struct SchedulerService {
	backend: Box<dyn SchedulerInterface>,
}

impl SchedulerService {
	/// Creates a new SchedulerService with the specified backend.
	pub fn new(backend: Box<dyn SchedulerInterface>) -> Self {
		Self { backend }
	}

	/// Enqueues a follow-up to fire at the given instant.
	pub async fn schedule(
		&self,
		fire_at: DateTime<Utc>,
		task: FollowUpTask,
	) -> Result<(), SchedulerError> {
		tracing::debug!(
			order_id = %task.order_id,
			state = %task.state,
			%fire_at,
			"scheduling follow-up"
		);
		self.backend.schedule(fire_at, task).await
	}
}
