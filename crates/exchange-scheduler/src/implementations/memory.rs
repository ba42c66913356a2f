//! Recording scheduler for tests.
//!
//! Captures every schedule request instead of arming timers, so tests
//! can assert on the fire instant and payload. Can be constructed in a
//! failing mode to exercise the fire-and-forget path after a committed
//! write.

use crate::{SchedulerError, SchedulerInterface};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use exchange_types::FollowUpTask;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Scheduler that records schedule requests in memory.
///
/// Clones share the same record, so a test can keep one handle and hand
/// the other to the service under test.
#[derive(Clone)]
pub struct MemoryScheduler {
	scheduled: Arc<Mutex<Vec<(DateTime<Utc>, FollowUpTask)>>>,
	failing: bool,
}

impl MemoryScheduler {
	/// Creates a recording scheduler.
	pub fn new() -> Self {
		Self {
			scheduled: Arc::new(Mutex::new(Vec::new())),
			failing: false,
		}
	}

	/// Creates a scheduler that rejects every request, simulating an
	/// unavailable scheduling subsystem.
	pub fn failing() -> Self {
		Self {
			scheduled: Arc::new(Mutex::new(Vec::new())),
			failing: true,
		}
	}

	/// Returns everything scheduled so far.
	pub async fn scheduled(&self) -> Vec<(DateTime<Utc>, FollowUpTask)> {
		self.scheduled.lock().await.clone()
	}
}

impl Default for MemoryScheduler {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl SchedulerInterface for MemoryScheduler {
	async fn schedule(
		&self,
		fire_at: DateTime<Utc>,
		task: FollowUpTask,
	) -> Result<(), SchedulerError> {
		if self.failing {
			return Err(SchedulerError::Unavailable(
				"scheduler configured to fail".to_string(),
			));
		}
		self.scheduled.lock().await.push((fire_at, task));
		Ok(())
	}
}
