//! In-process timer scheduler.
//!
//! Each schedule spawns a task that sleeps until the fire instant and
//! then pushes the follow-up onto a due-queue; the service binary runs a
//! worker that drains the queue into the follow-up handler. Timers are
//! never cancelled, the staleness check at fire time absorbs superseded
//! schedules.

use crate::{SchedulerError, SchedulerInterface};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use exchange_types::FollowUpTask;
use tokio::sync::mpsc;

/// Scheduler backed by in-process tokio timers.
pub struct TokioScheduler {
	due: mpsc::UnboundedSender<FollowUpTask>,
}

impl TokioScheduler {
	/// Creates the scheduler together with the due-queue receiver the
	/// follow-up worker should drain.
	pub fn new() -> (Self, mpsc::UnboundedReceiver<FollowUpTask>) {
		let (due, receiver) = mpsc::unbounded_channel();
		(Self { due }, receiver)
	}
}

#[async_trait]
impl SchedulerInterface for TokioScheduler {
	async fn schedule(
		&self,
		fire_at: DateTime<Utc>,
		task: FollowUpTask,
	) -> Result<(), SchedulerError> {
		if self.due.is_closed() {
			return Err(SchedulerError::Unavailable(
				"follow-up queue is closed".to_string(),
			));
		}

		// A fire instant in the past fires immediately.
		let delay = (fire_at - Utc::now())
			.to_std()
			.unwrap_or(std::time::Duration::ZERO);
		let due = self.due.clone();
		tokio::spawn(async move {
			tokio::time::sleep(delay).await;
			if due.send(task).is_err() {
				tracing::warn!("follow-up dropped, queue closed during sleep");
			}
		});
		Ok(())
	}
}
