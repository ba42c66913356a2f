//! Order state machine implementation.
//!
//! Manages order state transitions with validation. The static
//! transition table below is the single authoritative contract for which
//! triggers are legal from which state; the TTL table drives both
//! `state_expires_at` stamping and follow-up scheduling. Every accepted
//! transition appends exactly one history ledger entry in the same
//! atomic write as the order itself.

use crate::event_bus::EventBus;
use crate::{storage_error, truncate_id, OrderError};
use chrono::{DateTime, Duration, Utc};
use exchange_scheduler::SchedulerService;
use exchange_storage::OrderStore;
use exchange_types::{FollowUpTask, Order, OrderEvent, OrderState, OrderTrigger, StateHistory};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;

/// Static transition table: (current state, trigger) -> next state.
///
/// `Pending -> Rejected` without an intervening submit is deliberate: a
/// seller may reject an offer the buyer never finalized.
static TRANSITIONS: Lazy<HashMap<(OrderState, OrderTrigger), OrderState>> = Lazy::new(|| {
	HashMap::from([
		(
			(OrderState::Pending, OrderTrigger::Submit),
			OrderState::Submitted,
		),
		(
			(OrderState::Submitted, OrderTrigger::Approve),
			OrderState::Approved,
		),
		(
			(OrderState::Submitted, OrderTrigger::Reject),
			OrderState::Rejected,
		),
		(
			(OrderState::Pending, OrderTrigger::Reject),
			OrderState::Rejected,
		),
	])
});

/// Looks up the destination state for a trigger, if the transition is
/// legal.
pub fn next_state(from: OrderState, trigger: OrderTrigger) -> Option<OrderState> {
	TRANSITIONS.get(&(from, trigger)).copied()
}

/// Time-to-live per state.
///
/// States without an entry never expire and get no follow-up.
#[derive(Debug, Clone, Copy)]
pub struct StateTtls {
	pending: Duration,
	submitted: Duration,
}

impl StateTtls {
	/// Creates a TTL table from per-state durations in hours.
	pub fn from_hours(pending_hours: i64, submitted_hours: i64) -> Self {
		Self {
			pending: Duration::hours(pending_hours),
			submitted: Duration::hours(submitted_hours),
		}
	}

	/// The TTL of a state, `None` for states that never expire.
	pub fn ttl(&self, state: OrderState) -> Option<Duration> {
		match state {
			OrderState::Pending => Some(self.pending),
			OrderState::Submitted => Some(self.submitted),
			OrderState::Approved | OrderState::Rejected => None,
		}
	}

	/// The expiration instant for a state entered at `entered_at`.
	pub fn expires_at(
		&self,
		state: OrderState,
		entered_at: DateTime<Utc>,
	) -> Option<DateTime<Utc>> {
		self.ttl(state).map(|ttl| entered_at + ttl)
	}
}

impl Default for StateTtls {
	fn default() -> Self {
		Self::from_hours(48, 48)
	}
}

/// Manages order state transitions, history and follow-up scheduling.
pub struct OrderStateMachine {
	store: Arc<dyn OrderStore>,
	scheduler: Arc<SchedulerService>,
	event_bus: EventBus,
	ttls: StateTtls,
}

impl OrderStateMachine {
	pub fn new(
		store: Arc<dyn OrderStore>,
		scheduler: Arc<SchedulerService>,
		event_bus: EventBus,
		ttls: StateTtls,
	) -> Self {
		Self {
			store,
			scheduler,
			event_bus,
			ttls,
		}
	}

	/// The TTL table driving expiration stamping.
	pub fn ttls(&self) -> &StateTtls {
		&self.ttls
	}

	/// Submits a pending order.
	pub async fn submit(&self, order_id: &str) -> Result<Order, OrderError> {
		self.apply(order_id, OrderTrigger::Submit).await
	}

	/// Approves a submitted order.
	pub async fn approve(&self, order_id: &str) -> Result<Order, OrderError> {
		self.apply(order_id, OrderTrigger::Approve).await
	}

	/// Rejects a pending or submitted order.
	pub async fn reject(&self, order_id: &str) -> Result<Order, OrderError> {
		self.apply(order_id, OrderTrigger::Reject).await
	}

	/// Applies a trigger to an order.
	///
	/// Validates the transition, stamps the state timestamps, persists
	/// the order together with its new history entry in one atomic
	/// write, then schedules the follow-up for states with a TTL. An
	/// illegal trigger fails before any side effect; a lost race against
	/// a concurrent writer surfaces as `ConcurrencyConflict`.
	#[instrument(skip(self), fields(order_id = %truncate_id(order_id), trigger = %trigger))]
	pub async fn apply(&self, order_id: &str, trigger: OrderTrigger) -> Result<Order, OrderError> {
		let mut order = self
			.store
			.get_order(order_id)
			.await
			.map_err(|e| storage_error(order_id, e))?;

		let from = order.state;
		let read_at = order.updated_at;
		let to = next_state(from, trigger)
			.ok_or(OrderError::InvalidStateTransition { from, trigger })?;

		let now = Utc::now();
		order.state = to;
		order.state_updated_at = now;
		order.state_expires_at = self.ttls.expires_at(to, now);
		order.updated_at = now;

		let entry = StateHistory {
			order_id: order.id.clone(),
			state: to,
			effective_at: now,
		};
		self.store
			.transition_order(&order, from, read_at, &entry)
			.await
			.map_err(|e| storage_error(order_id, e))?;

		// The transition is committed; scheduling is fire-and-forget.
		self.schedule_follow_up(&order).await;

		self.event_bus
			.publish(OrderEvent::Transitioned {
				order_id: order.id.clone(),
				from,
				to,
				at: now,
			})
			.ok();
		tracing::info!(from = %from, to = %to, "order transitioned");

		Ok(order)
	}

	/// Schedules the expiration follow-up for an order whose current
	/// state has a deadline.
	///
	/// A scheduling failure must not undo the already-committed write;
	/// it is logged and published for alerting instead.
	pub async fn schedule_follow_up(&self, order: &Order) {
		let Some(fire_at) = order.state_expires_at else {
			return;
		};
		let task = FollowUpTask {
			order_id: order.id.clone(),
			state: order.state,
		};
		if let Err(error) = self.scheduler.schedule(fire_at, task).await {
			tracing::warn!(
				order_id = %truncate_id(&order.id),
				state = %order.state,
				%error,
				"follow-up scheduling failed after commit"
			);
			self.event_bus
				.publish(OrderEvent::FollowUpScheduleFailed {
					order_id: order.id.clone(),
					state: order.state,
					error: error.to_string(),
				})
				.ok();
		}
	}

	/// When the order most recently entered the given state, from the
	/// history ledger; `None` if it never has.
	pub async fn last_state_at(
		&self,
		order_id: &str,
		state: OrderState,
	) -> Result<Option<DateTime<Utc>>, OrderError> {
		let history = self
			.store
			.state_history(order_id)
			.await
			.map_err(|e| storage_error(order_id, e))?;
		Ok(history
			.iter()
			.rev()
			.find(|entry| entry.state == state)
			.map(|entry| entry.effective_at))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use exchange_scheduler::implementations::memory::MemoryScheduler;
	use exchange_storage::implementations::memory::MemoryStore;

	struct Fixture {
		machine: OrderStateMachine,
		store: Arc<MemoryStore>,
		scheduler: MemoryScheduler,
	}

	fn fixture() -> Fixture {
		fixture_with_scheduler(MemoryScheduler::new())
	}

	fn fixture_with_scheduler(scheduler: MemoryScheduler) -> Fixture {
		let store = Arc::new(MemoryStore::new());
		let machine = OrderStateMachine::new(
			store.clone(),
			Arc::new(SchedulerService::new(Box::new(scheduler.clone()))),
			EventBus::default(),
			StateTtls::default(),
		);
		Fixture {
			machine,
			store,
			scheduler,
		}
	}

	async fn insert_pending(store: &MemoryStore, ttls: &StateTtls) -> Order {
		let now = Utc::now();
		let order = Order {
			id: "order-1".to_string(),
			code: "B123456".to_string(),
			buyer_id: "user-id".to_string(),
			seller_id: "gravity-partner-id".to_string(),
			currency_code: "USD".to_string(),
			state: OrderState::Pending,
			state_updated_at: now,
			state_expires_at: ttls.expires_at(OrderState::Pending, now),
			fulfillment_type: None,
			shipping_info: None,
			items_total_cents: 1_080_024,
			shipping_total_cents: None,
			created_at: now,
			updated_at: now,
		};
		store
			.insert_order(
				&order,
				&[],
				&StateHistory {
					order_id: order.id.clone(),
					state: OrderState::Pending,
					effective_at: now,
				},
			)
			.await
			.unwrap();
		order
	}

	#[test]
	fn test_transition_table() {
		assert_eq!(
			next_state(OrderState::Pending, OrderTrigger::Submit),
			Some(OrderState::Submitted)
		);
		assert_eq!(
			next_state(OrderState::Submitted, OrderTrigger::Approve),
			Some(OrderState::Approved)
		);
		assert_eq!(
			next_state(OrderState::Submitted, OrderTrigger::Reject),
			Some(OrderState::Rejected)
		);
		assert_eq!(
			next_state(OrderState::Pending, OrderTrigger::Reject),
			Some(OrderState::Rejected)
		);

		assert_eq!(next_state(OrderState::Pending, OrderTrigger::Approve), None);
		assert_eq!(next_state(OrderState::Approved, OrderTrigger::Submit), None);
		assert_eq!(next_state(OrderState::Rejected, OrderTrigger::Reject), None);
	}

	#[tokio::test]
	async fn test_submit_stamps_timestamps_and_schedules_follow_up() {
		let f = fixture();
		let created = insert_pending(&f.store, f.machine.ttls()).await;

		let submitted = f.machine.submit("order-1").await.unwrap();
		assert_eq!(submitted.state, OrderState::Submitted);
		assert!(submitted.state_updated_at > created.state_updated_at);
		assert_eq!(
			submitted.state_expires_at,
			Some(submitted.state_updated_at + Duration::hours(48))
		);

		let history = f.store.state_history("order-1").await.unwrap();
		assert_eq!(history.len(), 2);
		assert_eq!(history.last().unwrap().state, OrderState::Submitted);
		assert_eq!(
			history.last().unwrap().effective_at,
			submitted.state_updated_at
		);

		let scheduled = f.scheduler.scheduled().await;
		assert_eq!(scheduled.len(), 1);
		assert_eq!(scheduled[0].0, submitted.state_expires_at.unwrap());
		assert_eq!(scheduled[0].1.order_id, "order-1");
		assert_eq!(scheduled[0].1.state, OrderState::Submitted);
	}

	#[tokio::test]
	async fn test_submit_then_reject_clears_expiration() {
		let f = fixture();
		insert_pending(&f.store, f.machine.ttls()).await;

		f.machine.submit("order-1").await.unwrap();
		let rejected = f.machine.reject("order-1").await.unwrap();

		assert_eq!(rejected.state, OrderState::Rejected);
		assert_eq!(rejected.state_expires_at, None);

		// Creation plus two transitions
		let history = f.store.state_history("order-1").await.unwrap();
		assert_eq!(history.len(), 3);
		assert_eq!(history.last().unwrap().state, OrderState::Rejected);

		// Rejection has no TTL, so no new follow-up beyond the submit one
		assert_eq!(f.scheduler.scheduled().await.len(), 1);
	}

	#[tokio::test]
	async fn test_illegal_trigger_has_no_side_effects() {
		let f = fixture();
		let created = insert_pending(&f.store, f.machine.ttls()).await;

		let result = f.machine.approve("order-1").await;
		assert!(matches!(
			result,
			Err(OrderError::InvalidStateTransition {
				from: OrderState::Pending,
				trigger: OrderTrigger::Approve,
			})
		));

		let order = f.store.get_order("order-1").await.unwrap();
		assert_eq!(order, created);
		assert_eq!(f.store.state_history("order-1").await.unwrap().len(), 1);
		assert!(f.scheduler.scheduled().await.is_empty());
	}

	#[tokio::test]
	async fn test_scheduling_failure_does_not_fail_the_transition() {
		let f = fixture_with_scheduler(MemoryScheduler::failing());
		insert_pending(&f.store, f.machine.ttls()).await;

		let mut events = f.machine.event_bus.subscribe();
		let submitted = f.machine.submit("order-1").await.unwrap();
		assert_eq!(submitted.state, OrderState::Submitted);
		assert_eq!(
			f.store.get_order("order-1").await.unwrap().state,
			OrderState::Submitted
		);

		// The failure is published for alerting, before Transitioned
		let event = events.recv().await.unwrap();
		assert!(matches!(
			event,
			OrderEvent::FollowUpScheduleFailed { ref order_id, .. } if order_id == "order-1"
		));
	}

	#[tokio::test]
	async fn test_last_state_at_reads_the_ledger() {
		let f = fixture();
		insert_pending(&f.store, f.machine.ttls()).await;

		assert_eq!(
			f.machine
				.last_state_at("order-1", OrderState::Submitted)
				.await
				.unwrap(),
			None
		);

		let submitted = f.machine.submit("order-1").await.unwrap();
		f.machine.approve("order-1").await.unwrap();

		// Still answers from the ledger after the state moved on
		assert_eq!(
			f.machine
				.last_state_at("order-1", OrderState::Submitted)
				.await
				.unwrap(),
			Some(submitted.state_updated_at)
		);
		assert_eq!(
			f.machine
				.last_state_at("order-1", OrderState::Rejected)
				.await
				.unwrap(),
			None
		);
	}

	#[tokio::test]
	async fn test_unknown_order() {
		let f = fixture();
		assert!(matches!(
			f.machine.submit("missing").await,
			Err(OrderError::OrderNotFound(_))
		));
	}

	#[tokio::test]
	async fn test_multibyte_order_id_is_an_error_not_a_panic() {
		let f = fixture();
		assert!(matches!(
			f.machine.submit("aaaaaaaéé").await,
			Err(OrderError::OrderNotFound(_))
		));
	}
}
