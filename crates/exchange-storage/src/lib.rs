//! Storage module for the exchange system.
//!
//! This module provides the persistence abstraction for the order
//! aggregate. An order, its line items and its state history ledger are
//! written as one unit: creation inserts all three atomically, and every
//! write re-checks the persisted record inside the same critical section
//! so a writer holding a stale read cannot overwrite a committed one.
//! The record version is the order's `updated_at`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use exchange_types::{LineItem, Order, OrderState, StateHistory};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod memory;
}

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	/// Error that occurs when a requested order is not found.
	#[error("Not found")]
	NotFound,
	/// Error that occurs when a competing writer changed the order
	/// first. The caller should refetch and may retry.
	#[error("Conflict on order {order_id}: {reason}")]
	Conflict { order_id: String, reason: String },
	/// Error that occurs when a write violates the store's contract,
	/// e.g. a non-transition update that tries to change the state.
	#[error("Invalid write: {0}")]
	InvalidWrite(String),
	/// Error that occurs during serialization/deserialization.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// Error that occurs in the storage backend.
	#[error("Backend error: {0}")]
	Backend(String),
}

/// On-storage representation of an order with its owned children.
///
/// Backends persist this as one record so that the order row, its line
/// items and its history ledger share a single unit of atomicity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
	pub order: Order,
	pub line_items: Vec<LineItem>,
	pub state_history: Vec<StateHistory>,
}

/// Trait defining the persistence interface for orders.
///
/// Implementations must guarantee that each method executes atomically
/// with respect to the other methods for the same order id.
#[async_trait]
pub trait OrderStore: Send + Sync {
	/// Inserts a new order together with its line items and the initial
	/// history entry. Fails if an order with the same id already exists;
	/// on failure nothing is persisted.
	async fn insert_order(
		&self,
		order: &Order,
		line_items: &[LineItem],
		initial_history: &StateHistory,
	) -> Result<(), StorageError>;

	/// Retrieves an order by id.
	async fn get_order(&self, order_id: &str) -> Result<Order, StorageError>;

	/// Writes non-state fields of an order.
	///
	/// `expected_updated_at` is the `updated_at` the caller read; if the
	/// persisted record has moved past it a competing writer won the
	/// race and the write fails with [`StorageError::Conflict`]. A
	/// same-version write that would change the persisted state is
	/// rejected with [`StorageError::InvalidWrite`]; state changes must
	/// go through [`OrderStore::transition_order`]. No history entry is
	/// appended.
	async fn update_order(
		&self,
		order: &Order,
		expected_updated_at: DateTime<Utc>,
	) -> Result<(), StorageError>;

	/// Writes a state transition and appends its history entry as one
	/// atomic operation.
	///
	/// The persisted state and record version are compared against
	/// `expected_state` and `expected_updated_at` inside the critical
	/// section; either mismatch means a competing writer won the race
	/// and yields [`StorageError::Conflict`] without writing.
	async fn transition_order(
		&self,
		order: &Order,
		expected_state: OrderState,
		expected_updated_at: DateTime<Utc>,
		history: &StateHistory,
	) -> Result<(), StorageError>;

	/// Returns the line items of an order.
	async fn line_items(&self, order_id: &str) -> Result<Vec<LineItem>, StorageError>;

	/// Returns the state history ledger of an order, oldest first.
	async fn state_history(&self, order_id: &str) -> Result<Vec<StateHistory>, StorageError>;
}

impl OrderRecord {
	/// Validates and applies a transition write against this record.
	///
	/// Shared by backends so the compare-and-swap semantics cannot drift
	/// between implementations. Must be called while the backend holds
	/// its write lock.
	pub fn apply_transition(
		&mut self,
		order: &Order,
		expected_state: OrderState,
		expected_updated_at: DateTime<Utc>,
		history: &StateHistory,
	) -> Result<(), StorageError> {
		if self.order.state != expected_state {
			return Err(StorageError::Conflict {
				order_id: self.order.id.clone(),
				reason: format!(
					"expected state {}, found {}",
					expected_state, self.order.state
				),
			});
		}
		if self.order.updated_at != expected_updated_at {
			return Err(StorageError::Conflict {
				order_id: self.order.id.clone(),
				reason: "record changed since read".to_string(),
			});
		}
		self.order = order.clone();
		self.state_history.push(history.clone());
		Ok(())
	}

	/// Validates and applies a non-state update against this record.
	///
	/// The version check runs first so a writer holding a stale read
	/// loses with a retryable conflict, not a contract violation.
	pub fn apply_update(
		&mut self,
		order: &Order,
		expected_updated_at: DateTime<Utc>,
	) -> Result<(), StorageError> {
		if self.order.updated_at != expected_updated_at {
			return Err(StorageError::Conflict {
				order_id: self.order.id.clone(),
				reason: "record changed since read".to_string(),
			});
		}
		if self.order.state != order.state {
			return Err(StorageError::InvalidWrite(format!(
				"update for order {} attempted a state change from {} to {}",
				self.order.id, self.order.state, order.state
			)));
		}
		self.order = order.clone();
		Ok(())
	}
}
