//! In-memory storage backend implementation for the exchange system.
//!
//! This module provides a memory-based implementation of the OrderStore
//! trait, useful for testing and development scenarios where persistence
//! is not required.

use crate::{OrderRecord, OrderStore, StorageError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use exchange_types::{LineItem, Order, OrderState, StateHistory};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory order store.
///
/// Records live in a HashMap behind a read-write lock; every mutation
/// takes the write lock, which gives each order the single critical
/// section the store contract requires.
pub struct MemoryStore {
	records: Arc<RwLock<HashMap<String, OrderRecord>>>,
}

impl MemoryStore {
	/// Creates a new MemoryStore instance.
	pub fn new() -> Self {
		Self {
			records: Arc::new(RwLock::new(HashMap::new())),
		}
	}
}

impl Default for MemoryStore {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl OrderStore for MemoryStore {
	async fn insert_order(
		&self,
		order: &Order,
		line_items: &[LineItem],
		initial_history: &StateHistory,
	) -> Result<(), StorageError> {
		let mut records = self.records.write().await;
		if records.contains_key(&order.id) {
			return Err(StorageError::Backend(format!(
				"order {} already exists",
				order.id
			)));
		}
		records.insert(
			order.id.clone(),
			OrderRecord {
				order: order.clone(),
				line_items: line_items.to_vec(),
				state_history: vec![initial_history.clone()],
			},
		);
		Ok(())
	}

	async fn get_order(&self, order_id: &str) -> Result<Order, StorageError> {
		let records = self.records.read().await;
		records
			.get(order_id)
			.map(|r| r.order.clone())
			.ok_or(StorageError::NotFound)
	}

	async fn update_order(
		&self,
		order: &Order,
		expected_updated_at: DateTime<Utc>,
	) -> Result<(), StorageError> {
		let mut records = self.records.write().await;
		let record = records.get_mut(&order.id).ok_or(StorageError::NotFound)?;
		record.apply_update(order, expected_updated_at)
	}

	async fn transition_order(
		&self,
		order: &Order,
		expected_state: OrderState,
		expected_updated_at: DateTime<Utc>,
		history: &StateHistory,
	) -> Result<(), StorageError> {
		let mut records = self.records.write().await;
		let record = records.get_mut(&order.id).ok_or(StorageError::NotFound)?;
		record.apply_transition(order, expected_state, expected_updated_at, history)
	}

	async fn line_items(&self, order_id: &str) -> Result<Vec<LineItem>, StorageError> {
		let records = self.records.read().await;
		records
			.get(order_id)
			.map(|r| r.line_items.clone())
			.ok_or(StorageError::NotFound)
	}

	async fn state_history(&self, order_id: &str) -> Result<Vec<StateHistory>, StorageError> {
		let records = self.records.read().await;
		records
			.get(order_id)
			.map(|r| r.state_history.clone())
			.ok_or(StorageError::NotFound)
	}
}
