//! File-based storage backend implementation for the exchange system.
//!
//! Stores one JSON record per order under a base directory, providing
//! simple persistence without external dependencies. All mutations are
//! serialized through a single async mutex and land via a temp-file
//! rename, so a record is always either the old version or the new one.

use crate::{OrderRecord, OrderStore, StorageError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use exchange_types::{LineItem, Order, OrderState, StateHistory};
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::Mutex;

/// File-based order store.
pub struct FileStore {
	/// Base directory path for storing records.
	base_path: PathBuf,
	/// Serializes mutations; reads go lock-free against the rename.
	write_lock: Mutex<()>,
}

impl FileStore {
	/// Creates a new FileStore rooted at the given directory, creating
	/// it if necessary.
	pub fn new(base_path: impl Into<PathBuf>) -> Result<Self, StorageError> {
		let base_path = base_path.into();
		std::fs::create_dir_all(&base_path)
			.map_err(|e| StorageError::Backend(format!("creating {:?}: {}", base_path, e)))?;
		Ok(Self {
			base_path,
			write_lock: Mutex::new(()),
		})
	}

	fn record_path(&self, order_id: &str) -> Result<PathBuf, StorageError> {
		// Order ids are UUIDs; anything path-like is a caller bug.
		if order_id.is_empty()
			|| order_id
				.chars()
				.any(|c| !c.is_ascii_alphanumeric() && c != '-')
		{
			return Err(StorageError::Backend(format!(
				"invalid order id: {order_id}"
			)));
		}
		Ok(self.base_path.join(format!("{order_id}.json")))
	}

	async fn read_record(&self, order_id: &str) -> Result<OrderRecord, StorageError> {
		let path = self.record_path(order_id)?;
		let bytes = match fs::read(&path).await {
			Ok(bytes) => bytes,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				return Err(StorageError::NotFound)
			}
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};
		serde_json::from_slice(&bytes).map_err(|e| StorageError::Serialization(e.to_string()))
	}

	async fn write_record(&self, record: &OrderRecord) -> Result<(), StorageError> {
		let path = self.record_path(&record.order.id)?;
		let tmp = path.with_extension("json.tmp");
		let bytes =
			serde_json::to_vec(record).map_err(|e| StorageError::Serialization(e.to_string()))?;
		fs::write(&tmp, bytes)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;
		fs::rename(&tmp, &path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))
	}
}

#[async_trait]
impl OrderStore for FileStore {
	async fn insert_order(
		&self,
		order: &Order,
		line_items: &[LineItem],
		initial_history: &StateHistory,
	) -> Result<(), StorageError> {
		let _guard = self.write_lock.lock().await;
		let path = self.record_path(&order.id)?;
		if fs::try_exists(&path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?
		{
			return Err(StorageError::Backend(format!(
				"order {} already exists",
				order.id
			)));
		}
		self.write_record(&OrderRecord {
			order: order.clone(),
			line_items: line_items.to_vec(),
			state_history: vec![initial_history.clone()],
		})
		.await
	}

	async fn get_order(&self, order_id: &str) -> Result<Order, StorageError> {
		Ok(self.read_record(order_id).await?.order)
	}

	async fn update_order(
		&self,
		order: &Order,
		expected_updated_at: DateTime<Utc>,
	) -> Result<(), StorageError> {
		let _guard = self.write_lock.lock().await;
		let mut record = self.read_record(&order.id).await?;
		record.apply_update(order, expected_updated_at)?;
		self.write_record(&record).await
	}

	async fn transition_order(
		&self,
		order: &Order,
		expected_state: OrderState,
		expected_updated_at: DateTime<Utc>,
		history: &StateHistory,
	) -> Result<(), StorageError> {
		let _guard = self.write_lock.lock().await;
		let mut record = self.read_record(&order.id).await?;
		record.apply_transition(order, expected_state, expected_updated_at, history)?;
		self.write_record(&record).await
	}

	async fn line_items(&self, order_id: &str) -> Result<Vec<LineItem>, StorageError> {
		Ok(self.read_record(order_id).await?.line_items)
	}

	async fn state_history(&self, order_id: &str) -> Result<Vec<StateHistory>, StorageError> {
		Ok(self.read_record(order_id).await?.state_history)
	}
}
