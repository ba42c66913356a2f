//! Core order engine for the exchange system.
//!
//! This module provides the main orchestration logic for the order
//! lifecycle: creation from a priced catalog artwork, validated state
//! transitions with an append-only history ledger, expiration follow-up
//! scheduling, and the pricing, shipping and tax computations behind the
//! order total. External systems (catalog, tax, scheduling, persistence)
//! are reached through the service boundaries of the sibling crates.

use exchange_catalog::{CatalogError, CatalogService};
use exchange_scheduler::SchedulerService;
use exchange_storage::{OrderStore, StorageError};
use exchange_tax::{TaxError, TaxService};
use exchange_types::{LineItem, Order, OrderState, OrderTrigger, ShippingInfo, StateHistory};
use std::sync::Arc;
use thiserror::Error;

pub mod event_bus;
pub mod handlers;
pub mod pricing;
pub mod shipping;
pub mod state;
pub mod totals;

pub use event_bus::EventBus;
pub use handlers::creation::{CreateOrderRequest, OrderCreator};
pub use handlers::follow_up::FollowUpHandler;
pub use handlers::shipping::ShippingHandler;
pub use state::{OrderStateMachine, StateTtls};
pub use totals::{OrderTotals, TotalsCalculator};

/// Utility function to truncate an id for display purposes.
///
/// Shows only the first 8 characters followed by ".." for longer ids.
/// Ids come from callers, so the cut lands on a char boundary, never a
/// byte offset.
pub(crate) fn truncate_id(id: &str) -> String {
	match id.char_indices().nth(8) {
		Some((index, _)) => format!("{}..", &id[..index]),
		None => id.to_string(),
	}
}

/// Errors that can occur during order operations.
///
/// Every kind is distinguishable so the API layer can map it to a
/// user-facing message without string matching. Errors from external
/// services are wrapped, preserving the underlying cause.
#[derive(Debug, Error)]
pub enum OrderError {
	/// The catalog could not produce the requested artwork.
	#[error("Catalog lookup failed: {0}")]
	CatalogLookup(#[from] CatalogError),
	/// Catalog data required for a price or fee is missing or unknown.
	#[error("Pricing configuration error: {0}")]
	PricingConfiguration(String),
	/// The caller's request is malformed (zero quantity, incomplete
	/// shipping details, totals before shipping is set).
	#[error("Invalid request: {0}")]
	InvalidRequest(String),
	/// The requested trigger is not legal from the current state.
	#[error("Invalid state transition: {trigger} is not allowed from {from}")]
	InvalidStateTransition {
		from: OrderState,
		trigger: OrderTrigger,
	},
	/// A competing transition won the race on the same order; the
	/// caller should refetch and may retry.
	#[error("Concurrent update lost on order {0}")]
	ConcurrencyConflict(String),
	/// The order does not exist.
	#[error("Order not found: {0}")]
	OrderNotFound(String),
	/// The persistence layer failed.
	#[error("Storage error: {0}")]
	Storage(StorageError),
	/// The tax service failed or returned an unusable response.
	#[error("Tax calculation failed: {0}")]
	Tax(#[from] TaxError),
}

/// Maps a storage error for a given order onto the domain error kinds.
pub(crate) fn storage_error(order_id: &str, error: StorageError) -> OrderError {
	match error {
		StorageError::NotFound => OrderError::OrderNotFound(order_id.to_string()),
		StorageError::Conflict { .. } => OrderError::ConcurrencyConflict(order_id.to_string()),
		other => OrderError::Storage(other),
	}
}

/// Main engine facade exposing the inbound order operations.
///
/// The engine wires the state machine, creation orchestrator, shipping
/// and follow-up handlers and the totals calculator over shared service
/// handles; the API layer talks to this type only.
pub struct OrderEngine {
	store: Arc<dyn OrderStore>,
	event_bus: EventBus,
	state_machine: Arc<OrderStateMachine>,
	creator: Arc<OrderCreator>,
	shipping_handler: Arc<ShippingHandler>,
	follow_up_handler: Arc<FollowUpHandler>,
	totals_calculator: Arc<TotalsCalculator>,
}

impl OrderEngine {
	/// Creates a new engine over the given service boundaries.
	pub fn new(
		store: Arc<dyn OrderStore>,
		catalog: Arc<CatalogService>,
		tax: Arc<TaxService>,
		scheduler: Arc<SchedulerService>,
		ttls: StateTtls,
	) -> Self {
		let event_bus = EventBus::default();

		let state_machine = Arc::new(OrderStateMachine::new(
			store.clone(),
			scheduler,
			event_bus.clone(),
			ttls,
		));
		let creator = Arc::new(OrderCreator::new(
			catalog.clone(),
			store.clone(),
			state_machine.clone(),
			event_bus.clone(),
		));
		let shipping_handler = Arc::new(ShippingHandler::new(catalog, store.clone()));
		let follow_up_handler = Arc::new(FollowUpHandler::new(store.clone(), event_bus.clone()));
		let totals_calculator = Arc::new(TotalsCalculator::new(store.clone(), tax));

		Self {
			store,
			event_bus,
			state_machine,
			creator,
			shipping_handler,
			follow_up_handler,
			totals_calculator,
		}
	}

	/// The engine's event bus; subscribe before mutating to observe
	/// lifecycle events.
	pub fn event_bus(&self) -> &EventBus {
		&self.event_bus
	}

	/// Handler the follow-up worker drives when scheduled tasks fire.
	pub fn follow_up_handler(&self) -> Arc<FollowUpHandler> {
		self.follow_up_handler.clone()
	}

	/// Creates a fully priced order from a catalog artwork.
	pub async fn create_from_artwork(
		&self,
		request: CreateOrderRequest,
	) -> Result<Order, OrderError> {
		self.creator.create_from_artwork(request).await
	}

	/// Sets fulfillment and shipping details and computes the shipping
	/// fee. A non-state update: no history entry, no state timestamps.
	pub async fn set_shipping(
		&self,
		order_id: &str,
		fulfillment_type: exchange_types::FulfillmentType,
		shipping_info: ShippingInfo,
	) -> Result<Order, OrderError> {
		self.shipping_handler
			.set_shipping(order_id, fulfillment_type, shipping_info)
			.await
	}

	/// Submits a pending order.
	pub async fn submit(&self, order_id: &str) -> Result<Order, OrderError> {
		self.state_machine.submit(order_id).await
	}

	/// Approves a submitted order.
	pub async fn approve(&self, order_id: &str) -> Result<Order, OrderError> {
		self.state_machine.approve(order_id).await
	}

	/// Rejects a pending or submitted order.
	pub async fn reject(&self, order_id: &str) -> Result<Order, OrderError> {
		self.state_machine.reject(order_id).await
	}

	/// Fetches an order by id.
	pub async fn order(&self, order_id: &str) -> Result<Order, OrderError> {
		self.store
			.get_order(order_id)
			.await
			.map_err(|e| storage_error(order_id, e))
	}

	/// Fetches the line items of an order.
	pub async fn line_items(&self, order_id: &str) -> Result<Vec<LineItem>, OrderError> {
		self.store
			.line_items(order_id)
			.await
			.map_err(|e| storage_error(order_id, e))
	}

	/// Fetches the state history ledger of an order, oldest first.
	pub async fn state_history(&self, order_id: &str) -> Result<Vec<StateHistory>, OrderError> {
		self.store
			.state_history(order_id)
			.await
			.map_err(|e| storage_error(order_id, e))
	}

	/// Computes the order totals, passing line items and shipping to
	/// the tax service.
	pub async fn totals(&self, order_id: &str) -> Result<OrderTotals, OrderError> {
		self.totals_calculator.totals(order_id).await
	}

	/// When the order was last submitted, from the ledger; `None` if it
	/// never was.
	pub async fn last_submitted_at(
		&self,
		order_id: &str,
	) -> Result<Option<chrono::DateTime<chrono::Utc>>, OrderError> {
		self.state_machine
			.last_state_at(order_id, OrderState::Submitted)
			.await
	}

	/// When the order was last approved, from the ledger; `None` if it
	/// never was.
	pub async fn last_approved_at(
		&self,
		order_id: &str,
	) -> Result<Option<chrono::DateTime<chrono::Utc>>, OrderError> {
		self.state_machine
			.last_state_at(order_id, OrderState::Approved)
			.await
	}
}
