//! Order creation orchestrator.
//!
//! Prices an artwork through the catalog boundary and persists the new
//! order, its single line item and the initial history entry as one
//! atomic write. The unit price is resolved exactly once here; nothing
//! re-fetches it later.

use crate::event_bus::EventBus;
use crate::pricing::resolve_price;
use crate::state::OrderStateMachine;
use crate::{storage_error, OrderError};
use chrono::Utc;
use exchange_catalog::CatalogService;
use exchange_storage::OrderStore;
use exchange_types::{
	generate_order_code, LineItem, Order, OrderEvent, OrderState, StateHistory,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Request to create an order for one artwork.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderRequest {
	pub buyer_id: String,
	pub artwork_id: String,
	/// Edition set to order, when the artwork is editioned.
	#[serde(default)]
	pub edition_set_id: Option<String>,
	pub quantity: u32,
}

/// Orchestrates order creation from a catalog artwork.
pub struct OrderCreator {
	catalog: Arc<CatalogService>,
	store: Arc<dyn OrderStore>,
	state_machine: Arc<OrderStateMachine>,
	event_bus: EventBus,
}

impl OrderCreator {
	pub fn new(
		catalog: Arc<CatalogService>,
		store: Arc<dyn OrderStore>,
		state_machine: Arc<OrderStateMachine>,
		event_bus: EventBus,
	) -> Self {
		Self {
			catalog,
			store,
			state_machine,
			event_bus,
		}
	}

	/// Creates a fully priced pending order.
	///
	/// Fetches the artwork once, resolves the unit price, and inserts the
	/// order with its line item and initial history entry atomically. A
	/// failure at any step leaves nothing persisted. The expiration
	/// follow-up is scheduled only after the insert committed.
	#[instrument(skip(self), fields(artwork_id = %request.artwork_id))]
	pub async fn create_from_artwork(
		&self,
		request: CreateOrderRequest,
	) -> Result<Order, OrderError> {
		if request.quantity == 0 {
			return Err(OrderError::InvalidRequest(
				"quantity must be at least 1".to_string(),
			));
		}

		let artwork = self.catalog.artwork(&request.artwork_id).await?;
		let resolved = resolve_price(&artwork, request.edition_set_id.as_deref())?;

		let now = Utc::now();
		let order = Order {
			id: Uuid::new_v4().to_string(),
			code: generate_order_code(),
			buyer_id: request.buyer_id.clone(),
			seller_id: artwork.partner_id.clone(),
			currency_code: resolved.currency_code.clone(),
			state: OrderState::Pending,
			state_updated_at: now,
			state_expires_at: self
				.state_machine
				.ttls()
				.expires_at(OrderState::Pending, now),
			fulfillment_type: None,
			shipping_info: None,
			items_total_cents: resolved.price_cents * i64::from(request.quantity),
			shipping_total_cents: None,
			created_at: now,
			updated_at: now,
		};
		let line_item = LineItem {
			id: Uuid::new_v4().to_string(),
			order_id: order.id.clone(),
			artwork_id: request.artwork_id,
			edition_set_id: request.edition_set_id,
			quantity: request.quantity,
			price_cents: resolved.price_cents,
		};
		let initial_history = StateHistory {
			order_id: order.id.clone(),
			state: OrderState::Pending,
			effective_at: now,
		};

		self.store
			.insert_order(&order, std::slice::from_ref(&line_item), &initial_history)
			.await
			.map_err(|e| storage_error(&order.id, e))?;

		// The insert is committed; scheduling is fire-and-forget.
		self.state_machine.schedule_follow_up(&order).await;

		self.event_bus
			.publish(OrderEvent::Created {
				order: order.clone(),
			})
			.ok();
		tracing::info!(
			order_id = %order.id,
			code = %order.code,
			items_total_cents = order.items_total_cents,
			"order created"
		);

		Ok(order)
	}
}
