//! Shipping details handler.
//!
//! Captures the buyer's fulfillment choice and shipping contact details
//! on an order and computes the shipping fee from each line item's
//! artwork. The write goes through the store's non-state path, so the
//! state timestamps and the history ledger are untouched and the
//! operation can be repeated freely before submission.

use crate::shipping::calculate_shipping;
use crate::{storage_error, truncate_id, OrderError};
use chrono::Utc;
use exchange_catalog::CatalogService;
use exchange_storage::OrderStore;
use exchange_types::{FulfillmentType, Order, ShippingInfo};
use std::sync::Arc;
use tracing::instrument;

/// Sets fulfillment and shipping details on an order.
pub struct ShippingHandler {
	catalog: Arc<CatalogService>,
	store: Arc<dyn OrderStore>,
}

impl ShippingHandler {
	pub fn new(catalog: Arc<CatalogService>, store: Arc<dyn OrderStore>) -> Self {
		Self { catalog, store }
	}

	/// Validates the details, computes the shipping fee and persists
	/// both on the order.
	///
	/// The fee is the sum over line items of each artwork's fee for the
	/// destination. A missing fee on the selected branch aborts the whole
	/// write; nothing is persisted partially.
	#[instrument(skip(self, shipping_info), fields(order_id = %truncate_id(order_id)))]
	pub async fn set_shipping(
		&self,
		order_id: &str,
		fulfillment_type: FulfillmentType,
		shipping_info: ShippingInfo,
	) -> Result<Order, OrderError> {
		if !shipping_info.complete_for(fulfillment_type) {
			return Err(OrderError::InvalidRequest(
				"shipping details are incomplete for the chosen fulfillment type".to_string(),
			));
		}

		let mut order = self
			.store
			.get_order(order_id)
			.await
			.map_err(|e| storage_error(order_id, e))?;
		let read_at = order.updated_at;
		let line_items = self
			.store
			.line_items(order_id)
			.await
			.map_err(|e| storage_error(order_id, e))?;

		let mut shipping_total_cents = 0;
		for line_item in &line_items {
			let artwork = self.catalog.artwork(&line_item.artwork_id).await?;
			shipping_total_cents +=
				calculate_shipping(&artwork, fulfillment_type, &shipping_info.country)?;
		}

		order.fulfillment_type = Some(fulfillment_type);
		order.shipping_info = Some(shipping_info);
		order.shipping_total_cents = Some(shipping_total_cents);
		order.updated_at = Utc::now();

		self.store
			.update_order(&order, read_at)
			.await
			.map_err(|e| storage_error(order_id, e))?;
		tracing::info!(shipping_total_cents, "shipping details set");

		Ok(order)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use exchange_catalog::implementations::memory::MemoryCatalog;
	use exchange_storage::implementations::memory::MemoryStore;
	use exchange_types::{
		Artwork, ArtworkLocation, ArtworkShipping, LineItem, OrderState, StateHistory,
	};

	struct Fixture {
		handler: ShippingHandler,
		store: Arc<MemoryStore>,
	}

	async fn fixture() -> Fixture {
		let catalog = MemoryCatalog::new();
		catalog
			.insert(Artwork {
				id: "artwork-id".to_string(),
				partner_id: "gravity-partner-id".to_string(),
				price_cents: 540_012,
				currency_code: "USD".to_string(),
				edition_sets: vec![],
				shipping: Some(ArtworkShipping {
					domestic_shipping_fee_cents: Some(10_000),
					international_shipping_fee_cents: Some(50_000),
					location: Some(ArtworkLocation {
						country: "US".to_string(),
						city: Some("Brooklyn".to_string()),
						state: Some("NY".to_string()),
					}),
				}),
			})
			.await;

		let store = Arc::new(MemoryStore::new());
		let now = Utc::now();
		let order = Order {
			id: "order-1".to_string(),
			code: "B123456".to_string(),
			buyer_id: "user-id".to_string(),
			seller_id: "gravity-partner-id".to_string(),
			currency_code: "USD".to_string(),
			state: OrderState::Pending,
			state_updated_at: now,
			state_expires_at: None,
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
				&[LineItem {
					id: "li-1".to_string(),
					order_id: "order-1".to_string(),
					artwork_id: "artwork-id".to_string(),
					edition_set_id: None,
					quantity: 2,
					price_cents: 540_012,
				}],
				&StateHistory {
					order_id: "order-1".to_string(),
					state: OrderState::Pending,
					effective_at: now,
				},
			)
			.await
			.unwrap();

		Fixture {
			handler: ShippingHandler::new(
				Arc::new(CatalogService::new(Box::new(catalog))),
				store.clone(),
			),
			store,
		}
	}

	fn domestic_info() -> ShippingInfo {
		ShippingInfo {
			name: "Fname Lname".to_string(),
			country: "US".to_string(),
			address_line1: Some("401 Broadway".to_string()),
			address_line2: None,
			postal_code: Some("10013".to_string()),
			city: Some("New York".to_string()),
			phone_number: Some("12125551234".to_string()),
		}
	}

	#[tokio::test]
	async fn test_domestic_shipping_fee_is_persisted() {
		let f = fixture().await;

		let order = f
			.handler
			.set_shipping("order-1", FulfillmentType::Ship, domestic_info())
			.await
			.unwrap();
		assert_eq!(order.shipping_total_cents, Some(10_000));
		assert_eq!(order.fulfillment_type, Some(FulfillmentType::Ship));
		assert!(order.has_shipping_info());

		assert_eq!(f.store.get_order("order-1").await.unwrap(), order);
	}

	#[tokio::test]
	async fn test_international_destination_uses_international_fee() {
		let f = fixture().await;

		let order = f
			.handler
			.set_shipping(
				"order-1",
				FulfillmentType::Ship,
				ShippingInfo {
					country: "IR".to_string(),
					..domestic_info()
				},
			)
			.await
			.unwrap();
		assert_eq!(order.shipping_total_cents, Some(50_000));
	}

	#[tokio::test]
	async fn test_pickup_ships_for_free_with_minimal_details() {
		let f = fixture().await;

		let order = f
			.handler
			.set_shipping(
				"order-1",
				FulfillmentType::Pickup,
				ShippingInfo {
					name: "Fname Lname".to_string(),
					country: "US".to_string(),
					address_line1: None,
					address_line2: None,
					postal_code: None,
					city: None,
					phone_number: None,
				},
			)
			.await
			.unwrap();
		assert_eq!(order.shipping_total_cents, Some(0));
	}

	#[tokio::test]
	async fn test_incomplete_details_are_rejected_before_any_write() {
		let f = fixture().await;

		let result = f
			.handler
			.set_shipping(
				"order-1",
				FulfillmentType::Ship,
				ShippingInfo {
					address_line1: None,
					..domestic_info()
				},
			)
			.await;
		assert!(matches!(result, Err(OrderError::InvalidRequest(_))));
		assert_eq!(
			f.store.get_order("order-1").await.unwrap().shipping_total_cents,
			None
		);
	}

	#[tokio::test]
	async fn test_state_fields_and_ledger_stay_untouched() {
		let f = fixture().await;
		let before = f.store.get_order("order-1").await.unwrap();

		f.handler
			.set_shipping("order-1", FulfillmentType::Ship, domestic_info())
			.await
			.unwrap();

		let after = f.store.get_order("order-1").await.unwrap();
		assert_eq!(after.state, before.state);
		assert_eq!(after.state_updated_at, before.state_updated_at);
		assert_eq!(after.state_expires_at, before.state_expires_at);
		assert_eq!(f.store.state_history("order-1").await.unwrap().len(), 1);
	}

	#[tokio::test]
	async fn test_repeating_overwrites_the_previous_details() {
		let f = fixture().await;

		f.handler
			.set_shipping("order-1", FulfillmentType::Ship, domestic_info())
			.await
			.unwrap();
		let order = f
			.handler
			.set_shipping(
				"order-1",
				FulfillmentType::Ship,
				ShippingInfo {
					country: "IR".to_string(),
					..domestic_info()
				},
			)
			.await
			.unwrap();
		assert_eq!(order.shipping_total_cents, Some(50_000));
		assert_eq!(f.store.state_history("order-1").await.unwrap().len(), 1);
	}

	#[tokio::test]
	async fn test_unknown_order() {
		let f = fixture().await;
		assert!(matches!(
			f.handler
				.set_shipping("missing", FulfillmentType::Ship, domestic_info())
				.await,
			Err(OrderError::OrderNotFound(_))
		));
	}
}
