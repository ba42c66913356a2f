//! Order totals with pass-through tax.
//!
//! The buyer total is items plus shipping plus whatever the tax service
//! answers; no tax rules live here. Totals require shipping details,
//! since the tax destination and the shipping amount both come from
//! them.

use crate::{storage_error, truncate_id, OrderError};
use exchange_storage::OrderStore;
use exchange_tax::{TaxLineItem, TaxRequest, TaxService};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;

/// The computed monetary totals of an order, in minor currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderTotals {
	pub items_total_cents: i64,
	pub shipping_total_cents: i64,
	pub tax_total_cents: i64,
	pub buyer_total_cents: i64,
}

/// Computes order totals against the tax service.
pub struct TotalsCalculator {
	store: Arc<dyn OrderStore>,
	tax: Arc<TaxService>,
}

impl TotalsCalculator {
	pub fn new(store: Arc<dyn OrderStore>, tax: Arc<TaxService>) -> Self {
		Self { store, tax }
	}

	/// Computes the totals of an order.
	///
	/// Requires shipping details to have been set; the destination and
	/// the shipping amount are both inputs to the tax calculation.
	#[instrument(skip(self), fields(order_id = %truncate_id(order_id)))]
	pub async fn totals(&self, order_id: &str) -> Result<OrderTotals, OrderError> {
		let order = self
			.store
			.get_order(order_id)
			.await
			.map_err(|e| storage_error(order_id, e))?;

		let (Some(shipping_total_cents), Some(destination)) =
			(order.shipping_total_cents, order.shipping_info.clone())
		else {
			return Err(OrderError::InvalidRequest(
				"totals require shipping details to be set first".to_string(),
			));
		};

		let line_items = self
			.store
			.line_items(order_id)
			.await
			.map_err(|e| storage_error(order_id, e))?;
		let request = TaxRequest {
			currency_code: order.currency_code.clone(),
			line_items: line_items
				.iter()
				.map(|li| TaxLineItem {
					artwork_id: li.artwork_id.clone(),
					quantity: li.quantity,
					unit_price_cents: li.price_cents,
				})
				.collect(),
			shipping_total_cents,
			destination,
		};
		let breakdown = self.tax.calculate(&request).await?;

		Ok(OrderTotals {
			items_total_cents: order.items_total_cents,
			shipping_total_cents,
			tax_total_cents: breakdown.tax_total_cents,
			buyer_total_cents: order.items_total_cents
				+ shipping_total_cents
				+ breakdown.tax_total_cents,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Utc;
	use exchange_storage::implementations::memory::MemoryStore;
	use exchange_tax::implementations::flat::FlatRateTax;
	use exchange_types::{
		FulfillmentType, LineItem, Order, OrderState, ShippingInfo, StateHistory,
	};

	async fn insert_order(store: &MemoryStore, with_shipping: bool) {
		let now = Utc::now();
		let shipping_info = ShippingInfo {
			name: "Fname Lname".to_string(),
			country: "US".to_string(),
			address_line1: Some("401 Broadway".to_string()),
			address_line2: None,
			postal_code: Some("10013".to_string()),
			city: Some("New York".to_string()),
			phone_number: Some("12125551234".to_string()),
		};
		let order = Order {
			id: "order-1".to_string(),
			code: "B123456".to_string(),
			buyer_id: "user-id".to_string(),
			seller_id: "gravity-partner-id".to_string(),
			currency_code: "USD".to_string(),
			state: OrderState::Pending,
			state_updated_at: now,
			state_expires_at: None,
			fulfillment_type: with_shipping.then_some(FulfillmentType::Ship),
			shipping_info: with_shipping.then_some(shipping_info),
			items_total_cents: 1_080_024,
			shipping_total_cents: with_shipping.then_some(10_000),
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
	}

	fn calculator(store: Arc<MemoryStore>, basis_points: i64) -> TotalsCalculator {
		TotalsCalculator::new(
			store,
			Arc::new(TaxService::new(Box::new(FlatRateTax::new(basis_points)))),
		)
	}

	#[tokio::test]
	async fn test_totals_pass_the_tax_through() {
		let store = Arc::new(MemoryStore::new());
		insert_order(&store, true).await;

		// 8.75% of items plus shipping
		let totals = calculator(store, 875).totals("order-1").await.unwrap();
		assert_eq!(totals.items_total_cents, 1_080_024);
		assert_eq!(totals.shipping_total_cents, 10_000);
		assert_eq!(totals.tax_total_cents, (1_080_024 + 10_000) * 875 / 10_000);
		assert_eq!(
			totals.buyer_total_cents,
			totals.items_total_cents + totals.shipping_total_cents + totals.tax_total_cents
		);
	}

	#[tokio::test]
	async fn test_totals_require_shipping_details() {
		let store = Arc::new(MemoryStore::new());
		insert_order(&store, false).await;

		let result = calculator(store, 875).totals("order-1").await;
		assert!(matches!(result, Err(OrderError::InvalidRequest(_))));
	}

	#[tokio::test]
	async fn test_unknown_order() {
		let store = Arc::new(MemoryStore::new());
		assert!(matches!(
			calculator(store, 875).totals("missing").await,
			Err(OrderError::OrderNotFound(_))
		));
	}
}
