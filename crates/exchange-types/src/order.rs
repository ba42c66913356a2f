//! Order aggregate types for the exchange system.
//!
//! This module defines the central order aggregate together with its owned
//! children: priced line items and the append-only state history ledger.
//! Line items and history entries never exist without a parent order.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix of every human-facing order code.
pub const ORDER_CODE_PREFIX: char = 'B';

/// Lifecycle states an order can occupy.
///
/// The legal transitions between these states are owned by the state
/// machine in `exchange-core`; nothing outside of it may move an order
/// from one state to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderState {
	Pending,
	Submitted,
	Approved,
	Rejected,
}

impl fmt::Display for OrderState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Pending => write!(f, "PENDING"),
			Self::Submitted => write!(f, "SUBMITTED"),
			Self::Approved => write!(f, "APPROVED"),
			Self::Rejected => write!(f, "REJECTED"),
		}
	}
}

/// Triggers that request a state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderTrigger {
	Submit,
	Approve,
	Reject,
}

impl fmt::Display for OrderTrigger {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Submit => write!(f, "submit"),
			Self::Approve => write!(f, "approve"),
			Self::Reject => write!(f, "reject"),
		}
	}
}

/// How an order reaches the buyer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FulfillmentType {
	/// Buyer picks the work up; no shipping fee applies.
	Pickup,
	/// The work is shipped; a domestic or international fee applies.
	Ship,
}

/// Shipping contact details captured on an order.
///
/// Which fields are required depends on the fulfillment type, see
/// [`ShippingInfo::complete_for`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingInfo {
	pub name: String,
	pub country: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub address_line1: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub address_line2: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub postal_code: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub city: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub phone_number: Option<String>,
}

impl ShippingInfo {
	/// Whether the captured details are sufficient for the given
	/// fulfillment type.
	///
	/// Pickup only needs a name and a country; shipping additionally
	/// requires the first address line, postal code, city and a phone
	/// number. The second address line is always optional.
	pub fn complete_for(&self, fulfillment_type: FulfillmentType) -> bool {
		let has = |field: &Option<String>| field.as_deref().is_some_and(|v| !v.is_empty());
		let base = !self.name.is_empty() && !self.country.is_empty();
		match fulfillment_type {
			FulfillmentType::Pickup => base,
			FulfillmentType::Ship => {
				base && has(&self.address_line1)
					&& has(&self.postal_code)
					&& has(&self.city)
					&& has(&self.phone_number)
			}
		}
	}
}

/// The central order aggregate.
///
/// Identity, parties and currency are fixed at creation. State fields are
/// written only by the state machine; `state_expires_at` is `Some` exactly
/// when the current state has a time-to-live, and always equals
/// `state_updated_at` plus that TTL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
	/// Unique identifier for this order.
	pub id: String,
	/// Human-facing short code, one letter followed by six digits.
	pub code: String,
	/// Buyer party identifier.
	pub buyer_id: String,
	/// Seller party identifier, taken from the artwork's owning partner.
	pub seller_id: String,
	/// ISO-4217 currency code, derived from the priced artwork.
	pub currency_code: String,
	/// Current lifecycle state.
	pub state: OrderState,
	/// Instant of the last state transition.
	pub state_updated_at: DateTime<Utc>,
	/// Expiration deadline of the current state, when it has a TTL.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub state_expires_at: Option<DateTime<Utc>>,
	/// How the order is fulfilled, once the buyer has chosen.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub fulfillment_type: Option<FulfillmentType>,
	/// Shipping details, once provided.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub shipping_info: Option<ShippingInfo>,
	/// Sum of line item subtotals in minor currency units.
	pub items_total_cents: i64,
	/// Shipping fee in minor currency units, once computed.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub shipping_total_cents: Option<i64>,
	/// Timestamp when this order was created.
	pub created_at: DateTime<Utc>,
	/// Timestamp when this order was last written.
	pub updated_at: DateTime<Utc>,
}

impl Order {
	/// Overall total owed by the buyer, once shipping has been computed.
	///
	/// The tax amount is an opaque pass-through from the tax service.
	pub fn buyer_total_cents(&self, tax_total_cents: i64) -> Option<i64> {
		self.shipping_total_cents
			.map(|shipping| self.items_total_cents + shipping + tax_total_cents)
	}

	/// Whether the order carries shipping details sufficient for its
	/// chosen fulfillment type.
	pub fn has_shipping_info(&self) -> bool {
		match (self.fulfillment_type, &self.shipping_info) {
			(Some(fulfillment_type), Some(info)) => info.complete_for(fulfillment_type),
			_ => false,
		}
	}
}

/// Generates a fresh human-facing order code.
///
/// The format is one uppercase prefix letter followed by exactly six
/// digits, zero-padded.
pub fn generate_order_code() -> String {
	let digits: u32 = rand::rng().random_range(0..1_000_000);
	format!("{}{:06}", ORDER_CODE_PREFIX, digits)
}

/// One priced, quantified unit within an order.
///
/// The unit price is resolved once at creation and never re-fetched;
/// corrections require a new order, not a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
	/// Unique identifier for this line item.
	pub id: String,
	/// Parent order identifier.
	pub order_id: String,
	/// Catalog artwork identifier.
	pub artwork_id: String,
	/// Edition set identifier, when a specific edition was ordered.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub edition_set_id: Option<String>,
	/// Ordered quantity, strictly positive.
	pub quantity: u32,
	/// Unit price in minor currency units.
	pub price_cents: i64,
}

impl LineItem {
	/// Subtotal in minor currency units.
	pub fn subtotal_cents(&self) -> i64 {
		self.price_cents * i64::from(self.quantity)
	}
}

/// One append-only ledger entry recording a state the order occupied.
///
/// Exactly one entry is written at creation and one per accepted
/// transition; entries are never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateHistory {
	/// Parent order identifier.
	pub order_id: String,
	/// The state the order entered.
	pub state: OrderState,
	/// Instant at which the state became effective.
	pub effective_at: DateTime<Utc>,
}

/// Payload of a deferred follow-up action.
///
/// Carries the state the order was in when the follow-up was scheduled so
/// that the handler can detect a stale schedule at fire time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpTask {
	pub order_id: String,
	pub state: OrderState,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_order_code_format() {
		for _ in 0..100 {
			let code = generate_order_code();
			assert_eq!(code.len(), 7);
			assert!(code.starts_with(ORDER_CODE_PREFIX));
			assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
		}
	}

	#[test]
	fn test_line_item_subtotal() {
		let line_item = LineItem {
			id: "li-1".to_string(),
			order_id: "order-1".to_string(),
			artwork_id: "artwork-1".to_string(),
			edition_set_id: None,
			quantity: 2,
			price_cents: 540_012,
		};
		assert_eq!(line_item.subtotal_cents(), 1_080_024);
	}

	#[test]
	fn test_shipping_info_completeness() {
		let info = ShippingInfo {
			name: "Fname Lname".to_string(),
			country: "IR".to_string(),
			address_line1: None,
			address_line2: None,
			postal_code: None,
			city: None,
			phone_number: None,
		};
		assert!(info.complete_for(FulfillmentType::Pickup));
		assert!(!info.complete_for(FulfillmentType::Ship));

		let info = ShippingInfo {
			address_line1: Some("Vanak".to_string()),
			postal_code: Some("09821".to_string()),
			city: Some("Tehran".to_string()),
			phone_number: Some("0923".to_string()),
			..info
		};
		assert!(info.complete_for(FulfillmentType::Ship));
	}
}
