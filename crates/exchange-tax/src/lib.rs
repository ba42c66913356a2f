//! Tax module for the exchange system.
//!
//! Boundary to the external tax-calculation service. The engine sends
//! line items, the shipping amount and a destination, and treats the
//! returned numbers as opaque pass-throughs for the order total; no tax
//! logic lives on this side of the boundary.

use async_trait::async_trait;
use exchange_types::ShippingInfo;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod flat;
	pub mod http;
}

/// Errors that can occur during tax calculation.
#[derive(Debug, Error)]
pub enum TaxError {
	/// Error that occurs during network communication.
	#[error("Network error: {0}")]
	Network(String),
	/// Error that occurs when the tax service returned an unusable
	/// response.
	#[error("Invalid tax response: {0}")]
	InvalidResponse(String),
}

/// One taxable line of an order as sent to the tax service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxLineItem {
	pub artwork_id: String,
	pub quantity: u32,
	pub unit_price_cents: i64,
}

/// Request sent to the tax service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxRequest {
	pub currency_code: String,
	pub line_items: Vec<TaxLineItem>,
	pub shipping_total_cents: i64,
	/// Destination the order ships to (or is picked up in).
	pub destination: ShippingInfo,
}

/// Response from the tax service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TaxBreakdown {
	/// Portion of the order amount that is taxable, in minor units.
	pub taxable_amount_cents: i64,
	/// Tax owed, in minor units.
	pub tax_total_cents: i64,
}

/// Trait defining the interface to the tax service.
#[async_trait]
pub trait TaxInterface: Send + Sync {
	/// Calculates the tax breakdown for an order.
	async fn calculate(&self, request: &TaxRequest) -> Result<TaxBreakdown, TaxError>;
}

/// Service that fronts the configured tax backend.
pub struct TaxService {
	backend: Box<dyn TaxInterface>,
}

impl TaxService {
	/// Creates a new TaxService with the specified backend.
	pub fn new(backend: Box<dyn TaxInterface>) -> Self {
		Self { backend }
	}

	/// Calculates the tax breakdown for an order.
	pub async fn calculate(&self, request: &TaxRequest) -> Result<TaxBreakdown, TaxError> {
		tracing::debug!(
			line_items = request.line_items.len(),
			shipping_total_cents = request.shipping_total_cents,
			"requesting tax calculation"
		);
		self.backend.calculate(request).await
	}
}
