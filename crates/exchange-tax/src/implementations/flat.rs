//! Flat-rate tax backend for testing and development.
//!
//! Applies a fixed basis-point rate to items plus shipping. Useful where
//! live tax data isn't needed or available; the engine treats the result
//! the same way it treats the real service's numbers.

use crate::{TaxBreakdown, TaxError, TaxInterface, TaxRequest};
use async_trait::async_trait;

/// Tax backend that charges a flat basis-point rate.
pub struct FlatRateTax {
	rate_basis_points: i64,
}

impl FlatRateTax {
	/// Creates a flat-rate backend; `rate_basis_points` of 875 means
	/// 8.75%.
	pub fn new(rate_basis_points: i64) -> Self {
		Self { rate_basis_points }
	}
}

#[async_trait]
impl TaxInterface for FlatRateTax {
	async fn calculate(&self, request: &TaxRequest) -> Result<TaxBreakdown, TaxError> {
		let items: i64 = request
			.line_items
			.iter()
			.map(|li| li.unit_price_cents * i64::from(li.quantity))
			.sum();
		let taxable_amount_cents = items + request.shipping_total_cents;
		Ok(TaxBreakdown {
			taxable_amount_cents,
			tax_total_cents: taxable_amount_cents * self.rate_basis_points / 10_000,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use exchange_types::ShippingInfo;

	#[tokio::test]
	async fn test_flat_rate() {
		let tax = FlatRateTax::new(875);
		let breakdown = tax
			.calculate(&TaxRequest {
				currency_code: "USD".to_string(),
				line_items: vec![crate::TaxLineItem {
					artwork_id: "artwork-id".to_string(),
					quantity: 2,
					unit_price_cents: 540_012,
				}],
				shipping_total_cents: 10_000,
				destination: ShippingInfo {
					name: "Fname Lname".to_string(),
					country: "US".to_string(),
					address_line1: None,
					address_line2: None,
					postal_code: None,
					city: None,
					phone_number: None,
				},
			})
			.await
			.unwrap();

		assert_eq!(breakdown.taxable_amount_cents, 1_090_024);
		assert_eq!(breakdown.tax_total_cents, 1_090_024 * 875 / 10_000);
	}
}
