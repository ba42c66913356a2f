//! Shipping fee calculation from artwork shipping settings.
//!
//! Pickup always ships for free. For shipped orders the destination
//! country is compared against the artwork's origin country, case
//! sensitively, to select the domestic or international fee. An absent
//! fee on the selected branch is a data error, never free shipping.

use crate::OrderError;
use exchange_types::{Artwork, ArtworkLocation, ArtworkShipping, FulfillmentType};

/// Calculates the shipping fee in minor currency units for one artwork.
pub fn calculate_shipping(
	artwork: &Artwork,
	fulfillment_type: FulfillmentType,
	destination_country: &str,
) -> Result<i64, OrderError> {
	match fulfillment_type {
		FulfillmentType::Pickup => Ok(0),
		FulfillmentType::Ship => {
			let location = origin_location(artwork)?;
			if is_domestic(location, destination_country) {
				domestic_fee(artwork)
			} else {
				international_fee(artwork)
			}
		}
	}
}

/// Whether a destination counts as domestic for the given origin.
///
/// The comparison is a case-sensitive exact match on the country code.
pub fn is_domestic(location: &ArtworkLocation, destination_country: &str) -> bool {
	location.country == destination_country
}

/// The artwork's domestic shipping fee; absence is a configuration
/// error.
pub fn domestic_fee(artwork: &Artwork) -> Result<i64, OrderError> {
	shipping_settings(artwork)?
		.domestic_shipping_fee_cents
		.ok_or_else(|| missing_fee(artwork, "domestic"))
}

/// The artwork's international shipping fee; absence is a configuration
/// error.
pub fn international_fee(artwork: &Artwork) -> Result<i64, OrderError> {
	shipping_settings(artwork)?
		.international_shipping_fee_cents
		.ok_or_else(|| missing_fee(artwork, "international"))
}

fn shipping_settings(artwork: &Artwork) -> Result<&ArtworkShipping, OrderError> {
	artwork.shipping.as_ref().ok_or_else(|| {
		OrderError::PricingConfiguration(format!(
			"Artwork {} has no shipping settings",
			artwork.id
		))
	})
}

fn origin_location(artwork: &Artwork) -> Result<&ArtworkLocation, OrderError> {
	shipping_settings(artwork)?.location.as_ref().ok_or_else(|| {
		OrderError::PricingConfiguration(format!(
			"Artwork {} is missing its shipping origin location",
			artwork.id
		))
	})
}

fn missing_fee(artwork: &Artwork, branch: &str) -> OrderError {
	OrderError::PricingConfiguration(format!(
		"Artwork {} is missing shipping fee for {} destinations",
		artwork.id, branch
	))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn artwork(domestic: Option<i64>, international: Option<i64>) -> Artwork {
		Artwork {
			id: "artwork-id".to_string(),
			partner_id: "gravity-partner-id".to_string(),
			price_cents: 540_012,
			currency_code: "USD".to_string(),
			edition_sets: vec![],
			shipping: Some(ArtworkShipping {
				domestic_shipping_fee_cents: domestic,
				international_shipping_fee_cents: international,
				location: Some(ArtworkLocation {
					country: "US".to_string(),
					city: Some("Brooklyn".to_string()),
					state: Some("NY".to_string()),
				}),
			}),
		}
	}

	#[test]
	fn test_pickup_is_free() {
		let fee =
			calculate_shipping(&artwork(Some(10_000), Some(50_000)), FulfillmentType::Pickup, "US")
				.unwrap();
		assert_eq!(fee, 0);
	}

	#[test]
	fn test_domestic_destination_uses_domestic_fee() {
		let fee =
			calculate_shipping(&artwork(Some(10_000), Some(50_000)), FulfillmentType::Ship, "US")
				.unwrap();
		assert_eq!(fee, 10_000);
	}

	#[test]
	fn test_international_destination_uses_international_fee() {
		let fee = calculate_shipping(
			&artwork(Some(10_000), Some(50_000)),
			FulfillmentType::Ship,
			"Iran",
		)
		.unwrap();
		assert_eq!(fee, 50_000);
	}

	#[test]
	fn test_missing_domestic_fee_is_an_error_not_free_shipping() {
		let result =
			calculate_shipping(&artwork(None, Some(50_000)), FulfillmentType::Ship, "US");
		assert!(matches!(
			result,
			Err(OrderError::PricingConfiguration(ref m)) if m.contains("missing shipping fee")
		));
	}

	#[test]
	fn test_missing_international_fee_is_an_error() {
		let result =
			calculate_shipping(&artwork(Some(10_000), None), FulfillmentType::Ship, "IR");
		assert!(matches!(
			result,
			Err(OrderError::PricingConfiguration(ref m)) if m.contains("missing shipping fee")
		));
	}

	#[test]
	fn test_is_domestic_is_case_sensitive_exact_match() {
		let location = ArtworkLocation {
			country: "US".to_string(),
			city: None,
			state: None,
		};
		assert!(is_domestic(&location, "US"));
		assert!(!is_domestic(&location, "us"));
		assert!(!is_domestic(&location, "IR"));
	}
}
