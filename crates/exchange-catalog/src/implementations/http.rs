//! HTTP catalog backend.
//!
//! Talks to the catalog service over its JSON API and validates the
//! loosely-typed artwork payload into the fixed-shape value object. A 404
//! maps to [`CatalogError::NotFound`]; a 2xx payload missing required
//! pricing fields maps to [`CatalogError::InvalidResponse`].

use crate::{CatalogError, CatalogInterface};
use async_trait::async_trait;
use exchange_types::{Artwork, ArtworkLocation, ArtworkShipping, EditionSet};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

/// Catalog backend backed by the catalog service's HTTP API.
pub struct HttpCatalog {
	client: reqwest::Client,
	base_url: String,
}

impl HttpCatalog {
	/// Creates a new HTTP catalog client against the given base URL.
	pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CatalogError> {
		let client = reqwest::Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| CatalogError::Network(e.to_string()))?;
		Ok(Self {
			client,
			base_url: base_url.trim_end_matches('/').to_string(),
		})
	}
}

#[async_trait]
impl CatalogInterface for HttpCatalog {
	async fn artwork(&self, artwork_id: &str) -> Result<Artwork, CatalogError> {
		let url = format!("{}/artwork/{}", self.base_url, artwork_id);
		let response = self
			.client
			.get(&url)
			.send()
			.await
			.map_err(|e| CatalogError::Network(e.to_string()))?;

		if response.status() == StatusCode::NOT_FOUND {
			return Err(CatalogError::NotFound(artwork_id.to_string()));
		}
		if !response.status().is_success() {
			return Err(CatalogError::Network(format!(
				"catalog returned {} for {}",
				response.status(),
				url
			)));
		}

		let payload: ArtworkPayload = response
			.json()
			.await
			.map_err(|e| CatalogError::InvalidResponse(e.to_string()))?;
		payload.validate()
	}
}

/// Raw artwork payload as returned by the catalog service.
///
/// Every field is optional at the wire level; [`ArtworkPayload::validate`]
/// decides what is actually required.
#[derive(Debug, Deserialize)]
pub(crate) struct ArtworkPayload {
	id: Option<String>,
	partner_id: Option<String>,
	price_cents: Option<i64>,
	currency_code: Option<String>,
	#[serde(default)]
	edition_sets: Vec<EditionSetPayload>,
	domestic_shipping_fee_cents: Option<i64>,
	international_shipping_fee_cents: Option<i64>,
	location: Option<LocationPayload>,
}

#[derive(Debug, Deserialize)]
struct EditionSetPayload {
	id: Option<String>,
	price_cents: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct LocationPayload {
	country: Option<String>,
	city: Option<String>,
	state: Option<String>,
}

impl ArtworkPayload {
	pub(crate) fn validate(self) -> Result<Artwork, CatalogError> {
		let missing = |field: &str| CatalogError::InvalidResponse(format!("missing {field}"));

		let id = self.id.ok_or_else(|| missing("id"))?;
		let partner_id = self.partner_id.ok_or_else(|| missing("partner_id"))?;
		let price_cents = self.price_cents.ok_or_else(|| missing("price_cents"))?;
		let currency_code = self.currency_code.ok_or_else(|| missing("currency_code"))?;

		let edition_sets = self
			.edition_sets
			.into_iter()
			.map(|e| {
				Ok(EditionSet {
					id: e.id.ok_or_else(|| missing("edition_sets.id"))?,
					price_cents: e
						.price_cents
						.ok_or_else(|| missing("edition_sets.price_cents"))?,
				})
			})
			.collect::<Result<Vec<_>, CatalogError>>()?;

		// Shipping fees stay optional here; the shipping calculator
		// rejects an absent fee only for the branch it selects.
		let location = match self.location {
			Some(location) => Some(ArtworkLocation {
				country: location.country.ok_or_else(|| missing("location.country"))?,
				city: location.city,
				state: location.state,
			}),
			None => None,
		};
		let shipping = if self.domestic_shipping_fee_cents.is_some()
			|| self.international_shipping_fee_cents.is_some()
			|| location.is_some()
		{
			Some(ArtworkShipping {
				domestic_shipping_fee_cents: self.domestic_shipping_fee_cents,
				international_shipping_fee_cents: self.international_shipping_fee_cents,
				location,
			})
		} else {
			None
		};

		Ok(Artwork {
			id,
			partner_id,
			price_cents,
			currency_code,
			edition_sets,
			shipping,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn payload(value: serde_json::Value) -> ArtworkPayload {
		serde_json::from_value(value).unwrap()
	}

	#[test]
	fn test_full_payload_parses() {
		let artwork = payload(json!({
			"id": "artwork-id",
			"partner_id": "gravity-partner-id",
			"price_cents": 540012,
			"currency_code": "USD",
			"edition_sets": [{ "id": "edition-set-id", "price_cents": 420042 }],
			"domestic_shipping_fee_cents": 10000,
			"international_shipping_fee_cents": 50000,
			"location": { "country": "US", "city": "Brooklyn", "state": "NY" }
		}))
		.validate()
		.unwrap();

		assert_eq!(artwork.price_cents, 540_012);
		assert_eq!(artwork.partner_id, "gravity-partner-id");
		assert_eq!(artwork.edition_sets[0].price_cents, 420_042);
		let shipping = artwork.shipping.unwrap();
		assert_eq!(shipping.domestic_shipping_fee_cents, Some(10_000));
		assert_eq!(shipping.location.unwrap().country, "US");
	}

	#[test]
	fn test_missing_price_is_invalid_response() {
		let result = payload(json!({
			"id": "artwork-id",
			"partner_id": "gravity-partner-id",
			"currency_code": "USD"
		}))
		.validate();
		assert!(
			matches!(result, Err(CatalogError::InvalidResponse(ref m)) if m.contains("price_cents"))
		);
	}

	#[test]
	fn test_absent_shipping_fees_are_preserved_not_defaulted() {
		let artwork = payload(json!({
			"id": "artwork-id",
			"partner_id": "gravity-partner-id",
			"price_cents": 540012,
			"currency_code": "USD",
			"location": { "country": "US" }
		}))
		.validate()
		.unwrap();

		let shipping = artwork.shipping.unwrap();
		assert_eq!(shipping.domestic_shipping_fee_cents, None);
		assert_eq!(shipping.international_shipping_fee_cents, None);
	}
}
