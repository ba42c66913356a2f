//! Catalog value objects for artwork lookups.
//!
//! The catalog service returns loosely-typed payloads; the boundary in
//! `exchange-catalog` validates them into the fixed shapes defined here.
//! Required pricing fields are enforced at that boundary, while shipping
//! fees stay optional because their absence is only an error for the
//! branch the shipping calculator actually selects.

use serde::{Deserialize, Serialize};

/// A catalog artwork with everything the order engine needs: a resolved
/// price, the owning partner, shipping settings and edition overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artwork {
	/// Catalog identifier of the artwork.
	pub id: String,
	/// Identifier of the partner that owns (sells) the artwork.
	pub partner_id: String,
	/// List price in minor currency units.
	pub price_cents: i64,
	/// ISO-4217 currency code of the list price.
	pub currency_code: String,
	/// Edition sets, each carrying its own price override.
	#[serde(default)]
	pub edition_sets: Vec<EditionSet>,
	/// Shipping settings, when the partner has configured them.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub shipping: Option<ArtworkShipping>,
}

impl Artwork {
	/// Finds an edition set by identifier.
	pub fn edition_set(&self, edition_set_id: &str) -> Option<&EditionSet> {
		self.edition_sets.iter().find(|e| e.id == edition_set_id)
	}
}

/// One edition of an artwork with its price override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditionSet {
	/// Catalog identifier of the edition set.
	pub id: String,
	/// Price of this edition in minor currency units.
	pub price_cents: i64,
}

/// Shipping settings configured on an artwork.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtworkShipping {
	/// Fee for destinations in the artwork's own country.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub domestic_shipping_fee_cents: Option<i64>,
	/// Fee for all other destinations.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub international_shipping_fee_cents: Option<i64>,
	/// Where the artwork ships from.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub location: Option<ArtworkLocation>,
}

/// Physical origin location of an artwork.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtworkLocation {
	pub country: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub city: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub state: Option<String>,
}
