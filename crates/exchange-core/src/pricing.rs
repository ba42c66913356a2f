//! Unit price resolution against catalog data.
//!
//! An order line is priced once, at creation, from the artwork's own
//! price or from the ordered edition set's override. Prices are never
//! re-fetched on later reads.

use crate::OrderError;
use exchange_types::Artwork;

/// A resolved unit price with its currency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPrice {
	pub price_cents: i64,
	pub currency_code: String,
}

/// Resolves the unit price for an artwork, honoring an edition set's
/// price override when one is ordered.
///
/// An unknown edition set id is a pricing configuration error, distinct
/// from the artwork itself being unknown (which the catalog boundary
/// reports before this point is reached).
pub fn resolve_price(
	artwork: &Artwork,
	edition_set_id: Option<&str>,
) -> Result<ResolvedPrice, OrderError> {
	let price_cents = match edition_set_id {
		Some(id) => {
			artwork
				.edition_set(id)
				.ok_or_else(|| {
					OrderError::PricingConfiguration(format!(
						"Unknown edition set {} on artwork {}",
						id, artwork.id
					))
				})?
				.price_cents
		}
		None => artwork.price_cents,
	};
	Ok(ResolvedPrice {
		price_cents,
		currency_code: artwork.currency_code.clone(),
	})
}
