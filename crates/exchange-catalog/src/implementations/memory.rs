//! In-memory catalog backend.
//!
//! Serves artworks from a fixed map, for tests and local development
//! where the real catalog service isn't available.

use crate::{CatalogError, CatalogInterface};
use async_trait::async_trait;
use exchange_types::Artwork;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Catalog backend that serves artworks from memory.
pub struct MemoryCatalog {
	artworks: RwLock<HashMap<String, Artwork>>,
}

impl MemoryCatalog {
	/// Creates an empty in-memory catalog.
	pub fn new() -> Self {
		Self {
			artworks: RwLock::new(HashMap::new()),
		}
	}

	/// Adds or replaces an artwork.
	pub async fn insert(&self, artwork: Artwork) {
		let mut artworks = self.artworks.write().await;
		artworks.insert(artwork.id.clone(), artwork);
	}
}

impl Default for MemoryCatalog {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl CatalogInterface for MemoryCatalog {
	async fn artwork(&self, artwork_id: &str) -> Result<Artwork, CatalogError> {
		let artworks = self.artworks.read().await;
		artworks
			.get(artwork_id)
			.cloned()
			.ok_or_else(|| CatalogError::NotFound(artwork_id.to_string()))
	}
}
