//! Catalog module for the exchange system.
//!
//! This module is the boundary to the external catalog service that owns
//! artwork data. The engine only ever sees the validated [`Artwork`] value
//! object; loosely-typed payloads are rejected here, and a missing artwork
//! is a distinct outcome from a malformed response.

use async_trait::async_trait;
use exchange_types::Artwork;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod http;
	pub mod memory;
}

/// Errors that can occur during catalog lookups.
#[derive(Debug, Error)]
pub enum CatalogError {
	/// Error that occurs when the requested artwork does not exist.
	#[error("Artwork not found: {0}")]
	NotFound(String),
	/// Error that occurs during network communication.
	#[error("Network error: {0}")]
	Network(String),
	/// Error that occurs when the catalog returned a payload missing
	/// required fields.
	#[error("Invalid catalog response: {0}")]
	InvalidResponse(String),
}

/// Trait defining the interface to the catalog service.
#[async_trait]
pub trait CatalogInterface: Send + Sync {
	/// Fetches an artwork by catalog identifier.
	async fn artwork(&self, artwork_id: &str) -> Result<Artwork, CatalogError>;
}

/// Service that fronts the configured catalog backend.
pub struct CatalogService {
	backend: Box<dyn CatalogInterface>,
}

impl CatalogService {
	/// Creates a new CatalogService with the specified backend.
	pub fn new(backend: Box<dyn CatalogInterface>) -> Self {
		Self { backend }
	}

	/// Fetches an artwork by catalog identifier.
	pub async fn artwork(&self, artwork_id: &str) -> Result<Artwork, CatalogError> {
		tracing::debug!(artwork_id, "fetching artwork from catalog");
		self.backend.artwork(artwork_id).await
	}
}
