//! HTTP tax backend.
//!
//! Posts the tax request to the tax service's JSON API and passes the
//! returned amounts through untouched.

use crate::{TaxBreakdown, TaxError, TaxInterface, TaxRequest};
use async_trait::async_trait;
use std::time::Duration;

/// Tax backend backed by the tax service's HTTP API.
pub struct HttpTax {
	client: reqwest::Client,
	base_url: String,
}

impl HttpTax {
	/// Creates a new HTTP tax client against the given base URL.
	pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TaxError> {
		let client = reqwest::Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| TaxError::Network(e.to_string()))?;
		Ok(Self {
			client,
			base_url: base_url.trim_end_matches('/').to_string(),
		})
	}
}

#[async_trait]
impl TaxInterface for HttpTax {
	async fn calculate(&self, request: &TaxRequest) -> Result<TaxBreakdown, TaxError> {
		let url = format!("{}/taxes", self.base_url);
		let response = self
			.client
			.post(&url)
			.json(request)
			.send()
			.await
			.map_err(|e| TaxError::Network(e.to_string()))?;

		if !response.status().is_success() {
			return Err(TaxError::Network(format!(
				"tax service returned {} for {}",
				response.status(),
				url
			)));
		}

		response
			.json()
			.await
			.map_err(|e| TaxError::InvalidResponse(e.to_string()))
	}
}
