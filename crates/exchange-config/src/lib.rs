//! Configuration module for the exchange system.
//!
//! This module provides structures and utilities for managing service
//! configuration. It supports loading configuration from TOML files and
//! provides validation to ensure all required values are properly set.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the huge input dump
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the exchange service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Configuration for the storage backend.
	#[serde(default)]
	pub storage: StorageConfig,
	/// Configuration for the catalog service boundary.
	#[serde(default)]
	pub catalog: CatalogConfig,
	/// Configuration for the tax service boundary.
	#[serde(default)]
	pub tax: TaxConfig,
	/// State time-to-live configuration.
	#[serde(default)]
	pub lifecycle: LifecycleConfig,
	/// Configuration for the HTTP API server.
	pub api: Option<ApiConfig>,
}

/// Which storage implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
	Memory,
	File,
}

/// Configuration for the storage backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Which implementation to use.
	#[serde(default = "default_storage_backend")]
	pub backend: StorageBackend,
	/// Base directory for the file backend.
	pub path: Option<PathBuf>,
}

fn default_storage_backend() -> StorageBackend {
	StorageBackend::Memory
}

impl Default for StorageConfig {
	fn default() -> Self {
		Self {
			backend: default_storage_backend(),
			path: None,
		}
	}
}

/// Which catalog implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogBackend {
	Http,
	Memory,
}

/// Configuration for the catalog service boundary.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
	/// Which implementation to use.
	#[serde(default = "default_catalog_backend")]
	pub backend: CatalogBackend,
	/// Base URL of the catalog service (required for the http backend).
	pub base_url: Option<String>,
	/// Request timeout in seconds.
	#[serde(default = "default_timeout_seconds")]
	pub timeout_seconds: u64,
}

fn default_catalog_backend() -> CatalogBackend {
	CatalogBackend::Http
}

/// Returns the default outbound request timeout in seconds.
fn default_timeout_seconds() -> u64 {
	30
}

impl Default for CatalogConfig {
	fn default() -> Self {
		Self {
			backend: default_catalog_backend(),
			base_url: None,
			timeout_seconds: default_timeout_seconds(),
		}
	}
}

/// Which tax implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxBackend {
	Http,
	Flat,
}

/// Configuration for the tax service boundary.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TaxConfig {
	/// Which implementation to use.
	#[serde(default = "default_tax_backend")]
	pub backend: TaxBackend,
	/// Base URL of the tax service (required for the http backend).
	pub base_url: Option<String>,
	/// Request timeout in seconds.
	#[serde(default = "default_timeout_seconds")]
	pub timeout_seconds: u64,
	/// Rate for the flat backend, in basis points.
	#[serde(default)]
	pub flat_rate_basis_points: i64,
}

fn default_tax_backend() -> TaxBackend {
	TaxBackend::Http
}

impl Default for TaxConfig {
	fn default() -> Self {
		Self {
			backend: default_tax_backend(),
			base_url: None,
			timeout_seconds: default_timeout_seconds(),
			flat_rate_basis_points: 0,
		}
	}
}

/// State time-to-live configuration.
///
/// Only states listed here expire; approved and rejected orders have no
/// deadline.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LifecycleConfig {
	/// Hours a pending order may sit before its follow-up fires.
	#[serde(default = "default_ttl_hours")]
	pub pending_ttl_hours: i64,
	/// Hours a submitted order may sit before its follow-up fires.
	#[serde(default = "default_ttl_hours")]
	pub submitted_ttl_hours: i64,
}

/// Returns the default state TTL in hours (two days).
fn default_ttl_hours() -> i64 {
	48
}

impl Default for LifecycleConfig {
	fn default() -> Self {
		Self {
			pending_ttl_hours: default_ttl_hours(),
			submitted_ttl_hours: default_ttl_hours(),
		}
	}
}

/// Configuration for the HTTP API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	/// Whether the API server should be started.
	#[serde(default = "default_api_enabled")]
	pub enabled: bool,
	/// Host to bind to.
	#[serde(default = "default_api_host")]
	pub host: String,
	/// Port to bind to.
	#[serde(default = "default_api_port")]
	pub port: u16,
}

fn default_api_enabled() -> bool {
	true
}

fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
	8080
}

impl Config {
	/// Loads and validates configuration from a TOML file.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let raw = tokio::fs::read_to_string(path).await?;
		Self::from_toml_str(&raw)
	}

	/// Parses and validates configuration from a TOML string.
	pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
		let config: Config = toml::from_str(raw)?;
		config.validate()?;
		Ok(config)
	}

	/// Validates cross-field requirements the serde layer cannot express.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.storage.backend == StorageBackend::File && self.storage.path.is_none() {
			return Err(ConfigError::Validation(
				"storage.path is required for the file backend".to_string(),
			));
		}
		if self.catalog.backend == CatalogBackend::Http && self.catalog.base_url.is_none() {
			return Err(ConfigError::Validation(
				"catalog.base_url is required for the http backend".to_string(),
			));
		}
		if self.tax.backend == TaxBackend::Http && self.tax.base_url.is_none() {
			return Err(ConfigError::Validation(
				"tax.base_url is required for the http backend".to_string(),
			));
		}
		if self.lifecycle.pending_ttl_hours <= 0 || self.lifecycle.submitted_ttl_hours <= 0 {
			return Err(ConfigError::Validation(
				"lifecycle TTLs must be positive".to_string(),
			));
		}
		Ok(())
	}
}
