//! Main entry point for the exchange service.
//!
//! This binary runs the order engine: it wires the configured storage,
//! catalog, tax and scheduler backends into the engine, drives the
//! follow-up worker that reacts to fired expiration schedules, and
//! serves the HTTP API when enabled.

use clap::Parser;
use exchange_catalog::{CatalogInterface, CatalogService};
use exchange_config::{CatalogBackend, Config, StorageBackend, TaxBackend};
use exchange_core::{FollowUpHandler, OrderEngine, StateTtls};
use exchange_scheduler::SchedulerService;
use exchange_storage::OrderStore;
use exchange_tax::{TaxInterface, TaxService};
use exchange_types::FollowUpTask;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

mod server;

// Import implementations from individual crates
use exchange_catalog::implementations::http::HttpCatalog;
use exchange_catalog::implementations::memory::MemoryCatalog;
use exchange_scheduler::implementations::tokio::TokioScheduler;
use exchange_storage::implementations::file::FileStore;
use exchange_storage::implementations::memory::MemoryStore;
use exchange_tax::implementations::flat::FlatRateTax;
use exchange_tax::implementations::http::HttpTax;

/// Command-line arguments for the exchange service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

/// Main entry point for the exchange service.
///
/// This function:
/// 1. Parses command-line arguments
/// 2. Initializes logging infrastructure
/// 3. Loads configuration from file
/// 4. Builds the order engine with the configured backends
/// 5. Runs the follow-up worker and API server until interrupted
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};

	let default_directive = args.log_level.to_string();
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started exchange service");

	// Load configuration
	let config = Config::from_file(args.config.to_string_lossy().as_ref()).await?;

	// Build the engine with the configured backends
	let (engine, due_queue) = build_engine(&config)?;
	let engine = Arc::new(engine);

	// The worker consumes the due queue for the lifetime of the process
	let worker = tokio::spawn(run_follow_up_worker(
		due_queue,
		engine.follow_up_handler(),
	));

	let api_config = config.api.clone().filter(|api| api.enabled);
	if let Some(api_config) = api_config {
		tokio::select! {
			result = server::start_server(api_config, Arc::clone(&engine)) => {
				tracing::info!("API server finished");
				result?;
			}
			_ = tokio::signal::ctrl_c() => {
				tracing::info!("Shutdown signal received");
			}
		}
	} else {
		tracing::info!("API disabled, running follow-up worker only");
		tokio::signal::ctrl_c().await?;
		tracing::info!("Shutdown signal received");
	}

	worker.abort();
	tracing::info!("Stopped exchange service");
	Ok(())
}

/// Builds the order engine from configuration.
///
/// Selects the storage, catalog and tax backends named in the config and
/// wires them into the engine together with the tokio scheduler. Returns
/// the engine and the scheduler's due queue for the follow-up worker.
fn build_engine(
	config: &Config,
) -> Result<(OrderEngine, mpsc::UnboundedReceiver<FollowUpTask>), Box<dyn std::error::Error>> {
	let store: Arc<dyn OrderStore> = match config.storage.backend {
		StorageBackend::Memory => Arc::new(MemoryStore::new()),
		StorageBackend::File => {
			let path = config
				.storage
				.path
				.as_ref()
				.ok_or("storage.path is required for the file backend")?;
			Arc::new(FileStore::new(path.clone())?)
		}
	};

	let catalog: Box<dyn CatalogInterface> = match config.catalog.backend {
		CatalogBackend::Http => {
			let base_url = config
				.catalog
				.base_url
				.as_deref()
				.ok_or("catalog.base_url is required for the http backend")?;
			Box::new(HttpCatalog::new(
				base_url,
				Duration::from_secs(config.catalog.timeout_seconds),
			)?)
		}
		CatalogBackend::Memory => Box::new(MemoryCatalog::new()),
	};

	let tax: Box<dyn TaxInterface> = match config.tax.backend {
		TaxBackend::Http => {
			let base_url = config
				.tax
				.base_url
				.as_deref()
				.ok_or("tax.base_url is required for the http backend")?;
			Box::new(HttpTax::new(
				base_url,
				Duration::from_secs(config.tax.timeout_seconds),
			)?)
		}
		TaxBackend::Flat => Box::new(FlatRateTax::new(config.tax.flat_rate_basis_points)),
	};

	let (scheduler, due_queue) = TokioScheduler::new();

	let engine = OrderEngine::new(
		store,
		Arc::new(CatalogService::new(catalog)),
		Arc::new(TaxService::new(tax)),
		Arc::new(SchedulerService::new(Box::new(scheduler))),
		StateTtls::from_hours(
			config.lifecycle.pending_ttl_hours,
			config.lifecycle.submitted_ttl_hours,
		),
	);

	Ok((engine, due_queue))
}

/// Drains the scheduler's due queue into the follow-up handler.
async fn run_follow_up_worker(
	mut due_queue: mpsc::UnboundedReceiver<FollowUpTask>,
	handler: Arc<FollowUpHandler>,
) {
	while let Some(task) = due_queue.recv().await {
		if let Err(error) = handler.handle(task).await {
			tracing::error!(%error, "follow-up handling failed");
		}
	}
	tracing::debug!("Follow-up queue closed");
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::tempdir;

	#[test]
	fn test_args_default_values() {
		let args = Args {
			config: PathBuf::from("config.toml"),
			log_level: "info".to_string(),
		};

		assert_eq!(args.config, PathBuf::from("config.toml"));
		assert_eq!(args.log_level, "info");
	}

	#[test]
	fn test_build_engine_with_memory_backends() {
		let config = Config::from_toml_str(
			r#"
			[catalog]
			backend = "memory"

			[tax]
			backend = "flat"
			flat_rate_basis_points = 875
			"#,
		)
		.unwrap();

		assert!(build_engine(&config).is_ok());
	}

	#[test]
	fn test_build_engine_with_file_storage() {
		let temp_dir = tempdir().unwrap();
		let config = Config::from_toml_str(&format!(
			r#"
			[storage]
			backend = "file"
			path = "{}"

			[catalog]
			backend = "memory"

			[tax]
			backend = "flat"
			"#,
			temp_dir.path().display()
		))
		.unwrap();

		assert!(build_engine(&config).is_ok());
	}

	#[tokio::test]
	async fn test_follow_up_worker_stops_when_queue_closes() {
		let config = Config::from_toml_str(
			r#"
			[catalog]
			backend = "memory"

			[tax]
			backend = "flat"
			"#,
		)
		.unwrap();
		let (engine, due_queue) = build_engine(&config).unwrap();
		let engine = Arc::new(engine);

		let worker = tokio::spawn(run_follow_up_worker(
			due_queue,
			engine.follow_up_handler(),
		));
		drop(engine);

		// Closing the sending side ends the worker loop
		worker.await.unwrap();
	}
}
