//! HTTP server for the exchange API.
//!
//! Routes the inbound order operations to the engine and maps domain
//! errors onto HTTP status codes by kind, never by message.

use axum::{
	extract::{Path, State},
	http::StatusCode,
	response::{IntoResponse, Json, Response},
	routing::{get, post},
	Router,
};
use exchange_config::ApiConfig;
use exchange_core::{CreateOrderRequest, OrderEngine, OrderError, OrderTotals};
use exchange_types::{FulfillmentType, Order, ShippingInfo};
use serde::Deserialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	/// Reference to the order engine for processing requests.
	pub engine: Arc<OrderEngine>,
}

/// Starts the HTTP server for the API.
pub async fn start_server(
	api_config: ApiConfig,
	engine: Arc<OrderEngine>,
) -> Result<(), Box<dyn std::error::Error>> {
	let app = router(AppState { engine });

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Exchange API server starting on {}", bind_address);

	axum::serve(listener, app).await?;

	Ok(())
}

/// Builds the router with the /api base path.
fn router(state: AppState) -> Router {
	Router::new()
		.nest(
			"/api",
			Router::new()
				.route("/orders", post(handle_create_order))
				.route("/orders/{id}", get(handle_get_order))
				.route("/orders/{id}/totals", get(handle_get_totals))
				.route("/orders/{id}/shipping", post(handle_set_shipping))
				.route("/orders/{id}/submit", post(handle_submit))
				.route("/orders/{id}/approve", post(handle_approve))
				.route("/orders/{id}/reject", post(handle_reject)),
		)
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(CorsLayer::permissive()),
		)
		.with_state(state)
}

/// Domain error carried out of a handler.
struct ApiError(OrderError);

impl From<OrderError> for ApiError {
	fn from(error: OrderError) -> Self {
		Self(error)
	}
}

/// Maps a domain error kind onto an HTTP status code.
fn status_code(error: &OrderError) -> StatusCode {
	match error {
		OrderError::OrderNotFound(_) => StatusCode::NOT_FOUND,
		OrderError::InvalidRequest(_)
		| OrderError::InvalidStateTransition { .. }
		| OrderError::PricingConfiguration(_) => StatusCode::UNPROCESSABLE_ENTITY,
		OrderError::ConcurrencyConflict(_) => StatusCode::CONFLICT,
		OrderError::CatalogLookup(_) => StatusCode::BAD_GATEWAY,
		OrderError::Storage(_) | OrderError::Tax(_) => StatusCode::INTERNAL_SERVER_ERROR,
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let status = status_code(&self.0);
		if status.is_server_error() {
			tracing::error!(error = %self.0, "request failed");
		} else {
			tracing::debug!(error = %self.0, "request rejected");
		}
		(
			status,
			Json(serde_json::json!({ "error": self.0.to_string() })),
		)
			.into_response()
	}
}

/// Handles POST /api/orders requests.
async fn handle_create_order(
	State(state): State<AppState>,
	Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
	let order = state.engine.create_from_artwork(request).await?;
	Ok((StatusCode::CREATED, Json(order)))
}

/// Handles GET /api/orders/{id} requests.
async fn handle_get_order(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<Order>, ApiError> {
	Ok(Json(state.engine.order(&id).await?))
}

/// Handles GET /api/orders/{id}/totals requests.
async fn handle_get_totals(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<OrderTotals>, ApiError> {
	Ok(Json(state.engine.totals(&id).await?))
}

/// Body of POST /api/orders/{id}/shipping.
#[derive(Debug, Deserialize)]
struct SetShippingRequest {
	fulfillment_type: FulfillmentType,
	shipping_info: ShippingInfo,
}

/// Handles POST /api/orders/{id}/shipping requests.
async fn handle_set_shipping(
	Path(id): Path<String>,
	State(state): State<AppState>,
	Json(request): Json<SetShippingRequest>,
) -> Result<Json<Order>, ApiError> {
	let order = state
		.engine
		.set_shipping(&id, request.fulfillment_type, request.shipping_info)
		.await?;
	Ok(Json(order))
}

/// Handles POST /api/orders/{id}/submit requests.
async fn handle_submit(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<Order>, ApiError> {
	Ok(Json(state.engine.submit(&id).await?))
}

/// Handles POST /api/orders/{id}/approve requests.
async fn handle_approve(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<Order>, ApiError> {
	Ok(Json(state.engine.approve(&id).await?))
}

/// Handles POST /api/orders/{id}/reject requests.
async fn handle_reject(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<Order>, ApiError> {
	Ok(Json(state.engine.reject(&id).await?))
}
