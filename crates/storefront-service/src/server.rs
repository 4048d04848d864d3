//! HTTP server for the storefront order API.
//!
//! Routes live under `/api`. Handlers decode the request, call into
//! [`crate::apis`], and turn engine errors into [`APIError`] responses.

use axum::{
	body::Bytes,
	extract::{
		rejection::{JsonRejection, QueryRejection},
		Path, Query, State,
	},
	http::{HeaderName, HeaderValue, Method, StatusCode},
	response::Json,
	routing::{get, post},
	Router,
};
use std::sync::Arc;
use std::time::Duration;
use storefront_config::{ApiConfig, CorsConfig};
use storefront_core::OrderEngine;
use storefront_types::{
	APIError, CancellationWindow, CustomerOrderEntry, DateQuery, NewOrder, Order, OrderReport,
	OrderSummary, Page, PaymentConfirmationRequest, ProgressView, QueueCounts, ReportQuery,
	RevenueSummary, TimelineEvent, TimelineQuery, WorkQueueQuery,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
	cors::{Any, CorsLayer},
	timeout::TimeoutLayer,
	trace::TraceLayer,
};

use crate::apis::{self, bad_request, to_api_error};

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
	let app = build_router(AppState { engine }, &api_config);

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Storefront API server starting on {}", bind_address);

	axum::serve(listener, app).await?;

	Ok(())
}

/// Builds the router with the `/api` base path and middleware.
pub fn build_router(state: AppState, api_config: &ApiConfig) -> Router {
	Router::new()
		.nest(
			"/api",
			Router::new()
				.route("/orders", post(handle_place_order))
				.route("/orders/{id}", get(handle_get_order))
				.route("/orders/{id}/cancellation", get(handle_get_cancellation))
				.route("/orders/{id}/cancel", post(handle_cancel))
				.route("/orders/{id}/payment", post(handle_payment))
				.route("/orders/{id}/progress", get(handle_get_progress))
				.route("/orders/{id}/timeline", get(handle_get_timeline))
				.route("/customers/{id}/orders", get(handle_customer_orders))
				.route("/work", get(handle_work_queue))
				.route("/work/counts", get(handle_work_counts))
				.route("/work/{id}/advance", post(handle_advance))
				.route("/stats/revenue", get(handle_revenue))
				.route("/stats/orders", get(handle_order_report)),
		)
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(TimeoutLayer::new(Duration::from_secs(
					api_config.timeout_seconds,
				)))
				.layer(cors_layer(api_config.cors.as_ref())),
		)
		.with_state(state)
}

/// CORS from configuration, permissive when none is given.
fn cors_layer(cors: Option<&CorsConfig>) -> CorsLayer {
	let Some(cors) = cors else {
		return CorsLayer::permissive();
	};

	let layer = if cors.allowed_origins.iter().any(|origin| origin == "*") {
		CorsLayer::new().allow_origin(Any)
	} else {
		let origins: Vec<HeaderValue> = cors
			.allowed_origins
			.iter()
			.filter_map(|origin| HeaderValue::from_str(origin).ok())
			.collect();
		CorsLayer::new().allow_origin(origins)
	};

	let layer = if cors.allowed_methods.is_empty() {
		layer.allow_methods([Method::GET, Method::POST])
	} else {
		let methods: Vec<Method> = cors
			.allowed_methods
			.iter()
			.filter_map(|method| Method::from_bytes(method.as_bytes()).ok())
			.collect();
		layer.allow_methods(methods)
	};

	if cors.allowed_headers.is_empty() {
		layer.allow_headers(Any)
	} else {
		let headers: Vec<HeaderName> = cors
			.allowed_headers
			.iter()
			.filter_map(|header| HeaderName::from_bytes(header.as_bytes()).ok())
			.collect();
		layer.allow_headers(headers)
	}
}

/// Logs and converts an engine error.
fn rejected(operation: &str, err: storefront_core::LifecycleError) -> APIError {
	tracing::warn!("{} failed: {}", operation, err);
	to_api_error(err)
}

/// Handles POST /api/orders requests.
///
/// Checkout hands over the order once it has been placed; the engine assigns
/// the id and stores it in `PREPARING`.
async fn handle_place_order(
	State(state): State<AppState>,
	body: Result<Json<NewOrder>, JsonRejection>,
) -> Result<(StatusCode, Json<Order>), APIError> {
	let Json(new_order) = body.map_err(|e| bad_request(e.body_text()))?;
	match apis::orders::place_order(&state.engine, new_order).await {
		Ok(order) => Ok((StatusCode::CREATED, Json(order))),
		Err(e) => Err(rejected("Order intake", e)),
	}
}

/// Handles GET /api/orders/{id} requests.
async fn handle_get_order(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<Order>, APIError> {
	apis::orders::get_order(&state.engine, &id)
		.await
		.map(Json)
		.map_err(|e| rejected("Order retrieval", e))
}

/// Handles GET /api/orders/{id}/cancellation requests.
async fn handle_get_cancellation(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<CancellationWindow>, APIError> {
	apis::orders::get_cancellation(&state.engine, &id)
		.await
		.map(Json)
		.map_err(|e| rejected("Cancellation lookup", e))
}

/// Handles POST /api/orders/{id}/cancel requests.
async fn handle_cancel(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<Order>, APIError> {
	apis::orders::cancel_order(&state.engine, &id)
		.await
		.map(Json)
		.map_err(|e| rejected("Cancellation", e))
}

/// Handles POST /api/orders/{id}/payment requests.
///
/// The body is optional; an empty body means "paid now".
async fn handle_payment(
	Path(id): Path<String>,
	State(state): State<AppState>,
	body: Bytes,
) -> Result<Json<Order>, APIError> {
	let request = if body.is_empty() {
		PaymentConfirmationRequest::default()
	} else {
		serde_json::from_slice(&body).map_err(|e| bad_request(e.to_string()))?
	};

	apis::orders::confirm_payment(&state.engine, &id, request)
		.await
		.map(Json)
		.map_err(|e| rejected("Payment confirmation", e))
}

/// Handles GET /api/orders/{id}/progress requests.
async fn handle_get_progress(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<ProgressView>, APIError> {
	apis::orders::get_progress(&state.engine, &id)
		.await
		.map(Json)
		.map_err(|e| rejected("Progress lookup", e))
}

/// Handles GET /api/orders/{id}/timeline requests.
async fn handle_get_timeline(
	Path(id): Path<String>,
	State(state): State<AppState>,
	query: Result<Query<TimelineQuery>, QueryRejection>,
) -> Result<Json<Vec<TimelineEvent>>, APIError> {
	let Query(query) = query.map_err(|e| bad_request(e.body_text()))?;
	apis::orders::get_timeline(&state.engine, &id, query.limit)
		.await
		.map(Json)
		.map_err(|e| rejected("Timeline lookup", e))
}

/// Handles GET /api/customers/{id}/orders requests.
async fn handle_customer_orders(
	Path(customer_id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<Vec<CustomerOrderEntry>>, APIError> {
	apis::orders::customer_orders(&state.engine, &customer_id)
		.await
		.map(Json)
		.map_err(|e| rejected("Customer order listing", e))
}

/// Handles GET /api/work requests.
async fn handle_work_queue(
	State(state): State<AppState>,
	query: Result<Query<WorkQueueQuery>, QueryRejection>,
) -> Result<Json<Page<OrderSummary>>, APIError> {
	let Query(query) = query.map_err(|e| bad_request(e.body_text()))?;
	apis::work::list(&state.engine, query)
		.await
		.map(Json)
		.map_err(|e| rejected("Work queue listing", e))
}

/// Handles GET /api/work/counts requests.
async fn handle_work_counts(
	State(state): State<AppState>,
	query: Result<Query<DateQuery>, QueryRejection>,
) -> Result<Json<QueueCounts>, APIError> {
	let Query(query) = query.map_err(|e| bad_request(e.body_text()))?;
	apis::work::counts(&state.engine, query)
		.await
		.map(Json)
		.map_err(|e| rejected("Work queue counts", e))
}

/// Handles POST /api/work/{id}/advance requests.
async fn handle_advance(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<Order>, APIError> {
	apis::work::advance(&state.engine, &id)
		.await
		.map(Json)
		.map_err(|e| rejected("Advance", e))
}

/// Handles GET /api/stats/revenue requests.
async fn handle_revenue(
	State(state): State<AppState>,
	query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Json<RevenueSummary>, APIError> {
	let Query(query) = query.map_err(|e| bad_request(e.body_text()))?;
	apis::stats::revenue(&state.engine, query)
		.await
		.map(Json)
		.map_err(|e| rejected("Revenue report", e))
}

/// Handles GET /api/stats/orders requests.
async fn handle_order_report(
	State(state): State<AppState>,
	query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Json<OrderReport>, APIError> {
	let Query(query) = query.map_err(|e| bad_request(e.body_text()))?;
	apis::stats::orders(&state.engine, query)
		.await
		.map(Json)
		.map_err(|e| rejected("Order report", e))
}
