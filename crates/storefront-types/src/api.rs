//! API types for the storefront order HTTP API.
//!
//! Request payloads, query parameters and the structured error surface shared
//! by every endpoint.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{CancellationWindow, OrderStatus, OrderSummary};

/// Body of the payment callback.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentConfirmationRequest {
	/// Capture instant reported by the provider. Defaults to the server clock.
	#[serde(default)]
	pub paid_at: Option<DateTime<Utc>>,
}

/// Query parameters of the staff work-queue listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkQueueQuery {
	pub status: OrderStatus,
	/// Local calendar day; today when omitted.
	#[serde(default)]
	pub date: Option<NaiveDate>,
	#[serde(default)]
	pub page: Option<usize>,
	#[serde(default)]
	pub page_size: Option<usize>,
}

/// Query parameters of the work-queue counts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DateQuery {
	#[serde(default)]
	pub date: Option<NaiveDate>,
}

/// Query parameters of the timeline endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimelineQuery {
	#[serde(default)]
	pub limit: Option<usize>,
}

/// Query parameters shared by the revenue and order reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportQuery {
	pub from_date: NaiveDate,
	pub to_date: NaiveDate,
	#[serde(default)]
	pub status: Option<OrderStatus>,
}

/// One row of a customer's order list, with its live cancellation window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerOrderEntry {
	#[serde(flatten)]
	pub summary: OrderSummary,
	pub cancellation: CancellationWindow,
}

/// API error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Error type/code
	pub error: String,
	/// Human-readable description
	pub message: String,
	/// Additional error context
	pub details: Option<serde_json::Value>,
	/// Suggested retry delay in seconds
	#[serde(rename = "retryAfter")]
	pub retry_after: Option<u64>,
}

/// Structured API error type with appropriate HTTP status mapping.
#[derive(Debug)]
pub enum APIError {
	/// Bad request with validation errors (400)
	BadRequest {
		error_type: String,
		message: String,
		details: Option<serde_json::Value>,
	},
	/// Unknown resource (404)
	NotFound { error_type: String, message: String },
	/// Request conflicts with the current state of the order (409)
	Conflict {
		error_type: String,
		message: String,
		details: Option<serde_json::Value>,
		retry_after: Option<u64>,
	},
	/// Unprocessable entity for business logic failures (422)
	UnprocessableEntity {
		error_type: String,
		message: String,
		details: Option<serde_json::Value>,
	},
	/// Internal server error (500)
	InternalServerError { error_type: String, message: String },
}

impl APIError {
	/// Get the HTTP status code for this error.
	pub fn status_code(&self) -> u16 {
		match self {
			APIError::BadRequest { .. } => 400,
			APIError::NotFound { .. } => 404,
			APIError::Conflict { .. } => 409,
			APIError::UnprocessableEntity { .. } => 422,
			APIError::InternalServerError { .. } => 500,
		}
	}

	/// Machine readable error code.
	pub fn error_type(&self) -> &str {
		match self {
			APIError::BadRequest { error_type, .. }
			| APIError::NotFound { error_type, .. }
			| APIError::Conflict { error_type, .. }
			| APIError::UnprocessableEntity { error_type, .. }
			| APIError::InternalServerError { error_type, .. } => error_type,
		}
	}

	/// Convert to ErrorResponse for JSON serialization.
	pub fn to_error_response(&self) -> ErrorResponse {
		match self {
			APIError::BadRequest {
				error_type,
				message,
				details,
			}
			| APIError::UnprocessableEntity {
				error_type,
				message,
				details,
			} => ErrorResponse {
				error: error_type.clone(),
				message: message.clone(),
				details: details.clone(),
				retry_after: None,
			},
			APIError::Conflict {
				error_type,
				message,
				details,
				retry_after,
			} => ErrorResponse {
				error: error_type.clone(),
				message: message.clone(),
				details: details.clone(),
				retry_after: *retry_after,
			},
			APIError::NotFound {
				error_type,
				message,
			}
			| APIError::InternalServerError {
				error_type,
				message,
			} => ErrorResponse {
				error: error_type.clone(),
				message: message.clone(),
				details: None,
				retry_after: None,
			},
		}
	}
}

impl fmt::Display for APIError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			APIError::BadRequest { message, .. } => write!(f, "Bad Request: {}", message),
			APIError::NotFound { message, .. } => write!(f, "Not Found: {}", message),
			APIError::Conflict { message, .. } => write!(f, "Conflict: {}", message),
			APIError::UnprocessableEntity { message, .. } => {
				write!(f, "Unprocessable Entity: {}", message)
			},
			APIError::InternalServerError { message, .. } => {
				write!(f, "Internal Server Error: {}", message)
			},
		}
	}
}

impl std::error::Error for APIError {}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for APIError {
	fn into_response(self) -> axum::response::Response {
		use axum::{http::StatusCode, response::Json};

		let status = StatusCode::from_u16(self.status_code())
			.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

		let error_response = self.to_error_response();
		(status, Json(error_response)).into_response()
	}
}
