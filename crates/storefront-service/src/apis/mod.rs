//! Endpoint implementations behind the HTTP routes.
//!
//! Each submodule talks to the [`OrderEngine`](storefront_core::OrderEngine)
//! and returns engine errors untouched; [`to_api_error`] is the single place
//! where they become HTTP responses.

pub mod orders;
pub mod stats;
pub mod work;

use storefront_core::{CancelRejection, LifecycleError};
use storefront_types::APIError;

/// Seconds a client should wait before retrying after a lost race.
const CONFLICT_RETRY_AFTER_SECS: u64 = 1;

/// Maps an engine error to the structured API error surface.
pub fn to_api_error(err: LifecycleError) -> APIError {
	let message = err.to_string();
	match err {
		LifecycleError::NotFound(_) => APIError::NotFound {
			error_type: "ORDER_NOT_FOUND".to_string(),
			message,
		},
		LifecycleError::InvalidTransition { from } => APIError::Conflict {
			error_type: "INVALID_TRANSITION".to_string(),
			message,
			details: Some(serde_json::json!({ "status": from })),
			retry_after: None,
		},
		LifecycleError::TransitionNotAllowed(CancelRejection::WindowExpired) => {
			APIError::Conflict {
				error_type: "CANCEL_WINDOW_EXPIRED".to_string(),
				message,
				details: None,
				retry_after: None,
			}
		},
		LifecycleError::TransitionNotAllowed(CancelRejection::WrongStatus(status)) => {
			APIError::Conflict {
				error_type: "CANCEL_WRONG_STATUS".to_string(),
				message,
				details: Some(serde_json::json!({ "status": status })),
				retry_after: None,
			}
		},
		LifecycleError::ConcurrentModification(_) => APIError::Conflict {
			error_type: "CONCURRENT_MODIFICATION".to_string(),
			message,
			details: None,
			retry_after: Some(CONFLICT_RETRY_AFTER_SECS),
		},
		LifecycleError::PaymentRejected(_) => APIError::UnprocessableEntity {
			error_type: "PAYMENT_REJECTED".to_string(),
			message,
			details: None,
		},
		LifecycleError::InvalidQuery(_) => APIError::BadRequest {
			error_type: "INVALID_REQUEST".to_string(),
			message,
			details: None,
		},
		LifecycleError::Storage(_) => APIError::InternalServerError {
			error_type: "INTERNAL_ERROR".to_string(),
			message,
		},
	}
}

/// Builds a 400 for a request the router could not decode.
pub fn bad_request(message: impl Into<String>) -> APIError {
	APIError::BadRequest {
		error_type: "INVALID_REQUEST".to_string(),
		message: message.into(),
		details: None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use storefront_types::OrderStatus;

	#[test]
	fn test_cancel_rejections_are_distinguishable() {
		let expired = to_api_error(CancelRejection::WindowExpired.into());
		let wrong = to_api_error(CancelRejection::WrongStatus(OrderStatus::Ready).into());

		assert_eq!(expired.status_code(), 409);
		assert_eq!(expired.error_type(), "CANCEL_WINDOW_EXPIRED");
		assert_eq!(wrong.status_code(), 409);
		assert_eq!(wrong.error_type(), "CANCEL_WRONG_STATUS");
		assert_eq!(
			wrong.to_error_response().details,
			Some(serde_json::json!({ "status": "READY" }))
		);
	}

	#[test]
	fn test_concurrent_modification_suggests_retry() {
		let err = to_api_error(LifecycleError::ConcurrentModification("o".to_string()));
		assert_eq!(err.to_error_response().retry_after, Some(1));
	}

	#[test]
	fn test_status_codes() {
		let cases = [
			(LifecycleError::NotFound("o".to_string()), 404),
			(
				LifecycleError::InvalidTransition {
					from: OrderStatus::Completed,
				},
				409,
			),
			(LifecycleError::PaymentRejected("cash".to_string()), 422),
			(LifecycleError::InvalidQuery("page".to_string()), 400),
			(LifecycleError::Storage("disk".to_string()), 500),
		];
		for (err, status) in cases {
			assert_eq!(to_api_error(err).status_code(), status);
		}
	}
}
