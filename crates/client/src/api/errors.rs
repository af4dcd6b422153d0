//! API error taxonomy.

use serde::Deserialize;
use thiserror::Error;

/// Errors surfaced by backend calls.
///
/// Every failure is reported to the user at the point of the failing action;
/// nothing retries automatically.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request failed before a usable response arrived.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend rejected the request with a user-facing message.
    #[error("{message}")]
    Validation { message: String },

    /// The backend could not hold the requested quantity.
    #[error("product is out of stock")]
    OutOfStock,

    /// The backend refused to create or extend a reservation.
    #[error("reservation denied")]
    ReservationDenied,

    /// The line or its hold no longer exists server-side.
    #[error("reservation not found")]
    ReservationNotFound,

    /// The payment-provider step failed.
    #[error("payment failed: {message}")]
    Payment { message: String },

    /// Any other non-success response.
    #[error("unexpected response ({status}): {message}")]
    Unexpected { status: u16, message: String },
}

/// Error body shape shared by all backend endpoints.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,

    #[serde(default)]
    message: Option<String>,
}

/// Map a non-2xx response to the taxonomy above.
pub(super) async fn error_from_response(response: reqwest::Response) -> ApiError {
    let status = response.status();
    let body: ErrorBody = response.json().await.unwrap_or_default();

    match body.code.as_deref() {
        Some("out_of_stock") => ApiError::OutOfStock,
        Some("reservation_denied") => ApiError::ReservationDenied,
        Some("reservation_not_found" | "reservation_expired") => ApiError::ReservationNotFound,
        _ if status.is_client_error() => ApiError::Validation {
            message: body
                .message
                .unwrap_or_else(|| format!("request rejected ({status})")),
        },
        _ => ApiError::Unexpected {
            status: status.as_u16(),
            message: body.message.unwrap_or_default(),
        },
    }
}

/// Payment endpoints collapse every failure into [`ApiError::Payment`].
pub(super) async fn payment_error_from_response(response: reqwest::Response) -> ApiError {
    let status = response.status();
    let body: ErrorBody = response.json().await.unwrap_or_default();

    ApiError::Payment {
        message: body
            .message
            .unwrap_or_else(|| format!("payment request failed ({status})")),
    }
}
