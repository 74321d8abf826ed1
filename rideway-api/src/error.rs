use reqwest::StatusCode;
use rideway_core::BookingApiError;
use serde_json::Value;

const SEAT_CONFLICT_FALLBACK: &str = "One or more selected seats are no longer available";

/// Problems constructing the client; request-time failures are `BookingApiError`.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("HTTP client could not be built: {0}")]
    Build(String),
}

pub(crate) fn transport_error(err: reqwest::Error) -> BookingApiError {
    if err.is_timeout() {
        BookingApiError::Timeout
    } else if err.is_decode() {
        BookingApiError::Decode(err.to_string())
    } else {
        BookingApiError::Transport(err.to_string())
    }
}

/// `message`, then `error`, from a JSON error body. Plain-text bodies are used as-is.
pub fn server_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(json) => ["message", "error"]
            .iter()
            .filter_map(|key| json.get(*key))
            .find_map(|value| match value {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Value::Object(inner) => inner
                    .get("message")
                    .and_then(Value::as_str)
                    .map(|s| s.trim().to_string()),
                _ => None,
            }),
        Err(_) if !trimmed.starts_with('<') => Some(trimmed.to_string()),
        Err(_) => None,
    }
}

/// Non-success status of a booked-seat query. 404 is handled by the caller as "nothing booked".
pub(crate) fn query_status_error(status: StatusCode, body: &str) -> BookingApiError {
    match status {
        StatusCode::UNAUTHORIZED => BookingApiError::Unauthorized,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => BookingApiError::Timeout,
        status => BookingApiError::Rejected {
            status: status.as_u16(),
            message: server_message(body),
        },
    }
}

pub(crate) fn submission_status_error(status: StatusCode, body: &str) -> BookingApiError {
    match status {
        StatusCode::CONFLICT => BookingApiError::SeatUnavailable {
            message: server_message(body).unwrap_or_else(|| SEAT_CONFLICT_FALLBACK.to_string()),
        },
        status => query_status_error(status, body),
    }
}
