use async_trait::async_trait;

use crate::booking::{BookingReceipt, BookingRequest};
use crate::passenger::PassengerInfo;
use crate::search::SeatQueryKey;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingApiError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Request timed out")]
    Timeout,

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Seat no longer available: {message}")]
    SeatUnavailable { message: String },

    #[error("Booking API rejected the request (status {status})")]
    Rejected { status: u16, message: Option<String> },

    #[error("Malformed response: {0}")]
    Decode(String),
}

impl BookingApiError {
    /// Message the server attached to the failure, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            BookingApiError::SeatUnavailable { message } => Some(message),
            BookingApiError::Rejected { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

/// The remote booking service.
#[async_trait]
pub trait BookingApi: Send + Sync {
    /// Seats already taken by other customers for one vehicle run.
    /// "No bookings yet" is an empty list, not an error.
    async fn fetch_booked_seats(&self, key: &SeatQueryKey) -> Result<Vec<i64>, BookingApiError>;

    async fn submit_booking(&self, request: &BookingRequest) -> Result<BookingReceipt, BookingApiError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Session store unavailable: {0}")]
    Unavailable(String),

    #[error("Stored passenger record is corrupt: {0}")]
    Corrupt(String),
}

/// Session-scoped persistence for passenger details across reloads.
#[async_trait]
pub trait PassengerStore: Send + Sync {
    async fn load(&self) -> Result<Option<PassengerInfo>, StoreError>;

    async fn save(&self, passenger: &PassengerInfo) -> Result<(), StoreError>;

    async fn clear(&self) -> Result<(), StoreError>;
}
