pub mod booking;
pub mod passenger;
pub mod payment;
pub mod repository;
pub mod search;

pub use booking::{BookingReceipt, BookingRequest};
pub use passenger::PassengerInfo;
pub use payment::{BookingStatus, PaymentMethod, PaymentStatus, ProofArtifact};
pub use repository::{BookingApi, BookingApiError, PassengerStore, StoreError};
pub use search::{Route, SeatQueryKey, ServiceKind, ServiceSearch};

/// Seat numbers are 1-based positions within a vehicle.
pub type SeatNumber = u32;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
