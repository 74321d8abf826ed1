pub mod models;
pub mod pii;

pub use models::events::{BookingEvent, EventEnvelope};
pub use pii::Masked;
