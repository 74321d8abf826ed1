pub mod auth;
pub mod client;
pub mod error;
pub mod wire;

pub use auth::BearerToken;
pub use client::HttpBookingApi;
pub use error::ClientError;
