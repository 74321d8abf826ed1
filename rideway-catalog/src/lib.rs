pub mod offering;
pub mod normalize;
pub mod pricing;
pub mod inventory;

pub use offering::{Fare, OfferingError, Schedule, TransportOffering};
pub use normalize::OfferingNormalizer;
pub use pricing::{quote, PricingError, Quote};
pub use inventory::{AvailabilityPolicy, AvailabilitySource, SeatAvailabilityEngine, SeatAvailabilitySnapshot};
