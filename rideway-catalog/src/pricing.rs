use rideway_core::ServiceKind;
use serde::{Deserialize, Serialize};

use crate::offering::{Fare, TransportOffering};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Quote {
    pub unit_amount: i64,
    pub seats: u32,
    pub total: i64,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    #[error("Fare amount cannot be negative: {0}")]
    NegativeFare(i64),

    #[error("Total overflowed for {seats} seats at {unit_amount}")]
    Overflow { unit_amount: i64, seats: u32 },
}

/// Total owed for `seats` seats: per-seat fares multiply, fixed fares and hires do not.
pub fn quote(offering: &TransportOffering, seats: usize) -> Result<Quote, PricingError> {
    let unit_amount = offering.fare.amount();
    if unit_amount < 0 {
        return Err(PricingError::NegativeFare(unit_amount));
    }
    let seats = u32::try_from(seats).map_err(|_| PricingError::Overflow {
        unit_amount,
        seats: u32::MAX,
    })?;

    let total = match (offering.kind, offering.fare) {
        (ServiceKind::SeatBooking, Fare::PerSeat(price)) => price
            .checked_mul(i64::from(seats))
            .ok_or(PricingError::Overflow { unit_amount, seats })?,
        (_, fare) => fare.amount(),
    };

    Ok(Quote {
        unit_amount,
        seats,
        total,
        currency: offering.currency.clone(),
    })
}
