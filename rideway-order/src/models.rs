use chrono::{DateTime, Utc};
use rideway_catalog::{quote, PricingError, Quote, TransportOffering};
use rideway_core::{BookingStatus, PaymentMethod, PaymentStatus, ProofArtifact, SeatNumber};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// In-progress wizard state for one offering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingSelection {
    pub offering: TransportOffering,
    pub seats: BTreeSet<SeatNumber>,
    pub payment_method: Option<PaymentMethod>,
    pub proof: Option<ProofArtifact>,
    frozen: bool,
}

impl BookingSelection {
    pub fn new(offering: TransportOffering) -> Self {
        Self {
            offering,
            seats: BTreeSet::new(),
            payment_method: None,
            proof: None,
            frozen: false,
        }
    }

    /// Set once the wizard reaches Summary; no seat or payment mutation afterwards.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub(crate) fn freeze(&mut self) {
        self.frozen = true;
    }

    pub(crate) fn thaw(&mut self) {
        self.frozen = false;
    }

    pub fn seat_list(&self) -> Vec<SeatNumber> {
        self.seats.iter().copied().collect()
    }

    pub fn quote(&self) -> Result<Quote, PricingError> {
        quote(&self.offering, self.seats.len())
    }

    pub fn total_amount(&self) -> Result<i64, PricingError> {
        self.quote().map(|q| q.total)
    }
}

/// Server-confirmed booking. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingRecord {
    pub booking_id: String,
    pub payment_status: PaymentStatus,
    pub booking_status: BookingStatus,
    pub method: PaymentMethod,
    pub offering_id: String,
    pub seats: Vec<SeatNumber>,
    pub total_amount: i64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    /// Whatever the booking API echoed back.
    pub server_body: serde_json::Value,
}

impl BookingRecord {
    pub fn is_confirmed(&self) -> bool {
        self.booking_status == BookingStatus::Confirmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_follows_seat_count() {
        let mut selection = BookingSelection::new(TransportOffering::seat_booking("off-1", 40, 1500));
        assert_eq!(selection.total_amount().unwrap(), 0);

        selection.seats.extend([5, 6]);
        assert_eq!(selection.total_amount().unwrap(), 3000);
        assert_eq!(selection.seat_list(), vec![5, 6]);
    }

    #[test]
    fn test_freeze_roundtrip() {
        let mut selection = BookingSelection::new(TransportOffering::vehicle_hire("hire-1", 9000));
        assert!(!selection.is_frozen());
        selection.freeze();
        assert!(selection.is_frozen());
        selection.thaw();
        assert!(!selection.is_frozen());
    }
}
