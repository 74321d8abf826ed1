use chrono::{NaiveDate, NaiveTime};
use rideway_core::{Route, SeatNumber, SeatQueryKey, ServiceKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const DEFAULT_CURRENCY: &str = "PKR";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Schedule {
    pub date: NaiveDate,
    pub time: NaiveTime,
}

/// Amounts are whole currency units.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "amount", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Fare {
    PerSeat(i64),
    Fixed(i64),
}

impl Fare {
    pub fn amount(&self) -> i64 {
        match self {
            Fare::PerSeat(amount) | Fare::Fixed(amount) => *amount,
        }
    }
}

/// A bookable vehicle run or hire offer, read-only to the booking flow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransportOffering {
    pub id: String,
    pub kind: ServiceKind,
    pub vehicle_id: Option<String>,
    pub company_id: Option<String>,
    /// `None` when the publisher never filled it in.
    pub capacity: Option<u32>,
    pub reserved_seats: BTreeSet<SeatNumber>,
    pub schedule: Option<Schedule>,
    pub route: Route,
    pub fare: Fare,
    pub currency: String,
}

impl TransportOffering {
    pub fn seat_booking(id: impl Into<String>, capacity: u32, price_per_seat: i64) -> Self {
        Self {
            id: id.into(),
            kind: ServiceKind::SeatBooking,
            vehicle_id: None,
            company_id: None,
            capacity: Some(capacity),
            reserved_seats: BTreeSet::new(),
            schedule: None,
            route: Route::default(),
            fare: Fare::PerSeat(price_per_seat),
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }

    pub fn vehicle_hire(id: impl Into<String>, fixed_fare: i64) -> Self {
        Self {
            id: id.into(),
            kind: ServiceKind::VehicleHire,
            vehicle_id: None,
            company_id: None,
            capacity: None,
            reserved_seats: BTreeSet::new(),
            schedule: None,
            route: Route::default(),
            fare: Fare::Fixed(fixed_fare),
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }

    pub fn with_reserved(mut self, seats: impl IntoIterator<Item = SeatNumber>) -> Self {
        self.reserved_seats = seats.into_iter().collect();
        self
    }

    pub fn with_vehicle(mut self, vehicle_id: impl Into<String>) -> Self {
        self.vehicle_id = Some(vehicle_id.into());
        self
    }

    pub fn with_company(mut self, company_id: impl Into<String>) -> Self {
        self.company_id = Some(company_id.into());
        self
    }

    pub fn with_schedule(mut self, date: NaiveDate, time: NaiveTime) -> Self {
        self.schedule = Some(Schedule { date, time });
        self
    }

    pub fn with_route(mut self, route: Route) -> Self {
        self.route = route;
        self
    }

    pub fn has_seats(&self) -> bool {
        self.kind.has_seats()
    }

    /// Key for the booked-seat query; `None` when vehicle or schedule is unknown.
    pub fn seat_query_key(&self) -> Option<SeatQueryKey> {
        let vehicle_id = self.vehicle_id.as_deref().filter(|v| !v.trim().is_empty())?;
        let schedule = self.schedule?;
        Some(SeatQueryKey::new(vehicle_id, schedule.date, schedule.time))
    }

    pub fn validate(&self) -> Result<(), OfferingError> {
        if self.id.trim().is_empty() {
            return Err(OfferingError::MissingField("id"));
        }
        if self.fare.amount() < 0 {
            return Err(OfferingError::InvalidField {
                field: "fare",
                value: self.fare.amount().to_string(),
            });
        }
        if let Some(capacity) = self.capacity.filter(|c| *c > 0) {
            if let Some(seat) = self.reserved_seats.iter().find(|s| **s == 0 || **s > capacity) {
                return Err(OfferingError::ReservedSeatOutOfRange {
                    seat: *seat,
                    capacity,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OfferingError {
    #[error("Offering is missing required field: {0}")]
    MissingField(&'static str),

    #[error("Offering field {field} has an unusable value: {value}")]
    InvalidField { field: &'static str, value: String },

    #[error("Reserved seat {seat} is outside 1..={capacity}")]
    ReservedSeatOutOfRange { seat: SeatNumber, capacity: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seat_query_key_requires_vehicle_and_schedule() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let time = NaiveTime::from_hms_opt(8, 0, 0).unwrap();

        let offering = TransportOffering::seat_booking("off-1", 40, 1500);
        assert!(offering.seat_query_key().is_none());

        let offering = offering.with_vehicle("veh-1");
        assert!(offering.seat_query_key().is_none());

        let key = offering.with_schedule(date, time).seat_query_key().unwrap();
        assert_eq!(key.vehicle_id, "veh-1");
        assert_eq!(key.arrival_time_param(), "08:00:00");
    }

    #[test]
    fn test_reserved_seats_must_fit_capacity() {
        let ok = TransportOffering::seat_booking("off-1", 10, 100).with_reserved([1, 10]);
        assert!(ok.validate().is_ok());

        let bad = TransportOffering::seat_booking("off-1", 10, 100).with_reserved([11]);
        assert_eq!(
            bad.validate(),
            Err(OfferingError::ReservedSeatOutOfRange { seat: 11, capacity: 10 })
        );

        let zero = TransportOffering::seat_booking("off-1", 10, 100).with_reserved([0]);
        assert!(zero.validate().is_err());
    }
}
