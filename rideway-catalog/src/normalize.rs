//! Maps the heterogeneous offering payloads the booking API and company dashboards
//! produce into the canonical [`TransportOffering`].

use chrono::{NaiveDate, NaiveTime};
use rideway_core::{Route, SeatNumber, ServiceKind};
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::offering::{Fare, OfferingError, Schedule, TransportOffering, DEFAULT_CURRENCY};

const ID_KEYS: &[&str] = &["id", "_id", "offer_id", "offerId"];
const VEHICLE_KEYS: &[&str] = &["vehicle_id", "vehicleId", "vehicle"];
const COMPANY_KEYS: &[&str] = &["company_id", "companyId", "company"];
const CAPACITY_KEYS: &[&str] = &[
    "capacity",
    "seats",
    "total_seats",
    "totalSeats",
    "seating_capacity",
    "vehicle.capacity",
    "vehicle.seats",
];
const RESERVED_KEYS: &[&str] = &["reserved_seats", "reservedSeats", "reserved"];
const DATE_KEYS: &[&str] = &["arrival_date", "arrivalDate", "date"];
const TIME_KEYS: &[&str] = &["arrival_time", "arrivalTime", "time"];
const FROM_KEYS: &[&str] = &["from", "from_location", "fromLocation", "origin"];
const TO_KEYS: &[&str] = &["to", "to_location", "toLocation", "destination"];
const KIND_KEYS: &[&str] = &["type", "kind", "service_type", "serviceType", "offer_type"];
const SEAT_PRICE_KEYS: &[&str] = &["price_per_seat", "pricePerSeat", "seat_price", "price", "fare"];
const FIXED_FARE_KEYS: &[&str] = &["fixed_fare", "fixedFare", "rent", "fare", "price"];

#[derive(Debug, Clone)]
pub struct OfferingNormalizer {
    default_currency: String,
}

impl Default for OfferingNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_CURRENCY)
    }
}

impl OfferingNormalizer {
    pub fn new(default_currency: impl Into<String>) -> Self {
        Self {
            default_currency: default_currency.into(),
        }
    }

    pub fn normalize(&self, raw: &Value) -> Result<TransportOffering, OfferingError> {
        let id = lookup(raw, ID_KEYS)
            .and_then(as_id)
            .ok_or(OfferingError::MissingField("id"))?;

        let kind = lookup(raw, KIND_KEYS)
            .and_then(Value::as_str)
            .map(parse_kind)
            .unwrap_or(ServiceKind::SeatBooking);

        let fare_keys = match kind {
            ServiceKind::SeatBooking => SEAT_PRICE_KEYS,
            ServiceKind::VehicleHire => FIXED_FARE_KEYS,
        };
        let amount_value = lookup(raw, fare_keys).ok_or(OfferingError::MissingField("price"))?;
        let amount = as_amount(amount_value).ok_or_else(|| OfferingError::InvalidField {
            field: "price",
            value: amount_value.to_string(),
        })?;
        let fare = match kind {
            ServiceKind::SeatBooking => Fare::PerSeat(amount),
            ServiceKind::VehicleHire => Fare::Fixed(amount),
        };

        let capacity = lookup(raw, CAPACITY_KEYS).and_then(as_u32);
        let reserved_seats = lookup(raw, RESERVED_KEYS)
            .map(|v| clamp_reserved(&id, seat_list(v), capacity))
            .unwrap_or_default();

        let date = lookup(raw, DATE_KEYS).and_then(Value::as_str).and_then(parse_date);
        let time = lookup(raw, TIME_KEYS).and_then(Value::as_str).and_then(parse_time);
        let schedule = match (date, time) {
            (Some(date), Some(time)) => Some(Schedule { date, time }),
            _ => None,
        };

        let currency = raw
            .get("currency")
            .and_then(Value::as_str)
            .filter(|c| !c.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.default_currency.clone());

        let offering = TransportOffering {
            id,
            kind,
            vehicle_id: lookup(raw, VEHICLE_KEYS).and_then(as_id),
            company_id: lookup(raw, COMPANY_KEYS).and_then(as_id),
            capacity,
            reserved_seats,
            schedule,
            route: Route::new(text(raw, FROM_KEYS), text(raw, TO_KEYS)),
            fare,
            currency,
        };
        debug!(offering_id = %offering.id, kind = ?offering.kind, "Normalized offering");
        Ok(offering)
    }

    /// Accepts a bare array or one wrapped in `data`/`offers`; unusable entries are skipped.
    pub fn normalize_all(&self, raw: &Value) -> Vec<TransportOffering> {
        let items = match raw {
            Value::Array(items) => items.as_slice(),
            Value::Object(_) => lookup(raw, &["data", "offers", "results"])
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or(&[]),
            _ => &[],
        };

        items
            .iter()
            .filter_map(|item| match self.normalize(item) {
                Ok(offering) => Some(offering),
                Err(e) => {
                    warn!("Skipping offering payload: {}", e);
                    None
                }
            })
            .collect()
    }
}

/// First present, non-null value among `keys`. Dotted keys walk into nested objects.
fn lookup<'a>(raw: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| {
        let found = key.split('.').try_fold(raw, |node, part| node.get(part))?;
        (!found.is_null()).then_some(found)
    })
}

fn as_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(_) => lookup(value, &["id", "_id"]).and_then(as_id),
        _ => None,
    }
}

fn as_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_amount(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.round() as i64))
        }
        _ => None,
    }
}

fn seat_list(value: &Value) -> Vec<i64> {
    match value {
        Value::Array(items) => items.iter().filter_map(as_i64).collect(),
        Value::String(s) => s
            .split(',')
            .filter_map(|part| part.trim().parse().ok())
            .collect(),
        Value::Number(_) => as_i64(value).into_iter().collect(),
        _ => Vec::new(),
    }
}

fn clamp_reserved(offering_id: &str, seats: Vec<i64>, capacity: Option<u32>) -> BTreeSet<SeatNumber> {
    let limit = capacity.filter(|c| *c > 0);
    seats
        .into_iter()
        .filter_map(|seat| {
            let in_range = u32::try_from(seat)
                .ok()
                .filter(|s| *s >= 1 && limit.map_or(true, |cap| *s <= cap));
            if in_range.is_none() {
                warn!(offering_id, seat, "Dropping reserved seat outside the seat map");
            }
            in_range
        })
        .collect()
}

fn parse_kind(raw: &str) -> ServiceKind {
    let raw = raw.to_lowercase();
    if raw.contains("hire") || raw.contains("rent") || raw.contains("charter") {
        ServiceKind::VehicleHire
    } else {
        ServiceKind::SeatBooking
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| raw.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()))
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

fn text(raw: &Value, keys: &[&str]) -> String {
    lookup(raw, keys)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}
