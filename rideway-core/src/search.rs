use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceKind {
    /// Individual seats on a scheduled run.
    SeatBooking,
    /// The whole vehicle for a fixed fare; no seat map.
    VehicleHire,
}

impl ServiceKind {
    pub fn has_seats(&self) -> bool {
        matches!(self, ServiceKind::SeatBooking)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Route {
    pub from: String,
    pub to: String,
}

impl Route {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Criteria entered on the search step.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceSearch {
    pub from: Option<String>,
    pub to: Option<String>,
    pub date: Option<NaiveDate>,
    pub kind: Option<ServiceKind>,
}

impl ServiceSearch {
    /// Case-insensitive substring match on endpoints; unset criteria match anything.
    pub fn matches(&self, kind: ServiceKind, route: &Route, date: Option<NaiveDate>) -> bool {
        if let Some(wanted) = self.kind {
            if wanted != kind {
                return false;
            }
        }
        if !endpoint_matches(self.from.as_deref(), &route.from) {
            return false;
        }
        if !endpoint_matches(self.to.as_deref(), &route.to) {
            return false;
        }
        match (self.date, date) {
            (Some(wanted), Some(actual)) => wanted == actual,
            (Some(_), None) => false,
            _ => true,
        }
    }
}

fn endpoint_matches(wanted: Option<&str>, actual: &str) -> bool {
    match wanted.map(str::trim).filter(|w| !w.is_empty()) {
        Some(w) => actual.to_lowercase().contains(&w.to_lowercase()),
        None => true,
    }
}

/// Identifies the booked-seat inventory of one vehicle run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SeatQueryKey {
    pub vehicle_id: String,
    pub arrival_date: NaiveDate,
    pub arrival_time: NaiveTime,
}

impl SeatQueryKey {
    pub fn new(vehicle_id: impl Into<String>, arrival_date: NaiveDate, arrival_time: NaiveTime) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            arrival_date,
            arrival_time,
        }
    }

    pub fn arrival_date_param(&self) -> String {
        self.arrival_date.format("%Y-%m-%d").to_string()
    }

    pub fn arrival_time_param(&self) -> String {
        self.arrival_time.format("%H:%M:%S").to_string()
    }
}
