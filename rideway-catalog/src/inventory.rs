use rideway_core::SeatNumber;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::offering::TransportOffering;

/// Placeholder used by the original booking screens when a vehicle has no capacity on
/// record. Still awaiting product confirmation, hence configurable.
pub const DEFAULT_FALLBACK_CAPACITY: u32 = 40;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AvailabilityPolicy {
    /// Capacity assumed when an offering's capacity is absent or zero.
    /// `None` keeps such offerings at zero seats.
    pub fallback_capacity: Option<u32>,
}

impl Default for AvailabilityPolicy {
    fn default() -> Self {
        Self {
            fallback_capacity: Some(DEFAULT_FALLBACK_CAPACITY),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AvailabilitySource {
    /// Booked seats came from the booking API.
    Live,
    /// Booked seats were not consulted; only owner-reserved seats count.
    ReservedOnly,
}

/// Derived seat picture for one offering. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeatAvailabilitySnapshot {
    pub offering_id: String,
    pub total: u32,
    pub reserved: BTreeSet<SeatNumber>,
    /// Raw booked entries, deduplicated. May hold values outside the seat map.
    pub booked: BTreeSet<i64>,
    pub available: u32,
    pub source: AvailabilitySource,
}

impl SeatAvailabilitySnapshot {
    /// Reserved ∪ booked.
    pub fn unavailable(&self) -> BTreeSet<i64> {
        self.reserved
            .iter()
            .map(|s| i64::from(*s))
            .chain(self.booked.iter().copied())
            .collect()
    }

    pub fn is_selectable(&self, seat: SeatNumber) -> bool {
        seat >= 1
            && seat <= self.total
            && !self.reserved.contains(&seat)
            && !self.booked.contains(&i64::from(seat))
    }

    pub fn selectable_seats(&self) -> Vec<SeatNumber> {
        (1..=self.total).filter(|s| self.is_selectable(*s)).collect()
    }

    pub fn is_live(&self) -> bool {
        self.source == AvailabilitySource::Live
    }
}

/// Pure availability math: `available = max(0, capacity - |reserved ∪ booked|)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeatAvailabilityEngine {
    policy: AvailabilityPolicy,
}

impl SeatAvailabilityEngine {
    pub fn new(policy: AvailabilityPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> AvailabilityPolicy {
        self.policy
    }

    pub fn effective_capacity(&self, offering: &TransportOffering) -> u32 {
        match offering.capacity {
            Some(capacity) if capacity > 0 => capacity,
            _ => self.policy.fallback_capacity.unwrap_or(0),
        }
    }

    pub fn compute_availability(
        &self,
        offering: &TransportOffering,
        booked_seats: &[i64],
    ) -> SeatAvailabilitySnapshot {
        self.snapshot(
            offering,
            booked_seats.iter().copied().collect(),
            AvailabilitySource::Live,
        )
    }

    /// Used when the booked-seat query is skipped or failed.
    pub fn reserved_only(&self, offering: &TransportOffering) -> SeatAvailabilitySnapshot {
        self.snapshot(offering, BTreeSet::new(), AvailabilitySource::ReservedOnly)
    }

    fn snapshot(
        &self,
        offering: &TransportOffering,
        booked: BTreeSet<i64>,
        source: AvailabilitySource,
    ) -> SeatAvailabilitySnapshot {
        let total = self.effective_capacity(offering);
        let mut snapshot = SeatAvailabilitySnapshot {
            offering_id: offering.id.clone(),
            total,
            reserved: offering.reserved_seats.clone(),
            booked,
            available: 0,
            source,
        };
        let unavailable = snapshot.unavailable().len();
        snapshot.available = u32::try_from(unavailable)
            .map(|taken| total.saturating_sub(taken))
            .unwrap_or(0);
        snapshot
    }
}
