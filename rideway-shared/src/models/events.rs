use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Notifications the booking flow hands to the rendering layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingEvent {
    AvailabilityRefreshed {
        offering_id: String,
        available: u32,
        booked_count: usize,
    },
    /// Booked seats could not be fetched; availability uses owner-reserved seats only.
    AvailabilityDegraded {
        offering_id: String,
        reason: String,
    },
    SelectionInvalidated {
        offering_id: String,
        dropped_seats: Vec<u32>,
    },
    StaleFetchDiscarded {
        offering_id: String,
        generation: u64,
    },
    BookingSubmitted {
        booking_id: String,
        booking_status: String,
        payment_status: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventEnvelope {
    pub timestamp: i64,
    #[serde(flatten)]
    pub event: BookingEvent,
}

impl EventEnvelope {
    pub fn now(event: BookingEvent) -> Self {
        Self {
            timestamp: Utc::now().timestamp(),
            event,
        }
    }

    /// Warnings are shown inline and never block the flow.
    pub fn is_warning(&self) -> bool {
        matches!(
            self.event,
            BookingEvent::AvailabilityDegraded { .. } | BookingEvent::SelectionInvalidated { .. }
        )
    }
}
