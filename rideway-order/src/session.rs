use rideway_catalog::{SeatAvailabilityEngine, SeatAvailabilitySnapshot, TransportOffering};
use rideway_core::{BookingApi, BookingApiError, PassengerInfo, PassengerStore, SeatQueryKey};
use rideway_shared::EventEnvelope;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::BookingRecord;
use crate::submission::{BookingError, BookingSubmitter};
use crate::wizard::{ApplyOutcome, BookingWizard, WizardError, WizardStep};

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// One passenger's pass through the wizard, wired to the booking API and the
/// passenger store. All network I/O of the flow happens here.
pub struct BookingSession {
    id: Uuid,
    wizard: BookingWizard,
    api: Arc<dyn BookingApi>,
    store: Arc<dyn PassengerStore>,
    submitter: BookingSubmitter,
    fetch_timeout: Duration,
}

impl BookingSession {
    /// Starts at the search step, restoring passenger details saved by an earlier visit.
    pub async fn start(
        engine: SeatAvailabilityEngine,
        api: Arc<dyn BookingApi>,
        store: Arc<dyn PassengerStore>,
    ) -> Self {
        let mut session = Self::with_wizard(BookingWizard::new(engine), api, store);
        session.restore_passenger().await;
        session
    }

    /// Deep-link entry for a single offering.
    pub async fn for_offering(
        engine: SeatAvailabilityEngine,
        offering: TransportOffering,
        api: Arc<dyn BookingApi>,
        store: Arc<dyn PassengerStore>,
    ) -> Result<Self, WizardError> {
        let wizard = BookingWizard::from_offering(engine, offering)?;
        let mut session = Self::with_wizard(wizard, api, store);
        session.restore_passenger().await;
        Ok(session)
    }

    fn with_wizard(wizard: BookingWizard, api: Arc<dyn BookingApi>, store: Arc<dyn PassengerStore>) -> Self {
        Self {
            id: Uuid::new_v4(),
            wizard,
            submitter: BookingSubmitter::new(api.clone()),
            api,
            store,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn wizard(&self) -> &BookingWizard {
        &self.wizard
    }

    /// Direct access for the synchronous selection operations (seat toggles, payment method, proof).
    pub fn wizard_mut(&mut self) -> &mut BookingWizard {
        &mut self.wizard
    }

    pub fn drain_events(&mut self) -> Vec<EventEnvelope> {
        self.wizard.drain_events()
    }

    pub async fn update_passenger(&mut self, passenger: PassengerInfo) -> Result<(), WizardError> {
        self.wizard.set_passenger(passenger)?;
        self.persist_passenger().await;
        Ok(())
    }

    /// Moves forward; entering SeatSelect also loads booked seats before returning.
    pub async fn advance(&mut self) -> Result<WizardStep, WizardError> {
        if self.wizard.step() == WizardStep::ServiceSearch {
            self.persist_passenger().await;
        }
        let step = self.wizard.advance()?;
        self.refresh_availability().await?;
        Ok(step)
    }

    pub async fn back(&mut self) -> Result<WizardStep, WizardError> {
        let step = self.wizard.back()?;
        self.refresh_availability().await?;
        Ok(step)
    }

    /// Runs the wizard's pending booked-seat fetch, if any, and hands the result back.
    /// A rejected token ends the flow instead of degrading the seat map.
    pub async fn refresh_availability(&mut self) -> Result<Option<ApplyOutcome>, WizardError> {
        let Some(ticket) = self.wizard.pending_fetch().cloned() else {
            return Ok(None);
        };
        let outcome = self.fetch_booked_seats(&ticket.key).await;
        if let Err(BookingApiError::Unauthorized) = outcome {
            self.expire();
            return Err(WizardError::Unauthenticated);
        }
        Ok(Some(self.wizard.apply_booked_seats(&ticket, outcome)))
    }

    /// Submits the frozen selection. Stale seats send the passenger back to SeatSelect;
    /// an auth failure discards the wizard but keeps the saved passenger details.
    pub async fn submit(&mut self) -> Result<BookingRecord, BookingError> {
        if let Some(record) = self.wizard.record() {
            return Err(BookingError::Validation(format!(
                "booking {} has already been submitted",
                record.booking_id
            )));
        }
        let selection = self
            .wizard
            .frozen_selection()
            .cloned()
            .ok_or_else(|| BookingError::Validation("booking has not reached the summary step".to_string()))?;
        let passenger = self
            .wizard
            .passenger()
            .cloned()
            .ok_or_else(|| BookingError::Validation("passenger details are missing".to_string()))?;
        self.persist_passenger().await;

        let snapshot = match self.presubmit_snapshot(&selection.offering).await {
            Ok(snapshot) => snapshot,
            Err(BookingApiError::Unauthorized) => {
                self.expire();
                return Err(BookingError::Unauthenticated);
            }
            Err(e) => {
                warn!(offering_id = %selection.offering.id, "Pre-submit availability check skipped: {}", e);
                self.fallback_snapshot(&selection.offering)
            }
        };
        match self.submitter.submit(&selection, &passenger, &snapshot).await {
            Ok(record) => {
                info!(session_id = %self.id, booking_id = %record.booking_id, "Booking completed");
                self.wizard
                    .record_submission(record.clone())
                    .map_err(|e| BookingError::Validation(e.to_string()))?;
                Ok(record)
            }
            Err(BookingError::StaleSelection { seats, message }) => {
                if let Err(e) = self.wizard.return_to_seat_select() {
                    warn!(session_id = %self.id, "Could not return to seat selection: {}", e);
                }
                match self.refresh_availability().await {
                    Err(WizardError::Unauthenticated) => Err(BookingError::Unauthenticated),
                    _ => Err(BookingError::StaleSelection { seats, message }),
                }
            }
            Err(BookingError::Unauthenticated) => {
                self.expire();
                Err(BookingError::Unauthenticated)
            }
            Err(e) => Err(e),
        }
    }

    fn expire(&mut self) {
        warn!(session_id = %self.id, "Session token rejected; discarding wizard state");
        self.wizard.reset();
    }

    /// Availability to re-check seats against right before submission.
    async fn presubmit_snapshot(
        &self,
        offering: &TransportOffering,
    ) -> Result<SeatAvailabilitySnapshot, BookingApiError> {
        match offering.seat_query_key().filter(|_| offering.has_seats()) {
            Some(key) => {
                let booked = self.fetch_booked_seats(&key).await?;
                Ok(self.wizard.engine().compute_availability(offering, &booked))
            }
            None => Ok(self.fallback_snapshot(offering)),
        }
    }

    fn fallback_snapshot(&self, offering: &TransportOffering) -> SeatAvailabilitySnapshot {
        match self.wizard.snapshot() {
            Some(snapshot) if snapshot.offering_id == offering.id => snapshot.clone(),
            _ => self.wizard.engine().reserved_only(offering),
        }
    }

    async fn fetch_booked_seats(&self, key: &SeatQueryKey) -> Result<Vec<i64>, BookingApiError> {
        match tokio::time::timeout(self.fetch_timeout, self.api.fetch_booked_seats(key)).await {
            Ok(result) => result,
            Err(_) => Err(BookingApiError::Timeout),
        }
    }

    async fn restore_passenger(&mut self) {
        match self.store.load().await {
            Ok(Some(passenger)) => {
                if let Err(e) = self.wizard.set_passenger(passenger) {
                    warn!(session_id = %self.id, "Could not restore passenger: {}", e);
                }
            }
            Ok(None) => {}
            Err(e) => warn!(session_id = %self.id, "Passenger store unavailable: {}", e),
        }
    }

    /// Best effort; a store outage never blocks booking.
    async fn persist_passenger(&self) {
        let Some(passenger) = self.wizard.passenger() else {
            return;
        };
        if let Err(e) = self.store.save(passenger).await {
            warn!(session_id = %self.id, "Could not persist passenger: {}", e);
        }
    }
}
