use rideway_catalog::{
    OfferingError, PricingError, SeatAvailabilityEngine, SeatAvailabilitySnapshot, TransportOffering,
};
use rideway_core::{
    BookingApiError, PassengerInfo, PaymentMethod, ProofArtifact, SeatNumber, SeatQueryKey, ServiceKind,
    ServiceSearch,
};
use rideway_shared::{BookingEvent, EventEnvelope};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::models::{BookingRecord, BookingSelection};

/// Wizard steps in forward order. ManualProofUpload is only visited for manual payments.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WizardStep {
    ServiceSearch,
    ServiceTypeSelect,
    TransportSelect,
    SeatSelect,
    PaymentMethodSelect,
    ManualProofUpload,
    Summary,
}

/// Tags one booked-seat fetch so a late response for a superseded offering can be dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub offering_id: String,
    pub key: SeatQueryKey,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied { dropped: Vec<SeatNumber> },
    /// Fetch failed; the snapshot stays reserved-only and booking is still allowed.
    Degraded { dropped: Vec<SeatNumber> },
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error("Passenger details incomplete: {0}")]
    InvalidPassenger(String),

    #[error("Choose a service type first")]
    NoServiceKind,

    #[error("Choose a transport offering first")]
    NoOffering,

    #[error("Offering cannot be booked: {0}")]
    InvalidOffering(#[from] OfferingError),

    #[error("Select at least one seat")]
    NoSeatsSelected,

    #[error("Choose a payment method")]
    NoPaymentMethod,

    #[error("Upload proof of payment to continue")]
    MissingProof,

    #[error("Pricing failed: {0}")]
    Pricing(#[from] PricingError),

    #[error("{action} is not allowed at step {step:?}")]
    WrongStep { step: WizardStep, action: &'static str },

    #[error("Booking has already been submitted")]
    Completed,

    #[error("Already at the first step")]
    AtFirstStep,

    /// The booking API rejected the session token; the wizard has been reset.
    #[error("Authentication required")]
    Unauthenticated,
}

/// Seat-booking offers need at least one seat; hires have no seat map.
pub fn ensure_seats_ready(selection: &BookingSelection) -> Result<(), WizardError> {
    if selection.offering.has_seats() && selection.seats.is_empty() {
        return Err(WizardError::NoSeatsSelected);
    }
    Ok(())
}

/// Linear booking flow from search to summary.
///
/// Network work is never done here. Entering SeatSelect issues a [`FetchTicket`];
/// whoever runs the fetch hands the result back through [`BookingWizard::apply_booked_seats`].
#[derive(Debug)]
pub struct BookingWizard {
    engine: SeatAvailabilityEngine,
    step: WizardStep,
    passenger: Option<PassengerInfo>,
    search: ServiceSearch,
    service_kind: Option<ServiceKind>,
    offering: Option<TransportOffering>,
    selection: Option<BookingSelection>,
    snapshot: Option<SeatAvailabilitySnapshot>,
    pending_fetch: Option<FetchTicket>,
    generation: u64,
    record: Option<BookingRecord>,
    events: Vec<EventEnvelope>,
}

impl BookingWizard {
    pub fn new(engine: SeatAvailabilityEngine) -> Self {
        Self {
            engine,
            step: WizardStep::ServiceSearch,
            passenger: None,
            search: ServiceSearch::default(),
            service_kind: None,
            offering: None,
            selection: None,
            snapshot: None,
            pending_fetch: None,
            generation: 0,
            record: None,
            events: Vec::new(),
        }
    }

    /// Entry from a single-offering deep link: starts at TransportSelect with the offering chosen.
    pub fn from_offering(
        engine: SeatAvailabilityEngine,
        offering: TransportOffering,
    ) -> Result<Self, WizardError> {
        offering.validate()?;
        let mut wizard = Self::new(engine);
        wizard.service_kind = Some(offering.kind);
        wizard.offering = Some(offering);
        wizard.step = WizardStep::TransportSelect;
        Ok(wizard)
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn passenger(&self) -> Option<&PassengerInfo> {
        self.passenger.as_ref()
    }

    pub fn search(&self) -> &ServiceSearch {
        &self.search
    }

    pub fn service_kind(&self) -> Option<ServiceKind> {
        self.service_kind
    }

    pub fn offering(&self) -> Option<&TransportOffering> {
        self.offering.as_ref()
    }

    pub fn selection(&self) -> Option<&BookingSelection> {
        self.selection.as_ref()
    }

    pub fn snapshot(&self) -> Option<&SeatAvailabilitySnapshot> {
        self.snapshot.as_ref()
    }

    pub fn engine(&self) -> &SeatAvailabilityEngine {
        &self.engine
    }

    pub fn pending_fetch(&self) -> Option<&FetchTicket> {
        self.pending_fetch.as_ref()
    }

    pub fn record(&self) -> Option<&BookingRecord> {
        self.record.as_ref()
    }

    /// The selection, once the wizard has reached Summary.
    pub fn frozen_selection(&self) -> Option<&BookingSelection> {
        self.selection.as_ref().filter(|s| s.is_frozen())
    }

    pub fn total_amount(&self) -> Result<i64, WizardError> {
        let selection = self.selection.as_ref().ok_or(WizardError::NoOffering)?;
        Ok(selection.total_amount()?)
    }

    pub fn drain_events(&mut self) -> Vec<EventEnvelope> {
        std::mem::take(&mut self.events)
    }

    pub fn set_passenger(&mut self, passenger: PassengerInfo) -> Result<(), WizardError> {
        self.ensure_open()?;
        if self.step == WizardStep::Summary {
            return Err(self.wrong_step("set passenger"));
        }
        self.passenger = Some(passenger);
        Ok(())
    }

    pub fn set_search(&mut self, search: ServiceSearch) -> Result<(), WizardError> {
        self.require_step(WizardStep::ServiceSearch, "set search")?;
        if let Some(kind) = search.kind {
            self.service_kind = Some(kind);
        }
        self.search = search;
        Ok(())
    }

    pub fn choose_service(&mut self, kind: ServiceKind) -> Result<(), WizardError> {
        self.require_step(WizardStep::ServiceTypeSelect, "choose service")?;
        if self.service_kind != Some(kind) {
            self.offering = None;
        }
        self.service_kind = Some(kind);
        Ok(())
    }

    /// Picking another offering supersedes any in-flight fetch and prior seat picks.
    pub fn choose_offering(&mut self, offering: TransportOffering) -> Result<(), WizardError> {
        self.require_step(WizardStep::TransportSelect, "choose offering")?;
        offering.validate()?;
        debug!(offering_id = %offering.id, "Offering chosen");
        self.invalidate_fetch();
        self.selection = None;
        self.snapshot = None;
        self.service_kind = Some(offering.kind);
        self.offering = Some(offering);
        Ok(())
    }

    pub fn advance(&mut self) -> Result<WizardStep, WizardError> {
        self.ensure_open()?;
        match self.step {
            WizardStep::ServiceSearch => {
                let passenger = self
                    .passenger
                    .as_ref()
                    .ok_or_else(|| WizardError::InvalidPassenger("passenger name is required".to_string()))?;
                passenger
                    .validate()
                    .map_err(|e| WizardError::InvalidPassenger(e.to_string()))?;
                self.move_to(WizardStep::ServiceTypeSelect);
            }
            WizardStep::ServiceTypeSelect => {
                self.service_kind.ok_or(WizardError::NoServiceKind)?;
                self.move_to(WizardStep::TransportSelect);
            }
            WizardStep::TransportSelect => {
                let offering = self.offering.clone().ok_or(WizardError::NoOffering)?;
                if offering.has_seats() {
                    self.selection = Some(BookingSelection::new(offering));
                    self.enter_seat_select();
                } else {
                    self.selection = Some(BookingSelection::new(offering));
                    self.snapshot = None;
                    self.move_to(WizardStep::PaymentMethodSelect);
                }
            }
            WizardStep::SeatSelect => {
                let selection = self.selection.as_ref().ok_or(WizardError::NoOffering)?;
                ensure_seats_ready(selection)?;
                self.invalidate_fetch();
                self.move_to(WizardStep::PaymentMethodSelect);
            }
            WizardStep::PaymentMethodSelect => {
                let method = self.selection.as_ref().ok_or(WizardError::NoOffering)?.payment_method;
                match method {
                    None => return Err(WizardError::NoPaymentMethod),
                    Some(PaymentMethod::Manual) => self.move_to(WizardStep::ManualProofUpload),
                    Some(PaymentMethod::Cash) => self.enter_summary()?,
                }
            }
            WizardStep::ManualProofUpload => {
                let has_proof = self
                    .selection
                    .as_ref()
                    .and_then(|s| s.proof.as_ref())
                    .is_some_and(|p| !p.is_empty());
                if !has_proof {
                    return Err(WizardError::MissingProof);
                }
                self.enter_summary()?;
            }
            WizardStep::Summary => return Err(self.wrong_step("advance")),
        }
        Ok(self.step)
    }

    /// Steps back to the immediate predecessor. Passenger info is kept; returning to
    /// SeatSelect keeps the picked seats but re-validates them against a fresh fetch.
    pub fn back(&mut self) -> Result<WizardStep, WizardError> {
        self.ensure_open()?;
        match self.step {
            WizardStep::ServiceSearch => return Err(WizardError::AtFirstStep),
            WizardStep::ServiceTypeSelect => self.move_to(WizardStep::ServiceSearch),
            WizardStep::TransportSelect => self.move_to(WizardStep::ServiceTypeSelect),
            WizardStep::SeatSelect => {
                self.invalidate_fetch();
                self.selection = None;
                self.snapshot = None;
                self.move_to(WizardStep::TransportSelect);
            }
            WizardStep::PaymentMethodSelect => {
                let has_seats = self.offering.as_ref().is_some_and(|o| o.has_seats());
                if has_seats {
                    self.enter_seat_select();
                } else {
                    self.selection = None;
                    self.move_to(WizardStep::TransportSelect);
                }
            }
            WizardStep::ManualProofUpload => self.move_to(WizardStep::PaymentMethodSelect),
            WizardStep::Summary => {
                let method = self.selection.as_mut().and_then(|s| {
                    s.thaw();
                    s.payment_method
                });
                if method == Some(PaymentMethod::Manual) {
                    self.move_to(WizardStep::ManualProofUpload);
                } else {
                    self.move_to(WizardStep::PaymentMethodSelect);
                }
            }
        }
        Ok(self.step)
    }

    /// Adds or removes a seat. Adding an unselectable seat is a silent no-op;
    /// returns whether the selection changed.
    pub fn toggle_seat(&mut self, seat: SeatNumber) -> bool {
        if self.step != WizardStep::SeatSelect {
            debug!(seat, step = ?self.step, "Ignoring seat toggle outside seat selection");
            return false;
        }
        let (Some(selection), Some(snapshot)) = (self.selection.as_mut(), self.snapshot.as_ref()) else {
            return false;
        };
        if selection.seats.remove(&seat) {
            return true;
        }
        let within_limit = u32::try_from(selection.seats.len())
            .map(|picked| picked < snapshot.available)
            .unwrap_or(false);
        if snapshot.is_selectable(seat) && within_limit {
            selection.seats.insert(seat);
            true
        } else {
            debug!(seat, "Seat not selectable");
            false
        }
    }

    pub fn set_payment_method(&mut self, method: PaymentMethod) -> Result<(), WizardError> {
        self.require_step(WizardStep::PaymentMethodSelect, "set payment method")?;
        let selection = self.selection.as_mut().ok_or(WizardError::NoOffering)?;
        selection.payment_method = Some(method);
        if !method.requires_proof() {
            selection.proof = None;
        }
        Ok(())
    }

    pub fn attach_proof(&mut self, proof: ProofArtifact) -> Result<(), WizardError> {
        self.require_step(WizardStep::ManualProofUpload, "attach proof")?;
        if proof.is_empty() {
            return Err(WizardError::MissingProof);
        }
        let selection = self.selection.as_mut().ok_or(WizardError::NoOffering)?;
        selection.proof = Some(proof);
        Ok(())
    }

    /// Applies the result of the fetch identified by `ticket`. Results for anything other
    /// than the current offering and generation are discarded untouched.
    pub fn apply_booked_seats(
        &mut self,
        ticket: &FetchTicket,
        outcome: Result<Vec<i64>, BookingApiError>,
    ) -> ApplyOutcome {
        if self.pending_fetch.as_ref() != Some(ticket) {
            info!(
                offering_id = %ticket.offering_id,
                generation = ticket.generation,
                "Discarding stale availability fetch"
            );
            self.push_event(BookingEvent::StaleFetchDiscarded {
                offering_id: ticket.offering_id.clone(),
                generation: ticket.generation,
            });
            return ApplyOutcome::Stale;
        }
        self.pending_fetch = None;

        let Some(offering) = self.offering.as_ref() else {
            return ApplyOutcome::Stale;
        };
        match outcome {
            Ok(booked) => {
                let snapshot = self.engine.compute_availability(offering, &booked);
                info!(
                    offering_id = %snapshot.offering_id,
                    available = snapshot.available,
                    "Seat availability refreshed"
                );
                self.push_event(BookingEvent::AvailabilityRefreshed {
                    offering_id: snapshot.offering_id.clone(),
                    available: snapshot.available,
                    booked_count: snapshot.booked.len(),
                });
                self.snapshot = Some(snapshot);
                ApplyOutcome::Applied {
                    dropped: self.revalidate_selection(),
                }
            }
            Err(e) => {
                warn!(offering_id = %offering.id, "Booked seats unavailable, using reserved seats only: {}", e);
                let snapshot = self.engine.reserved_only(offering);
                self.push_event(BookingEvent::AvailabilityDegraded {
                    offering_id: snapshot.offering_id.clone(),
                    reason: e.to_string(),
                });
                self.snapshot = Some(snapshot);
                ApplyOutcome::Degraded {
                    dropped: self.revalidate_selection(),
                }
            }
        }
    }

    /// After the server rejected seats as taken: clear them and pick again.
    pub fn return_to_seat_select(&mut self) -> Result<(), WizardError> {
        self.ensure_open()?;
        let selection = self.selection.as_mut().ok_or(WizardError::NoOffering)?;
        if !selection.offering.has_seats() {
            return Err(self.wrong_step("return to seat selection"));
        }
        selection.thaw();
        selection.seats.clear();
        self.enter_seat_select();
        Ok(())
    }

    pub fn record_submission(&mut self, record: BookingRecord) -> Result<(), WizardError> {
        self.require_step(WizardStep::Summary, "record submission")?;
        self.push_event(BookingEvent::BookingSubmitted {
            booking_id: record.booking_id.clone(),
            booking_status: record.booking_status.as_str().to_string(),
            payment_status: record.payment_status.as_str().to_string(),
        });
        self.record = Some(record);
        Ok(())
    }

    /// Drops everything but the passenger, back to the first step.
    pub fn reset(&mut self) {
        let passenger = self.passenger.take();
        let generation = self.generation + 1;
        *self = Self::new(self.engine);
        self.passenger = passenger;
        self.generation = generation;
    }

    fn enter_seat_select(&mut self) {
        self.invalidate_fetch();
        let Some(offering) = self.offering.as_ref() else {
            return;
        };
        self.snapshot = Some(self.engine.reserved_only(offering));
        self.pending_fetch = offering.seat_query_key().map(|key| FetchTicket {
            offering_id: offering.id.clone(),
            key,
            generation: self.generation,
        });
        if self.pending_fetch.is_none() {
            debug!(offering_id = %offering.id, "No vehicle/date/time key; availability uses reserved seats only");
        }
        self.move_to(WizardStep::SeatSelect);
        self.revalidate_selection();
    }

    fn enter_summary(&mut self) -> Result<(), WizardError> {
        let passenger = self
            .passenger
            .as_ref()
            .ok_or_else(|| WizardError::InvalidPassenger("passenger name is required".to_string()))?;
        passenger
            .validate()
            .map_err(|e| WizardError::InvalidPassenger(e.to_string()))?;
        let selection = self.selection.as_mut().ok_or(WizardError::NoOffering)?;
        ensure_seats_ready(selection)?;
        selection.total_amount()?;
        selection.freeze();
        self.move_to(WizardStep::Summary);
        Ok(())
    }

    fn revalidate_selection(&mut self) -> Vec<SeatNumber> {
        let (Some(selection), Some(snapshot)) = (self.selection.as_mut(), self.snapshot.as_ref()) else {
            return Vec::new();
        };
        let dropped: Vec<SeatNumber> = selection
            .seats
            .iter()
            .copied()
            .filter(|seat| !snapshot.is_selectable(*seat))
            .collect();
        if dropped.is_empty() {
            return dropped;
        }
        for seat in &dropped {
            selection.seats.remove(seat);
        }
        let offering_id = snapshot.offering_id.clone();
        warn!(offering_id = %offering_id, ?dropped, "Selected seats are no longer available");
        self.push_event(BookingEvent::SelectionInvalidated {
            offering_id,
            dropped_seats: dropped.clone(),
        });
        dropped
    }

    fn invalidate_fetch(&mut self) {
        self.generation += 1;
        self.pending_fetch = None;
    }

    fn move_to(&mut self, next: WizardStep) {
        debug!(from = ?self.step, to = ?next, "Wizard transition");
        self.step = next;
    }

    fn push_event(&mut self, event: BookingEvent) {
        self.events.push(EventEnvelope::now(event));
    }

    fn ensure_open(&self) -> Result<(), WizardError> {
        if self.record.is_some() {
            return Err(WizardError::Completed);
        }
        Ok(())
    }

    fn require_step(&self, step: WizardStep, action: &'static str) -> Result<(), WizardError> {
        self.ensure_open()?;
        if self.step != step {
            return Err(self.wrong_step(action));
        }
        Ok(())
    }

    fn wrong_step(&self, action: &'static str) -> WizardError {
        WizardError::WrongStep {
            step: self.step,
            action,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use rideway_catalog::AvailabilitySource;

    fn bus(id: &str) -> TransportOffering {
        TransportOffering::seat_booking(id, 40, 1500)
            .with_reserved([1, 2])
            .with_vehicle(format!("veh-{}", id))
            .with_schedule(
                NaiveDate::from_ymd_opt(2025, 4, 10).unwrap(),
                NaiveTime::from_hms_opt(7, 30, 0).unwrap(),
            )
    }

    fn passenger() -> PassengerInfo {
        PassengerInfo::new("Ayesha Khan", "03001234567")
    }

    fn past_transport_select(offering: TransportOffering) -> BookingWizard {
        let mut wizard = BookingWizard::from_offering(SeatAvailabilityEngine::default(), offering).unwrap();
        wizard.set_passenger(passenger()).unwrap();
        wizard.advance().unwrap();
        wizard
    }

    fn at_seat_select(offering: TransportOffering) -> BookingWizard {
        let wizard = past_transport_select(offering);
        assert_eq!(wizard.step(), WizardStep::SeatSelect);
        wizard
    }

    fn proof() -> ProofArtifact {
        ProofArtifact::new("transfer.png", "image/png", vec![0x89, 0x50, 0x4e, 0x47])
    }

    #[test]
    fn test_search_requires_name_and_contact() {
        let mut wizard = BookingWizard::new(SeatAvailabilityEngine::default());
        assert!(matches!(wizard.advance(), Err(WizardError::InvalidPassenger(_))));

        wizard.set_passenger(PassengerInfo::new("Ayesha", "")).unwrap();
        assert!(matches!(wizard.advance(), Err(WizardError::InvalidPassenger(_))));
        assert_eq!(wizard.step(), WizardStep::ServiceSearch);

        wizard.set_passenger(passenger()).unwrap();
        assert_eq!(wizard.advance().unwrap(), WizardStep::ServiceTypeSelect);
    }

    #[test]
    fn test_full_forward_flow_with_cash() {
        let mut wizard = BookingWizard::new(SeatAvailabilityEngine::default());
        wizard.set_passenger(passenger()).unwrap();
        wizard.advance().unwrap();

        assert_eq!(wizard.advance(), Err(WizardError::NoServiceKind));
        wizard.choose_service(ServiceKind::SeatBooking).unwrap();
        assert_eq!(wizard.advance().unwrap(), WizardStep::TransportSelect);

        assert_eq!(wizard.advance(), Err(WizardError::NoOffering));
        wizard.choose_offering(bus("a")).unwrap();
        assert_eq!(wizard.advance().unwrap(), WizardStep::SeatSelect);

        let ticket = wizard.pending_fetch().cloned().unwrap();
        assert_eq!(wizard.apply_booked_seats(&ticket, Ok(vec![2, 3])), ApplyOutcome::Applied { dropped: vec![] });
        assert_eq!(wizard.snapshot().unwrap().available, 37);

        assert!(wizard.toggle_seat(5));
        assert!(wizard.toggle_seat(6));
        assert_eq!(wizard.total_amount().unwrap(), 3000);

        assert_eq!(wizard.advance().unwrap(), WizardStep::PaymentMethodSelect);
        assert_eq!(wizard.advance(), Err(WizardError::NoPaymentMethod));
        wizard.set_payment_method(PaymentMethod::Cash).unwrap();
        assert_eq!(wizard.advance().unwrap(), WizardStep::Summary);

        let frozen = wizard.frozen_selection().unwrap();
        assert_eq!(frozen.seat_list(), vec![5, 6]);
        assert_eq!(wizard.advance(), Err(wizard.wrong_step("advance")));
    }

    #[test]
    fn test_zero_seats_blocks_payment_step() {
        let mut wizard = at_seat_select(bus("a"));
        assert_eq!(wizard.advance(), Err(WizardError::NoSeatsSelected));
        assert_eq!(wizard.step(), WizardStep::SeatSelect);
    }

    #[test]
    fn test_hire_offer_skips_seat_selection() {
        let hire = TransportOffering::vehicle_hire("hire-1", 25_000);
        let mut wizard = past_transport_select(hire.clone());
        assert_eq!(wizard.step(), WizardStep::PaymentMethodSelect);
        assert!(wizard.pending_fetch().is_none());

        let selection = BookingSelection::new(hire);
        assert!(ensure_seats_ready(&selection).is_ok());

        assert_eq!(wizard.back().unwrap(), WizardStep::TransportSelect);
        assert!(wizard.selection().is_none());
    }

    #[test]
    fn test_toggle_rejects_unselectable_seats() {
        let mut wizard = at_seat_select(bus("a"));
        let ticket = wizard.pending_fetch().cloned().unwrap();
        wizard.apply_booked_seats(&ticket, Ok(vec![3]));

        for seat in [0, 1, 2, 3, 41] {
            assert!(!wizard.toggle_seat(seat), "seat {} should be rejected", seat);
        }
        assert!(wizard.selection().unwrap().seats.is_empty());

        assert!(wizard.toggle_seat(10));
        assert!(wizard.toggle_seat(10));
        assert!(wizard.selection().unwrap().seats.is_empty());
    }

    #[test]
    fn test_toggle_capped_by_available_count() {
        let offering = TransportOffering::seat_booking("small", 10, 500)
            .with_vehicle("veh-small")
            .with_schedule(
                NaiveDate::from_ymd_opt(2025, 4, 10).unwrap(),
                NaiveTime::from_hms_opt(7, 30, 0).unwrap(),
            );
        let mut wizard = at_seat_select(offering);
        let ticket = wizard.pending_fetch().cloned().unwrap();
        // an out-of-range booking still counts against the available total
        wizard.apply_booked_seats(&ticket, Ok(vec![99]));

        let snapshot = wizard.snapshot().unwrap().clone();
        assert_eq!(snapshot.available, 9);
        assert_eq!(snapshot.selectable_seats().len(), 10);

        for seat in 1..=9 {
            assert!(wizard.toggle_seat(seat));
        }
        assert!(!wizard.toggle_seat(10));
        let picked = wizard.selection().unwrap().seat_list();
        assert_eq!(picked, (1..=9).collect::<Vec<_>>());

        // freeing one seat makes room again
        assert!(wizard.toggle_seat(1));
        assert!(wizard.toggle_seat(10));
        assert_eq!(wizard.selection().unwrap().seats.len(), 9);
    }

    #[test]
    fn test_seatless_offering_is_reserved_only() {
        let offering = TransportOffering::seat_booking("tiny", 3, 500);
        let mut wizard = at_seat_select(offering);
        assert!(wizard.pending_fetch().is_none());
        assert_eq!(wizard.snapshot().unwrap().source, AvailabilitySource::ReservedOnly);
        assert!(wizard.toggle_seat(3));
    }

    #[test]
    fn test_stale_fetch_is_discarded() {
        let mut wizard = at_seat_select(bus("a"));
        let ticket_a = wizard.pending_fetch().cloned().unwrap();

        wizard.back().unwrap();
        wizard.choose_offering(bus("b")).unwrap();
        wizard.advance().unwrap();
        let ticket_b = wizard.pending_fetch().cloned().unwrap();
        assert_ne!(ticket_a.generation, ticket_b.generation);

        assert_eq!(
            wizard.apply_booked_seats(&ticket_a, Ok((3..=40).collect())),
            ApplyOutcome::Stale
        );
        let snapshot = wizard.snapshot().unwrap();
        assert_eq!(snapshot.offering_id, "b");
        assert_eq!(snapshot.available, 38);
        assert_eq!(wizard.pending_fetch(), Some(&ticket_b));

        let events = wizard.drain_events();
        assert!(matches!(
            events.last().map(|e| &e.event),
            Some(BookingEvent::StaleFetchDiscarded { .. })
        ));

        assert!(matches!(wizard.apply_booked_seats(&ticket_b, Ok(vec![])), ApplyOutcome::Applied { .. }));
        assert_eq!(wizard.snapshot().unwrap().available, 38);
    }

    #[test]
    fn test_leaving_seat_select_invalidates_fetch() {
        let mut wizard = at_seat_select(bus("a"));
        let ticket = wizard.pending_fetch().cloned().unwrap();
        wizard.toggle_seat(9);
        wizard.advance().unwrap();

        assert_eq!(wizard.apply_booked_seats(&ticket, Ok(vec![9])), ApplyOutcome::Stale);
        assert_eq!(wizard.selection().unwrap().seat_list(), vec![9]);
    }

    #[test]
    fn test_failed_fetch_degrades_to_reserved_only() {
        let mut wizard = at_seat_select(bus("a"));
        let ticket = wizard.pending_fetch().cloned().unwrap();

        let outcome = wizard.apply_booked_seats(&ticket, Err(BookingApiError::Timeout));
        assert_eq!(outcome, ApplyOutcome::Degraded { dropped: vec![] });
        assert_eq!(wizard.snapshot().unwrap().available, 38);
        assert!(wizard.toggle_seat(3));

        let events = wizard.drain_events();
        assert!(events.iter().any(|e| e.is_warning()));
    }

    #[test]
    fn test_back_to_seats_revalidates_selection() {
        let mut wizard = at_seat_select(bus("a"));
        let ticket = wizard.pending_fetch().cloned().unwrap();
        wizard.apply_booked_seats(&ticket, Ok(vec![]));
        wizard.toggle_seat(5);
        wizard.toggle_seat(6);
        wizard.advance().unwrap();

        assert_eq!(wizard.back().unwrap(), WizardStep::SeatSelect);
        assert_eq!(wizard.passenger(), Some(&passenger()));
        let refreshed = wizard.pending_fetch().cloned().unwrap();
        assert_ne!(refreshed, ticket);

        // seat 6 was taken by someone else in the meantime
        let outcome = wizard.apply_booked_seats(&refreshed, Ok(vec![6]));
        assert_eq!(outcome, ApplyOutcome::Applied { dropped: vec![6] });
        assert_eq!(wizard.selection().unwrap().seat_list(), vec![5]);
    }

    #[test]
    fn test_manual_payment_requires_proof() {
        let mut wizard = at_seat_select(bus("a"));
        wizard.toggle_seat(5);
        wizard.toggle_seat(6);
        wizard.advance().unwrap();
        wizard.set_payment_method(PaymentMethod::Manual).unwrap();
        assert_eq!(wizard.advance().unwrap(), WizardStep::ManualProofUpload);

        assert_eq!(wizard.advance(), Err(WizardError::MissingProof));
        assert_eq!(
            wizard.attach_proof(ProofArtifact::new("empty.png", "image/png", vec![])),
            Err(WizardError::MissingProof)
        );
        assert_eq!(wizard.step(), WizardStep::ManualProofUpload);

        wizard.attach_proof(proof()).unwrap();
        assert_eq!(wizard.advance().unwrap(), WizardStep::Summary);
        assert_eq!(wizard.total_amount().unwrap(), 3000);

        assert_eq!(wizard.back().unwrap(), WizardStep::ManualProofUpload);
        assert!(wizard.frozen_selection().is_none());
    }

    #[test]
    fn test_switching_to_cash_drops_proof() {
        let mut wizard = at_seat_select(bus("a"));
        wizard.toggle_seat(7);
        wizard.advance().unwrap();
        wizard.set_payment_method(PaymentMethod::Manual).unwrap();
        wizard.advance().unwrap();
        wizard.attach_proof(proof()).unwrap();
        wizard.back().unwrap();

        wizard.set_payment_method(PaymentMethod::Cash).unwrap();
        assert!(wizard.selection().unwrap().proof.is_none());
        assert_eq!(wizard.advance().unwrap(), WizardStep::Summary);
    }

    #[test]
    fn test_summary_blocks_mutation() {
        let mut wizard = at_seat_select(bus("a"));
        wizard.toggle_seat(5);
        wizard.advance().unwrap();
        wizard.set_payment_method(PaymentMethod::Cash).unwrap();
        wizard.advance().unwrap();

        assert!(!wizard.toggle_seat(8));
        assert!(wizard.set_payment_method(PaymentMethod::Manual).is_err());
        assert!(wizard.set_passenger(passenger()).is_err());
    }

    #[test]
    fn test_return_to_seat_select_clears_seats() {
        let mut wizard = at_seat_select(bus("a"));
        wizard.toggle_seat(5);
        wizard.advance().unwrap();
        wizard.set_payment_method(PaymentMethod::Cash).unwrap();
        wizard.advance().unwrap();

        wizard.return_to_seat_select().unwrap();
        assert_eq!(wizard.step(), WizardStep::SeatSelect);
        let selection = wizard.selection().unwrap();
        assert!(selection.seats.is_empty());
        assert!(!selection.is_frozen());
        assert_eq!(selection.payment_method, Some(PaymentMethod::Cash));
        assert!(wizard.pending_fetch().is_some());
    }

    #[test]
    fn test_reset_keeps_passenger_only() {
        let mut wizard = at_seat_select(bus("a"));
        wizard.toggle_seat(5);
        wizard.reset();

        assert_eq!(wizard.step(), WizardStep::ServiceSearch);
        assert_eq!(wizard.passenger(), Some(&passenger()));
        assert!(wizard.offering().is_none());
        assert!(wizard.selection().is_none());
        assert_eq!(wizard.back(), Err(WizardError::AtFirstStep));
    }

    #[test]
    fn test_changing_service_clears_offering() {
        let mut wizard = BookingWizard::new(SeatAvailabilityEngine::default());
        wizard.set_passenger(passenger()).unwrap();
        wizard.advance().unwrap();
        wizard.choose_service(ServiceKind::SeatBooking).unwrap();
        wizard.advance().unwrap();
        wizard.choose_offering(bus("a")).unwrap();
        wizard.back().unwrap();

        wizard.choose_service(ServiceKind::VehicleHire).unwrap();
        assert!(wizard.offering().is_none());
    }

    #[test]
    fn test_invalid_offering_rejected() {
        let bad = TransportOffering::seat_booking("bad", 10, 100).with_reserved([12]);
        assert!(matches!(
            BookingWizard::from_offering(SeatAvailabilityEngine::default(), bad),
            Err(WizardError::InvalidOffering(_))
        ));
    }
}
