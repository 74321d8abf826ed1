use chrono::Utc;
use rideway_catalog::SeatAvailabilitySnapshot;
use rideway_core::{BookingApi, BookingApiError, BookingRequest, PassengerInfo, SeatNumber};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::models::{BookingRecord, BookingSelection};

const GENERIC_FAILURE: &str = "Booking could not be completed. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingError {
    #[error("Booking is not ready to submit: {0}")]
    Validation(String),

    /// Seats were taken after the client-side check; pick again.
    #[error("Seats {seats:?} are no longer available: {message}")]
    StaleSelection { seats: Vec<SeatNumber>, message: String },

    /// Token missing or expired; the flow has to restart after login.
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Booking request timed out")]
    Timeout,

    #[error("{0}")]
    Submission(String),

    /// The server answered but the reply could not be read; the booking may exist.
    #[error("Booking status unknown: {0}")]
    Unconfirmed(String),
}

impl BookingError {
    /// Whether the user can simply press submit again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BookingError::Timeout | BookingError::Submission(_))
    }
}

/// Turns a frozen selection into a booking API call. Never retries on its own.
pub struct BookingSubmitter {
    api: Arc<dyn BookingApi>,
}

impl BookingSubmitter {
    pub fn new(api: Arc<dyn BookingApi>) -> Self {
        Self { api }
    }

    pub fn build_request(
        selection: &BookingSelection,
        passenger: &PassengerInfo,
    ) -> Result<BookingRequest, BookingError> {
        let method = selection
            .payment_method
            .ok_or_else(|| BookingError::Validation("no payment method chosen".to_string()))?;
        let screenshot = if method.requires_proof() {
            let proof = selection
                .proof
                .clone()
                .filter(|p| !p.is_empty())
                .ok_or_else(|| BookingError::Validation("payment proof is missing".to_string()))?;
            Some(proof)
        } else {
            None
        };
        let quote = selection
            .quote()
            .map_err(|e| BookingError::Validation(e.to_string()))?;
        let offering = &selection.offering;
        let schedule = offering.schedule;

        Ok(BookingRequest {
            vehicle_id: offering.vehicle_id.clone(),
            company_id: offering.company_id.clone(),
            seat_numbers: selection.seat_list(),
            passenger_name: passenger.name.trim().to_string(),
            passenger_phone: passenger.phone.clone(),
            passenger_email: passenger.email.clone(),
            passenger_cnic: passenger.national_id.clone(),
            from_location: offering.route.from.clone(),
            to_location: offering.route.to.clone(),
            arrival_date: schedule.map(|s| s.date),
            arrival_time: schedule.map(|s| s.time),
            total_amount: quote.total,
            currency: quote.currency,
            method,
            screenshot,
        })
    }

    /// `snapshot` is the freshest availability the caller has; seats failing it are
    /// reported as stale before anything is sent.
    pub async fn submit(
        &self,
        selection: &BookingSelection,
        passenger: &PassengerInfo,
        snapshot: &SeatAvailabilitySnapshot,
    ) -> Result<BookingRecord, BookingError> {
        if !selection.is_frozen() {
            return Err(BookingError::Validation("selection is not finalized".to_string()));
        }
        passenger
            .validate()
            .map_err(|e| BookingError::Validation(e.to_string()))?;

        if selection.offering.has_seats() {
            if snapshot.offering_id != selection.offering.id {
                return Err(BookingError::Validation(format!(
                    "availability is for offering {}, not {}",
                    snapshot.offering_id, selection.offering.id
                )));
            }
            let taken: Vec<SeatNumber> = selection
                .seats
                .iter()
                .copied()
                .filter(|seat| !snapshot.is_selectable(*seat))
                .collect();
            if !taken.is_empty() {
                warn!(offering_id = %selection.offering.id, ?taken, "Selection went stale before submit");
                return Err(BookingError::StaleSelection {
                    seats: taken,
                    message: "Some selected seats have just been booked".to_string(),
                });
            }
        }

        let request = Self::build_request(selection, passenger)?;
        info!(
            offering_id = %selection.offering.id,
            method = %request.method,
            seats = request.seat_numbers.len(),
            total = request.total_amount,
            "Submitting booking"
        );

        let receipt = self
            .api
            .submit_booking(&request)
            .await
            .map_err(|e| Self::interpret_failure(e, &request))?;

        let (payment_status, booking_status) = request.method.outcome();
        info!(
            booking_id = %receipt.booking_id,
            booking_status = booking_status.as_str(),
            "Booking accepted"
        );
        Ok(BookingRecord {
            booking_id: receipt.booking_id,
            payment_status,
            booking_status,
            method: request.method,
            offering_id: selection.offering.id.clone(),
            seats: request.seat_numbers,
            total_amount: request.total_amount,
            currency: request.currency,
            created_at: Utc::now(),
            server_body: receipt.body,
        })
    }

    fn interpret_failure(err: BookingApiError, request: &BookingRequest) -> BookingError {
        error!("Booking submission failed: {}", err);
        match err {
            BookingApiError::Unauthorized => BookingError::Unauthenticated,
            BookingApiError::Timeout => BookingError::Timeout,
            BookingApiError::SeatUnavailable { message } => BookingError::StaleSelection {
                seats: request.seat_numbers.clone(),
                message,
            },
            BookingApiError::Rejected {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => BookingError::Submission(message),
            BookingApiError::Decode(detail) => BookingError::Unconfirmed(detail),
            _ => BookingError::Submission(GENERIC_FAILURE.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{NaiveDate, NaiveTime};
    use rideway_catalog::{SeatAvailabilityEngine, TransportOffering};
    use rideway_core::{
        BookingReceipt, BookingStatus, PaymentMethod, PaymentStatus, ProofArtifact, SeatQueryKey,
    };
    use std::sync::Mutex;

    struct ScriptedApi {
        response: Result<BookingReceipt, BookingApiError>,
        sent: Mutex<Vec<BookingRequest>>,
    }

    impl ScriptedApi {
        fn new(response: Result<BookingReceipt, BookingApiError>) -> Arc<Self> {
            Arc::new(Self {
                response,
                sent: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl BookingApi for ScriptedApi {
        async fn fetch_booked_seats(&self, _key: &SeatQueryKey) -> Result<Vec<i64>, BookingApiError> {
            Ok(vec![])
        }

        async fn submit_booking(&self, request: &BookingRequest) -> Result<BookingReceipt, BookingApiError> {
            self.sent.lock().unwrap().push(request.clone());
            self.response.clone()
        }
    }

    fn receipt() -> BookingReceipt {
        BookingReceipt {
            booking_id: "bk-100".to_string(),
            body: serde_json::json!({ "id": "bk-100" }),
        }
    }

    fn offering() -> TransportOffering {
        TransportOffering::seat_booking("off-1", 40, 1500)
            .with_vehicle("veh-1")
            .with_company("co-1")
            .with_schedule(
                NaiveDate::from_ymd_opt(2025, 4, 10).unwrap(),
                NaiveTime::from_hms_opt(7, 30, 0).unwrap(),
            )
    }

    fn frozen(method: PaymentMethod) -> BookingSelection {
        let mut selection = BookingSelection::new(offering());
        selection.seats.extend([5, 6]);
        selection.payment_method = Some(method);
        if method == PaymentMethod::Manual {
            selection.proof = Some(ProofArtifact::new("t.png", "image/png", vec![1, 2, 3]));
        }
        selection.freeze();
        selection
    }

    fn passenger() -> PassengerInfo {
        PassengerInfo::new("Ayesha Khan", "03001234567").with_national_id("35202-1234567-1")
    }

    fn snapshot(booked: &[i64]) -> SeatAvailabilitySnapshot {
        SeatAvailabilityEngine::default().compute_availability(&offering(), booked)
    }

    #[tokio::test]
    async fn test_cash_booking_is_confirmed_and_paid() {
        let api = ScriptedApi::new(Ok(receipt()));
        let submitter = BookingSubmitter::new(api.clone());

        let record = submitter
            .submit(&frozen(PaymentMethod::Cash), &passenger(), &snapshot(&[]))
            .await
            .unwrap();
        assert_eq!(record.booking_id, "bk-100");
        assert_eq!(record.booking_status, BookingStatus::Confirmed);
        assert_eq!(record.payment_status, PaymentStatus::Paid);
        assert_eq!(record.total_amount, 3000);
        assert!(record.is_confirmed());

        let sent = api.sent.lock().unwrap();
        assert_eq!(sent[0].seat_numbers, vec![5, 6]);
        assert_eq!(sent[0].passenger_cnic.as_ref().unwrap().expose(), "35202-1234567-1");
        assert!(sent[0].screenshot.is_none());
    }

    #[tokio::test]
    async fn test_manual_booking_is_reserved_pending_verification() {
        let api = ScriptedApi::new(Ok(receipt()));
        let submitter = BookingSubmitter::new(api.clone());

        let record = submitter
            .submit(&frozen(PaymentMethod::Manual), &passenger(), &snapshot(&[]))
            .await
            .unwrap();
        assert_eq!(record.booking_status, BookingStatus::Reserved);
        assert_eq!(record.payment_status, PaymentStatus::PendingVerification);
        assert_eq!(api.sent.lock().unwrap()[0].screenshot.as_ref().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_unfrozen_selection_rejected() {
        let api = ScriptedApi::new(Ok(receipt()));
        let submitter = BookingSubmitter::new(api.clone());
        let mut selection = frozen(PaymentMethod::Cash);
        selection.thaw();

        let result = submitter.submit(&selection, &passenger(), &snapshot(&[])).await;
        assert!(matches!(result, Err(BookingError::Validation(_))));
        assert!(api.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_locally_stale_seats_never_sent() {
        let api = ScriptedApi::new(Ok(receipt()));
        let submitter = BookingSubmitter::new(api.clone());

        let result = submitter
            .submit(&frozen(PaymentMethod::Cash), &passenger(), &snapshot(&[6]))
            .await;
        match result {
            Err(BookingError::StaleSelection { seats, .. }) => assert_eq!(seats, vec![6]),
            other => panic!("unexpected {:?}", other),
        }
        assert!(api.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_server_failures_are_classified() {
        let cases = vec![
            (BookingApiError::Unauthorized, BookingError::Unauthenticated),
            (BookingApiError::Timeout, BookingError::Timeout),
            (
                BookingApiError::Rejected {
                    status: 400,
                    message: Some("Invalid CNIC".to_string()),
                },
                BookingError::Submission("Invalid CNIC".to_string()),
            ),
            (
                BookingApiError::Rejected { status: 500, message: None },
                BookingError::Submission(GENERIC_FAILURE.to_string()),
            ),
            (
                BookingApiError::Transport("connection reset".to_string()),
                BookingError::Submission(GENERIC_FAILURE.to_string()),
            ),
            (
                BookingApiError::Decode("unreadable body".to_string()),
                BookingError::Unconfirmed("unreadable body".to_string()),
            ),
            (
                BookingApiError::SeatUnavailable {
                    message: "Seat 5 already booked".to_string(),
                },
                BookingError::StaleSelection {
                    seats: vec![5, 6],
                    message: "Seat 5 already booked".to_string(),
                },
            ),
        ];

        for (api_error, expected) in cases {
            let submitter = BookingSubmitter::new(ScriptedApi::new(Err(api_error)));
            let result = submitter
                .submit(&frozen(PaymentMethod::Cash), &passenger(), &snapshot(&[]))
                .await;
            assert_eq!(result.unwrap_err(), expected);
        }
    }

    #[tokio::test]
    async fn test_snapshot_for_other_offering_rejected() {
        let api = ScriptedApi::new(Ok(receipt()));
        let submitter = BookingSubmitter::new(api.clone());
        let other = TransportOffering::seat_booking("off-2", 40, 1500);
        let foreign = SeatAvailabilityEngine::default().compute_availability(&other, &[]);

        let result = submitter
            .submit(&frozen(PaymentMethod::Cash), &passenger(), &foreign)
            .await;
        assert!(matches!(result, Err(BookingError::Validation(_))));
        assert!(api.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn test_unconfirmed_is_not_retryable() {
        assert!(!BookingError::Unconfirmed("garbled".to_string()).is_retryable());
        assert!(!BookingError::Unauthenticated.is_retryable());
        assert!(BookingError::Timeout.is_retryable());
    }

    #[test]
    fn test_manual_request_requires_proof() {
        let mut selection = frozen(PaymentMethod::Manual);
        selection.proof = None;
        assert!(matches!(
            BookingSubmitter::build_request(&selection, &passenger()),
            Err(BookingError::Validation(_))
        ));
    }

    #[test]
    fn test_hire_request_has_no_seats() {
        let mut selection = BookingSelection::new(TransportOffering::vehicle_hire("hire-1", 25_000));
        selection.payment_method = Some(PaymentMethod::Cash);
        let request = BookingSubmitter::build_request(&selection, &passenger()).unwrap();
        assert!(request.seat_numbers.is_empty());
        assert_eq!(request.total_amount, 25_000);
        assert_eq!(request.method, PaymentMethod::Cash);
    }
}
