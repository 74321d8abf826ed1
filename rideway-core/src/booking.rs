use chrono::{NaiveDate, NaiveTime};
use rideway_shared::Masked;
use serde::{Deserialize, Serialize};

use crate::payment::{PaymentMethod, ProofArtifact};
use crate::SeatNumber;

/// Payload sent to the booking API when the passenger confirms.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub vehicle_id: Option<String>,
    pub company_id: Option<String>,
    pub seat_numbers: Vec<SeatNumber>,
    pub passenger_name: String,
    pub passenger_phone: Masked<String>,
    pub passenger_email: Option<Masked<String>>,
    pub passenger_cnic: Option<Masked<String>>,
    pub from_location: String,
    pub to_location: String,
    pub arrival_date: Option<NaiveDate>,
    #[serde(serialize_with = "serialize_time")]
    pub arrival_time: Option<NaiveTime>,
    pub total_amount: i64,
    pub currency: String,
    pub method: PaymentMethod,
    /// Sent as a multipart file part, never inside the JSON body.
    #[serde(skip)]
    pub screenshot: Option<ProofArtifact>,
}

fn serialize_time<S>(time: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match time {
        Some(t) => serializer.serialize_str(&t.format("%H:%M:%S").to_string()),
        None => serializer.serialize_none(),
    }
}

impl BookingRequest {
    pub fn arrival_time_param(&self) -> Option<String> {
        self.arrival_time.map(|t| t.format("%H:%M:%S").to_string())
    }
}

/// What the booking API returned for an accepted submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingReceipt {
    pub booking_id: String,
    pub body: serde_json::Value,
}
