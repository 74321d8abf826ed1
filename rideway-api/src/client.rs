use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use rideway_core::{BookingApi, BookingApiError, BookingReceipt, BookingRequest, PaymentMethod, SeatQueryKey};
use rideway_store::ApiConfig;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::auth::{request_headers, BearerToken};
use crate::error::{query_status_error, submission_status_error, transport_error, ClientError};
use crate::wire::{multipart_form, parse_booked_seats, parse_receipt, response_body};

pub const DEFAULT_BOOKED_SEATS_PATH: &str = "/bookings/booked-seats";
pub const DEFAULT_BOOKINGS_PATH: &str = "/bookings";

/// `BookingApi` over the booking service's HTTP endpoints.
#[derive(Clone)]
pub struct HttpBookingApi {
    client: Client,
    base_url: String,
    booked_seats_path: String,
    bookings_path: String,
    token: Option<BearerToken>,
}

impl HttpBookingApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        Url::parse(base_url).map_err(|e| ClientError::InvalidBaseUrl(format!("{}: {}", base_url, e)))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            booked_seats_path: DEFAULT_BOOKED_SEATS_PATH.to_string(),
            bookings_path: DEFAULT_BOOKINGS_PATH.to_string(),
            token: None,
        })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self, ClientError> {
        let api = Self::new(&config.base_url, config.timeout())?
            .with_paths(&config.booked_seats_path, &config.bookings_path);
        Ok(match &config.bearer_token {
            Some(token) => api.with_token(token.expose().as_str()),
            None => api,
        })
    }

    pub fn with_paths(mut self, booked_seats_path: &str, bookings_path: &str) -> Self {
        self.booked_seats_path = booked_seats_path.to_string();
        self.bookings_path = bookings_path.to_string();
        self
    }

    pub fn with_token(mut self, token: &str) -> Self {
        self.token = BearerToken::new(token);
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn read_body(response: Response) -> String {
        match response.text().await {
            Ok(body) => body,
            Err(e) => {
                debug!("Could not read response body: {}", e);
                String::new()
            }
        }
    }
}

#[async_trait]
impl BookingApi for HttpBookingApi {
    async fn fetch_booked_seats(&self, key: &SeatQueryKey) -> Result<Vec<i64>, BookingApiError> {
        let (headers, request_id) = request_headers(self.token.as_ref());
        let response = self
            .client
            .get(self.url(&self.booked_seats_path))
            .headers(headers)
            .query(&[
                ("vehicleId", key.vehicle_id.clone()),
                ("arrivalDate", key.arrival_date_param()),
                ("arrivalTime", key.arrival_time_param()),
            ])
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        debug!(%request_id, vehicle_id = %key.vehicle_id, %status, "Booked seats response");
        match status {
            StatusCode::NOT_FOUND => Ok(Vec::new()),
            StatusCode::NO_CONTENT => Ok(Vec::new()),
            s if s.is_success() => {
                let body: Value = response.json().await.map_err(transport_error)?;
                parse_booked_seats(&body)
            }
            s => {
                let body = Self::read_body(response).await;
                warn!(%request_id, status = s.as_u16(), "Booked seats query failed");
                Err(query_status_error(s, &body))
            }
        }
    }

    async fn submit_booking(&self, request: &BookingRequest) -> Result<BookingReceipt, BookingApiError> {
        let (headers, request_id) = request_headers(self.token.as_ref());
        let builder = self.client.post(self.url(&self.bookings_path)).headers(headers);
        let builder = match request.method {
            PaymentMethod::Manual => builder.multipart(multipart_form(request)?),
            PaymentMethod::Cash => builder.json(request),
        };

        info!(
            %request_id,
            method = %request.method,
            seats = ?request.seat_numbers,
            phone = %request.passenger_phone,
            "Sending booking"
        );
        let response = builder.send().await.map_err(transport_error)?;

        let status = response.status();
        if status.is_success() {
            // the booking exists now; an odd body must not turn this into a failure
            let body = response_body(&Self::read_body(response).await);
            let receipt = parse_receipt(body, &request_id.to_string());
            info!(%request_id, booking_id = %receipt.booking_id, "Booking accepted by server");
            return Ok(receipt);
        }

        let body = Self::read_body(response).await;
        warn!(%request_id, status = status.as_u16(), "Booking rejected by server");
        Err(submission_status_error(status, &body))
    }
}
