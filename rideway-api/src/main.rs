use anyhow::Context;
use rideway_api::HttpBookingApi;
use rideway_catalog::{AvailabilityPolicy, OfferingNormalizer, SeatAvailabilityEngine};
use rideway_order::{BookingSession, WizardError};
use rideway_store::{app_config::Config, open_passenger_store};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Opens a booking session per offering in a JSON listing and prints the seat map it loads.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rideway_api=debug,rideway_order=debug,rideway_catalog=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let path = std::env::args()
        .nth(1)
        .context("usage: rideway-api <offerings.json>")?;
    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Checking availability against {}", config.api.base_url);

    let api = Arc::new(HttpBookingApi::from_config(&config.api)?);
    let store = open_passenger_store(&config.session, Uuid::new_v4())?;
    let engine = SeatAvailabilityEngine::new(AvailabilityPolicy {
        fallback_capacity: config.booking.fallback(),
    });
    let normalizer = OfferingNormalizer::new(config.booking.currency.clone());

    let raw = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read {}", path))?;
    let listing: serde_json::Value = serde_json::from_str(&raw).context("Offerings file is not valid JSON")?;

    for offering in normalizer.normalize_all(&listing) {
        if !offering.has_seats() {
            println!("{}: vehicle hire, fare {}", offering.id, offering.fare.amount());
            continue;
        }
        let id = offering.id.clone();
        let mut session = BookingSession::for_offering(engine, offering, api.clone(), store.clone())
            .await
            .with_context(|| format!("Offering {} cannot be booked", id))?
            .with_fetch_timeout(config.booking.availability_timeout());
        match session.advance().await {
            Ok(_) => {}
            Err(WizardError::Unauthenticated) => anyhow::bail!("Booking API rejected the bearer token"),
            Err(e) => return Err(e).with_context(|| format!("Could not open seat map for {}", id)),
        }
        if let Some(snapshot) = session.wizard().snapshot() {
            println!("{}", serde_json::to_string(snapshot)?);
        }
    }
    Ok(())
}
