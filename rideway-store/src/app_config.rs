use rideway_shared::Masked;
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub booking: BookingConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_booked_seats_path")]
    pub booked_seats_path: String,
    #[serde(default = "default_bookings_path")]
    pub bookings_path: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub bearer_token: Option<Masked<String>>,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_booked_seats_path() -> String {
    "/bookings/booked-seats".to_string()
}

fn default_bookings_path() -> String {
    "/bookings".to_string()
}

fn default_timeout_ms() -> u64 {
    15_000
}

#[derive(Debug, Deserialize, Clone)]
pub struct BookingConfig {
    /// Seats assumed when an offering carries no capacity. `0` turns the fallback off,
    /// leaving such offerings with no bookable seats.
    #[serde(default = "default_fallback_capacity")]
    pub fallback_capacity: u32,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_availability_timeout_ms")]
    pub availability_timeout_ms: u64,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            fallback_capacity: default_fallback_capacity(),
            currency: default_currency(),
            availability_timeout_ms: default_availability_timeout_ms(),
        }
    }
}

impl BookingConfig {
    pub fn fallback(&self) -> Option<u32> {
        Some(self.fallback_capacity).filter(|seats| *seats > 0)
    }

    pub fn availability_timeout(&self) -> Duration {
        Duration::from_millis(self.availability_timeout_ms)
    }
}

fn default_fallback_capacity() -> u32 {
    40
}

fn default_currency() -> String {
    "PKR".to_string()
}

fn default_availability_timeout_ms() -> u64 {
    10_000
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    pub redis_url: Option<String>,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            key_prefix: default_key_prefix(),
            ttl_seconds: default_ttl_seconds(),
        }
    }
}

fn default_key_prefix() -> String {
    "rideway:passenger".to_string()
}

fn default_ttl_seconds() -> u64 {
    // one day
    86_400
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // optional per-environment overrides
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // never checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. RIDEWAY_API__BASE_URL=https://...
            .add_source(config::Environment::with_prefix("RIDEWAY").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
