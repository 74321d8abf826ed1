pub mod app_config;
pub mod memory;
pub mod redis_repo;

use rideway_core::{PassengerStore, StoreError};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub use app_config::{ApiConfig, BookingConfig, Config, SessionConfig};
pub use memory::InMemoryPassengerStore;
pub use redis_repo::{RedisClient, RedisPassengerStore};

/// Redis when `session.redis_url` is set, otherwise a process-local store.
pub fn open_passenger_store(config: &SessionConfig, session_id: Uuid) -> Result<Arc<dyn PassengerStore>, StoreError> {
    match RedisPassengerStore::from_config(config, session_id)? {
        Some(store) => {
            info!(key = %store.key(), "Using Redis passenger store");
            Ok(Arc::new(store))
        }
        None => Ok(Arc::new(InMemoryPassengerStore::new())),
    }
}
