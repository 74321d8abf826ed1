use async_trait::async_trait;
use redis::AsyncCommands;
use rideway_core::{PassengerInfo, PassengerStore, StoreError};
use tracing::{debug, info};
use uuid::Uuid;

use crate::app_config::SessionConfig;

#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
}

impl RedisClient {
    pub fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, StoreError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(unavailable)
    }
}

fn unavailable(err: redis::RedisError) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

/// Passenger details for one browser session, stored as JSON under
/// `{prefix}:{session_id}` and refreshed to the full TTL on every save.
#[derive(Clone)]
pub struct RedisPassengerStore {
    redis: RedisClient,
    key: String,
    ttl_seconds: u64,
}

impl RedisPassengerStore {
    pub fn new(redis: RedisClient, key_prefix: &str, session_id: Uuid, ttl_seconds: u64) -> Self {
        Self {
            redis,
            key: passenger_key(key_prefix, session_id),
            ttl_seconds,
        }
    }

    pub fn from_config(config: &SessionConfig, session_id: Uuid) -> Result<Option<Self>, StoreError> {
        let Some(url) = config.redis_url.as_deref() else {
            return Ok(None);
        };
        let redis = RedisClient::new(url).map_err(unavailable)?;
        Ok(Some(Self::new(redis, &config.key_prefix, session_id, config.ttl_seconds)))
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

pub fn passenger_key(prefix: &str, session_id: Uuid) -> String {
    format!("{}:{}", prefix, session_id)
}

#[async_trait]
impl PassengerStore for RedisPassengerStore {
    async fn load(&self) -> Result<Option<PassengerInfo>, StoreError> {
        let mut conn = self.redis.connection().await?;
        let raw: Option<String> = conn.get(&self.key).await.map_err(unavailable)?;
        let Some(raw) = raw else {
            debug!(key = %self.key, "No stored passenger");
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StoreError::Corrupt(e.to_string()))
    }

    async fn save(&self, passenger: &PassengerInfo) -> Result<(), StoreError> {
        let payload = serde_json::to_string(passenger).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        let mut conn = self.redis.connection().await?;
        conn.set_ex::<_, _, ()>(&self.key, payload, self.ttl_seconds)
            .await
            .map_err(unavailable)?;
        info!(key = %self.key, phone = %passenger.phone, "Passenger details saved");
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut conn = self.redis.connection().await?;
        conn.del::<_, ()>(&self.key).await.map_err(unavailable)?;
        Ok(())
    }
}
