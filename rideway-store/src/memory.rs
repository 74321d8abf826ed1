use async_trait::async_trait;
use rideway_core::{PassengerInfo, PassengerStore, StoreError};
use tokio::sync::RwLock;

/// Process-local store for when no Redis is configured. Lives as long as the session does.
#[derive(Debug, Default)]
pub struct InMemoryPassengerStore {
    passenger: RwLock<Option<PassengerInfo>>,
}

impl InMemoryPassengerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PassengerStore for InMemoryPassengerStore {
    async fn load(&self) -> Result<Option<PassengerInfo>, StoreError> {
        Ok(self.passenger.read().await.clone())
    }

    async fn save(&self, passenger: &PassengerInfo) -> Result<(), StoreError> {
        *self.passenger.write().await = Some(passenger.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.passenger.write().await.take();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_load_clear() {
        let store = InMemoryPassengerStore::new();
        assert_eq!(store.load().await.unwrap(), None);

        let passenger = PassengerInfo::new("Bilal Ahmed", "03211234567").with_email("bilal@example.com");
        store.save(&passenger).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(passenger));

        store.clear().await.unwrap();
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let store = InMemoryPassengerStore::new();
        store.save(&PassengerInfo::new("First", "0300")).await.unwrap();
        store.save(&PassengerInfo::new("Second", "0301")).await.unwrap();
        assert_eq!(store.load().await.unwrap().unwrap().name, "Second");
    }
}
