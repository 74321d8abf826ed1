use rideway_shared::Masked;
use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

/// Passenger details entered at the start of the wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassengerInfo {
    pub name: String,
    pub phone: Masked<String>,
    #[serde(default)]
    pub email: Option<Masked<String>>,
    #[serde(default)]
    pub national_id: Option<Masked<String>>,
}

impl PassengerInfo {
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: Masked::new(phone.into()),
            email: None,
            national_id: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(Masked::new(email.into()));
        self
    }

    pub fn with_national_id(mut self, national_id: impl Into<String>) -> Self {
        self.national_id = Some(Masked::new(national_id.into()));
        self
    }

    /// Only name and contact are required to leave the search step.
    pub fn validate(&self) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::Validation("passenger name is required".to_string()));
        }
        if self.phone.expose().trim().is_empty() {
            return Err(CoreError::Validation("passenger contact is required".to_string()));
        }
        tracing::debug!(phone = %self.phone, "Passenger info validated");
        Ok(())
    }

    pub fn email_str(&self) -> &str {
        self.email.as_ref().map(|e| e.expose().as_str()).unwrap_or("")
    }

    pub fn national_id_str(&self) -> &str {
        self.national_id.as_ref().map(|n| n.expose().as_str()).unwrap_or("")
    }
}
