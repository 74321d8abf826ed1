use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Paid on the spot; the booking is confirmed immediately.
    Cash,
    /// Out-of-band transfer, verified later from an uploaded proof.
    Manual,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentStatus {
    Paid,
    PendingVerification,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum BookingStatus {
    Confirmed,
    Reserved,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::Manual => "MANUAL",
        }
    }

    pub fn requires_proof(&self) -> bool {
        matches!(self, PaymentMethod::Manual)
    }

    /// Statuses a successful submission with this method resolves to.
    pub fn outcome(&self) -> (PaymentStatus, BookingStatus) {
        match self {
            PaymentMethod::Cash => (PaymentStatus::Paid, BookingStatus::Confirmed),
            PaymentMethod::Manual => (PaymentStatus::PendingVerification, BookingStatus::Reserved),
        }
    }
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "paid",
            PaymentStatus::PendingVerification => "pending-verification",
        }
    }
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Reserved => "reserved",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uploaded proof of a manual payment, e.g. a bank transfer screenshot.
#[derive(Clone, PartialEq, Eq)]
pub struct ProofArtifact {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ProofArtifact {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }
}

impl fmt::Debug for ProofArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProofArtifact")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_by_method() {
        assert_eq!(
            PaymentMethod::Cash.outcome(),
            (PaymentStatus::Paid, BookingStatus::Confirmed)
        );
        assert_eq!(
            PaymentMethod::Manual.outcome(),
            (PaymentStatus::PendingVerification, BookingStatus::Reserved)
        );
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(serde_json::to_string(&PaymentMethod::Manual).unwrap(), "\"MANUAL\"");
        assert_eq!(
            serde_json::to_string(&PaymentStatus::PendingVerification).unwrap(),
            "\"pending-verification\""
        );
        assert_eq!(serde_json::to_string(&BookingStatus::Reserved).unwrap(), "\"reserved\"");
    }

    #[test]
    fn test_proof_debug_hides_bytes() {
        let proof = ProofArtifact::new("transfer.png", "image/png", vec![1, 2, 3]);
        assert_eq!(
            format!("{:?}", proof),
            "ProofArtifact { file_name: \"transfer.png\", content_type: \"image/png\", len: 3 }"
        );
        assert!(!proof.is_empty());
    }
}
