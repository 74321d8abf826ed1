use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

const VISIBLE_SUFFIX: usize = 4;

/// Wrapper for passenger PII and credentials.
///
/// `Debug` and `Display` only ever show the last few characters, so a value can be
/// dropped into `tracing::info!("{:?}", ...)` without leaking a phone number or token.
/// Serialization is transparent because the booking API needs the real value.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Masked<T>(pub T);

impl<T> Masked<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn expose(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: fmt::Display> Masked<T> {
    fn masked(&self) -> String {
        let raw = self.0.to_string();
        let chars: Vec<char> = raw.chars().collect();
        if chars.len() <= VISIBLE_SUFFIX {
            return "****".to_string();
        }
        let tail: String = chars[chars.len() - VISIBLE_SUFFIX..].iter().collect();
        format!("****{}", tail)
    }
}

impl<T: fmt::Display> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.masked())
    }
}

impl<T: fmt::Display> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.masked())
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Masked<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        T::deserialize(deserializer).map(Masked)
    }
}

impl From<String> for Masked<String> {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Masked<String> {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_keeps_only_suffix() {
        let phone = Masked::<String>::from("03001234567");
        assert_eq!(format!("{:?}", phone), "****4567");
        assert_eq!(phone.to_string(), "****4567");
    }

    #[test]
    fn test_short_values_fully_masked() {
        let pin = Masked::<String>::from("1234");
        assert_eq!(format!("{:?}", pin), "****");
    }

    #[test]
    fn test_serialization_is_transparent() {
        let email = Masked::<String>::from("ayesha@example.com");
        let json = serde_json::to_string(&email).unwrap();
        assert_eq!(json, "\"ayesha@example.com\"");

        let back: Masked<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.expose(), "ayesha@example.com");
    }
}
