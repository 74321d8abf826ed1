use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use rideway_shared::Masked;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Session bearer token. Only the last characters ever reach a log line.
#[derive(Clone, Debug)]
pub struct BearerToken(Masked<String>);

impl BearerToken {
    /// Blank tokens count as no token.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        let token = token.trim();
        if token.is_empty() {
            None
        } else {
            Some(Self(Masked::new(token.to_string())))
        }
    }

    fn header_value(&self) -> Option<HeaderValue> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", self.0.expose())).ok()?;
        value.set_sensitive(true);
        Some(value)
    }
}

/// Headers shared by every call: the bearer token when present and a fresh correlation id.
pub(crate) fn request_headers(token: Option<&BearerToken>) -> (HeaderMap, Uuid) {
    let request_id = Uuid::new_v4();
    let mut headers = HeaderMap::new();
    if let Some(value) = token.and_then(BearerToken::header_value) {
        headers.insert(AUTHORIZATION, value);
    }
    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        headers.insert(REQUEST_ID_HEADER, value);
    }
    (headers, request_id)
}
