use reqwest::multipart::{Form, Part};
use rideway_core::{BookingApiError, BookingReceipt, BookingRequest};
use serde_json::Value;
use tracing::warn;

const SEAT_KEYS: [&str; 2] = ["bookedSeats", "data"];
const ID_KEYS: [&str; 4] = ["id", "_id", "bookingId", "booking_id"];
const ID_CONTAINERS: [&str; 2] = ["booking", "data"];

/// Booked seats from either a bare array or one wrapped under `bookedSeats`/`data`.
/// Entries that are not whole numbers are skipped.
pub fn parse_booked_seats(body: &Value) -> Result<Vec<i64>, BookingApiError> {
    let list = match body {
        Value::Array(items) => items,
        Value::Object(map) => SEAT_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array))
            .ok_or_else(|| BookingApiError::Decode("booked seats response has no seat list".to_string()))?,
        Value::Null => return Ok(Vec::new()),
        other => {
            return Err(BookingApiError::Decode(format!(
                "unexpected booked seats payload: {}",
                other
            )))
        }
    };

    Ok(list
        .iter()
        .filter_map(|item| {
            let seat = seat_number(item);
            if seat.is_none() {
                warn!(entry = %item, "Ignoring non-numeric booked seat");
            }
            seat
        })
        .collect())
}

fn seat_number(item: &Value) -> Option<i64> {
    match item {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Receipt for an accepted submission. A 2xx is success whatever the body looks like;
/// without a server id the booking is tracked under `fallback_id`.
pub fn parse_receipt(body: Value, fallback_id: &str) -> BookingReceipt {
    let booking_id = find_booking_id(&body).unwrap_or_else(|| {
        warn!(fallback_id, "Booking accepted without a recognisable id");
        fallback_id.to_string()
    });
    BookingReceipt { booking_id, body }
}

/// JSON when the body parses, otherwise the raw text; empty bodies become `null`.
pub fn response_body(text: &str) -> Value {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string()))
}

fn find_booking_id(body: &Value) -> Option<String> {
    id_field(body).or_else(|| {
        ID_CONTAINERS
            .iter()
            .filter_map(|key| body.get(*key))
            .find_map(id_field)
    })
}

fn id_field(value: &Value) -> Option<String> {
    ID_KEYS.iter().filter_map(|key| value.get(*key)).find_map(|id| match id {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Multipart body for proof-of-payment bookings: every JSON field as a text part
/// (arrays as JSON text, nulls omitted) plus the `screenshot` file part.
pub fn multipart_form(request: &BookingRequest) -> Result<Form, BookingApiError> {
    let fields = match serde_json::to_value(request) {
        Ok(Value::Object(fields)) => fields,
        Ok(_) => return Err(BookingApiError::Transport("booking request is not an object".to_string())),
        Err(e) => return Err(BookingApiError::Transport(e.to_string())),
    };

    let mut form = Form::new();
    for (name, value) in fields {
        let text = match value {
            Value::Null => continue,
            Value::String(s) => s,
            other => other.to_string(),
        };
        form = form.text(name, text);
    }

    if let Some(proof) = &request.screenshot {
        let part = Part::bytes(proof.bytes.clone())
            .file_name(proof.file_name.clone())
            .mime_str(&proof.content_type)
            .map_err(|e| BookingApiError::Transport(format!("invalid proof content type: {}", e)))?;
        form = form.part("screenshot", part);
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_booked_seats_shapes() {
        assert_eq!(parse_booked_seats(&json!([3, "4", " 5 ", 6.0])).unwrap(), vec![3, 4, 5, 6]);
        assert_eq!(parse_booked_seats(&json!({ "bookedSeats": [1, 2] })).unwrap(), vec![1, 2]);
        assert_eq!(parse_booked_seats(&json!({ "data": ["7"] })).unwrap(), vec![7]);
        assert_eq!(parse_booked_seats(&Value::Null).unwrap(), Vec::<i64>::new());
    }

    #[test]
    fn test_booked_seats_keeps_out_of_range_and_drops_junk() {
        assert_eq!(
            parse_booked_seats(&json!([0, -2, 99, "A1", null, 2.5])).unwrap(),
            vec![0, -2, 99]
        );
    }

    #[test]
    fn test_booked_seats_rejects_unknown_object() {
        assert!(matches!(
            parse_booked_seats(&json!({ "seats": [1] })),
            Err(BookingApiError::Decode(_))
        ));
    }

    #[test]
    fn test_receipt_id_lookup() {
        let id = |body: Value| parse_receipt(body, "req-1").booking_id;
        assert_eq!(id(json!({ "id": "bk-1" })), "bk-1");
        assert_eq!(id(json!({ "_id": "65f0c2" })), "65f0c2");
        assert_eq!(id(json!({ "bookingId": 42 })), "42");
        assert_eq!(id(json!({ "success": true, "booking": { "_id": "nested" } })), "nested");
        assert_eq!(id(json!({ "data": { "booking_id": "bk-9" } })), "bk-9");
    }

    #[test]
    fn test_receipt_without_id_uses_fallback() {
        let receipt = parse_receipt(json!({ "success": true, "message": "Booking created" }), "req-7");
        assert_eq!(receipt.booking_id, "req-7");
        assert_eq!(receipt.body["message"], "Booking created");
    }

    #[test]
    fn test_response_body_shapes() {
        assert_eq!(response_body(r#"{"id":"x"}"#), json!({ "id": "x" }));
        assert_eq!(response_body("Created"), json!("Created"));
        assert_eq!(response_body("  "), Value::Null);
    }
}
