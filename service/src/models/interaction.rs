// service/src/models/interaction.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionDirection {
  Request,
  Response,
  Error,
}

impl InteractionDirection {
  pub const fn as_str(self) -> &'static str {
    match self {
      InteractionDirection::Request => "request",
      InteractionDirection::Response => "response",
      InteractionDirection::Error => "error",
    }
  }
}

/// One logged request, response or error exchanged with the print vendor.
///
/// `order_id` is empty until the audited wrapper stamps it; vendor clients
/// capture interactions without knowing which local order they belong to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorInteraction {
  pub id: String,
  pub order_id: String,
  pub timestamp: DateTime<Utc>,
  pub direction: InteractionDirection,
  pub endpoint: String,
  pub http_status: Option<u16>,
  /// Already redacted.
  pub payload: JsonValue,
  pub duration_ms: Option<u64>,
}

impl VendorInteraction {
  pub fn new(direction: InteractionDirection, endpoint: impl Into<String>, payload: JsonValue) -> Self {
    Self {
      id: Uuid::new_v4().to_string(),
      order_id: String::new(),
      timestamp: Utc::now(),
      direction,
      endpoint: endpoint.into(),
      http_status: None,
      payload: redact(payload),
      duration_ms: None,
    }
  }

  pub fn with_status(mut self, status: u16) -> Self {
    self.http_status = Some(status);
    self
  }

  pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
    self.duration_ms = Some(duration_ms);
    self
  }
}

const REDACTED: &str = "[REDACTED]";
const SENSITIVE_KEY_PARTS: [&str; 7] = ["email", "phone", "apikey", "api_key", "authorization", "token", "secret"];

fn is_sensitive(key: &str) -> bool {
  let key = key.to_ascii_lowercase();
  SENSITIVE_KEY_PARTS.iter().any(|part| key.contains(part))
}

/// Replaces the values of personal or credential-bearing keys, at any depth.
pub fn redact(value: JsonValue) -> JsonValue {
  match value {
    JsonValue::Object(map) => JsonValue::Object(
      map
        .into_iter()
        .map(|(k, v)| {
          if is_sensitive(&k) {
            (k, JsonValue::String(REDACTED.to_string()))
          } else {
            (k, redact(v))
          }
        })
        .collect(),
    ),
    JsonValue::Array(items) => JsonValue::Array(items.into_iter().map(redact).collect()),
    other => other,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn redacts_nested_contact_and_credentials() {
    let payload = json!({
      "delivery": { "contactEmail": "parent@example.com", "phoneNumber": "555", "city": "Leeds" },
      "headers": [{ "Authorization": "Bearer abc" }],
      "pages": 24
    });

    let redacted = redact(payload);

    assert_eq!(redacted["delivery"]["contactEmail"], "[REDACTED]");
    assert_eq!(redacted["delivery"]["phoneNumber"], "[REDACTED]");
    assert_eq!(redacted["delivery"]["city"], "Leeds");
    assert_eq!(redacted["headers"][0]["Authorization"], "[REDACTED]");
    assert_eq!(redacted["pages"], 24);
  }

  #[test]
  fn new_interaction_is_redacted_on_construction() {
    let i = VendorInteraction::new(InteractionDirection::Request, "submit_order", json!({ "apiKey": "k" }));
    assert_eq!(i.payload["apiKey"], "[REDACTED]");
    assert!(i.order_id.is_empty());
  }
}
