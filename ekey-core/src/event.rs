//! Fingerprint notifications as posted by the ekey controller.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::EventError;

/// Top-level fields a notification must carry.
pub const REQUIRED_FIELDS: [&str; 3] = ["time", "type", "result"];

/// One fingerprint scan or digital-input event.
///
/// Unknown fields are ignored at every level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct FingerEvent {
    /// ISO-8601 time stamp as sent by the controller
    pub time: String,
    #[serde(rename = "type")]
    pub event_type: i64,
    pub result: i64,
    pub detail: Option<i64>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub ctl_dev_id: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub acq_dev_id: Option<String>,
    #[serde(default)]
    pub params: EventParams,
}

/// The nested `params` object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct EventParams {
    #[serde(default, deserialize_with = "string_or_number")]
    pub user_id: Option<String>,
    pub finger_index: Option<i64>,
    pub input_number: Option<i64>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub trigger: Option<Value>,
}

impl FingerEvent {
    /// Parse a webhook body.
    ///
    /// Syntax errors and non-object bodies are `InvalidJson`; absent
    /// required fields are reported together as `MissingFields`; anything
    /// present with the wrong type is `InvalidField`.
    pub fn from_slice(body: &[u8]) -> Result<Self, EventError> {
        let value: Value =
            serde_json::from_slice(body).map_err(|e| EventError::InvalidJson(e.to_string()))?;

        let Value::Object(fields) = &value else {
            return Err(EventError::InvalidJson("expected a JSON object".to_string()));
        };

        let missing: Vec<&'static str> = REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|field| !fields.contains_key(*field))
            .collect();
        if !missing.is_empty() {
            return Err(EventError::MissingFields(missing));
        }

        serde_json::from_value(value).map_err(|e| EventError::InvalidField(e.to_string()))
    }

    pub fn user_id(&self) -> Option<&str> {
        self.params.user_id.as_deref()
    }

    /// Event time in UTC, or `None` when the controller sent something
    /// unparsable. A bad time stamp never rejects the event.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.time)
    }
}

/// Ids arrive as strings from current firmware and as bare numbers from
/// some older exports. Both are kept as text.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<Id>::deserialize(deserializer)?.map(|id| match id {
        Id::Text(text) => text,
        Id::Number(number) => number.to_string(),
    }))
}

/// Parse an ekey time stamp (`2025-01-27T14:30:45.123Z`).
///
/// Offsets other than `Z` are converted to UTC; a time without an offset is
/// taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    match NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(naive) => Some(naive.and_utc()),
        Err(err) => {
            tracing::warn!(time = raw, error = %err, "Could not parse event timestamp");
            None
        }
    }
}
