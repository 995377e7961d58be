//! Identity resolution: joins a [`FingerEvent`] with the current
//! [`MappingTable`] into the record that gets published.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::codes;
use crate::event::FingerEvent;
use crate::mapping::MappingTable;

/// Bus event type fired for every accepted notification.
pub const FINGERPRINT_DETECTED: &str = "ekey.fingerprint_detected";

/// A fingerprint event after id-to-name translation.
///
/// Unmapped ids are carried through as their raw value, so resolution never
/// fails.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ResolvedEvent {
    pub time: String,
    /// Parsed `time`; absent if the controller sent an unparsable value
    pub timestamp: Option<DateTime<Utc>>,

    #[serde(rename = "type")]
    pub event_type: i64,
    pub type_name: String,

    pub result: i64,
    pub result_name: String,

    pub detail: Option<i64>,
    pub detail_name: Option<String>,

    pub user_id: Option<String>,
    pub user_name: Option<String>,
    /// Whether `user_id` was found in the mapping
    #[serde(skip)]
    pub user_is_mapped: bool,

    pub finger_index: Option<i64>,
    pub finger_name: String,

    pub ctl_device_id: Option<String>,
    pub ctl_device_name: Option<String>,
    pub acq_device_id: Option<String>,
    pub acq_device_name: Option<String>,

    pub input_number: Option<i64>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub trigger: Option<Value>,
}

impl ResolvedEvent {
    pub fn resolve(event: &FingerEvent, mapping: &MappingTable) -> Self {
        let user_id = event.params.user_id.clone();
        let user_is_mapped = user_id
            .as_deref()
            .is_some_and(|id| mapping.contains_user(id));
        let user_name = user_id
            .as_deref()
            .map(|id| mapping.user_name(id).unwrap_or(id).to_string());

        let device_name = |id: &Option<String>| {
            id.as_deref()
                .map(|id| mapping.device_name(id).unwrap_or(id).to_string())
        };

        Self {
            time: event.time.clone(),
            timestamp: event.timestamp(),
            event_type: event.event_type,
            type_name: codes::type_label(event.event_type).into_owned(),
            result: event.result,
            result_name: codes::result_label(event.result).into_owned(),
            detail: event.detail,
            // zero means "no detail"
            detail_name: event
                .detail
                .filter(|code| *code != 0)
                .map(|code| codes::detail_label(code).into_owned()),
            user_id,
            user_name,
            user_is_mapped,
            finger_index: event.params.finger_index,
            finger_name: codes::finger_label(event.params.finger_index).into_owned(),
            ctl_device_name: device_name(&event.ctl_dev_id),
            ctl_device_id: event.ctl_dev_id.clone(),
            acq_device_name: device_name(&event.acq_dev_id),
            acq_device_id: event.acq_dev_id.clone(),
            input_number: event.params.input_number,
            trigger: event.params.trigger.clone(),
        }
    }

    /// Name used in logs: the resolved user, or "unknown" for events
    /// without a user (digital inputs).
    pub fn display_user(&self) -> &str {
        self.user_name.as_deref().unwrap_or("unknown")
    }
}
