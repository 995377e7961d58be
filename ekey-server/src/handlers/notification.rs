//! Webhook handler for fingerprint notifications
//!
//! The controller posts one JSON object per scan. The body is read as raw
//! bytes so that syntax errors, missing fields and wrong field types can be
//! told apart in the response.

use axum::{body::Bytes, extract::State};
use ekey_core::FingerEvent;

use crate::auth::Authorized;
use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/notification/finger - Receive a fingerprint event
///
/// Resolves user and device ids against the installed mapping, fires
/// `ekey.fingerprint_detected` and updates the user's sensors.
#[utoipa::path(
    post,
    path = "/api/notification/finger",
    tag = "Notifications",
    request_body(content = FingerEvent, content_type = "application/json"),
    responses(
        (status = 200, description = "Event accepted", body = String, example = "OK"),
        (status = 400, description = "Malformed body (INVALID_JSON, MISSING_FIELDS, INVALID_FIELD)"),
        (status = 401, description = "Token configured but no Bearer header sent"),
        (status = 403, description = "Wrong token")
    )
)]
pub async fn notification_handler(
    _auth: Authorized,
    State(state): State<AppState>,
    body: Bytes,
) -> Result<&'static str, ApiError> {
    let event = FingerEvent::from_slice(&body)?;
    let resolved = state.bridge.handle(&event).await;

    tracing::info!(
        event_type = %resolved.type_name,
        result = %resolved.result_name,
        user = resolved.display_user(),
        user_id = resolved.user_id.as_deref().unwrap_or("-"),
        finger = %resolved.finger_name,
        device = resolved.acq_device_name.as_deref().unwrap_or("-"),
        time = %resolved.time,
        "Fingerprint event"
    );

    Ok("OK")
}
