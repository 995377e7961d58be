//! Code tables from the ekey notification API.
//!
//! Every lookup is total: codes the table does not know map to a generic
//! `unknown_<code>` label so a new firmware value never fails a request.

use std::borrow::Cow;

/// Result code for a successful fingerprint match.
pub const RESULT_MATCH: i64 = 10;

/// Event type code for a finger scan.
pub const TYPE_FINGER: i64 = 10;

/// Labels a finger select may hold. Negative indices are the left hand.
pub const FINGER_OPTIONS: [&str; 11] = [
    "none",
    "right_thumb",
    "right_index_finger",
    "right_middle_finger",
    "right_ring_finger",
    "right_little_finger",
    "left_thumb",
    "left_index_finger",
    "left_middle_finger",
    "left_ring_finger",
    "left_little_finger",
];

fn known_or_unknown(label: Option<&'static str>, code: i64) -> Cow<'static, str> {
    match label {
        Some(label) => Cow::Borrowed(label),
        None => Cow::Owned(format!("unknown_{code}")),
    }
}

/// Label for the `result` field.
pub fn result_label(code: i64) -> Cow<'static, str> {
    let label = match code {
        10 => Some("match"),
        20 => Some("filtered_match"),
        30 => Some("no_match"),
        0 => Some("unknown"),
        _ => None,
    };
    known_or_unknown(label, code)
}

/// Label for the `type` field.
pub fn type_label(code: i64) -> Cow<'static, str> {
    let label = match code {
        10 => Some("finger"),
        20 => Some("digital_input"),
        _ => None,
    };
    known_or_unknown(label, code)
}

/// Label for the optional `detail` field.
pub fn detail_label(code: i64) -> Cow<'static, str> {
    let label = match code {
        10 => Some("input_disabled"),
        20 => Some("schedule"),
        30 => Some("no_rule"),
        40 => Some("no_input"),
        50 => Some("invalid_input"),
        60 => Some("time_limitation"),
        _ => None,
    };
    known_or_unknown(label, code)
}

/// Label for `params.fingerIndex`.
pub fn finger_label(index: Option<i64>) -> Cow<'static, str> {
    let Some(index) = index else {
        return Cow::Borrowed("unknown");
    };

    let label = match index {
        -5 => "left_little_finger",
        -4 => "left_ring_finger",
        -3 => "left_middle_finger",
        -2 => "left_index_finger",
        -1 => "left_thumb",
        0 => "none",
        1 => "right_thumb",
        2 => "right_index_finger",
        3 => "right_middle_finger",
        4 => "right_ring_finger",
        5 => "right_little_finger",
        other => return Cow::Owned(format!("finger_{other}")),
    };
    Cow::Borrowed(label)
}

/// Whether `label` is one of [`FINGER_OPTIONS`].
pub fn is_finger_option(label: &str) -> bool {
    FINGER_OPTIONS.contains(&label)
}
