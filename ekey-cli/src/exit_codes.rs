//! Exit codes following sysexits.h conventions.
//!
//! These codes let scripts tell a bad mapping file apart from a missing one
//! or from an unreachable bridge.

use ekey_core::{EventError, MappingError};

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// General error (catch-all).
pub const GENERAL_ERROR: i32 = 1;

/// Data format error (invalid mapping or event, rejected notification).
/// Maps to EX_DATAERR from sysexits.h.
pub const DATA_ERROR: i32 = 65;

/// Cannot open input file.
/// Maps to EX_NOINPUT from sysexits.h.
pub const INPUT_ERROR: i32 = 66;

/// Bridge unreachable.
/// Maps to EX_UNAVAILABLE from sysexits.h.
pub const NETWORK_ERROR: i32 = 69;

/// Represents an exit code with optional error context.
#[derive(Debug)]
pub struct ExitCode {
    pub code: i32,
    pub message: Option<String>,
}

impl ExitCode {
    pub const fn success() -> Self {
        Self {
            code: SUCCESS,
            message: None,
        }
    }

    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let message = format!("{err:#}");

        // Classify error by inspecting the chain
        let mut code = GENERAL_ERROR;
        for cause in err.chain() {
            if let Some(mapping) = cause.downcast_ref::<MappingError>() {
                code = match mapping {
                    MappingError::Io { .. } => INPUT_ERROR,
                    _ => DATA_ERROR,
                };
                break;
            }
            if cause.is::<EventError>() || cause.is::<serde_json::Error>() {
                code = DATA_ERROR;
                break;
            }
            if cause.is::<std::io::Error>() {
                code = INPUT_ERROR;
                break;
            }
            if cause.is::<reqwest::Error>() {
                code = NETWORK_ERROR;
                break;
            }
            if cause.is::<crate::commands::send::Rejected>() {
                code = DATA_ERROR;
                break;
            }
        }

        Self {
            code,
            message: Some(message),
        }
    }
}
