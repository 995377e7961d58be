//! ekey Core - identity resolution for ekey fingerprint notifications
//!
//! This crate holds the part of the bridge that does not touch the network:
//! the user-supplied mapping export, the notification model, the ekey code
//! tables and the join that turns a raw notification into a named event.
//!
//! # Example
//!
//! ```
//! use ekey_core::{FingerEvent, MappingTable, ResolvedEvent};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mapping = MappingTable::from_json(
//!     r#"{"users": [{"userId": "LOAbWecG", "userName": "Mandi"}]}"#,
//! )?;
//!
//! let event = FingerEvent::from_slice(
//!     br#"{"time": "2025-01-27T14:30:45Z", "type": 10, "result": 10,
//!          "params": {"userId": "LOAbWecG", "fingerIndex": 2}}"#,
//! )?;
//!
//! let resolved = ResolvedEvent::resolve(&event, &mapping);
//! assert_eq!(resolved.user_name.as_deref(), Some("Mandi"));
//! assert_eq!(resolved.result_name, "match");
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod codes;
pub mod error;
pub mod event;
pub mod mapping;
pub mod resolve;

pub use codes::{
    detail_label, finger_label, is_finger_option, result_label, type_label, FINGER_OPTIONS,
    RESULT_MATCH, TYPE_FINGER,
};
pub use error::{EventError, MappingError, Result};
pub use event::{parse_timestamp, EventParams, FingerEvent, REQUIRED_FIELDS};
pub use mapping::{DeviceEntry, MappingSummary, MappingTable, UserEntry};
pub use resolve::{ResolvedEvent, FINGERPRINT_DETECTED};
