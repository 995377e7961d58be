//! Mapping tables: the user-supplied export that translates ekey user and
//! device ids into display names.
//!
//! A [`MappingTable`] is immutable once built. Reconfiguration builds a new
//! table and swaps it in whole.

use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::error::{MappingError, Result};

/// One entry of the `users` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEntry {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
}

/// One entry of the `devices` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceEntry {
    pub device_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
}

/// Counts reported back to whoever configured a mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MappingSummary {
    /// `system` field of the export, or "Unknown"
    #[cfg_attr(feature = "openapi", schema(example = "ekey bionyx"))]
    pub system: String,
    /// Users that carry both an id and a name
    #[cfg_attr(feature = "openapi", schema(example = 3))]
    pub users: usize,
    /// Devices that carry an id
    #[cfg_attr(feature = "openapi", schema(example = 1))]
    pub devices: usize,
}

/// Id-to-name translation table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MappingTable {
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    users: Vec<UserEntry>,
    devices: Vec<DeviceEntry>,
    #[serde(skip)]
    user_index: HashMap<String, usize>,
    #[serde(skip)]
    device_index: HashMap<String, usize>,
}

impl MappingTable {
    /// Build a table from entries. Duplicate ids resolve to the last entry.
    pub fn new(system: Option<String>, users: Vec<UserEntry>, devices: Vec<DeviceEntry>) -> Self {
        let user_index = users
            .iter()
            .enumerate()
            .map(|(i, user)| (user.user_id.clone(), i))
            .collect();
        let device_index = devices
            .iter()
            .enumerate()
            .map(|(i, device)| (device.device_id.clone(), i))
            .collect();

        Self {
            system,
            users,
            devices,
            user_index,
            device_index,
        }
    }

    /// A table with no entries: every id resolves to itself.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a mapping export from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Build a table from an already parsed export.
    ///
    /// The export must be an object with a `users` or `devices` list.
    /// Entries without an id are skipped; numeric ids are stringified.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut root) = value else {
            return Err(MappingError::InvalidStructure);
        };

        let users = take_list(&mut root, "users");
        let devices = take_list(&mut root, "devices");
        if users.is_none() && devices.is_none() {
            return Err(MappingError::MissingRequiredFields);
        }

        let system = root
            .get("system")
            .and_then(Value::as_str)
            .map(str::to_owned);

        let users = users
            .unwrap_or_default()
            .iter()
            .filter_map(|item| {
                Some(UserEntry {
                    user_id: id_field(item, "userId")?,
                    user_name: text_field(item, "userName"),
                })
            })
            .collect();

        let devices = devices
            .unwrap_or_default()
            .iter()
            .filter_map(|item| {
                Some(DeviceEntry {
                    device_id: id_field(item, "deviceId")?,
                    device_name: text_field(item, "deviceName"),
                })
            })
            .collect();

        Ok(Self::new(system, users, devices))
    }

    /// Read and parse a mapping file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| MappingError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn system(&self) -> Option<&str> {
        self.system.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.devices.is_empty()
    }

    /// Whether `user_id` has an entry, named or not.
    pub fn contains_user(&self, user_id: &str) -> bool {
        self.user_index.contains_key(user_id)
    }

    /// Mapped name for a user id, if the entry has one.
    pub fn user_name(&self, user_id: &str) -> Option<&str> {
        let index = *self.user_index.get(user_id)?;
        self.users[index].user_name.as_deref()
    }

    /// Mapped name for a device id, if the entry has one.
    pub fn device_name(&self, device_id: &str) -> Option<&str> {
        let index = *self.device_index.get(device_id)?;
        self.devices[index].device_name.as_deref()
    }

    /// Distinct mapped users as `(user_id, display_name)`.
    ///
    /// The display name is the one a webhook event for that id resolves to:
    /// the mapped name, or the raw id for entries without one.
    pub fn users(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.users
            .iter()
            .enumerate()
            .filter(|(i, user)| self.user_index.get(&user.user_id) == Some(i))
            .map(|(_, user)| {
                let name = user.user_name.as_deref().unwrap_or(&user.user_id);
                (user.user_id.as_str(), name)
            })
    }

    pub fn summary(&self) -> MappingSummary {
        MappingSummary {
            system: self.system.clone().unwrap_or_else(|| "Unknown".to_string()),
            users: self.users.iter().filter(|u| u.user_name.is_some()).count(),
            devices: self.devices.len(),
        }
    }
}

fn take_list(root: &mut serde_json::Map<String, Value>, key: &str) -> Option<Vec<Value>> {
    match root.remove(key) {
        Some(Value::Array(items)) => Some(items),
        _ => None,
    }
}

fn id_field(item: &Value, key: &str) -> Option<String> {
    match item.get(key)? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

fn text_field(item: &Value, key: &str) -> Option<String> {
    item.get(key).and_then(Value::as_str).map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const EXPORT: &str = r#"{
        "system": "ekey bionyx",
        "users": [
            {"userId": "LOAbWecG", "userName": "Mandi"},
            {"userId": "Xy12", "userName": "Chris"},
            {"userId": "NoName"}
        ],
        "devices": [
            {"deviceId": "80156839130911", "deviceName": "Front Door"}
        ]
    }"#;

    #[test]
    fn test_parse_export() {
        let table = MappingTable::from_json(EXPORT).unwrap();
        assert_eq!(table.system(), Some("ekey bionyx"));
        assert_eq!(table.user_name("LOAbWecG"), Some("Mandi"));
        assert_eq!(table.user_name("Xy12"), Some("Chris"));
        assert_eq!(table.device_name("80156839130911"), Some("Front Door"));
        assert_eq!(table.user_name("missing"), None);
        assert_eq!(table.device_name("missing"), None);
    }

    #[test]
    fn test_user_without_name_is_known_but_unnamed() {
        let table = MappingTable::from_json(EXPORT).unwrap();
        assert!(table.contains_user("NoName"));
        assert_eq!(table.user_name("NoName"), None);

        let users: Vec<_> = table.users().collect();
        assert!(users.contains(&("NoName", "NoName")));
    }

    #[test]
    fn test_duplicate_ids_last_write_wins() {
        let table = MappingTable::from_json(
            r#"{"users": [
                {"userId": "a", "userName": "First"},
                {"userId": "a", "userName": "Second"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(table.user_name("a"), Some("Second"));
        let users: Vec<_> = table.users().collect();
        assert_eq!(users, vec![("a", "Second")]);
    }

    #[test]
    fn test_numeric_ids_are_stringified() {
        let table = MappingTable::from_json(
            r#"{"devices": [{"deviceId": 42, "deviceName": "Garage"}]}"#,
        )
        .unwrap();
        assert_eq!(table.device_name("42"), Some("Garage"));
    }

    #[test]
    fn test_entries_without_id_are_skipped() {
        let table = MappingTable::from_json(
            r#"{"users": [{"userName": "Ghost"}, {"userId": "b", "userName": "Bo"}]}"#,
        )
        .unwrap();
        assert_eq!(table.users().count(), 1);
    }

    #[test]
    fn test_summary_counts() {
        let summary = MappingTable::from_json(EXPORT).unwrap().summary();
        assert_eq!(summary.system, "ekey bionyx");
        assert_eq!(summary.users, 2);
        assert_eq!(summary.devices, 1);

        let summary = MappingTable::from_json(r#"{"users": []}"#).unwrap().summary();
        assert_eq!(summary.system, "Unknown");
    }

    #[test]
    fn test_invalid_json() {
        let err = MappingTable::from_json("{not json").unwrap_err();
        assert!(matches!(err, MappingError::InvalidJson(_)));
    }

    #[test]
    fn test_non_object_rejected() {
        let err = MappingTable::from_json("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, MappingError::InvalidStructure));
    }

    #[test]
    fn test_missing_lists_rejected() {
        let err = MappingTable::from_json(r#"{"system": "x"}"#).unwrap_err();
        assert!(matches!(err, MappingError::MissingRequiredFields));

        let err = MappingTable::from_json(r#"{"users": "nope"}"#).unwrap_err();
        assert!(matches!(err, MappingError::MissingRequiredFields));
    }

    #[test]
    fn test_empty_table() {
        let table = MappingTable::empty();
        assert!(table.is_empty());
        assert_eq!(table.users().count(), 0);
        assert_eq!(table.summary().users, 0);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(EXPORT.as_bytes()).unwrap();

        let table = MappingTable::load(file.path()).unwrap();
        assert_eq!(table.user_name("LOAbWecG"), Some("Mandi"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = MappingTable::load("/definitely/not/here/mapping.json").unwrap_err();
        assert!(matches!(err, MappingError::Io { .. }));
    }
}
