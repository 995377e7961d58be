//! Per-user sensor registry
//!
//! Each mapped user owns three entities:
//! - `sensor.<slug>_last_access`: time of the last scan
//! - `sensor.<slug>_last_result`: result label of the last scan
//! - `select.<slug>_last_finger`: finger used for the last scan
//!
//! Entries are created by an idempotent upsert, eagerly when a mapping is
//! installed and lazily on the first event for a mapped user. Writes replace
//! whole values, so replaying an event leaves the registry unchanged.
//!
//! Slugs are unique across the registry: a user whose name slugifies to a
//! slug already held by another user gets `<slug>_2`, `<slug>_3` and so on.

use std::collections::HashSet;

use chrono::{DateTime, SecondsFormat, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use ekey_core::{is_finger_option, MappingTable, ResolvedEvent};
use serde::Serialize;
use utoipa::ToSchema;

/// Value of a last-access sensor. Falls back to the raw controller string
/// when the time stamp did not parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AccessTime {
    Parsed(DateTime<Utc>),
    Raw(String),
}

impl AccessTime {
    fn from_event(event: &ResolvedEvent) -> Self {
        match event.timestamp {
            Some(ts) => Self::Parsed(ts),
            None => Self::Raw(event.time.clone()),
        }
    }

    fn to_state(&self) -> String {
        match self {
            Self::Parsed(ts) => ts.to_rfc3339_opts(SecondsFormat::Millis, true),
            Self::Raw(raw) => raw.clone(),
        }
    }
}

/// The three sensors of one user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSensors {
    pub user_id: String,
    pub user_name: String,
    pub slug: String,
    pub last_access: Option<AccessTime>,
    pub last_result: Option<String>,
    pub last_finger: String,
    /// Full event behind the current values, exposed as attributes
    pub last_event: Option<ResolvedEvent>,
}

impl UserSensors {
    fn new(user_id: &str, user_name: &str, slug: String) -> Self {
        Self {
            user_id: user_id.to_string(),
            user_name: user_name.to_string(),
            slug,
            last_access: None,
            last_result: None,
            last_finger: "none".to_string(),
            last_event: None,
        }
    }

    pub fn entity_id(&self, kind: SensorKind) -> String {
        format!("{}.{}_{}", kind.domain(), self.slug, kind.suffix())
    }

    fn state(&self, kind: SensorKind) -> Option<String> {
        match kind {
            SensorKind::LastAccess => self.last_access.as_ref().map(AccessTime::to_state),
            SensorKind::LastResult => self.last_result.clone(),
            SensorKind::LastFinger => Some(self.last_finger.clone()),
        }
    }

    fn entity_state(&self, kind: SensorKind) -> EntityState {
        EntityState {
            entity_id: self.entity_id(kind),
            user_id: self.user_id.clone(),
            user_name: self.user_name.clone(),
            state: self.state(kind),
            attributes: self.last_event.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    LastAccess,
    LastResult,
    LastFinger,
}

impl SensorKind {
    pub const ALL: [SensorKind; 3] = [Self::LastAccess, Self::LastResult, Self::LastFinger];

    fn domain(self) -> &'static str {
        match self {
            Self::LastAccess | Self::LastResult => "sensor",
            Self::LastFinger => "select",
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Self::LastAccess => "last_access",
            Self::LastResult => "last_result",
            Self::LastFinger => "last_finger",
        }
    }

    /// Split an entity id of this kind into its slug.
    fn slug_of(self, entity_id: &str) -> Option<&str> {
        entity_id
            .strip_prefix(self.domain())?
            .strip_prefix('.')?
            .strip_suffix(self.suffix())?
            .strip_suffix('_')
    }
}

/// One entity as returned by the states endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct EntityState {
    #[schema(example = "sensor.mandi_last_result")]
    pub entity_id: String,
    #[schema(example = "LOAbWecG")]
    pub user_id: String,
    #[schema(example = "Mandi")]
    pub user_name: String,
    /// Current value; absent until the first event for the user
    #[schema(example = "match")]
    pub state: Option<String>,
    /// The event that produced the current value
    pub attributes: Option<ResolvedEvent>,
}

/// Entity-id-safe form of a user name: lower case, runs of anything that is
/// not alphanumeric collapsed to `_`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for ch in name.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            slug.push(ch);
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    while slug.ends_with('_') {
        slug.pop();
    }

    if slug.is_empty() {
        "unknown".to_string()
    } else {
        slug
    }
}

/// Registry of per-user sensors keyed by resolved user name.
#[derive(Default)]
pub struct SensorRegistry {
    users: DashMap<String, UserSensors>,
    /// slug -> owning user name
    slugs: DashMap<String, String>,
}

impl SensorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a user's sensors in their empty state if they do not exist.
    pub fn upsert_user(&self, user_id: &str, user_name: &str) {
        self.users
            .entry(user_name.to_string())
            .and_modify(|sensors| {
                if sensors.user_id != user_id {
                    sensors.user_id = user_id.to_string();
                }
            })
            .or_insert_with(|| UserSensors::new(user_id, user_name, self.claim_slug(user_name)));
    }

    /// Reserve the first free slug for `user_name`. A name that already
    /// holds a slug gets it back.
    fn claim_slug(&self, user_name: &str) -> String {
        let base = slugify(user_name);
        let mut n = 1;
        loop {
            let candidate = if n == 1 {
                base.clone()
            } else {
                format!("{base}_{n}")
            };

            match self.slugs.entry(candidate.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(user_name.to_string());
                    if n > 1 {
                        tracing::warn!(
                            user = %user_name,
                            slug = %candidate,
                            "Slug already taken by another user, using suffixed entity ids"
                        );
                    }
                    return candidate;
                }
                Entry::Occupied(owner) if owner.get() == user_name => return candidate,
                Entry::Occupied(_) => n += 1,
            }
        }
    }

    /// Converge the registry onto a mapping: every mapped user gets sensors,
    /// users that are no longer mapped lose theirs. Surviving users keep
    /// their values.
    pub fn sync_mapping(&self, mapping: &MappingTable) {
        let names: HashSet<&str> = mapping.users().map(|(_, name)| name).collect();
        self.users.retain(|name, _| names.contains(name.as_str()));
        self.slugs.retain(|_, owner| names.contains(owner.as_str()));

        for (user_id, user_name) in mapping.users() {
            self.upsert_user(user_id, user_name);
        }

        tracing::debug!(users = self.users.len(), "Sensor registry synced to mapping");
    }

    /// Overwrite a mapped user's sensors from an event.
    ///
    /// Returns `false` when the event has no user or the user is not in the
    /// mapping; such users have no sensors.
    pub fn record(&self, event: &ResolvedEvent) -> bool {
        let (Some(user_id), Some(user_name)) = (&event.user_id, &event.user_name) else {
            return false;
        };
        if !event.user_is_mapped {
            tracing::debug!(user_id = %user_id, "No sensors for unmapped user");
            return false;
        }

        let finger = if is_finger_option(&event.finger_name) {
            event.finger_name.clone()
        } else {
            tracing::warn!(
                finger = %event.finger_name,
                user = %user_name,
                "Unknown finger name, setting to 'none'"
            );
            "none".to_string()
        };

        self.upsert_user(user_id, user_name);
        if let Some(mut sensors) = self.users.get_mut(user_name.as_str()) {
            sensors.last_access = Some(AccessTime::from_event(event));
            sensors.last_result = Some(event.result_name.clone());
            sensors.last_finger = finger;
            sensors.last_event = Some(event.clone());
        }

        tracing::debug!(user = %user_name, "Updated user sensors");
        true
    }

    pub fn get(&self, user_name: &str) -> Option<UserSensors> {
        self.users.get(user_name).map(|entry| entry.value().clone())
    }

    /// All users, sorted by name.
    pub fn snapshot(&self) -> Vec<UserSensors> {
        let mut users: Vec<_> = self.users.iter().map(|e| e.value().clone()).collect();
        users.sort_by(|a, b| a.user_name.cmp(&b.user_name));
        users
    }

    /// Every entity of every user.
    pub fn states(&self) -> Vec<EntityState> {
        self.snapshot()
            .iter()
            .flat_map(|user| SensorKind::ALL.map(|kind| user.entity_state(kind)))
            .collect()
    }

    /// Look up a single entity by id.
    pub fn state(&self, entity_id: &str) -> Option<EntityState> {
        SensorKind::ALL.into_iter().find_map(|kind| {
            let slug = kind.slug_of(entity_id)?;
            let owner = self.slugs.get(slug)?.value().clone();
            let sensors = self.users.get(&owner)?;
            Some(sensors.entity_state(kind))
        })
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl std::fmt::Debug for SensorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensorRegistry")
            .field("users", &self.users.len())
            .field("slugs", &self.slugs.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ekey_core::FingerEvent;

    fn mapping() -> MappingTable {
        MappingTable::from_json(
            r#"{"users": [
                {"userId": "LOAbWecG", "userName": "Mandi"},
                {"userId": "Xy12", "userName": "Chris Miller"}
            ]}"#,
        )
        .unwrap()
    }

    fn resolved(user_id: &str, body_extra: &str, mapping: &MappingTable) -> ResolvedEvent {
        let body = format!(
            r#"{{"time": "2025-01-27T14:30:45Z", "type": 10, "result": 10,
                 "params": {{"userId": "{user_id}" {body_extra}}}}}"#
        );
        let event = FingerEvent::from_slice(body.as_bytes()).unwrap();
        ResolvedEvent::resolve(&event, mapping)
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Mandi"), "mandi");
        assert_eq!(slugify("Chris Miller"), "chris_miller");
        assert_eq!(slugify("  Anna--Lena! "), "anna_lena");
        assert_eq!(slugify("???"), "unknown");
    }

    #[test]
    fn test_sync_creates_empty_sensors() {
        let registry = SensorRegistry::new();
        registry.sync_mapping(&mapping());

        assert_eq!(registry.len(), 2);
        let mandi = registry.get("Mandi").unwrap();
        assert_eq!(mandi.last_result, None);
        assert_eq!(mandi.last_finger, "none");
        assert_eq!(
            mandi.entity_id(SensorKind::LastResult),
            "sensor.mandi_last_result"
        );
        assert_eq!(
            mandi.entity_id(SensorKind::LastFinger),
            "select.mandi_last_finger"
        );
    }

    #[test]
    fn test_record_updates_all_three_sensors() {
        let mapping = mapping();
        let registry = SensorRegistry::new();
        registry.sync_mapping(&mapping);

        assert!(registry.record(&resolved("LOAbWecG", r#", "fingerIndex": 2"#, &mapping)));

        let mandi = registry.get("Mandi").unwrap();
        assert_eq!(mandi.last_result.as_deref(), Some("match"));
        assert_eq!(mandi.last_finger, "right_index_finger");
        assert!(matches!(mandi.last_access, Some(AccessTime::Parsed(_))));

        let state = registry.state("sensor.mandi_last_access").unwrap();
        assert_eq!(state.state.as_deref(), Some("2025-01-27T14:30:45.000Z"));
    }

    #[test]
    fn test_unmapped_user_gets_no_sensors() {
        let mapping = mapping();
        let registry = SensorRegistry::new();
        registry.sync_mapping(&mapping);

        assert!(!registry.record(&resolved("stranger", "", &mapping)));
        assert!(registry.get("stranger").is_none());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_lazy_and_eager_creation_converge() {
        let mapping = mapping();

        let eager = SensorRegistry::new();
        eager.sync_mapping(&mapping);
        eager.record(&resolved("LOAbWecG", "", &mapping));

        let lazy = SensorRegistry::new();
        lazy.record(&resolved("LOAbWecG", "", &mapping));
        lazy.sync_mapping(&mapping);

        assert_eq!(eager.snapshot(), lazy.snapshot());
    }

    #[test]
    fn test_replay_is_idempotent() {
        let mapping = mapping();
        let registry = SensorRegistry::new();
        let event = resolved("LOAbWecG", r#", "fingerIndex": -1"#, &mapping);

        registry.record(&event);
        let first = registry.snapshot();
        registry.record(&event);
        assert_eq!(registry.snapshot(), first);
    }

    #[test]
    fn test_unknown_finger_falls_back_to_none() {
        let mapping = mapping();
        let registry = SensorRegistry::new();
        registry.record(&resolved("LOAbWecG", r#", "fingerIndex": 9"#, &mapping));
        assert_eq!(registry.get("Mandi").unwrap().last_finger, "none");
    }

    #[test]
    fn test_unparsable_time_kept_raw() {
        let mapping = mapping();
        let event = FingerEvent::from_slice(
            br#"{"time": "not-a-time", "type": 10, "result": 10, "params": {"userId": "LOAbWecG"}}"#,
        )
        .unwrap();
        let registry = SensorRegistry::new();
        registry.record(&ResolvedEvent::resolve(&event, &mapping));

        assert_eq!(
            registry.get("Mandi").unwrap().last_access,
            Some(AccessTime::Raw("not-a-time".to_string()))
        );
    }

    #[test]
    fn test_sync_drops_removed_users_and_keeps_values() {
        let mapping = mapping();
        let registry = SensorRegistry::new();
        registry.sync_mapping(&mapping);
        registry.record(&resolved("LOAbWecG", "", &mapping));

        let smaller =
            MappingTable::from_json(r#"{"users": [{"userId": "LOAbWecG", "userName": "Mandi"}]}"#)
                .unwrap();
        registry.sync_mapping(&smaller);

        assert_eq!(registry.len(), 1);
        assert!(registry.get("Chris Miller").is_none());
        assert_eq!(
            registry.get("Mandi").unwrap().last_result.as_deref(),
            Some("match")
        );
    }

    #[test]
    fn test_states_lists_three_entities_per_user() {
        let registry = SensorRegistry::new();
        registry.sync_mapping(&mapping());

        let states = registry.states();
        assert_eq!(states.len(), 6);
        assert_eq!(states[0].entity_id, "sensor.chris_miller_last_access");
        assert!(registry.state("select.chris_miller_last_finger").is_some());
        assert!(registry.state("sensor.nobody_last_result").is_none());
    }

    #[test]
    fn test_colliding_slugs_get_distinct_entity_ids() {
        let mapping = MappingTable::from_json(
            r#"{"users": [
                {"userId": "a1", "userName": "Anna Lena"},
                {"userId": "a2", "userName": "Anna-Lena"},
                {"userId": "m1", "userName": "Mandi"},
                {"userId": "m2", "userName": "mandi"}
            ]}"#,
        )
        .unwrap();
        let registry = SensorRegistry::new();
        registry.sync_mapping(&mapping);

        assert_eq!(registry.get("Anna Lena").unwrap().slug, "anna_lena");
        assert_eq!(registry.get("Anna-Lena").unwrap().slug, "anna_lena_2");
        assert_eq!(registry.get("Mandi").unwrap().slug, "mandi");
        assert_eq!(registry.get("mandi").unwrap().slug, "mandi_2");

        let states = registry.states();
        let ids: HashSet<&str> = states.iter().map(|s| s.entity_id.as_str()).collect();
        assert_eq!(states.len(), 12);
        assert_eq!(ids.len(), 12);

        registry.record(&resolved("a2", "", &mapping));
        let second = registry.state("sensor.anna_lena_2_last_result").unwrap();
        assert_eq!(second.user_name, "Anna-Lena");
        assert_eq!(second.state.as_deref(), Some("match"));

        let first = registry.state("sensor.anna_lena_last_result").unwrap();
        assert_eq!(first.user_name, "Anna Lena");
        assert_eq!(first.state, None);
    }

    #[test]
    fn test_slugs_are_stable_across_resync() {
        let mapping = MappingTable::from_json(
            r#"{"users": [
                {"userId": "m1", "userName": "Mandi"},
                {"userId": "m2", "userName": "mandi"}
            ]}"#,
        )
        .unwrap();
        let registry = SensorRegistry::new();
        registry.sync_mapping(&mapping);
        registry.sync_mapping(&mapping);
        assert_eq!(registry.get("mandi").unwrap().slug, "mandi_2");

        let only_lower =
            MappingTable::from_json(r#"{"users": [{"userId": "m2", "userName": "mandi"}]}"#)
                .unwrap();
        registry.sync_mapping(&only_lower);
        assert_eq!(registry.get("mandi").unwrap().slug, "mandi_2");
        assert!(registry.state("sensor.mandi_last_result").is_none());

        // a freed slug can be claimed again
        registry.upsert_user("m3", "MANDI");
        assert_eq!(registry.get("MANDI").unwrap().slug, "mandi");
    }
}
