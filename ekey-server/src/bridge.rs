//! The webhook pipeline: resolve against the current mapping, then publish.
//!
//! The mapping sits behind an async `RwLock` holding an `Arc`. A request
//! keeps the read lock from resolution through publishing, and a replacement
//! takes the write lock for the swap and the publisher re-sync, so a request
//! sees either the old table and old sensors or the new ones, never a mix.

use std::path::Path;
use std::sync::Arc;

use ekey_core::{FingerEvent, MappingError, MappingSummary, MappingTable, ResolvedEvent};
use tokio::sync::RwLock;

use crate::publisher::EventPublisher;

pub struct Bridge {
    mapping: RwLock<Arc<MappingTable>>,
    publisher: Arc<dyn EventPublisher>,
}

impl Bridge {
    /// Install `mapping` and eagerly announce it to the publisher.
    pub fn new(mapping: MappingTable, publisher: Arc<dyn EventPublisher>) -> Self {
        publisher.on_mapping_changed(&mapping);
        Self {
            mapping: RwLock::new(Arc::new(mapping)),
            publisher,
        }
    }

    /// Resolve and publish one notification.
    pub async fn handle(&self, event: &FingerEvent) -> ResolvedEvent {
        let mapping = self.mapping.read().await;
        let resolved = ResolvedEvent::resolve(event, &mapping);
        self.publisher.publish(&resolved);
        resolved
    }

    /// The currently installed table.
    pub async fn mapping(&self) -> Arc<MappingTable> {
        self.mapping.read().await.clone()
    }

    /// Swap in a new table. The old one is dropped once the last in-flight
    /// request releases it.
    pub async fn replace_mapping(&self, mapping: MappingTable) -> MappingSummary {
        let summary = mapping.summary();
        let mut current = self.mapping.write().await;
        self.publisher.on_mapping_changed(&mapping);
        *current = Arc::new(mapping);

        tracing::info!(
            system = %summary.system,
            users = summary.users,
            devices = summary.devices,
            "Mapping installed"
        );
        summary
    }

    /// Reload the table from a mapping file. On error the current table
    /// stays in place.
    pub async fn reload_from_file(&self, path: &Path) -> Result<MappingSummary, MappingError> {
        let mapping = MappingTable::load(path)?;
        Ok(self.replace_mapping(mapping).await)
    }
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use crate::bus::EventBus;
    use crate::publisher::Hub;

    /// Publisher that remembers what it was given.
    #[derive(Default)]
    struct Recorder {
        published: Mutex<Vec<ResolvedEvent>>,
        mappings: Mutex<Vec<usize>>,
    }

    impl EventPublisher for Recorder {
        fn publish(&self, event: &ResolvedEvent) {
            self.published.lock().unwrap().push(event.clone());
        }

        fn on_mapping_changed(&self, mapping: &MappingTable) {
            self.mappings.lock().unwrap().push(mapping.users().count());
        }
    }

    fn event() -> FingerEvent {
        FingerEvent::from_slice(
            br#"{"time": "2025-01-27T14:30:45Z", "type": 10, "result": 10,
                 "params": {"userId": "LOAbWecG"}}"#,
        )
        .unwrap()
    }

    fn mandi() -> MappingTable {
        MappingTable::from_json(r#"{"users": [{"userId": "LOAbWecG", "userName": "Mandi"}]}"#)
            .unwrap()
    }

    #[tokio::test]
    async fn test_new_announces_mapping() {
        let recorder = Arc::new(Recorder::default());
        let _bridge = Bridge::new(mandi(), recorder.clone());
        assert_eq!(*recorder.mappings.lock().unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn test_handle_resolves_and_publishes() {
        let recorder = Arc::new(Recorder::default());
        let bridge = Bridge::new(mandi(), recorder.clone());

        let resolved = bridge.handle(&event()).await;
        assert_eq!(resolved.user_name.as_deref(), Some("Mandi"));

        let published = recorder.published.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0], resolved);
    }

    #[tokio::test]
    async fn test_replace_mapping_changes_resolution() {
        let recorder = Arc::new(Recorder::default());
        let bridge = Bridge::new(MappingTable::empty(), recorder.clone());
        assert_eq!(
            bridge.handle(&event()).await.user_name.as_deref(),
            Some("LOAbWecG")
        );

        let summary = bridge.replace_mapping(mandi()).await;
        assert_eq!(summary.users, 1);
        assert_eq!(
            bridge.handle(&event()).await.user_name.as_deref(),
            Some("Mandi")
        );
        assert_eq!(*recorder.mappings.lock().unwrap(), vec![0, 1]);
    }

    #[tokio::test]
    async fn test_reload_from_file_keeps_old_table_on_error() {
        let recorder = Arc::new(Recorder::default());
        let bridge = Bridge::new(mandi(), recorder);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ broken").unwrap();

        assert!(bridge.reload_from_file(file.path()).await.is_err());
        assert_eq!(bridge.mapping().await.user_name("LOAbWecG"), Some("Mandi"));
    }

    #[tokio::test]
    async fn test_reload_from_file() {
        let recorder = Arc::new(Recorder::default());
        let bridge = Bridge::new(MappingTable::empty(), recorder);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"system": "home", "users": [{"userId": "a", "userName": "Ann"}]}"#)
            .unwrap();

        let summary = bridge.reload_from_file(file.path()).await.unwrap();
        assert_eq!(summary.system, "home");
        assert_eq!(bridge.mapping().await.user_name("a"), Some("Ann"));
    }

    /// Real hub that checks the registry right after every publish.
    struct CheckedHub {
        hub: Hub,
        published: AtomicUsize,
        violations: Mutex<Vec<String>>,
    }

    impl CheckedHub {
        fn new() -> Self {
            Self {
                hub: Hub::new(EventBus::new(16)),
                published: AtomicUsize::new(0),
                violations: Mutex::new(Vec::new()),
            }
        }

        fn violation(&self, message: String) {
            self.violations.lock().unwrap().push(message);
        }
    }

    impl EventPublisher for CheckedHub {
        fn publish(&self, event: &ResolvedEvent) {
            self.hub.publish(event);
            self.published.fetch_add(1, Ordering::SeqCst);

            let sensors = self.hub.sensors();
            if event.user_is_mapped {
                if event.user_name.as_deref() != Some("Mandi") {
                    self.violation(format!("mapped event named {:?}", event.user_name));
                }
                match sensors.get("Mandi") {
                    Some(user) if user.last_event.as_ref() == Some(event) => {}
                    other => self.violation(format!("stale sensors after mapped event: {other:?}")),
                }
            } else {
                if sensors.get("LOAbWecG").is_some() {
                    self.violation("sensors created for raw id".to_string());
                }
                if !sensors.is_empty() {
                    self.violation(format!("unmapped event with {} users registered", sensors.len()));
                }
            }
        }

        fn on_mapping_changed(&self, mapping: &MappingTable) {
            self.hub.on_mapping_changed(mapping);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reload_never_mixes_tables() {
        const TASKS: usize = 8;
        const ROUNDS: usize = 200;

        let checked = Arc::new(CheckedHub::new());
        let bridge = Arc::new(Bridge::new(MappingTable::empty(), checked.clone()));

        let mut workers = Vec::new();
        for _ in 0..TASKS {
            let bridge = bridge.clone();
            workers.push(tokio::spawn(async move {
                let event = event();
                let mut mapped: usize = 0;
                for _ in 0..ROUNDS {
                    if bridge.handle(&event).await.user_is_mapped {
                        mapped += 1;
                    }
                    tokio::task::yield_now().await;
                }
                mapped
            }));
        }

        let reloader = {
            let bridge = bridge.clone();
            tokio::spawn(async move {
                for round in 0..100 {
                    let table = if round % 2 == 0 {
                        mandi()
                    } else {
                        MappingTable::empty()
                    };
                    bridge.replace_mapping(table).await;
                    tokio::task::yield_now().await;
                }
            })
        };

        let mut mapped = 0;
        for worker in workers {
            mapped += worker.await.unwrap();
        }
        reloader.await.unwrap();

        let violations = checked.violations.lock().unwrap();
        assert!(violations.is_empty(), "{violations:?}");
        assert_eq!(checked.published.load(Ordering::SeqCst), TASKS * ROUNDS);
        assert!(mapped <= TASKS * ROUNDS);

        // last reload installed the empty table
        assert!(bridge.mapping().await.is_empty());
        assert!(checked.hub.sensors().is_empty());
    }
}
