//! Publishing resolved events
//!
//! [`EventPublisher`] is the narrow interface between the webhook pipeline
//! and whatever consumes its output. [`Hub`] is the in-process consumer the
//! server runs with: an event bus plus the per-user sensor registry.

use ekey_core::{MappingTable, ResolvedEvent, FINGERPRINT_DETECTED};

use crate::bus::EventBus;
use crate::sensors::SensorRegistry;

/// Sink for resolved events and mapping changes.
pub trait EventPublisher: Send + Sync {
    /// Publish one resolved notification.
    fn publish(&self, event: &ResolvedEvent);

    /// A new mapping table was installed.
    fn on_mapping_changed(&self, mapping: &MappingTable);
}

/// Event bus and sensor registry.
#[derive(Debug)]
pub struct Hub {
    bus: EventBus,
    sensors: SensorRegistry,
}

impl Hub {
    pub fn new(bus: EventBus) -> Self {
        Self {
            bus,
            sensors: SensorRegistry::new(),
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn sensors(&self) -> &SensorRegistry {
        &self.sensors
    }
}

impl EventPublisher for Hub {
    fn publish(&self, event: &ResolvedEvent) {
        self.bus.fire(FINGERPRINT_DETECTED, event.clone());

        if event.user_id.is_some() {
            self.sensors.record(event);
        }
    }

    fn on_mapping_changed(&self, mapping: &MappingTable) {
        self.sensors.sync_mapping(mapping);
    }
}
