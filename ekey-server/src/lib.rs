//! ekey Server Library - HTTP bridge for ekey fingerprint webhooks
//!
//! This library exposes the server components for use in integration tests.
//! The main binary uses these same components.

pub mod auth;
pub mod bridge;
pub mod bus;
pub mod config;
pub mod error;
pub mod handlers;
pub mod openapi;
pub mod publisher;
pub mod routes;
pub mod sensors;
pub mod state;

pub use auth::{Authorized, SecretToken};
pub use bridge::Bridge;
pub use bus::{spawn_logger, BusEvent, EventBus};
pub use config::Config;
pub use error::ApiError;
pub use openapi::ApiDoc;
pub use publisher::{EventPublisher, Hub};
pub use routes::{create_router, create_router_with_config};
pub use sensors::{slugify, AccessTime, EntityState, SensorKind, SensorRegistry, UserSensors};
pub use state::AppState;
