//! HTTP request handlers
//!
//! This module contains all the request handlers for the API endpoints.

pub mod admin;
pub mod health;
pub mod notification;

pub use crate::state::AppState;
pub use admin::{
    delete_mapping_handler, get_mapping_handler, get_state_handler, list_states_handler,
    put_mapping_handler,
};
pub use health::{health, ready, HealthResponse, ReadyResponse};
pub use notification::notification_handler;
