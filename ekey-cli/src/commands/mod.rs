//! Subcommand implementations.

pub mod resolve;
pub mod send;
pub mod validate;
