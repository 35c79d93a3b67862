//! eva-core
//!
//! Pure domain types, runtime configuration, and media path conventions.
//! No HTTP or storage dependency; this is the shared vocabulary of the Eva
//! generation service.

pub mod config;
pub mod error;
pub mod media_paths;
pub mod models;
