//! eva-generation
//!
//! Charged, provider-agnostic media generation: debit, submit, poll,
//! persist. Also companion creation, which chains a text model and an
//! avatar image.

pub mod companion;
pub mod error;
pub mod job;
pub mod orchestrator;
pub mod poll;
