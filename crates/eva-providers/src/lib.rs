//! eva-providers
//!
//! Adapters for the third-party media and text generation services, plus
//! the parsing of structured text-model output.

pub mod client;
pub mod error;
pub mod extract;
pub mod fal;
pub mod kie;
pub mod media;
pub mod registry;
pub mod runpod;
pub mod text;
