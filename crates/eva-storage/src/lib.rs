//! eva-storage
//!
//! Migration of provider-hosted artifacts into storage the service owns:
//! a local media directory or an S3 bucket.

pub mod artifact;
pub mod error;
pub mod local;
pub mod s3;
pub mod store;
