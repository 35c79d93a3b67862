pub mod companion;
pub mod media;
pub mod transaction;
pub mod user;
