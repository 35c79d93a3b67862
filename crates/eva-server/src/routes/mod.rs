pub mod balance;
pub mod companion;
pub mod generate;
pub mod health;
