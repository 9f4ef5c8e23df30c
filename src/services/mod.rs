pub mod auth;
pub mod availability;
pub mod directory;
pub mod metrics;
pub mod reservations;
