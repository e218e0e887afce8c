//! Database module for pulseboard.
//!
//! Provides SQLite storage with automatic migrations.

mod models;
mod store;

pub use models::*;
pub use store::*;
