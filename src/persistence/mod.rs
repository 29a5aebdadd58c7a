//! Durable storage for the saved notification state.

pub mod error;
pub mod sqlite;
pub mod traits;
