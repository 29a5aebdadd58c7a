#![warn(missing_docs)]
//! outage-watch keeps a single live Telegram notification in sync with the
//! DTEK outage status for one fixed address: it polls the source, compares
//! each observation against what was last communicated, and creates, edits,
//! supersedes or closes the notification accordingly.

pub mod config;
pub mod executor;
pub mod http_client;
pub mod models;
pub mod notifier;
pub mod observer;
pub mod persistence;
pub mod reconciler;
pub mod render;
pub mod supervisor;
pub mod test_helpers;
