//! Whole-collection persistence for user alerts.
//!
//! The entire alert collection is one human-readable JSON document mapping
//! user id to an ordered alert list. There is no per-alert persistence API:
//! callers load the full book, mutate it, and replace it in one save.

mod error;
mod json_store;

pub use error::StoreError;
pub use json_store::JsonAlertStore;
