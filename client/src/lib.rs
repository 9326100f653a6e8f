//! Trackwell Client Library
//!
//! The asynchronous shell around the pure engine in `trackwell-shared`:
//! configuration, the session credential store, the HTTP record store, and
//! the sync controller that sequences every mutation with its follow-up
//! refetch.

pub mod api;
pub mod config;
pub mod error;
pub mod session;
pub mod sync;
