//! # Covid Server
//!
//! JSON service for per-country daily pandemic statistics.
//!
//! This crate hosts the composition root: it owns the snapshot store, runs the
//! background refresher and serves the store over HTTP.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod app;
pub mod error;

pub use api::{router, AppState};
pub use app::*;
pub use error::*;
