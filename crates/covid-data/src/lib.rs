//! # Covid Data
//!
//! Ingestion and serving state for covid-stats.
//!
//! - [`parser`] turns the upstream CSV into an immutable [`Dataset`]
//! - [`query`] holds the pure functions answering API requests
//! - [`store`] keeps the live [`Snapshot`] behind an atomic pointer swap
//! - [`source`] downloads the CSV over HTTP
//! - [`refresher`] drives periodic downloads into the store

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod parser;
pub mod query;
pub mod record;
pub mod refresher;
pub mod source;
pub mod store;

pub use error::*;
pub use parser::parse_dataset;
pub use record::*;
pub use refresher::*;
pub use source::*;
pub use store::*;
