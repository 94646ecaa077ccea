//! Record the latest seismic events reported by the IGP web service.
//!
//! The crate wires three steps behind [`task::IngestTask`]: fetch one
//! upstream report ([`fetch`]), normalize it into [`models::SeismicEvent`]
//! records ([`normalize`]) and persist the batch ([`store`]).

pub mod config;
pub mod errors;
pub mod fetch;
pub mod models;
pub mod normalize;
pub mod store;
pub mod task;
