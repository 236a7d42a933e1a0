//! Linked choropleth and time-series views over Vienna district rent and
//! income statistics.

pub mod config;
pub mod controller;
pub mod data;
pub mod error;
pub mod filter;
pub mod render;
pub mod selection;
pub mod server;
pub mod session;
pub mod spatial;
pub mod types;

#[cfg(test)]
mod test_support;

pub use controller::{ControlSync, Dashboard, Event, EventEnvelope, Outcome, Session, View};
pub use error::SelectionError;
pub use filter::EmptySelectionPolicy;
pub use selection::{SelectionDomain, SelectionState};
pub use types::{DistrictRegion, Indicator, Row};
