//! Microgrid design and financial analysis engine.
//!
//! [`analysis::analyze`] turns a facility profile and a rate table into a
//! sized DER design, its costs, incentive-adjusted financials, a reliability
//! estimate, and recommendations.

pub mod analysis;
#[cfg(feature = "api")]
pub mod api;
pub mod config;
pub mod costs;
pub mod error;
pub mod facility;
pub mod finance;
pub mod logging;
pub mod recommend;
pub mod reliability;
pub mod sizing;
