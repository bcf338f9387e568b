//! haulboard: the routing and reporting core of a trucking company's admin dashboard.
//!
//! - `geo` sorts a job's drop-off stops by distance from its pickup point and resolves addresses
//!   for coordinates.
//! - `report` buckets a month's financial records by day and builds the voucher reports.
//! - `store` fetches those records from the dashboard API.
//!
//! The `commands` module drives all of these for the `haulboard` binary.

pub mod args;
pub mod commands;
mod config;
mod error;
pub mod geo;
mod mode;
pub mod model;
pub mod report;
mod session;
pub mod store;
mod utils;

#[cfg(test)]
mod test;

pub use config::Config;
pub use error::{CoreError, CoreResult, Error, Result};
pub use mode::Mode;
pub use session::{Session, SessionToken, Transport};
