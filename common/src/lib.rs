//! Shared data model for `hostsweep`: subnet arithmetic, interface and
//! report types, configuration and the error taxonomy.

pub mod config;
pub mod error;
pub mod network;
pub mod report;
pub mod utils;
