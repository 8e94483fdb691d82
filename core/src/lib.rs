//! Host discovery engine: enumerates LAN interfaces and finds out which
//! addresses on their subnets answer.

pub mod engine;
pub mod network;
pub mod probe;
pub mod scanner;
