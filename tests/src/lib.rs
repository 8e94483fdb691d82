//! Engine-level tests that run against fake probers and interface tables,
//! so they need neither root nor a real network.

#[cfg(test)]
mod support;

#[cfg(test)]
mod discovery;
#[cfg(test)]
mod engine;
