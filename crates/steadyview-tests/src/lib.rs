//! Integration test crate for SteadyView.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It drives the stabilizer, the tracker and the demo pipeline together.

#[cfg(test)]
mod stabilize;

#[cfg(test)]
mod tracking;

#[cfg(test)]
mod pipeline;
