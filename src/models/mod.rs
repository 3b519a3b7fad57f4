//! Core data models for the container sync run.
//!
//! These entities describe the remote listing snapshot and the local
//! candidates measured against it. Listing records deserialize directly
//! from the store's JSON via `serde`.

pub mod candidate;
pub mod object;
