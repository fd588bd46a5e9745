//! # confmod-common
//!
//! Shared types, error definitions, configuration models, and naming
//! constants used across the entire confmod workspace.
//!
//! This crate is the leaf of the dependency graph — it depends on no other
//! internal crate and provides the primitives that the composition engine
//! and the SDK build upon.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
