//! services/api/src/lib.rs
//!
//! Library surface of the `api` service, re-exported for the binaries.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
