//! services/api/src/lib.rs
//!
//! The `api` service: provider adapters, configuration and the HTTP surface
//! around the `vocab_core` gateway.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
