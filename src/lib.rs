//! Interactive feature-model configuration service.
//!
//! The selection engine lives in [`selector_core`]; this crate adds the HTTP
//! surface, the backend client and configuration.

pub mod api;
pub mod client;
pub mod config;
pub mod sessions;

pub use selector_core as core;
