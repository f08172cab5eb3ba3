//! Dulocart Core - Shared types library.
//!
//! This crate provides the plain data records exchanged between the checkout
//! domain and the shipping pipeline:
//! - `dulocart-shipping` - Shippo client, rate quoting, label purchase
//! - `dulocart-cli` - Command-line access to the pipeline
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. Everything
//! here is constructed by the checkout domain and handed to the pipeline, or
//! produced by the pipeline and handed back.
//!
//! # Modules
//!
//! - [`types`] - IDs, prices, addresses, parcels, quoted rates and labels

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
