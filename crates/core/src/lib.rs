//! Themedrop Core - Shared types library.
//!
//! This crate provides common types used across all Themedrop components:
//! - `admin` - Theme deployment service talking to the Shopify Admin API
//! - `integration-tests` - Stub platform harness and end-to-end tests
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Validated store domains, theme global IDs and theme file inputs

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
