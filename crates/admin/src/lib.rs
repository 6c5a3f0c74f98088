//! Themedrop admin library.
//!
//! Deploys Shopify themes on behalf of installed shops: staged archive
//! uploads, theme create/rename/delete, file upserts and processing status,
//! exposed as a small JSON API.
//!
//! # Security
//!
//! This crate holds HIGH PRIVILEGE access: every remote call carries a
//! shop's offline Admin API token read from the session store. Tokens are
//! never logged or returned to callers.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod services;
pub mod shopify;
pub mod state;
