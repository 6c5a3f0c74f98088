//! Core types for Themedrop.
//!
//! This module provides type-safe wrappers for the values that cross the
//! boundary between callers and the remote platform.

pub mod id;
pub mod store;
pub mod theme_file;

pub use id::{ThemeId, ThemeIdError};
pub use store::{StoreDomain, StoreDomainError};
pub use theme_file::{FileEncoding, ThemeFileError, ThemeFileInput};
