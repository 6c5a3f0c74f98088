//! Business logic services for theme deployment.
//!
//! # Services
//!
//! - `credentials` - Resolves a shop reference to a usable access token
//! - `themes` - Theme deployment operations (validate, resolve, call, map)

pub mod credentials;
pub mod themes;

pub use credentials::CredentialResolver;
pub use themes::{ThemeDeployer, ThemeStatus};
