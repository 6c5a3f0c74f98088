//! Store domain type.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`StoreDomain`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreDomainError {
    /// Nothing is left once the scheme and trailing slashes are removed.
    #[error("shop cannot be empty")]
    Empty,
    /// The input is too long to be a hostname.
    #[error("shop must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains whitespace or a path after the host.
    #[error("shop must be a bare hostname, got {0:?}")]
    Invalid(String),
}

/// A canonical store hostname (e.g. `my-store.myshopify.com`).
///
/// Callers may pass the shop with or without a scheme and with or without a
/// trailing slash, in any case. All of these parse to the same value:
///
/// ```
/// use themedrop_core::StoreDomain;
///
/// let a = StoreDomain::parse("my-store.myshopify.com").unwrap();
/// let b = StoreDomain::parse("https://My-Store.myshopify.com/").unwrap();
/// let c = StoreDomain::parse("HTTP://my-store.MYSHOPIFY.com//").unwrap();
///
/// assert_eq!(a, b);
/// assert_eq!(b, c);
/// assert_eq!(a.as_str(), "my-store.myshopify.com");
/// ```
///
/// The canonical form is used both as the credential lookup key and as the
/// host of the GraphQL endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StoreDomain(String);

impl StoreDomain {
    /// Maximum length of a hostname (RFC 1035).
    pub const MAX_LENGTH: usize = 253;

    /// Parse and canonicalize a store reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty after normalization, longer
    /// than a hostname may be, or still contains whitespace or a path.
    pub fn parse(s: &str) -> Result<Self, StoreDomainError> {
        let host = strip_scheme(s.trim()).trim_end_matches('/');

        if host.is_empty() {
            return Err(StoreDomainError::Empty);
        }

        if host.len() > Self::MAX_LENGTH {
            return Err(StoreDomainError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if host.contains(|c: char| c.is_whitespace() || c == '/') {
            return Err(StoreDomainError::Invalid(s.to_owned()));
        }

        Ok(Self(host.to_lowercase()))
    }

    /// Returns the canonical hostname.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `StoreDomain` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

fn strip_scheme(s: &str) -> &str {
    for scheme in ["https://", "http://"] {
        if let Some(prefix) = s.get(..scheme.len())
            && prefix.eq_ignore_ascii_case(scheme)
        {
            return s.get(scheme.len()..).unwrap_or_default();
        }
    }
    s
}

impl fmt::Display for StoreDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for StoreDomain {
    type Err = StoreDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for StoreDomain {
    type Error = StoreDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<StoreDomain> for String {
    fn from(domain: StoreDomain) -> Self {
        domain.0
    }
}

impl AsRef<str> for StoreDomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
