//! Theme identifiers and their platform global-ID form.
//!
//! Callers address themes by the numeric id the platform shows in its admin.
//! Every GraphQL call needs the global form instead:
//! `gid://shopify/OnlineStoreTheme/<id>`.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Platform namespace segment of every global ID.
pub const GID_PLATFORM: &str = "shopify";

/// Resource type segment for themes.
pub const THEME_GID_TYPE: &str = "OnlineStoreTheme";

/// Errors that can occur when parsing a [`ThemeId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ThemeIdError {
    /// The input string is empty.
    #[error("themeId cannot be empty")]
    Empty,
    /// The input is neither a positive integer nor a theme global ID.
    #[error("themeId must be a positive integer or a theme global ID, got {0:?}")]
    Invalid(String),
}

/// A numeric theme id.
///
/// ```
/// use themedrop_core::ThemeId;
///
/// let id = ThemeId::new(123_456);
/// assert_eq!(id.to_gid(), "gid://shopify/OnlineStoreTheme/123456");
///
/// // Global IDs returned by the platform parse back to the same id.
/// assert_eq!(ThemeId::parse("gid://shopify/OnlineStoreTheme/123456").unwrap(), id);
/// assert_eq!(ThemeId::parse("123456").unwrap(), id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThemeId(u64);

impl ThemeId {
    /// Create a new theme ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the underlying numeric value.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Parse either a bare numeric id or a theme global ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, not a positive integer, or a
    /// global ID for a resource other than a theme.
    pub fn parse(s: &str) -> Result<Self, ThemeIdError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ThemeIdError::Empty);
        }

        let numeric = match s.strip_prefix("gid://") {
            Some(rest) => {
                let mut segments = rest.splitn(3, '/');
                match (segments.next(), segments.next(), segments.next()) {
                    (Some(GID_PLATFORM), Some(THEME_GID_TYPE), Some(id)) => id,
                    _ => return Err(ThemeIdError::Invalid(s.to_owned())),
                }
            }
            None => s,
        };

        match numeric.parse::<u64>() {
            Ok(id) if id > 0 => Ok(Self(id)),
            _ => Err(ThemeIdError::Invalid(s.to_owned())),
        }
    }

    /// The platform global ID for this theme.
    #[must_use]
    pub fn to_gid(&self) -> String {
        format!("gid://{GID_PLATFORM}/{THEME_GID_TYPE}/{}", self.0)
    }
}

impl fmt::Display for ThemeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ThemeId {
    type Err = ThemeIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<u64> for ThemeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ThemeId> for u64 {
    fn from(id: ThemeId) -> Self {
        id.0
    }
}

impl Serialize for ThemeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

/// Theme ids arrive as JSON numbers from most callers and as strings from
/// query strings and forms.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawThemeId {
    Number(u64),
    Text(String),
}

impl<'de> Deserialize<'de> for ThemeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawThemeId::deserialize(deserializer)? {
            RawThemeId::Number(0) => Err(serde::de::Error::custom(ThemeIdError::Invalid(
                "0".to_owned(),
            ))),
            RawThemeId::Number(id) => Ok(Self(id)),
            RawThemeId::Text(text) => Self::parse(&text).map_err(serde::de::Error::custom),
        }
    }
}
