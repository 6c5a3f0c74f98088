//! Theme file contents pushed into an existing theme.

use serde::{Deserialize, Serialize};

/// How a [`ThemeFileInput`]'s `content` is encoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileEncoding {
    /// Plain text (Liquid, JSON, CSS, ...).
    #[default]
    Text,
    /// Base64-encoded binary (images, fonts).
    Base64,
}

impl FileEncoding {
    /// The platform's content-type tag for this encoding.
    #[must_use]
    pub const fn as_body_type(&self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Base64 => "BASE64",
        }
    }
}

/// Errors found while validating a [`ThemeFileInput`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ThemeFileError {
    /// The file has no filename.
    #[error("files[{index}].filename is required")]
    MissingFilename {
        /// Position of the file in the request.
        index: usize,
    },
    /// The file has no content.
    #[error("files[{index}].content is required")]
    MissingContent {
        /// Position of the file in the request.
        index: usize,
    },
}

/// A single file to write into a theme.
///
/// `content` is optional at the type level so that requests omitting it can
/// be deserialized and then rejected with a field-specific message. An empty
/// string is valid content (it truncates the file).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeFileInput {
    /// Path relative to the theme root (e.g. `sections/header.liquid`).
    #[serde(default)]
    pub filename: String,
    /// File body, interpreted per `encoding`.
    #[serde(default)]
    pub content: Option<String>,
    /// Content encoding (defaults to `TEXT`).
    #[serde(default)]
    pub encoding: FileEncoding,
}

impl ThemeFileInput {
    /// Create a text file input.
    #[must_use]
    pub fn text(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            content: Some(content.into()),
            encoding: FileEncoding::Text,
        }
    }

    /// Create a base64 file input.
    #[must_use]
    pub fn base64(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            content: Some(content.into()),
            encoding: FileEncoding::Base64,
        }
    }

    /// Check that the file has a filename and content.
    ///
    /// # Errors
    ///
    /// Returns the first missing field, tagged with `index`.
    pub fn validate(&self, index: usize) -> Result<(), ThemeFileError> {
        if self.filename.trim().is_empty() {
            return Err(ThemeFileError::MissingFilename { index });
        }
        if self.content.is_none() {
            return Err(ThemeFileError::MissingContent { index });
        }
        Ok(())
    }
}
