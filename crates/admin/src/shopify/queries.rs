//! GraphQL documents for the Shopify Admin API theme endpoints.
//!
//! Each builder returns a [`RemoteRequest`] carrying the document, its
//! variables, and the root field the gateway should expect in `data`.

use serde_json::json;
use themedrop_core::{ThemeFileInput, ThemeId};

use super::gateway::RemoteRequest;

/// A named GraphQL operation and the root field of its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    pub name: &'static str,
    pub document: &'static str,
    pub root_field: &'static str,
}

// =============================================================================
// Staged uploads
// =============================================================================

pub const STAGED_UPLOADS_CREATE: Operation = Operation {
    name: "StagedUploadsCreate",
    document: r"mutation StagedUploadsCreate($input: [StagedUploadInput!]!) {
  stagedUploadsCreate(input: $input) {
    stagedTargets {
      url
      resourceUrl
      parameters {
        name
        value
      }
    }
    userErrors {
      field
      message
    }
  }
}",
    root_field: "stagedUploadsCreate",
};

/// Request one `FILE` staging target sized to the payload, uploaded by POST.
pub fn staged_uploads_create(filename: &str, mime_type: &str, file_size: usize) -> RemoteRequest {
    RemoteRequest::new(
        STAGED_UPLOADS_CREATE,
        json!({
            "input": [{
                "filename": filename,
                "mimeType": mime_type,
                "resource": "FILE",
                "fileSize": file_size.to_string(),
                "httpMethod": "POST",
            }]
        }),
    )
}

// =============================================================================
// Themes
// =============================================================================

pub const THEME_CREATE: Operation = Operation {
    name: "ThemeCreate",
    document: r"mutation ThemeCreate($source: URL!, $name: String) {
  themeCreate(source: $source, name: $name) {
    theme {
      id
      name
      role
    }
    userErrors {
      field
      message
    }
  }
}",
    root_field: "themeCreate",
};

pub fn theme_create(source: &str, name: &str) -> RemoteRequest {
    RemoteRequest::new(THEME_CREATE, json!({ "source": source, "name": name }))
}

pub const THEME_UPDATE: Operation = Operation {
    name: "ThemeUpdate",
    document: r"mutation ThemeUpdate($id: ID!, $input: OnlineStoreThemeInput!) {
  themeUpdate(id: $id, input: $input) {
    theme {
      id
      name
      role
    }
    userErrors {
      field
      message
    }
  }
}",
    root_field: "themeUpdate",
};

pub fn theme_update(theme_id: ThemeId, name: &str) -> RemoteRequest {
    RemoteRequest::new(
        THEME_UPDATE,
        json!({ "id": theme_id.to_gid(), "input": { "name": name } }),
    )
}

pub const THEME_FILES_UPSERT: Operation = Operation {
    name: "ThemeFilesUpsert",
    document: r"mutation ThemeFilesUpsert($themeId: ID!, $files: [OnlineStoreThemeFilesUpsertFileInput!]!) {
  themeFilesUpsert(themeId: $themeId, files: $files) {
    upsertedThemeFiles {
      filename
    }
    userErrors {
      field
      message
    }
  }
}",
    root_field: "themeFilesUpsert",
};

/// Files are sent as `{filename, body: {type, value}}` with the body type
/// taken from each file's encoding.
pub fn theme_files_upsert(theme_id: ThemeId, files: &[ThemeFileInput]) -> RemoteRequest {
    let files: Vec<_> = files
        .iter()
        .map(|file| {
            json!({
                "filename": file.filename,
                "body": {
                    "type": file.encoding.as_body_type(),
                    "value": file.content.as_deref().unwrap_or_default(),
                }
            })
        })
        .collect();

    RemoteRequest::new(
        THEME_FILES_UPSERT,
        json!({ "themeId": theme_id.to_gid(), "files": files }),
    )
}

pub const THEME_DELETE: Operation = Operation {
    name: "ThemeDelete",
    document: r"mutation ThemeDelete($id: ID!) {
  themeDelete(id: $id) {
    deletedThemeId
    userErrors {
      field
      message
    }
  }
}",
    root_field: "themeDelete",
};

pub fn theme_delete(theme_id: ThemeId) -> RemoteRequest {
    RemoteRequest::new(THEME_DELETE, json!({ "id": theme_id.to_gid() }))
}

pub const THEME_STATUS: Operation = Operation {
    name: "ThemeStatus",
    document: r"query ThemeStatus($id: ID!) {
  theme(id: $id) {
    id
    processing
    processingFailed
  }
}",
    root_field: "theme",
};

pub fn theme_status(theme_id: ThemeId) -> RemoteRequest {
    RemoteRequest::new(THEME_STATUS, json!({ "id": theme_id.to_gid() }))
}
