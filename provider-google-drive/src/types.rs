//! Google Drive API request and response types
//!
//! Data structures for the Google Drive API v3 `files` resource.

use bridge_traits::storage::RemoteEntry;
use serde::{Deserialize, Serialize};

/// Google Drive API file resource, restricted to the requested fields
///
/// See: https://developers.google.com/drive/api/v3/reference/files#resource
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    /// File ID
    pub id: String,

    /// File name
    #[serde(default)]
    pub name: String,

    /// File size in bytes, encoded as a decimal string (omitted for folders
    /// and native documents)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

impl From<DriveFile> for RemoteEntry {
    fn from(file: DriveFile) -> Self {
        RemoteEntry {
            id: file.id,
            name: file.name,
            size: file.size.and_then(|s| s.parse().ok()),
        }
    }
}

/// Google Drive API files.list response
///
/// See: https://developers.google.com/drive/api/v3/reference/files/list
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesListResponse {
    /// List of files
    #[serde(default)]
    pub files: Vec<DriveFile>,

    /// Token for next page
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Body of a files.create call for a folder
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderRequest<'a> {
    pub name: &'a str,
    pub mime_type: &'a str,
    pub parents: Vec<&'a str>,
}

/// files.create response when only `id` is requested
#[derive(Debug, Deserialize)]
pub struct CreatedFile {
    pub id: String,
}
