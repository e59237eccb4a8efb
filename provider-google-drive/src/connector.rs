//! Google Drive API connector implementation
//!
//! Implements the `RemoteStorage` trait for Google Drive API v3.

use async_trait::async_trait;
use bridge_traits::auth::AccessTokenProvider;
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::http::{ByteStream, HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bridge_traits::storage::{EntryKind, ListFilter, ListingPage, RemoteStorage};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::error::GoogleDriveError;
use crate::types::{CreateFolderRequest, CreatedFile, FilesListResponse};

/// Google Drive API base URL
const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// MIME type Google Drive uses for folders
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Alias Google Drive accepts for the user's root folder
const ROOT_FOLDER_ID: &str = "root";

/// Fields requested for listings
const LIST_FIELDS: &str = "files(id,name,size),nextPageToken";

/// Maximum results per page (Google Drive API limit)
const MAX_PAGE_SIZE: u32 = 1000;

/// Default timeout for metadata calls
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Google Drive API connector
///
/// Implements `RemoteStorage` for Google Drive API v3. Each method performs
/// exactly one HTTP round trip; non-success statuses are surfaced as
/// `BridgeError`s (404 as `NotFound`) for the caller to classify.
///
/// # Example
///
/// ```ignore
/// use provider_google_drive::GoogleDriveConnector;
/// use bridge_traits::storage::{ListFilter, RemoteStorage};
///
/// let connector = GoogleDriveConnector::new(http_client, token_provider);
/// let page = connector.list_children(Some(folder_id), &ListFilter::files(), None).await?;
/// ```
pub struct GoogleDriveConnector {
    /// HTTP client for API requests
    http_client: Arc<dyn HttpClient>,

    /// Source of OAuth 2.0 access tokens
    token_provider: Arc<dyn AccessTokenProvider>,

    /// Timeout for list/create/delete calls
    request_timeout: Duration,
}

impl GoogleDriveConnector {
    /// Create a new Google Drive connector
    ///
    /// # Arguments
    ///
    /// * `http_client` - HTTP client implementation
    /// * `token_provider` - Provider of tokens with the `drive` scope
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        token_provider: Arc<dyn AccessTokenProvider>,
    ) -> Self {
        Self {
            http_client,
            token_provider,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Override the timeout applied to non-streaming calls
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Build a request carrying a fresh bearer token
    async fn authorized(&self, method: HttpMethod, url: String) -> Result<HttpRequest> {
        let token = self.token_provider.access_token().await?;
        Ok(HttpRequest::new(method, url)
            .bearer_token(token)
            .header("Accept", "application/json"))
    }

    /// Execute a metadata request and reject non-success statuses
    async fn send(&self, request: HttpRequest, resource: &str) -> Result<HttpResponse> {
        let response = self
            .http_client
            .execute(request.timeout(self.request_timeout))
            .await?;

        if response.is_success() {
            Ok(response)
        } else {
            debug!(status = response.status, resource, "Drive API call rejected");
            Err(GoogleDriveError::from_status(response.status, resource, response.text_lossy()).into())
        }
    }

    fn parse<T: serde::de::DeserializeOwned>(response: &HttpResponse, what: &str) -> Result<T> {
        serde_json::from_slice(&response.body).map_err(|e| {
            GoogleDriveError::ParseError(format!("Failed to parse {}: {}", what, e)).into()
        })
    }
}

/// Escape a value for use inside a single-quoted Drive query literal
fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Build the `q` parameter for a children listing
fn build_query(parent_id: &str, filter: &ListFilter) -> String {
    let mut conditions = vec![format!("'{}' in parents", escape_query_value(parent_id))];

    conditions.push(match filter.kind {
        EntryKind::Folder => format!("mimeType = '{}'", FOLDER_MIME_TYPE),
        EntryKind::File => format!("mimeType != '{}'", FOLDER_MIME_TYPE),
    });

    if let Some(name) = &filter.name {
        conditions.push(format!("name = '{}'", escape_query_value(name)));
    }

    conditions.push("trashed = false".to_string());
    conditions.join(" and ")
}

#[async_trait]
impl RemoteStorage for GoogleDriveConnector {
    #[instrument(skip(self, filter), fields(kind = ?filter.kind))]
    async fn list_children(
        &self,
        parent_id: Option<&str>,
        filter: &ListFilter,
        page_token: Option<&str>,
    ) -> Result<ListingPage> {
        let parent = parent_id.unwrap_or(ROOT_FOLDER_ID);
        match &filter.name {
            Some(name) => debug!("Get folder by name: {}", name),
            None => debug!("Get files for id: {}", parent),
        }

        let mut url = format!(
            "{}/files?q={}&fields={}&spaces=drive&pageSize={}",
            DRIVE_API_BASE,
            urlencoding::encode(&build_query(parent, filter)),
            urlencoding::encode(LIST_FIELDS),
            MAX_PAGE_SIZE
        );

        if let Some(token) = page_token {
            url.push_str(&format!("&pageToken={}", urlencoding::encode(token)));
        }

        let request = self.authorized(HttpMethod::Get, url).await?;
        let response = self.send(request, parent).await?;
        let list: FilesListResponse = Self::parse(&response, "files list response")?;

        debug!(
            count = list.files.len(),
            has_more = list.next_page_token.is_some(),
            "Listed Drive page"
        );

        Ok(ListingPage {
            entries: list.files.into_iter().map(Into::into).collect(),
            next_page_token: list.next_page_token,
        })
    }

    #[instrument(skip(self))]
    async fn create_folder(&self, name: &str, parent_id: Option<&str>) -> Result<String> {
        debug!("Create dir \"{}\"", name);

        let parent = parent_id.unwrap_or(ROOT_FOLDER_ID);
        let url = format!("{}/files?fields=id", DRIVE_API_BASE);
        let body = CreateFolderRequest {
            name,
            mime_type: FOLDER_MIME_TYPE,
            parents: vec![parent],
        };

        let request = self.authorized(HttpMethod::Post, url).await?.json(&body)?;
        let response = self.send(request, parent).await?;
        let created: CreatedFile = Self::parse(&response, "created folder")?;

        Ok(created.id)
    }

    #[instrument(skip(self))]
    async fn delete_by_id(&self, id: &str) -> Result<()> {
        debug!("Remove id: {}", id);

        let url = format!("{}/files/{}", DRIVE_API_BASE, urlencoding::encode(id));
        let request = self.authorized(HttpMethod::Delete, url).await?;
        self.send(request, id).await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn download_by_id(&self, id: &str) -> Result<ByteStream> {
        debug!("Download file by id: {}", id);

        let url = format!(
            "{}/files/{}?alt=media",
            DRIVE_API_BASE,
            urlencoding::encode(id)
        );
        let request = self.authorized(HttpMethod::Get, url).await?;

        self.http_client
            .download_stream(request)
            .await
            .map_err(|e| match e {
                BridgeError::HttpStatus { status, message } => {
                    GoogleDriveError::from_status(status, id, message).into()
                }
                other => other,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::auth::StaticTokenProvider;
    use bytes::Bytes;
    use mockall::mock;
    use std::collections::HashMap;
    use tokio::io::AsyncReadExt;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
            async fn download_stream(&self, request: HttpRequest) -> Result<ByteStream>;
        }
    }

    fn connector(mock_http: MockHttpClient) -> GoogleDriveConnector {
        GoogleDriveConnector::new(
            Arc::new(mock_http),
            Arc::new(StaticTokenProvider::new("test_token")),
        )
    }

    fn json_response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        }
    }

    fn decoded_query(url: &str) -> String {
        let encoded = url
            .split("q=")
            .nth(1)
            .and_then(|rest| rest.split('&').next())
            .unwrap();
        urlencoding::decode(encoded).unwrap().into_owned()
    }

    #[test]
    fn test_build_query_for_files() {
        let query = build_query("folder1", &ListFilter::files());
        assert_eq!(
            query,
            "'folder1' in parents and mimeType != 'application/vnd.google-apps.folder' and trashed = false"
        );
    }

    #[test]
    fn test_build_query_for_named_folder_escapes_quotes() {
        let query = build_query("root", &ListFilter::folder_named("it's"));
        assert_eq!(
            query,
            "'root' in parents and mimeType = 'application/vnd.google-apps.folder' and name = 'it\\'s' and trashed = false"
        );
    }

    #[tokio::test]
    async fn test_list_children_success() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute()
            .withf(|req| {
                req.method == HttpMethod::Get
                    && req.headers.get("Authorization") == Some(&"Bearer test_token".to_string())
                    && req.url.contains("pageToken=page2")
                    && decoded_query(&req.url).starts_with("'folder1' in parents")
            })
            .times(1)
            .returning(|_| {
                Ok(json_response(
                    200,
                    r#"{
                        "files": [
                            {"id": "file1", "name": "x.txt", "size": "100"},
                            {"id": "file2", "name": "y.txt", "size": "200"}
                        ],
                        "nextPageToken": "page3"
                    }"#,
                ))
            });

        let page = connector(mock_http)
            .list_children(Some("folder1"), &ListFilter::files(), Some("page2"))
            .await
            .unwrap();

        assert_eq!(page.entries.len(), 2);
        assert_eq!(page.entries[0].id, "file1");
        assert_eq!(page.entries[1].size, Some(200));
        assert_eq!(page.next_page_token, Some("page3".to_string()));
    }

    #[tokio::test]
    async fn test_list_children_defaults_to_root() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute()
            .withf(|req| decoded_query(&req.url).starts_with("'root' in parents"))
            .times(1)
            .returning(|_| Ok(json_response(200, r#"{"files": []}"#)));

        let page = connector(mock_http)
            .list_children(None, &ListFilter::folder_named("a"), None)
            .await
            .unwrap();

        assert!(page.entries.is_empty());
        assert!(page.next_page_token.is_none());
    }

    #[tokio::test]
    async fn test_list_children_malformed_body() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| Ok(json_response(200, "<html>")));

        let result = connector(mock_http)
            .list_children(Some("folder1"), &ListFilter::files(), None)
            .await;

        assert!(matches!(result, Err(BridgeError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_create_folder_sends_metadata() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute()
            .withf(|req| {
                let body: serde_json::Value =
                    serde_json::from_slice(req.body.as_ref().unwrap()).unwrap();
                req.method == HttpMethod::Post
                    && req.url.ends_with("/files?fields=id")
                    && body["name"] == "2024"
                    && body["mimeType"] == FOLDER_MIME_TYPE
                    && body["parents"] == serde_json::json!(["parent1"])
            })
            .times(1)
            .returning(|_| Ok(json_response(200, r#"{"id": "new-folder"}"#)));

        let id = connector(mock_http)
            .create_folder("2024", Some("parent1"))
            .await
            .unwrap();

        assert_eq!(id, "new-folder");
    }

    #[tokio::test]
    async fn test_delete_by_id() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute()
            .withf(|req| req.method == HttpMethod::Delete && req.url.ends_with("/files/folder1"))
            .times(1)
            .returning(|_| Ok(json_response(204, "")));

        connector(mock_http).delete_by_id("folder1").await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_missing_maps_to_not_found() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| Ok(json_response(404, r#"{"error": {"code": 404}}"#)));

        let result = connector(mock_http).delete_by_id("gone").await;

        match result {
            Err(BridgeError::NotFound(id)) => assert_eq!(id, "gone"),
            other => panic!("expected NotFound, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_server_error_is_http_status() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| Ok(json_response(503, "backend error")));

        let result = connector(mock_http).delete_by_id("folder1").await;

        assert!(matches!(
            result,
            Err(BridgeError::HttpStatus { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn test_download_by_id_streams_body() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_download_stream()
            .withf(|req| {
                req.url.ends_with("/files/file1?alt=media")
                    && req.headers.contains_key("Authorization")
            })
            .times(1)
            .returning(|_| Ok(Box::new(std::io::Cursor::new(vec![1u8, 2, 3, 4, 5]))));

        let mut stream = connector(mock_http).download_by_id("file1").await.unwrap();
        let mut data = Vec::new();
        stream.read_to_end(&mut data).await.unwrap();

        assert_eq!(data, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_download_missing_file() {
        let mut mock_http = MockHttpClient::new();

        mock_http.expect_download_stream().times(1).returning(|_| {
            Err(BridgeError::HttpStatus {
                status: 404,
                message: "File not found".to_string(),
            })
        });

        let result = connector(mock_http).download_by_id("file1").await;

        assert!(matches!(result, Err(BridgeError::NotFound(_))));
    }
}
