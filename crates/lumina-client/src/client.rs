//! HTTP client for the photo service: one operation per backend capability,
//! credential attachment, and centralized error classification.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use tokio::io::AsyncWriteExt;
use url::Url;
use uuid::Uuid;

use lumina_api_models::{
    BatchUploadResponse, ImageRecord, ImageStats, MaybeEnveloped, PageOrList, SingleUploadResponse,
};

use crate::auth::{Credential, CredentialStore};
use crate::error::{ApiError, ApiResult};

/// Request timeout applied when the caller does not override it.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

const HEADER_REQUEST_ID: &str = "x-request-id";

/// Which server-side listing an operation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    /// The main gallery (non-archived, non-trashed images).
    All,
    /// Images flagged as favorites.
    Favorites,
    /// Archived images.
    Archived,
    /// Images in the trash.
    Trash,
}

impl ListScope {
    pub(crate) const fn path(self) -> &'static str {
        match self {
            Self::All => "/images",
            Self::Favorites => "/images/favorites",
            Self::Archived => "/images/archived",
            Self::Trash => "/images/trash",
        }
    }

    /// Human-readable scope name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Favorites => "favorites",
            Self::Archived => "archived",
            Self::Trash => "trash",
        }
    }
}

/// Thin wrapper around the backend REST surface.
///
/// Every operation attaches the current credential when one is held, decodes
/// the optionally-enveloped payload on success, and normalizes failures into
/// [`ApiError`]. A 401 observed anywhere additionally invalidates the
/// credential store, exactly once per response.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    credentials: CredentialStore,
}

impl ApiClient {
    /// Build a client for `base_url` with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Invalid`] if the underlying HTTP client cannot be
    /// constructed.
    pub fn new(base_url: Url, credentials: CredentialStore) -> ApiResult<Self> {
        Self::with_timeout(base_url, credentials, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Build a client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Invalid`] if the underlying HTTP client cannot be
    /// constructed.
    pub fn with_timeout(
        base_url: Url,
        credentials: CredentialStore,
        timeout: Duration,
    ) -> ApiResult<Self> {
        let mut default_headers = HeaderMap::new();
        let trace_id = HeaderValue::from_str(&Uuid::new_v4().to_string())
            .map_err(|_| ApiError::Invalid("trace identifier is not a valid header".to_string()))?;
        default_headers.insert(HEADER_REQUEST_ID, trace_id);

        let http = Client::builder()
            .timeout(timeout)
            .default_headers(default_headers)
            .build()
            .map_err(|err| ApiError::Invalid(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            http,
            base_url,
            credentials,
        })
    }

    /// Base URL this client addresses.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The credential store this client attaches and invalidates.
    #[must_use]
    pub const fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    fn endpoint(&self, path: &str) -> ApiResult<Url> {
        self.base_url
            .join(path)
            .map_err(|err| ApiError::Invalid(format!("invalid endpoint '{path}': {err}")))
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match self.credentials.current() {
            Some(credential) => builder.header(AUTHORIZATION, credential.header_value()),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, url: &Url) -> ApiResult<Response> {
        let response = builder
            .send()
            .await
            .map_err(|err| connectivity(url, &err))?;
        self.check(response).await
    }

    async fn check(&self, response: Response) -> ApiResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED {
            self.credentials.invalidate();
        }
        let bytes = response.bytes().await.unwrap_or_default();
        Err(ApiError::classify_status(
            status.as_u16(),
            server_message(&bytes),
        ))
    }

    /// Probe the service health endpoint, returning its plaintext body.
    ///
    /// This doubles as the manual "retry connection" action: it is never
    /// invoked automatically after a failure.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] for any failure.
    pub async fn health(&self) -> ApiResult<String> {
        let url = self.endpoint("/health")?;
        let response = self.send(self.request(Method::GET, url.clone()), &url).await?;
        response
            .text()
            .await
            .map_err(|err| connectivity(&url, &err))
    }

    /// Validate a username/secret pair against the service and, on success,
    /// install the credential in the store (persisted best-effort).
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] when the probe fails; the store
    /// is left untouched except for the invalidation a 401 always triggers.
    pub async fn login(&self, username: &str, secret: &str) -> ApiResult<Credential> {
        let credential = Credential::encode(username, secret);
        let url = self.endpoint("/health")?;
        let response = self
            .http
            .get(url.clone())
            .header(AUTHORIZATION, credential.header_value())
            .send()
            .await
            .map_err(|err| connectivity(&url, &err))?;
        self.check(response).await?;
        self.credentials.install(credential.clone());
        Ok(credential)
    }

    /// Drop the stored credential.
    pub fn logout(&self) {
        self.credentials.invalidate();
    }

    /// Fetch one page of a listing scope.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] for any failure.
    pub async fn list_page(
        &self,
        scope: ListScope,
        page: u32,
        size: u32,
    ) -> ApiResult<Vec<ImageRecord>> {
        let mut url = self.endpoint(scope.path())?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("size", &size.to_string());
        let response = self.send(self.request(Method::GET, url.clone()), &url).await?;
        let records: PageOrList<ImageRecord> = decode_payload(response, "image listing").await?;
        Ok(records.into_items())
    }

    /// Fetch one page of search results for `query`.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] for any failure.
    pub async fn search_page(
        &self,
        query: &str,
        page: u32,
        size: u32,
    ) -> ApiResult<Vec<ImageRecord>> {
        let mut url = self.endpoint("/images/search")?;
        url.query_pairs_mut()
            .append_pair("query", query)
            .append_pair("page", &page.to_string())
            .append_pair("size", &size.to_string());
        let response = self.send(self.request(Method::GET, url.clone()), &url).await?;
        let records: PageOrList<ImageRecord> = decode_payload(response, "search results").await?;
        Ok(records.into_items())
    }

    /// Fetch one record by id.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] for any failure.
    pub async fn image(&self, id: i64) -> ApiResult<ImageRecord> {
        let url = self.endpoint(&format!("/images/{id}"))?;
        let response = self.send(self.request(Method::GET, url.clone()), &url).await?;
        decode_payload(response, "image record").await
    }

    /// Fetch the collection counters.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] for any failure.
    pub async fn stats(&self) -> ApiResult<ImageStats> {
        let url = self.endpoint("/images/stats")?;
        let response = self.send(self.request(Method::GET, url.clone()), &url).await?;
        decode_payload(response, "image stats").await
    }

    /// Toggle the favorite flag on a record.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] for any failure.
    pub async fn toggle_favorite(&self, id: i64) -> ApiResult<()> {
        self.put_flag(&format!("/images/{id}/favorite")).await
    }

    /// Toggle the archive flag on a record.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] for any failure.
    pub async fn toggle_archive(&self, id: i64) -> ApiResult<()> {
        self.put_flag(&format!("/images/{id}/archive")).await
    }

    /// Soft-delete a record into the trash.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] for any failure.
    pub async fn move_to_trash(&self, id: i64) -> ApiResult<()> {
        self.put_flag(&format!("/images/{id}/trash")).await
    }

    /// Restore a record from the trash.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] for any failure.
    pub async fn restore(&self, id: i64) -> ApiResult<()> {
        self.put_flag(&format!("/images/{id}/restore")).await
    }

    /// Permanently delete a record. Irreversible.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] for any failure.
    pub async fn delete_permanent(&self, id: i64) -> ApiResult<()> {
        let url = self.endpoint(&format!("/images/{id}/permanent"))?;
        self.send(self.request(Method::DELETE, url.clone()), &url)
            .await?;
        Ok(())
    }

    async fn put_flag(&self, path: &str) -> ApiResult<()> {
        let url = self.endpoint(path)?;
        self.send(self.request(Method::PUT, url.clone()), &url)
            .await?;
        Ok(())
    }

    /// Upload a single file through the single-upload endpoint.
    ///
    /// The body is a multipart form with one `file` field; the boundary and
    /// content type are generated by the transport, never hand-set.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] for any failure, including a
    /// local read failure.
    pub async fn upload(&self, path: &Path) -> ApiResult<SingleUploadResponse> {
        let form = Form::new().part("file", file_part(path).await?);
        let url = self.endpoint("/images/upload")?;
        let builder = self.request(Method::POST, url.clone()).multipart(form);
        let response = self.send(builder, &url).await?;
        decode_payload(response, "upload response").await
    }

    /// Upload two or more files through the batch endpoint (repeated
    /// `files` fields).
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] for any failure, including a
    /// local read failure.
    pub async fn upload_many(&self, paths: &[PathBuf]) -> ApiResult<BatchUploadResponse> {
        let mut form = Form::new();
        for path in paths {
            form = form.part("files", file_part(path).await?);
        }
        let url = self.endpoint("/images/upload-multiple")?;
        let builder = self.request(Method::POST, url.clone()).multipart(form);
        let response = self.send(builder, &url).await?;
        decode_payload(response, "batch upload response").await
    }

    /// Stream the original image to `dest`, returning the byte count.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] for any failure, including a
    /// local write failure.
    pub async fn download_to(&self, id: i64, dest: &Path) -> ApiResult<u64> {
        let url = self.endpoint(&format!("/images/{id}/download"))?;
        let response = self.send(self.request(Method::GET, url.clone()), &url).await?;

        let mut file = tokio::fs::File::create(dest).await.map_err(|err| {
            ApiError::Invalid(format!("failed to create '{}': {err}", dest.display()))
        })?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|err| connectivity(&url, &err))?;
            file.write_all(&chunk).await.map_err(|err| {
                ApiError::Invalid(format!("failed to write '{}': {err}", dest.display()))
            })?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(|err| {
            ApiError::Invalid(format!("failed to write '{}': {err}", dest.display()))
        })?;
        Ok(written)
    }

    /// Fetch a thumbnail rendition of the image.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] for any failure.
    pub async fn thumbnail(&self, id: i64, width: u32, height: u32) -> ApiResult<Vec<u8>> {
        let mut url = self.endpoint(&format!("/images/{id}/thumbnail"))?;
        url.query_pairs_mut()
            .append_pair("width", &width.to_string())
            .append_pair("height", &height.to_string());
        let response = self.send(self.request(Method::GET, url.clone()), &url).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|err| connectivity(&url, &err))?;
        Ok(bytes.to_vec())
    }
}

fn connectivity(url: &Url, err: &reqwest::Error) -> ApiError {
    ApiError::Connectivity {
        url: url.to_string(),
        reason: err.to_string(),
    }
}

/// Pull a human-readable error out of a failure body: the JSON `error` or
/// `message` field when present, else the trimmed body text.
fn server_message(bytes: &[u8]) -> Option<String> {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(bytes) {
        for key in ["error", "message"] {
            if let Some(text) = value.get(key).and_then(serde_json::Value::as_str) {
                return Some(text.to_string());
            }
        }
    }
    let text = String::from_utf8_lossy(bytes);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

async fn decode_payload<T: serde::de::DeserializeOwned>(
    response: Response,
    context: &'static str,
) -> ApiResult<T> {
    let status = response.status().as_u16();
    let bytes = response.bytes().await.map_err(|err| ApiError::Decode {
        context,
        reason: err.to_string(),
    })?;
    let body: MaybeEnveloped<T> =
        serde_json::from_slice(&bytes).map_err(|err| ApiError::Decode {
            context,
            reason: err.to_string(),
        })?;
    if let Some(message) = body.failure_message() {
        return Err(ApiError::Unexpected {
            status,
            message: message.to_string(),
        });
    }
    body.into_data().ok_or(ApiError::Decode {
        context,
        reason: "envelope carried no data".to_string(),
    })
}

async fn file_part(path: &Path) -> ApiResult<Part> {
    let bytes = tokio::fs::read(path).await.map_err(|err| {
        ApiError::Invalid(format!("failed to read '{}': {err}", path.display()))
    })?;
    let filename = path
        .file_name()
        .map_or_else(|| "upload".to_string(), |name| name.to_string_lossy().into_owned());
    let part = Part::bytes(bytes).file_name(filename);
    match content_type_for(path) {
        Some(mime) => part
            .mime_str(mime)
            .map_err(|err| ApiError::Invalid(format!("invalid content type '{mime}': {err}"))),
        None => Ok(part),
    }
}

/// Infer a content type from the file extension; the transport's
/// `application/octet-stream` default stands otherwise.
fn content_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "tif" | "tiff" => Some("image/tiff"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::MockServer;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client_for(server: &MockServer, store: CredentialStore) -> ApiClient {
        let base_url = server.base_url().parse().expect("valid base URL");
        ApiClient::new(base_url, store).expect("client should build")
    }

    fn record_json(id: i64) -> serde_json::Value {
        json!({
            "id": id,
            "filename": format!("img-{id}.jpg"),
            "storedFilename": format!("{id}-stored.jpg"),
            "originalFilename": format!("holiday-{id}.jpg"),
            "filePath": format!("/data/{id}-stored.jpg"),
            "fileSize": 1_024,
            "contentType": "image/jpeg",
            "uploadDate": "2024-03-01T09:30:00",
            "isFavorite": false,
            "isArchived": false,
            "isDeleted": false
        })
    }

    #[tokio::test]
    async fn list_page_attaches_basic_auth_header() {
        let server = MockServer::start_async().await;
        let store = CredentialStore::in_memory();
        store.install(Credential::encode("alice", "secret"));

        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/images")
                .query_param("page", "0")
                .query_param("size", "20")
                .header("authorization", "Basic YWxpY2U6c2VjcmV0");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!([record_json(1)]));
        });

        let client = client_for(&server, store);
        let records = client
            .list_page(ListScope::All, 0, 20)
            .await
            .expect("listing should succeed");
        assert_eq!(records.len(), 1);
        mock.assert();
    }

    #[tokio::test]
    async fn list_page_decodes_enveloped_page() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/images");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "success": true,
                    "data": {
                        "content": [record_json(1), record_json(2)],
                        "totalElements": 2
                    }
                }));
        });

        let client = client_for(&server, CredentialStore::in_memory());
        let records = client
            .list_page(ListScope::All, 0, 20)
            .await
            .expect("listing should succeed");
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn unauthorized_response_invalidates_credentials() {
        let server = MockServer::start_async().await;
        let store = CredentialStore::in_memory();
        store.install(Credential::encode("alice", "stale"));

        server.mock(|when, then| {
            when.method(PUT).path("/images/4/favorite");
            then.status(401);
        });

        let client = client_for(&server, store.clone());
        let err = client
            .toggle_favorite(4)
            .await
            .expect_err("401 should surface");
        assert!(err.is_unauthorized());
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn error_classification_follows_precedence() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/images/upload");
            then.status(413);
        });
        server.mock(|when, then| {
            when.method(GET).path("/images/9");
            then.status(404)
                .header("content-type", "application/json")
                .json_body(json!({"error": "Image not found with id: 9"}));
        });
        server.mock(|when, then| {
            when.method(GET).path("/images/stats");
            then.status(500).body("boom");
        });

        let dir = tempfile::tempdir().expect("tempdir");
        let payload = dir.path().join("big.jpg");
        std::fs::write(&payload, b"bytes").expect("write payload");

        let client = client_for(&server, CredentialStore::in_memory());

        assert!(matches!(
            client.upload(&payload).await,
            Err(ApiError::FileTooLarge)
        ));
        match client.image(9).await {
            Err(ApiError::Unexpected { status, message }) => {
                assert_eq!(status, 404);
                assert_eq!(message, "Image not found with id: 9");
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert!(matches!(
            client.stats().await,
            Err(ApiError::Server { status: 500 })
        ));
    }

    #[tokio::test]
    async fn connection_refused_maps_to_connectivity() {
        // Nothing listens on this port.
        let base_url: Url = "http://127.0.0.1:1".parse().expect("valid URL");
        let client =
            ApiClient::new(base_url, CredentialStore::in_memory()).expect("client should build");
        assert!(matches!(
            client.health().await,
            Err(ApiError::Connectivity { .. })
        ));
    }

    #[tokio::test]
    async fn login_probes_health_and_installs_credential() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/health")
                .header("authorization", "Basic YWxpY2U6c2VjcmV0");
            then.status(200).body("OK");
        });

        let store = CredentialStore::in_memory();
        let client = client_for(&server, store.clone());
        let credential = client
            .login("alice", "secret")
            .await
            .expect("login should succeed");
        assert_eq!(credential.username, "alice");
        assert!(store.is_authenticated());
        mock.assert();
    }

    #[tokio::test]
    async fn failed_login_leaves_store_unauthenticated() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/health");
            then.status(401);
        });

        let store = CredentialStore::in_memory();
        let client = client_for(&server, store.clone());
        let err = client
            .login("alice", "wrong")
            .await
            .expect_err("login should fail");
        assert!(err.is_unauthorized());
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn upload_sends_multipart_file_field() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/images/upload")
                .body_includes("name=\"file\"")
                .body_includes("filename=\"photo.jpg\"");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"message": "uploaded", "image": null}));
        });

        let dir = tempfile::tempdir().expect("tempdir");
        let payload = dir.path().join("photo.jpg");
        std::fs::write(&payload, b"jpeg-bytes").expect("write payload");

        let client = client_for(&server, CredentialStore::in_memory());
        let response = client.upload(&payload).await.expect("upload should succeed");
        assert_eq!(response.message.as_deref(), Some("uploaded"));
        mock.assert();
    }

    #[tokio::test]
    async fn download_streams_body_to_disk() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/images/3/download");
            then.status(200).body("raw-image-bytes");
        });

        let dir = tempfile::tempdir().expect("tempdir");
        let dest = dir.path().join("out.jpg");

        let client = client_for(&server, CredentialStore::in_memory());
        let written = client
            .download_to(3, &dest)
            .await
            .expect("download should succeed");
        assert_eq!(written, 15);
        assert_eq!(std::fs::read(&dest).expect("read dest"), b"raw-image-bytes");
    }

    #[test]
    fn content_type_inference_covers_common_extensions() {
        assert_eq!(
            content_type_for(Path::new("a.JPG")),
            Some("image/jpeg")
        );
        assert_eq!(content_type_for(Path::new("a.png")), Some("image/png"));
        assert_eq!(content_type_for(Path::new("a.bin")), None);
        assert_eq!(content_type_for(Path::new("noext")), None);
    }
}
