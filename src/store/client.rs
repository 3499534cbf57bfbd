//! HTTP client wrapper for the Gemini File Search API.

use crate::config::Config;
use crate::store::{
    backend::FileSearchBackend,
    types::{
        Answer, Document, FileSearchError, GenerateContentResponse, StoreRef, UploadOperation,
    },
};
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

const API_VERSION: &str = "v1beta";
const UPLOAD_URL_HEADER: &str = "x-goog-upload-url";

/// Lightweight HTTP client for File Search operations.
pub struct FileSearchService {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) api_key: String,
}

impl FileSearchService {
    /// Construct a new client from explicit configuration.
    pub fn new(config: &Config) -> Result<Self, FileSearchError> {
        let client = Client::builder().user_agent("filesearch/0.1").build()?;

        let base_url = normalize_base_url(&config.base_url).map_err(FileSearchError::InvalidUrl)?;
        tracing::debug!(
            url = %base_url,
            has_api_key = !config.api_key.is_empty(),
            "Initialized File Search HTTP client"
        );

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.request_url(method, &format_endpoint(&self.base_url, path))
    }

    fn request_url(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("x-goog-api-key", &self.api_key)
    }

    async fn parse_json<T>(
        &self,
        response: reqwest::Response,
        context: &'static str,
    ) -> Result<T, FileSearchError>
    where
        T: DeserializeOwned,
    {
        let response = self.ensure_success(response, context).await?;
        Ok(response.json().await?)
    }

    async fn ensure_success(
        &self,
        response: reqwest::Response,
        context: &'static str,
    ) -> Result<reqwest::Response, FileSearchError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let error = FileSearchError::UnexpectedStatus { status, body };
        tracing::error!(error = %error, "{context}");
        Err(error)
    }

    async fn start_upload_session(
        &self,
        document: &Document,
        store: &StoreRef,
        display_name: Option<&str>,
    ) -> Result<String, FileSearchError> {
        let mut metadata = Map::new();
        metadata.insert("mimeType".into(), Value::String(document.mime_type.clone()));
        if let Some(name) = display_name.map(str::trim).filter(|name| !name.is_empty()) {
            metadata.insert("displayName".into(), Value::String(name.to_string()));
        }

        let response = self
            .request(
                Method::POST,
                &format!(
                    "upload/{API_VERSION}/{}:uploadToFileSearchStore",
                    store.resource_name()
                ),
            )
            .header("x-goog-upload-protocol", "resumable")
            .header("x-goog-upload-command", "start")
            .header(
                "x-goog-upload-header-content-length",
                document.bytes.len().to_string(),
            )
            .header("x-goog-upload-header-content-type", &document.mime_type)
            .json(&Value::Object(metadata))
            .send()
            .await?;

        let response = self
            .ensure_success(response, "Failed to start upload session")
            .await?;

        response
            .headers()
            .get(UPLOAD_URL_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or(FileSearchError::MissingUploadUrl)
    }
}

#[async_trait]
impl FileSearchBackend for FileSearchService {
    async fn create_store(&self, display_name: &str) -> Result<StoreRef, FileSearchError> {
        let response = self
            .request(Method::POST, &format!("{API_VERSION}/fileSearchStores"))
            .json(&json!({ "displayName": display_name }))
            .send()
            .await?;

        let store: StoreRef = self
            .parse_json(response, "Failed to create File Search store")
            .await?;
        tracing::info!(store = %store.name, display_name, "File Search store created");
        Ok(store)
    }

    async fn upload(
        &self,
        document: Document,
        store: &StoreRef,
        display_name: Option<&str>,
    ) -> Result<UploadOperation, FileSearchError> {
        let upload_url = self
            .start_upload_session(&document, store, display_name)
            .await?;
        tracing::debug!(store = %store.resource_name(), file = %document.file_name, "Upload session opened");

        let size = document.bytes.len();
        let response = self
            .request_url(Method::POST, &upload_url)
            .header("x-goog-upload-command", "upload, finalize")
            .header("x-goog-upload-offset", "0")
            .body(document.bytes)
            .send()
            .await?;

        let operation: UploadOperation = self
            .parse_json(response, "Failed to upload document")
            .await?;
        tracing::debug!(
            store = %store.resource_name(),
            operation = %operation.name,
            bytes = size,
            done = operation.done,
            "Document uploaded"
        );
        Ok(operation)
    }

    async fn get_operation(
        &self,
        operation: &UploadOperation,
    ) -> Result<UploadOperation, FileSearchError> {
        let response = self
            .request(Method::GET, &format!("{API_VERSION}/{}", operation.name))
            .send()
            .await?;

        self.parse_json(response, "Failed to fetch operation status")
            .await
    }

    async fn generate_grounded_answer(
        &self,
        prompt: &str,
        stores: &[StoreRef],
        model: &str,
    ) -> Result<Answer, FileSearchError> {
        let store_names: Vec<String> = stores.iter().map(StoreRef::resource_name).collect();
        let body = json!({
            "contents": [
                {
                    "role": "user",
                    "parts": [{ "text": prompt }]
                }
            ],
            "tools": [
                {
                    "fileSearch": { "fileSearchStoreNames": store_names }
                }
            ]
        });

        let response = self
            .request(
                Method::POST,
                &format!("{API_VERSION}/{}:generateContent", model_resource(model)),
            )
            .json(&body)
            .send()
            .await?;

        let payload: GenerateContentResponse = self
            .parse_json(response, "Grounded generation failed")
            .await?;
        Ok(payload.into_answer())
    }
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = reqwest::Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}

fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}

fn model_resource(model: &str) -> String {
    let model = model.trim();
    if model.starts_with("models/") || model.starts_with("tunedModels/") {
        model.to_string()
    } else {
        format!("models/{model}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{
        Method::{GET, POST},
        MockServer,
    };

    fn service(server: &MockServer) -> FileSearchService {
        FileSearchService {
            client: Client::builder()
                .user_agent("filesearch-test")
                .build()
                .expect("client"),
            base_url: server.base_url(),
            api_key: "test-key".into(),
        }
    }

    #[test]
    fn model_names_gain_prefix_once() {
        assert_eq!(model_resource("gemini-2.5-flash"), "models/gemini-2.5-flash");
        assert_eq!(
            model_resource("models/gemini-2.5-flash"),
            "models/gemini-2.5-flash"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let config = Config::from_lookup(|key| match key {
            "GOOGLE_API_KEY" => Some("secret".into()),
            "FILE_SEARCH_BASE_URL" => Some("not a url".into()),
            _ => None,
        })
        .expect("config");
        assert!(matches!(
            FileSearchService::new(&config),
            Err(FileSearchError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn create_store_sends_display_name() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1beta/fileSearchStores")
                    .header("x-goog-api-key", "test-key")
                    .json_body(json!({ "displayName": "my-store" }));
                then.status(200).json_body(json!({
                    "name": "fileSearchStores/my-store-123",
                    "displayName": "my-store"
                }));
            })
            .await;

        let store = service(&server)
            .create_store("my-store")
            .await
            .expect("store");

        mock.assert();
        assert_eq!(store.name, "fileSearchStores/my-store-123");
        assert_eq!(store.display_name.as_deref(), Some("my-store"));
    }

    #[tokio::test]
    async fn upload_uses_resumable_protocol() {
        let server = MockServer::start_async().await;
        let session_url = server.url("/upload-session/1");

        let start = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/upload/v1beta/fileSearchStores/docs-1:uploadToFileSearchStore")
                    .header("x-goog-api-key", "test-key")
                    .header("x-goog-upload-protocol", "resumable")
                    .header("x-goog-upload-command", "start")
                    .header("x-goog-upload-header-content-length", "11")
                    .header("x-goog-upload-header-content-type", "text/plain")
                    .json_body(json!({
                        "mimeType": "text/plain",
                        "displayName": "display-file-name"
                    }));
                then.status(200).header("x-goog-upload-url", session_url.as_str());
            })
            .await;

        let finalize = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/upload-session/1")
                    .header("x-goog-upload-command", "upload, finalize")
                    .header("x-goog-upload-offset", "0")
                    .body("hello world");
                then.status(200).json_body(json!({
                    "name": "fileSearchStores/docs-1/upload/operations/op-1"
                }));
            })
            .await;

        let document = Document {
            file_name: "sample.txt".into(),
            mime_type: "text/plain".into(),
            bytes: b"hello world".to_vec(),
        };
        let operation = service(&server)
            .upload(document, &StoreRef::named("docs-1"), Some("display-file-name"))
            .await
            .expect("operation");

        start.assert();
        finalize.assert();
        assert_eq!(operation.name, "fileSearchStores/docs-1/upload/operations/op-1");
        assert!(!operation.done);
    }

    #[tokio::test]
    async fn upload_without_session_url_fails() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/upload/v1beta/fileSearchStores/docs-1:uploadToFileSearchStore");
                then.status(200);
            })
            .await;

        let document = Document {
            file_name: "sample.txt".into(),
            mime_type: "text/plain".into(),
            bytes: b"hi".to_vec(),
        };
        let error = service(&server)
            .upload(document, &StoreRef::named("docs-1"), None)
            .await
            .expect_err("missing upload url");
        assert!(matches!(error, FileSearchError::MissingUploadUrl));
    }

    #[tokio::test]
    async fn rejected_upload_surfaces_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/upload/v1beta/fileSearchStores/missing:uploadToFileSearchStore");
                then.status(404).body("store not found");
            })
            .await;

        let document = Document {
            file_name: "sample.txt".into(),
            mime_type: "text/plain".into(),
            bytes: b"hi".to_vec(),
        };
        let error = service(&server)
            .upload(document, &StoreRef::named("missing"), None)
            .await
            .expect_err("rejected");
        match error {
            FileSearchError::UnexpectedStatus { status, body } => {
                assert_eq!(status.as_u16(), 404);
                assert_eq!(body, "store not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn get_operation_reads_status() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v1beta/fileSearchStores/docs-1/upload/operations/op-1")
                    .header("x-goog-api-key", "test-key");
                then.status(200).json_body(json!({
                    "name": "fileSearchStores/docs-1/upload/operations/op-1",
                    "done": true,
                    "response": { "documentName": "fileSearchStores/docs-1/documents/doc-1" }
                }));
            })
            .await;

        let pending = UploadOperation {
            name: "fileSearchStores/docs-1/upload/operations/op-1".into(),
            done: false,
            response: None,
            error: None,
        };
        let operation = service(&server)
            .get_operation(&pending)
            .await
            .expect("operation");

        mock.assert();
        assert!(operation.succeeded());
        assert!(operation.response.is_some());
    }

    #[tokio::test]
    async fn refetching_finished_operation_is_a_pure_read() {
        let server = MockServer::start_async().await;
        let status = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v1beta/fileSearchStores/docs-1/upload/operations/op-1");
                then.status(200).json_body(json!({
                    "name": "fileSearchStores/docs-1/upload/operations/op-1",
                    "done": true
                }));
            })
            .await;
        let writes = server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(500);
            })
            .await;

        let service = service(&server);
        let done = UploadOperation {
            name: "fileSearchStores/docs-1/upload/operations/op-1".into(),
            done: true,
            response: None,
            error: None,
        };
        let first = service.get_operation(&done).await.expect("first");
        let second = service.get_operation(&first).await.expect("second");

        status.assert_hits(2);
        writes.assert_hits(0);
        assert_eq!(first, done);
        assert_eq!(second, first);
    }

    #[tokio::test]
    async fn grounded_answer_lists_every_store() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1beta/models/gemini-2.5-flash:generateContent")
                    .json_body(json!({
                        "contents": [
                            { "role": "user", "parts": [{ "text": "What is X?" }] }
                        ],
                        "tools": [
                            {
                                "fileSearch": {
                                    "fileSearchStoreNames": [
                                        "fileSearchStores/docs-1",
                                        "fileSearchStores/docs-2"
                                    ]
                                }
                            }
                        ]
                    }));
                then.status(200).json_body(json!({
                    "candidates": [{
                        "content": { "role": "model", "parts": [{ "text": "X is a letter." }] },
                        "groundingMetadata": {
                            "groundingChunks": [
                                { "retrievedContext": { "title": "sample.txt", "text": "X is a letter." } }
                            ]
                        }
                    }]
                }));
            })
            .await;

        let answer = service(&server)
            .generate_grounded_answer(
                "What is X?",
                &[
                    StoreRef::named("docs-1"),
                    StoreRef::named("fileSearchStores/docs-2"),
                ],
                "gemini-2.5-flash",
            )
            .await
            .expect("answer");

        mock.assert();
        assert_eq!(answer.text, "X is a letter.");
        assert_eq!(answer.sources.len(), 1);
    }

    #[tokio::test]
    async fn grounded_answer_surfaces_auth_errors() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1beta/models/gemini-2.5-flash:generateContent");
                then.status(403).body("API key not valid");
            })
            .await;

        let error = service(&server)
            .generate_grounded_answer("hi", &[StoreRef::named("docs-1")], "gemini-2.5-flash")
            .await
            .expect_err("forbidden");
        assert!(matches!(
            error,
            FileSearchError::UnexpectedStatus { status, .. } if status.as_u16() == 403
        ));
    }
}
