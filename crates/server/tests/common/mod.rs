//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process router
//! backed by a job service with mock collaborators, so jobs run end to end
//! without a model backend.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use redline_core::{
    job::InMemoryJobRegistry,
    report::DocxReportWriter,
    testing::{MockExtractor, MockTransformer},
    transformer::{Transformer, UnavailableTransformer},
    Config, JobService,
};

/// Re-export fixtures for test convenience
pub use redline_core::testing::fixtures;

const BOUNDARY: &str = "redline-test-boundary";

/// Test fixture for API testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_submit() {
///     let fixture = TestFixture::new();
///
///     let response = fixture
///         .submit(&[("essay.docx", fixtures::docx_bytes(&["Hello."]))], None)
///         .await;
///
///     assert_eq!(response.status, 202);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Shared state, for waiting on jobs
    pub state: Arc<redline_server::state::AppState>,
    /// Mock extractor - configure per-file text and failures
    pub extractor: Arc<MockExtractor>,
    /// Mock transformer - configure results, failures and delays
    pub transformer: Arc<MockTransformer>,
    /// Work directory for uploads and outputs
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
    pub bytes: Bytes,
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Create a fixture whose proofreading backend is not configured.
    pub fn unavailable() -> Self {
        Self::build(Some("LLM API key not configured"))
    }

    fn build(unavailable: Option<&str>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let mut config = Config::default();
        config.server.host = std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST);
        config.processor.work_dir = temp_dir.path().to_path_buf();

        let extractor = Arc::new(MockExtractor::new());
        let transformer = Arc::new(MockTransformer::new());
        let backend: Arc<dyn Transformer> = match unavailable {
            Some(reason) => Arc::new(UnavailableTransformer::new(reason)),
            None => Arc::clone(&transformer) as Arc<dyn Transformer>,
        };

        let service = JobService::new(
            config,
            Arc::new(InMemoryJobRegistry::new()),
            extractor.clone(),
            backend,
            Arc::new(DocxReportWriter::new()),
        );

        let state = Arc::new(redline_server::state::AppState::new(service));
        let router = redline_server::api::create_router(Arc::clone(&state));

        Self {
            router,
            state,
            extractor,
            transformer,
            temp_dir,
        }
    }

    /// Wait until the job reaches a terminal status.
    pub async fn wait_for_job(&self, job_id: &str) {
        fixtures::wait_for_terminal(self.state.service().registry().as_ref(), job_id).await;
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.send(Request::builder().method("GET").uri(path).body(Body::empty()).unwrap())
            .await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.send(
            Request::builder()
                .method("DELETE")
                .uri(path)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Submit files as a multipart form to `/api/v1/jobs`.
    pub async fn submit(&self, files: &[(&str, Vec<u8>)], role: Option<&str>) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/jobs")
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(files, role)))
            .unwrap();
        self.send(request).await
    }

    /// Submit docx files whose text names the file.
    pub async fn submit_docx(&self, names: &[&str], role: Option<&str>) -> TestResponse {
        let files: Vec<(&str, Vec<u8>)> = names
            .iter()
            .map(|name| (*name, fixtures::docx_bytes(&[*name])))
            .collect();
        self.submit(&files, role).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
            bytes,
        }
    }
}

/// Build a multipart/form-data body with a `role` field and `files` parts.
pub fn multipart_body(files: &[(&str, Vec<u8>)], role: Option<&str>) -> Vec<u8> {
    let mut body = Vec::new();

    if let Some(role) = role {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"role\"\r\n\r\n{}\r\n",
                BOUNDARY, role
            )
            .as_bytes(),
        );
    }

    for (name, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, name
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}
