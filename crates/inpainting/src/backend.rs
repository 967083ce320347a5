//! Client for the remote AI inpainting service.
//!
//! The service consumes `{image, mask, positive_prompt, negative_prompt}`
//! as JSON and returns `{image}` on success or a non-2xx status with an
//! optional `{detail}` reason. The trait seam exists so the orchestrator
//! can be exercised without a network.

use async_trait::async_trait;
use inpaint_common::{InpaintRequest, InpaintResponse};
use tracing::{debug, warn};

use crate::error::{InpaintError, Result};

/// Path of the inpainting endpoint, relative to the configured base URL.
pub const IMAGE_MASK_ENDPOINT: &str = "/api/image-mask";

#[async_trait]
pub trait InpaintBackend: Send + Sync {
    async fn inpaint(&self, request: &InpaintRequest) -> Result<InpaintResponse>;

    /// The backend's configured base URL, for user-facing status text.
    fn api_url(&self) -> &str;
}

/// HTTP implementation posting to `{api_url}/api/image-mask`.
pub struct HttpBackend {
    client: reqwest::Client,
    api_url: String,
}

impl HttpBackend {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    /// Use a caller-configured client, e.g. one carrying a request timeout.
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_owned();
        Self { client, api_url }
    }

    fn endpoint(&self) -> String {
        format!("{}{IMAGE_MASK_ENDPOINT}", self.api_url)
    }
}

#[async_trait]
impl InpaintBackend for HttpBackend {
    async fn inpaint(&self, request: &InpaintRequest) -> Result<InpaintResponse> {
        let url = self.endpoint();
        debug!(%url, "posting inpaint request");

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| InpaintError::BackendUnreachable(e.to_string()))?;

        let status = response.status();
        // A failure body may be valid JSON with a `detail`, or anything at
        // all; decode failures on either path fall back to the generic
        // backend error.
        let body = response.json::<InpaintResponse>().await.ok();

        if !status.is_success() {
            warn!(status = status.as_u16(), "backend rejected inpaint request");
            return Err(match body.and_then(|b| b.detail) {
                Some(detail) if !detail.is_empty() => InpaintError::BackendRejected(detail),
                _ => InpaintError::BackendError,
            });
        }

        body.ok_or(InpaintError::BackendError)
    }

    fn api_url(&self) -> &str {
        &self.api_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inpaint_common::ImagePayload;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn request() -> InpaintRequest {
        InpaintRequest {
            image: ImagePayload::from_png_bytes(&[1]),
            mask: ImagePayload::from_png_bytes(&[2]),
            positive_prompt: Some("a red door".to_owned()),
            negative_prompt: None,
        }
    }

    /// Serve exactly one canned HTTP response, returning the request bytes.
    async fn one_shot_server(status_line: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Should bind");
        let addr = listener.local_addr().expect("Should have an address");

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.expect("Should accept");
            let mut received = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = stream.read(&mut chunk).await.expect("Should read");
                received.extend_from_slice(&chunk[..n]);
                // The request is finished once the JSON body is complete;
                // a naive end-of-headers + content check suffices here.
                if let Some(headers_end) = find_headers_end(&received) {
                    let expected = content_length(&received[..headers_end]);
                    if received.len() >= headers_end + expected {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream
                .write_all(response.as_bytes())
                .await
                .expect("Should respond");
            stream.shutdown().await.ok();
            String::from_utf8_lossy(&received).into_owned()
        });

        (format!("http://{addr}"), handle)
    }

    fn find_headers_end(bytes: &[u8]) -> Option<usize> {
        bytes
            .windows(4)
            .position(|w| w == b"\r\n\r\n")
            .map(|i| i + 4)
    }

    fn content_length(headers: &[u8]) -> usize {
        String::from_utf8_lossy(headers)
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                if name.eq_ignore_ascii_case("content-length") {
                    value.trim().parse().ok()
                } else {
                    None
                }
            })
            .unwrap_or(0)
    }

    #[tokio::test]
    async fn test_success_response() {
        let (api_url, server) =
            one_shot_server("200 OK", r#"{"image":"iVBORw0KGgo="}"#).await;
        let backend = HttpBackend::new(api_url);

        let response = backend.inpaint(&request()).await.expect("Should succeed");
        assert_eq!(response.image.as_deref(), Some("iVBORw0KGgo="));

        let received = server.await.expect("Should join");
        assert!(received.starts_with("POST /api/image-mask"));
        assert!(received.contains(r#""positive_prompt":"a red door""#));
        // Absent prompts are omitted, not sent as null.
        assert!(!received.contains("negative_prompt"));
    }

    #[tokio::test]
    async fn test_rejection_surfaces_detail() {
        let (api_url, server) = one_shot_server(
            "500 Internal Server Error",
            r#"{"detail":"model overloaded"}"#,
        )
        .await;
        let backend = HttpBackend::new(api_url);

        let err = backend.inpaint(&request()).await.expect_err("Should fail");
        assert!(matches!(err, InpaintError::BackendRejected(ref d) if d == "model overloaded"));
        assert_eq!(err.to_string(), "model overloaded");
        server.await.expect("Should join");
    }

    #[tokio::test]
    async fn test_rejection_without_detail_is_generic() {
        let (api_url, server) = one_shot_server("502 Bad Gateway", "oops").await;
        let backend = HttpBackend::new(api_url);

        let err = backend.inpaint(&request()).await.expect_err("Should fail");
        assert!(matches!(err, InpaintError::BackendError));
        server.await.expect("Should join");
    }

    #[tokio::test]
    async fn test_unreachable_backend() {
        // Reserved TEST-NET-1 address; nothing listens there.
        let backend = HttpBackend::with_client(
            reqwest::Client::builder()
                .timeout(std::time::Duration::from_millis(500))
                .build()
                .expect("Should build client"),
            "http://192.0.2.1:9",
        );
        let err = backend.inpaint(&request()).await.expect_err("Should fail");
        assert!(matches!(err, InpaintError::BackendUnreachable(_)));
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let backend = HttpBackend::new("http://localhost:8000/");
        assert_eq!(backend.endpoint(), "http://localhost:8000/api/image-mask");
    }
}
