//! HTTP origin: GET by path against a static file server.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, RANGE};

use super::origin::{Fetched, Origin, OriginError, slice_range};
use crate::index::{ByteRange, Locator};

/// Fetches locators relative to a base URL.
///
/// Absolute URL locators bypass the base. A ranged locator is sent as a
/// `Range` header and accepts either `206` or a full `200` body, which is
/// sliced locally. An empty range never reaches the network. Any other
/// status is an error.
#[derive(Debug, Clone)]
pub struct HttpOrigin {
    base_url: String,
    client: reqwest::Client,
}

impl HttpOrigin {
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, OriginError> {
        let base_url = base_url.into();
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| OriginError::Transport {
            target: base_url.clone(),
            message: e.to_string(),
        })?;
        Ok(Self::with_client(base_url, client))
    }

    /// Use a caller-built client (proxy, TLS and pooling settings).
    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, locator: &Locator) -> String {
        if locator.is_absolute_url() {
            return locator.target.clone();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            locator.target.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl Origin for HttpOrigin {
    fn describe(&self) -> String {
        self.base_url.clone()
    }

    async fn fetch(&self, locator: &Locator) -> Result<Fetched, OriginError> {
        if let Some(range) = locator.range
            && range.is_empty()
        {
            return Ok(Fetched {
                bytes: Vec::new(),
                content_type: None,
            });
        }

        let url = self.url_for(locator);
        let transport = |e: reqwest::Error| OriginError::Transport {
            target: url.clone(),
            message: e.to_string(),
        };

        let mut request = self.client.get(&url);
        if let Some(range) = locator.range {
            request = request.header(RANGE, format!("bytes={}-{}", range.offset, range.last_byte()));
        }
        let response = request.send().await.map_err(transport)?;

        let status = response.status();
        let partial = match status {
            StatusCode::OK => false,
            StatusCode::PARTIAL_CONTENT if locator.range.is_some() => true,
            StatusCode::NOT_FOUND => return Err(OriginError::NotFound(url)),
            other => {
                return Err(OriginError::Status {
                    target: url,
                    status: other.as_u16(),
                });
            }
        };

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(transport)?;

        let bytes = match locator.range {
            Some(range) if partial => slice_range(&body, ByteRange { offset: 0, ..range }).to_vec(),
            Some(range) => slice_range(&body, range).to_vec(),
            None => body.to_vec(),
        };
        Ok(Fetched {
            bytes,
            content_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use super::*;
    use crate::index::Index;
    use crate::layer::Layer;
    use crate::remote::RemoteSource;
    use crate::vpath::VPath;
    use layerfs_types::FsError;

    fn origin(base_url: &str) -> HttpOrigin {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        HttpOrigin::with_client(base_url, client)
    }

    /// Answer one request with a canned response; the task yields the
    /// request head it received.
    async fn serve_once(status_line: &'static str, body: &'static [u8]) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-length: {}\r\ncontent-type: text/plain\r\nconnection: close\r\n\r\n",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.write_all(body).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&head).to_lowercase()
        });
        (base_url, handle)
    }

    #[test]
    fn urls_join_base_and_target() {
        let origin = HttpOrigin::new("http://localhost:8080/", None).unwrap();
        assert_eq!(
            origin.url_for(&Locator::whole("simple.txt")),
            "http://localhost:8080/simple.txt"
        );
        assert_eq!(
            origin.url_for(&Locator::whole("/docs/a.md")),
            "http://localhost:8080/docs/a.md"
        );
        assert_eq!(
            origin.url_for(&Locator::whole("https://cdn.example/x.bin")),
            "https://cdn.example/x.bin"
        );
    }

    #[tokio::test]
    async fn ok_returns_body_and_content_type() {
        let (base, server) = serve_once("200 OK", b"hello").await;
        let fetched = origin(&base).fetch(&Locator::whole("simple.txt")).await.unwrap();
        assert_eq!(fetched.bytes, b"hello");
        assert_eq!(fetched.content_type.as_deref(), Some("text/plain"));

        let head = server.await.unwrap();
        assert!(head.starts_with("get /simple.txt "));
        assert!(!head.contains("range:"));
    }

    #[tokio::test]
    async fn ranged_request_accepts_partial_content() {
        let (base, server) = serve_once("206 Partial Content", b"hello").await;
        let fetched = origin(&base)
            .fetch(&Locator::ranged("pack.bin", 2, 5))
            .await
            .unwrap();
        assert_eq!(fetched.bytes, b"hello");
        assert!(server.await.unwrap().contains("range: bytes=2-6"));
    }

    #[tokio::test]
    async fn ranged_request_slices_a_full_body() {
        let (base, server) = serve_once("200 OK", b"xxhelloyy").await;
        let fetched = origin(&base)
            .fetch(&Locator::ranged("pack.bin", 2, 5))
            .await
            .unwrap();
        assert_eq!(fetched.bytes, b"hello");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn partial_content_without_range_is_rejected() {
        let (base, server) = serve_once("206 Partial Content", b"he").await;
        let err = origin(&base).fetch(&Locator::whole("simple.txt")).await.unwrap_err();
        assert!(matches!(err, OriginError::Status { status: 206, .. }));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn missing_object_is_not_found() {
        let (base, server) = serve_once("404 Not Found", b"").await;
        let err = origin(&base).fetch(&Locator::whole("gone.txt")).await.unwrap_err();
        assert!(matches!(err, OriginError::NotFound(_)));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn server_error_is_a_status_error() {
        let (base, server) = serve_once("500 Internal Server Error", b"boom").await;
        let err = origin(&base).fetch(&Locator::whole("simple.txt")).await.unwrap_err();
        assert!(matches!(err, OriginError::Status { status: 500, .. }));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn empty_range_skips_the_network() {
        // Nothing listens on the discard port; a request would fail.
        let fetched = origin("http://127.0.0.1:9")
            .fetch(&Locator::ranged("pack.bin", 10, 0))
            .await
            .unwrap();
        assert!(fetched.bytes.is_empty());
    }

    #[tokio::test]
    async fn failed_fetch_reads_as_not_found() {
        let (base, server) = serve_once("500 Internal Server Error", b"").await;
        let index = Index::from_json(r#"{ "/simple.txt": { "kind": "file", "size": 5 } }"#).unwrap();
        let source = RemoteSource::new(Arc::new(index), Arc::new(origin(&base)));

        let err = source.read(&VPath::parse("/simple.txt").unwrap()).await.unwrap_err();
        assert_eq!(err, FsError::NotFound("/simple.txt".into()));
        server.await.unwrap();
    }
}
