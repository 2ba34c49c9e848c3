//! The origin capability: fetch bytes by locator.

use async_trait::async_trait;
use thiserror::Error;

use crate::index::{ByteRange, Locator};
use crate::vpath::split_extension;

/// Why an origin could not produce bytes.
///
/// The overlay reports every one of these to its callers as
/// `FsError::NotFound`; the detail only reaches the log.
#[derive(Debug, Error)]
pub enum OriginError {
    #[error("{0} not found at origin")]
    NotFound(String),
    #[error("origin returned status {status} for {target}")]
    Status { target: String, status: u16 },
    #[error("origin request for {target} failed: {message}")]
    Transport { target: String, message: String },
    #[error("origin i/o for {target}: {source}")]
    Io {
        target: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid locator {0}")]
    InvalidLocator(String),
}

/// Bytes returned by an origin, with the content type it reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// A byte-addressable remote read source.
#[async_trait]
pub trait Origin: Send + Sync {
    /// Short description used in logs (`dir:/srv/site`, `http://...`).
    fn describe(&self) -> String;

    /// Fetch the bytes a locator points at.
    async fn fetch(&self, locator: &Locator) -> Result<Fetched, OriginError>;
}

/// The part of `data` a byte range covers, clamped to what exists.
pub fn slice_range(data: &[u8], range: ByteRange) -> &[u8] {
    let start = usize::try_from(range.offset).unwrap_or(usize::MAX).min(data.len());
    let length = usize::try_from(range.length).unwrap_or(usize::MAX);
    let end = start.saturating_add(length).min(data.len());
    &data[start..end]
}

/// Content type hint from a file name's extension.
pub fn guess_content_type(name: &str) -> Option<&'static str> {
    let (_, extension) = split_extension(name);
    let content_type = match extension.to_ascii_lowercase().as_str() {
        ".txt" | ".log" => "text/plain",
        ".md" => "text/markdown",
        ".html" | ".htm" => "text/html",
        ".css" => "text/css",
        ".js" | ".mjs" => "text/javascript",
        ".json" => "application/json",
        ".toml" => "application/toml",
        ".xml" => "application/xml",
        ".csv" => "text/csv",
        ".png" => "image/png",
        ".jpg" | ".jpeg" => "image/jpeg",
        ".gif" => "image/gif",
        ".svg" => "image/svg+xml",
        ".pdf" => "application/pdf",
        ".wasm" => "application/wasm",
        ".zip" => "application/zip",
        ".bin" => "application/octet-stream",
        _ => return None,
    };
    Some(content_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("simple.txt", Some("text/plain"))]
    #[case("README.MD", Some("text/markdown"))]
    #[case("archive.tar.zip", Some("application/zip"))]
    #[case(".profile", None)]
    #[case("Makefile", None)]
    fn guesses_from_extension(#[case] name: &str, #[case] expected: Option<&str>) {
        assert_eq!(guess_content_type(name), expected);
    }

    #[rstest]
    #[case(2, 5, b"hello".as_slice())]
    #[case(2, 100, b"helloyy".as_slice())]
    #[case(0, 0, b"".as_slice())]
    #[case(50, 5, b"".as_slice())]
    #[case(u64::MAX, u64::MAX, b"".as_slice())]
    #[case(4, u64::MAX, b"lloyy".as_slice())]
    fn slices_clamp_to_data(#[case] offset: u64, #[case] length: u64, #[case] expected: &[u8]) {
        assert_eq!(slice_range(b"xxhelloyy", ByteRange { offset, length }), expected);
    }
}
