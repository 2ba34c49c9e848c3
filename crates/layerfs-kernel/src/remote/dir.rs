//! A local directory standing in for a network origin.

use std::io::SeekFrom;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use super::origin::{Fetched, Origin, OriginError, guess_content_type};
use crate::index::Locator;

/// Serves locators as paths relative to a root directory.
#[derive(Debug, Clone)]
pub struct DirOrigin {
    root: PathBuf,
}

impl DirOrigin {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a locator target onto the root, refusing anything that escapes it.
    fn resolve(&self, target: &str) -> Result<PathBuf, OriginError> {
        let relative = Path::new(target.trim_start_matches('/'));
        let mut resolved = self.root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(segment) => resolved.push(segment),
                Component::CurDir => {}
                _ => return Err(OriginError::InvalidLocator(target.to_string())),
            }
        }
        Ok(resolved)
    }
}

#[async_trait]
impl Origin for DirOrigin {
    fn describe(&self) -> String {
        format!("dir:{}", self.root.display())
    }

    async fn fetch(&self, locator: &Locator) -> Result<Fetched, OriginError> {
        if locator.is_absolute_url() {
            return Err(OriginError::InvalidLocator(locator.target.clone()));
        }
        let path = self.resolve(&locator.target)?;
        let io_err = |source: std::io::Error| {
            if source.kind() == std::io::ErrorKind::NotFound {
                OriginError::NotFound(locator.target.clone())
            } else {
                OriginError::Io {
                    target: locator.target.clone(),
                    source,
                }
            }
        };

        let bytes = match locator.range {
            None => tokio::fs::read(&path).await.map_err(io_err)?,
            Some(range) => {
                let mut file = tokio::fs::File::open(&path).await.map_err(io_err)?;
                let available = file
                    .metadata()
                    .await
                    .map_err(io_err)?
                    .len()
                    .saturating_sub(range.offset);
                file.seek(SeekFrom::Start(range.offset))
                    .await
                    .map_err(io_err)?;
                let capacity = usize::try_from(range.length.min(available)).unwrap_or(0);
                let mut bytes = Vec::with_capacity(capacity);
                file.take(range.length)
                    .read_to_end(&mut bytes)
                    .await
                    .map_err(io_err)?;
                bytes
            }
        };

        let content_type = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(guess_content_type)
            .map(str::to_string);
        Ok(Fetched {
            bytes,
            content_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn oversized_range_reads_what_exists() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("pack.bin"), b"xxhello").expect("write");
        let origin = DirOrigin::new(dir.path());

        let fetched = origin
            .fetch(&Locator::ranged("pack.bin", 2, u64::MAX - 2))
            .await
            .unwrap();
        assert_eq!(fetched.bytes, b"hello");

        let past_end = origin
            .fetch(&Locator::ranged("pack.bin", 100, 5))
            .await
            .unwrap();
        assert!(past_end.bytes.is_empty());
    }

    #[tokio::test]
    async fn fetches_whole_and_ranged() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("simple.txt"), b"hello").expect("write");
        std::fs::write(dir.path().join("pack.bin"), b"xxhelloyy").expect("write");
        let origin = DirOrigin::new(dir.path());

        let whole = origin.fetch(&Locator::whole("simple.txt")).await.unwrap();
        assert_eq!(whole.bytes, b"hello");
        assert_eq!(whole.content_type.as_deref(), Some("text/plain"));

        let ranged = origin
            .fetch(&Locator::ranged("pack.bin", 2, 5))
            .await
            .unwrap();
        assert_eq!(ranged.bytes, b"hello");
    }

    #[tokio::test]
    async fn missing_and_escaping_targets_fail() {
        let dir = tempfile::tempdir().expect("tempdir");
        let origin = DirOrigin::new(dir.path());

        let missing = origin.fetch(&Locator::whole("nope.txt")).await.unwrap_err();
        assert!(matches!(missing, OriginError::NotFound(_)));

        let escape = origin
            .fetch(&Locator::whole("../etc/passwd"))
            .await
            .unwrap_err();
        assert!(matches!(escape, OriginError::InvalidLocator(_)));
    }
}
