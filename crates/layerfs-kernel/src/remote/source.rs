//! The remote read source: Index metadata plus origin bytes.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use layerfs_types::{EntryKind, FsError, FsResult};

use super::origin::{Origin, guess_content_type};
use crate::index::{Index, IndexEntry};
use crate::layer::{Layer, LayerChild, Metadata, Presence};
use crate::vpath::VPath;

/// Read-only layer answering from an immutable [`Index`] and fetching file
/// bytes from an [`Origin`].
pub struct RemoteSource {
    index: Arc<Index>,
    origin: Arc<dyn Origin>,
}

impl RemoteSource {
    pub fn new(index: Arc<Index>, origin: Arc<dyn Origin>) -> Self {
        Self { index, origin }
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn origin(&self) -> &dyn Origin {
        self.origin.as_ref()
    }
}

fn metadata_for(entry: &IndexEntry) -> Metadata {
    match entry.kind {
        EntryKind::Directory => Metadata::directory(),
        EntryKind::File => Metadata {
            locator: Some(entry.locator.clone()),
            content_type: entry
                .path
                .file_name()
                .and_then(guess_content_type)
                .map(str::to_string),
            ..Metadata::file(entry.size)
        },
    }
}

#[async_trait]
impl Layer for RemoteSource {
    fn label(&self) -> &'static str {
        "remote"
    }

    fn read_only(&self) -> bool {
        true
    }

    async fn lookup(&self, path: &VPath) -> FsResult<Option<Presence>> {
        Ok(self
            .index
            .get(path)
            .map(|entry| Presence::Node(metadata_for(entry))))
    }

    async fn read(&self, path: &VPath) -> FsResult<Vec<u8>> {
        let entry = self
            .index
            .get(path)
            .ok_or_else(|| FsError::NotFound(path.to_string()))?;
        if entry.kind == EntryKind::Directory {
            return Err(FsError::NotAFile(path.to_string()));
        }

        debug!(path = %path, locator = %entry.locator, origin = %self.origin.describe(), "remote fetch");
        let fetched = match self.origin.fetch(&entry.locator).await {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!(path = %path, error = %e, "remote fetch failed");
                return Err(FsError::NotFound(path.to_string()));
            }
        };

        if fetched.bytes.len() as u64 != entry.size {
            warn!(
                path = %path,
                expected = entry.size,
                actual = fetched.bytes.len(),
                "remote size differs from index"
            );
        }
        Ok(fetched.bytes)
    }

    async fn list(&self, dir: &VPath) -> FsResult<Vec<LayerChild>> {
        Ok(self
            .index
            .children(dir)
            .into_iter()
            .filter_map(|entry| {
                entry.path.file_name().map(|name| LayerChild {
                    name: name.to_string(),
                    presence: Presence::Node(metadata_for(entry)),
                })
            })
            .collect())
    }
}
