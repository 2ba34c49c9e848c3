//! The capability interface shared by the remote source and the write store.
//!
//! The overlay never talks to a concrete backend. It holds one read-only
//! `Layer` (the remote index plus origin) and one writable `Layer` (the local
//! cache) and picks between them with its shadowing rule.

use async_trait::async_trait;

use layerfs_types::{EntryKind, FsError, FsResult};

use crate::index::Locator;
use crate::vpath::VPath;

/// Metadata a layer reports for a present entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    /// File or directory.
    pub kind: EntryKind,
    /// Size in bytes (0 for directories).
    pub size: u64,
    /// Directory recreated over a deletion; hides everything below it in
    /// lower layers.
    pub opaque: bool,
    /// Where a remote file's bytes live.
    pub locator: Option<Locator>,
    /// Content type hint, if the layer knows one.
    pub content_type: Option<String>,
}

impl Metadata {
    pub fn file(size: u64) -> Self {
        Self {
            kind: EntryKind::File,
            size,
            opaque: false,
            locator: None,
            content_type: None,
        }
    }

    pub fn directory() -> Self {
        Self {
            kind: EntryKind::Directory,
            size: 0,
            opaque: false,
            locator: None,
            content_type: None,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

/// What a layer holds at a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presence {
    /// A file or directory.
    Node(Metadata),
    /// A deletion marker shadowing whatever lies beneath.
    Whiteout,
}

/// A direct child reported by `Layer::list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerChild {
    pub name: String,
    pub presence: Presence,
}

/// One layer of the overlay.
///
/// Read operations are mandatory. Mutating operations default to
/// `FsError::ReadOnly`, which is what the remote source keeps.
#[async_trait]
pub trait Layer: Send + Sync {
    /// Short name used in logs.
    fn label(&self) -> &'static str;

    /// Returns true if this layer rejects writes.
    fn read_only(&self) -> bool;

    /// What, if anything, this layer holds at `path`.
    async fn lookup(&self, path: &VPath) -> FsResult<Option<Presence>>;

    /// Read the entire contents of a file.
    async fn read(&self, path: &VPath) -> FsResult<Vec<u8>>;

    /// Direct children of `dir` held by this layer, whiteouts included.
    ///
    /// A directory this layer knows nothing about lists as empty; whether the
    /// directory exists is the overlay's decision.
    async fn list(&self, dir: &VPath) -> FsResult<Vec<LayerChild>>;

    /// Check if a path holds a file or directory.
    async fn exists(&self, path: &VPath) -> bool {
        matches!(self.lookup(path).await, Ok(Some(Presence::Node(_))))
    }

    /// Create or overwrite a file, replacing any whiteout at `path`.
    async fn write(&self, _path: &VPath, _data: &[u8]) -> FsResult<()> {
        Err(FsError::ReadOnly)
    }

    /// Record a directory marker, replacing any whiteout at `path`.
    async fn mkdir(&self, _path: &VPath, _opaque: bool) -> FsResult<()> {
        Err(FsError::ReadOnly)
    }

    /// Record a whiteout at `path`, replacing any entry there.
    async fn whiteout(&self, _path: &VPath) -> FsResult<()> {
        Err(FsError::ReadOnly)
    }

    /// Forget `path` and everything below it, whiteouts included.
    async fn purge(&self, _path: &VPath) -> FsResult<()> {
        Err(FsError::ReadOnly)
    }

    /// Make pending writes durable.
    async fn flush(&self) -> FsResult<()> {
        Ok(())
    }
}
