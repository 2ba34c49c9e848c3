//! The overlay resolver.
//!
//! Two layers are merged into one namespace: a writable upper layer (the
//! local cache) over a read-only lower layer (the remote source). For any
//! path the upper layer wins; a whiteout in the upper layer hides the lower
//! entry at that path and everything below it. An opaque upper directory
//! hides every lower entry below it while staying visible itself.
//!
//! Writes always land in the upper layer. Writing a path that only exists
//! remotely makes it local from then on (copy-on-write); the lower layer is
//! never mutated.
//!
//! Every public method takes an internal `RwLock`: lookups share it, mutations
//! hold it exclusively, so composite operations such as [`OverlayFs::rename`]
//! are never observed half-applied.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use layerfs_types::{DirEntry, EntryKind, FsError, FsResult, Provenance};

use crate::index::Locator;
use crate::layer::{Layer, Metadata, Presence};
use crate::vpath::{VPath, base_name};

/// Tunables for [`OverlayFs`].
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlayOptions {
    /// Store remote bytes in the upper layer after the first read.
    pub cache_remote_reads: bool,
}

/// How a path resolves in the merged namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayEntry {
    /// Served by the writable layer.
    Local(Metadata),
    /// Served by the read-only layer.
    Remote(Metadata),
    /// Nothing visible, whether never present or deleted.
    Absent,
}

impl OverlayEntry {
    pub fn metadata(&self) -> Option<&Metadata> {
        match self {
            OverlayEntry::Local(meta) | OverlayEntry::Remote(meta) => Some(meta),
            OverlayEntry::Absent => None,
        }
    }

    pub fn kind(&self) -> Option<EntryKind> {
        self.metadata().map(|meta| meta.kind)
    }

    pub fn is_dir(&self) -> bool {
        self.kind() == Some(EntryKind::Directory)
    }

    pub fn is_file(&self) -> bool {
        self.kind() == Some(EntryKind::File)
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, OverlayEntry::Absent)
    }

    pub fn provenance(&self) -> Option<Provenance> {
        match self {
            OverlayEntry::Local(_) => Some(Provenance::Local),
            OverlayEntry::Remote(_) => Some(Provenance::Remote),
            OverlayEntry::Absent => None,
        }
    }
}

/// Metadata reported by [`OverlayFs::stat`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stat {
    pub path: VPath,
    pub kind: EntryKind,
    pub size: u64,
    pub provenance: Provenance,
    pub locator: Option<Locator>,
    pub content_type: Option<String>,
}

/// Result of [`OverlayFs::copy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyOutcome {
    Copied { destination: VPath },
    /// Directories are not copied. The call still succeeds.
    SkippedDirectory,
}

/// What the upper layer's records on a path's ancestors do to the lower layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shadow {
    /// Lower entries show through.
    Open,
    /// An opaque directory above hides the lower layer; upper entries remain.
    Opaque,
    /// A whiteout or file above hides the path in both layers.
    Hidden,
}

/// One step of a planned rename, relative to the source root.
enum Move {
    Dir(String),
    File(String, Vec<u8>),
}

/// The merged filesystem.
pub struct OverlayFs {
    lower: Arc<dyn Layer>,
    upper: Arc<dyn Layer>,
    options: OverlayOptions,
    lock: RwLock<()>,
}

impl OverlayFs {
    pub fn new(lower: Arc<dyn Layer>, upper: Arc<dyn Layer>, options: OverlayOptions) -> Self {
        Self {
            lower,
            upper,
            options,
            lock: RwLock::new(()),
        }
    }

    /// Resolve `path` to the entry currently visible there.
    pub async fn resolve(&self, path: &VPath) -> FsResult<OverlayEntry> {
        let _guard = self.lock.read().await;
        self.resolve_unlocked(path).await
    }

    /// Read a whole file.
    pub async fn read(&self, path: &VPath) -> FsResult<Vec<u8>> {
        if self.options.cache_remote_reads {
            let _guard = self.lock.write().await;
            self.read_unlocked(path).await
        } else {
            let _guard = self.lock.read().await;
            self.read_unlocked(path).await
        }
    }

    /// Create or overwrite a file. The parent directory must exist.
    pub async fn write(&self, path: &VPath, data: &[u8]) -> FsResult<()> {
        let _guard = self.lock.write().await;
        self.write_unlocked(path, data).await
    }

    /// Create a directory. The parent directory must exist.
    pub async fn mkdir(&self, path: &VPath) -> FsResult<()> {
        let _guard = self.lock.write().await;
        self.mkdir_unlocked(path).await
    }

    /// Remove a file or a whole directory subtree.
    pub async fn remove(&self, path: &VPath) -> FsResult<()> {
        let _guard = self.lock.write().await;
        self.remove_unlocked(path).await
    }

    /// Move `src` to `dst`, recursively for directories.
    pub async fn rename(&self, src: &VPath, dst: &VPath) -> FsResult<()> {
        let _guard = self.lock.write().await;
        self.rename_unlocked(src, dst).await
    }

    /// Merged listing of `dir`, ordered by name.
    pub async fn list(&self, dir: &VPath) -> FsResult<Vec<DirEntry>> {
        let _guard = self.lock.read().await;
        self.list_unlocked(dir).await
    }

    pub async fn stat(&self, path: &VPath) -> FsResult<Stat> {
        let _guard = self.lock.read().await;
        let entry = self.resolve_unlocked(path).await?;
        let (meta, provenance) = match entry {
            OverlayEntry::Local(meta) => (meta, Provenance::Local),
            OverlayEntry::Remote(meta) => (meta, Provenance::Remote),
            OverlayEntry::Absent => return Err(FsError::NotFound(path.to_string())),
        };
        Ok(Stat {
            path: path.clone(),
            kind: meta.kind,
            size: meta.size,
            provenance,
            locator: meta.locator,
            content_type: meta.content_type,
        })
    }

    pub async fn exists(&self, path: &VPath) -> bool {
        matches!(
            self.resolve(path).await,
            Ok(OverlayEntry::Local(_) | OverlayEntry::Remote(_))
        )
    }

    pub async fn is_dir(&self, path: &VPath) -> bool {
        matches!(self.resolve(path).await, Ok(entry) if entry.is_dir())
    }

    /// Copy a file into an existing directory, keeping its base name.
    ///
    /// Directory sources are skipped and reported as
    /// [`CopyOutcome::SkippedDirectory`]; nothing is created for them.
    pub async fn copy(&self, source: &VPath, dest_dir: &VPath) -> FsResult<CopyOutcome> {
        let _guard = self.lock.write().await;

        match self.resolve_unlocked(source).await? {
            OverlayEntry::Absent => return Err(FsError::NotFound(source.to_string())),
            entry if entry.is_dir() => {
                debug!(source = %source, "directory copy skipped");
                return Ok(CopyOutcome::SkippedDirectory);
            }
            _ => {}
        }

        match self.resolve_unlocked(dest_dir).await? {
            OverlayEntry::Absent => return Err(FsError::NotFound(dest_dir.to_string())),
            entry if entry.is_file() => {
                return Err(FsError::NotADirectory(dest_dir.to_string()));
            }
            _ => {}
        }

        let name = base_name(source).ok_or_else(|| FsError::InvalidPath(source.to_string()))?;
        let destination = dest_dir.join(&name)?;

        let data = self.read_unlocked(source).await?;
        self.write_unlocked(&destination, &data).await?;
        debug!(source = %source, destination = %destination, bytes = data.len(), "copied");
        Ok(CopyOutcome::Copied { destination })
    }

    /// Make every pending upper-layer write durable.
    pub async fn flush(&self) -> FsResult<()> {
        let _guard = self.lock.write().await;
        self.upper.flush().await
    }

    // ------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------

    async fn shadow_beneath(&self, path: &VPath) -> FsResult<Shadow> {
        let mut shadow = Shadow::Open;
        for ancestor in path.ancestors() {
            match self.upper.lookup(&ancestor).await? {
                Some(Presence::Whiteout) => return Ok(Shadow::Hidden),
                Some(Presence::Node(meta)) if meta.is_file() => return Ok(Shadow::Hidden),
                Some(Presence::Node(meta)) if meta.opaque => shadow = Shadow::Opaque,
                _ => {}
            }
        }
        Ok(shadow)
    }

    /// The lower entry at `path`, if the upper layer's ancestors let it through.
    async fn lower_beneath(&self, path: &VPath, shadow: Shadow) -> FsResult<Option<Metadata>> {
        if shadow != Shadow::Open {
            return Ok(None);
        }
        match self.lower.lookup(path).await? {
            Some(Presence::Node(meta)) => Ok(Some(meta)),
            _ => Ok(None),
        }
    }

    async fn resolve_unlocked(&self, path: &VPath) -> FsResult<OverlayEntry> {
        if path.is_root() {
            return Ok(match self.upper.lookup(path).await? {
                Some(Presence::Node(meta)) if meta.is_dir() => OverlayEntry::Local(meta),
                _ => OverlayEntry::Remote(Metadata::directory()),
            });
        }

        let shadow = self.shadow_beneath(path).await?;
        if shadow == Shadow::Hidden {
            return Ok(OverlayEntry::Absent);
        }

        match self.upper.lookup(path).await? {
            Some(Presence::Whiteout) => Ok(OverlayEntry::Absent),
            Some(Presence::Node(local)) => {
                if let Some(remote) = self.lower_beneath(path, shadow).await?
                    && remote.kind != local.kind
                {
                    return Err(FsError::Conflict {
                        path: path.to_string(),
                        local: local.kind,
                        remote: remote.kind,
                    });
                }
                Ok(OverlayEntry::Local(local))
            }
            None => Ok(match self.lower_beneath(path, shadow).await? {
                Some(remote) => OverlayEntry::Remote(remote),
                None => OverlayEntry::Absent,
            }),
        }
    }

    /// Resolve `dir` and require a directory.
    async fn require_dir(&self, dir: &VPath) -> FsResult<OverlayEntry> {
        match self.resolve_unlocked(dir).await? {
            OverlayEntry::Absent => Err(FsError::NotFound(dir.to_string())),
            entry if entry.is_file() => Err(FsError::NotADirectory(dir.to_string())),
            entry => Ok(entry),
        }
    }

    // ------------------------------------------------------------------
    // Unlocked operations
    // ------------------------------------------------------------------

    async fn read_unlocked(&self, path: &VPath) -> FsResult<Vec<u8>> {
        match self.resolve_unlocked(path).await? {
            OverlayEntry::Absent => Err(FsError::NotFound(path.to_string())),
            entry if entry.is_dir() => Err(FsError::NotAFile(path.to_string())),
            OverlayEntry::Local(_) => {
                debug!(path = %path, layer = self.upper.label(), "read");
                self.upper.read(path).await
            }
            OverlayEntry::Remote(_) => {
                debug!(path = %path, layer = self.lower.label(), "read");
                let data = self.lower.read(path).await?;
                if self.options.cache_remote_reads {
                    self.upper.write(path, &data).await?;
                    debug!(path = %path, bytes = data.len(), "cached remote read");
                }
                Ok(data)
            }
        }
    }

    async fn write_unlocked(&self, path: &VPath, data: &[u8]) -> FsResult<()> {
        let parent = path
            .parent()
            .ok_or_else(|| FsError::IsADirectory(path.to_string()))?;
        self.require_dir(&parent).await?;

        match self.resolve_unlocked(path).await? {
            entry if entry.is_dir() => return Err(FsError::IsADirectory(path.to_string())),
            OverlayEntry::Remote(_) => {
                debug!(path = %path, "copy-on-write over remote file");
            }
            OverlayEntry::Absent => {
                let shadow = self.shadow_beneath(path).await?;
                if let Some(remote) = self.lower_beneath(path, shadow).await?
                    && remote.is_dir()
                {
                    return Err(FsError::Conflict {
                        path: path.to_string(),
                        local: EntryKind::File,
                        remote: EntryKind::Directory,
                    });
                }
            }
            OverlayEntry::Local(_) => {}
        }

        self.copy_up_parents(path).await?;
        self.upper.write(path, data).await
    }

    async fn mkdir_unlocked(&self, path: &VPath) -> FsResult<()> {
        let Some(parent) = path.parent() else {
            return Err(FsError::AlreadyExists(path.to_string()));
        };
        self.require_dir(&parent).await?;

        if !self.resolve_unlocked(path).await?.is_absent() {
            return Err(FsError::AlreadyExists(path.to_string()));
        }

        let shadow = self.shadow_beneath(path).await?;
        let opaque = match self.lower_beneath(path, shadow).await? {
            Some(remote) if remote.is_file() => {
                return Err(FsError::Conflict {
                    path: path.to_string(),
                    local: EntryKind::Directory,
                    remote: EntryKind::File,
                });
            }
            Some(_) => true,
            None => false,
        };

        self.copy_up_parents(path).await?;
        self.upper.mkdir(path, opaque).await?;
        debug!(path = %path, opaque, "mkdir");
        Ok(())
    }

    /// Give every ancestor of `path` a directory marker in the upper layer.
    async fn copy_up_parents(&self, path: &VPath) -> FsResult<()> {
        for ancestor in path.ancestors() {
            if ancestor.is_root() {
                continue;
            }
            if self.upper.lookup(&ancestor).await?.is_none() {
                self.upper.mkdir(&ancestor, false).await?;
                debug!(path = %ancestor, "copy-up directory");
            }
        }
        Ok(())
    }

    async fn remove_unlocked(&self, path: &VPath) -> FsResult<()> {
        if path.is_root() {
            return Err(FsError::InvalidOperation("cannot remove /".to_string()));
        }
        if self.resolve_unlocked(path).await?.is_absent() {
            return Err(FsError::NotFound(path.to_string()));
        }

        let shadow = self.shadow_beneath(path).await?;
        let remote_visible = self.lower_beneath(path, shadow).await?.is_some();

        self.upper.purge(path).await?;
        if remote_visible {
            self.upper.whiteout(path).await?;
            debug!(path = %path, "whiteout");
        } else {
            debug!(path = %path, "removed local entry");
        }
        Ok(())
    }

    async fn rename_unlocked(&self, src: &VPath, dst: &VPath) -> FsResult<()> {
        if src.is_root() {
            return Err(FsError::InvalidOperation("cannot move /".to_string()));
        }
        let source = self.resolve_unlocked(src).await?;
        if source.is_absent() {
            return Err(FsError::NotFound(src.to_string()));
        }
        if src == dst {
            return Ok(());
        }
        if src.is_ancestor_of(dst) {
            return Err(FsError::InvalidOperation(format!(
                "cannot move {src} into itself"
            )));
        }

        let parent = dst
            .parent()
            .ok_or_else(|| FsError::IsADirectory(dst.to_string()))?;
        self.require_dir(&parent).await?;

        let target = self.resolve_unlocked(dst).await?;
        if target.is_dir() {
            return Err(FsError::IsADirectory(dst.to_string()));
        }
        if target.is_file() && source.is_dir() {
            return Err(FsError::AlreadyExists(dst.to_string()));
        }

        // Read everything before touching anything.
        let plan = if source.is_dir() {
            self.plan_tree(src).await?
        } else {
            vec![Move::File(String::new(), self.read_unlocked(src).await?)]
        };

        for step in plan {
            match step {
                Move::Dir(relative) => {
                    self.mkdir_unlocked(&dst.join(&relative)?).await?;
                }
                Move::File(relative, data) => {
                    self.write_unlocked(&dst.join(&relative)?, &data).await?;
                }
            }
        }
        self.remove_unlocked(src).await?;
        info!(from = %src, to = %dst, "renamed");
        Ok(())
    }

    /// Parent-first walk of a merged subtree, file contents included.
    async fn plan_tree(&self, root: &VPath) -> FsResult<Vec<Move>> {
        let mut plan = vec![Move::Dir(String::new())];
        let mut pending = vec![root.clone()];
        while let Some(dir) = pending.pop() {
            for child in self.list_unlocked(&dir).await? {
                let path = dir.join(&child.name)?;
                let relative = path.relative_to(root).unwrap_or_default().to_string();
                match child.kind {
                    EntryKind::Directory => {
                        plan.push(Move::Dir(relative));
                        pending.push(path);
                    }
                    EntryKind::File => {
                        let data = self.read_unlocked(&path).await?;
                        plan.push(Move::File(relative, data));
                    }
                }
            }
        }
        Ok(plan)
    }

    async fn list_unlocked(&self, dir: &VPath) -> FsResult<Vec<DirEntry>> {
        let entry = self.require_dir(dir).await?;

        let lower_visible = match &entry {
            OverlayEntry::Local(meta) if meta.opaque => false,
            _ => dir.is_root() || self.shadow_beneath(dir).await? == Shadow::Open,
        };

        let mut merged: BTreeMap<String, DirEntry> = BTreeMap::new();
        if lower_visible {
            for child in self.lower.list(dir).await? {
                if let Presence::Node(meta) = child.presence {
                    let entry = dir_entry(child.name.clone(), &meta, Provenance::Remote);
                    merged.insert(child.name, entry);
                }
            }
        }
        for child in self.upper.list(dir).await? {
            match child.presence {
                Presence::Whiteout => {
                    merged.remove(&child.name);
                }
                Presence::Node(meta) => {
                    let entry = dir_entry(child.name.clone(), &meta, Provenance::Local);
                    merged.insert(child.name, entry);
                }
            }
        }
        Ok(merged.into_values().collect())
    }
}

fn dir_entry(name: String, meta: &Metadata, provenance: Provenance) -> DirEntry {
    match meta.kind {
        EntryKind::Directory => DirEntry::directory(name, provenance),
        EntryKind::File => DirEntry::file(name, meta.size, provenance),
    }
}
