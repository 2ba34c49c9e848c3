//! The remote index: an immutable map from path to remote metadata.
//!
//! Built once at startup from a JSON manifest. Two layouts are accepted:
//!
//! ```json
//! { "/simple.txt": { "kind": "file", "size": 5, "locator": "simple.txt" } }
//! ```
//!
//! ```json
//! { "version": 1, "entries": { "/Desktop": { "kind": "directory" } } }
//! ```
//!
//! A locator is either a string (origin-relative path or absolute URL) or a
//! byte range `{ "path": "blob.bin", "offset": 128, "length": 5 }`. Missing
//! locators default to the entry path without its leading `/`. Missing
//! ancestor directories are synthesized, and the root is always a directory.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use layerfs_types::EntryKind;

use crate::vpath::VPath;

/// Errors raised while loading a manifest. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("reading manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing manifest: {0}")]
    Json(#[from] serde_json::Error),
    #[error("manifest must be a JSON object")]
    NotAnObject,
    #[error("unsupported manifest version {0}")]
    UnsupportedVersion(u64),
    #[error("invalid path in manifest: {0:?}")]
    InvalidPath(String),
    #[error("manifest declares {0} more than once")]
    Duplicate(String),
    #[error("manifest declares file {file} as an ancestor of {child}")]
    FileAncestor { file: String, child: String },
    #[error("manifest declares the root as a file")]
    RootIsFile,
    #[error("{path}: ranged locator length {length} does not match size {size}")]
    RangeSizeMismatch { path: String, length: u64, size: u64 },
    #[error("{path}: ranged locator offset {offset} plus length {length} overflows")]
    RangeOverflow { path: String, offset: u64, length: u64 },
}

/// A contiguous slice of an origin object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub offset: u64,
    pub length: u64,
}

impl ByteRange {
    /// Exclusive end offset.
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.length)
    }

    /// Inclusive end offset, as used in an HTTP `Range` header.
    pub fn last_byte(&self) -> u64 {
        self.end().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

/// Tells an origin how to fetch a file's bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    /// Origin-relative path or absolute URL.
    pub target: String,
    /// Slice of the target holding the file, or the whole target if `None`.
    pub range: Option<ByteRange>,
}

impl Locator {
    pub fn whole(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            range: None,
        }
    }

    pub fn ranged(target: impl Into<String>, offset: u64, length: u64) -> Self {
        Self {
            target: target.into(),
            range: Some(ByteRange { offset, length }),
        }
    }

    /// True if the target is an absolute URL rather than an origin path.
    pub fn is_absolute_url(&self) -> bool {
        self.target.starts_with("http://") || self.target.starts_with("https://")
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.range {
            Some(range) => write!(
                f,
                "{}[{}..{}]",
                self.target,
                range.offset,
                range.end()
            ),
            None => f.write_str(&self.target),
        }
    }
}

/// One entry of the remote index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub path: VPath,
    pub kind: EntryKind,
    pub size: u64,
    pub locator: Locator,
}

impl IndexEntry {
    fn synthesized_directory(path: VPath) -> Self {
        let locator = Locator::whole(path.as_str().trim_start_matches('/'));
        Self {
            path,
            kind: EntryKind::Directory,
            size: 0,
            locator,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ManifestKind {
    File,
    #[serde(alias = "dir")]
    Directory,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ManifestLocator {
    Target(String),
    Range {
        path: String,
        offset: u64,
        length: u64,
    },
}

#[derive(Debug, Deserialize)]
struct ManifestRecord {
    kind: ManifestKind,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    locator: Option<ManifestLocator>,
}

/// Highest manifest version this loader understands.
const MANIFEST_VERSION: u64 = 1;

/// Immutable path → metadata map for the remote side of the overlay.
#[derive(Debug, Clone)]
pub struct Index {
    entries: BTreeMap<VPath, IndexEntry>,
}

impl Index {
    /// An index holding only the root directory.
    pub fn empty() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(
            VPath::root(),
            IndexEntry::synthesized_directory(VPath::root()),
        );
        Self { entries }
    }

    /// Load and validate a manifest file.
    pub async fn load(path: &Path) -> Result<Self, IndexError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| IndexError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_json(&text)
    }

    /// Parse and validate a manifest document.
    pub fn from_json(text: &str) -> Result<Self, IndexError> {
        let doc: serde_json::Value = serde_json::from_str(text)?;
        let serde_json::Value::Object(mut object) = doc else {
            return Err(IndexError::NotAnObject);
        };

        let raw = match object.get("entries") {
            Some(serde_json::Value::Object(_)) => {
                if let Some(version) = object.get("version").and_then(|v| v.as_u64())
                    && version > MANIFEST_VERSION
                {
                    return Err(IndexError::UnsupportedVersion(version));
                }
                object
                    .remove("entries")
                    .unwrap_or(serde_json::Value::Null)
            }
            _ => serde_json::Value::Object(object),
        };
        let records: BTreeMap<String, ManifestRecord> = serde_json::from_value(raw)?;

        let mut index = Self::empty();
        for (key, record) in records {
            let path = parse_key(&key)?;
            let entry = build_entry(path, record)?;
            index.insert_declared(&key, entry)?;
        }
        index.synthesize_ancestors()?;
        Ok(index)
    }

    fn insert_declared(&mut self, key: &str, entry: IndexEntry) -> Result<(), IndexError> {
        if entry.path.is_root() {
            if entry.kind == EntryKind::File {
                return Err(IndexError::RootIsFile);
            }
            // The synthesized root is replaced by the declared one.
            self.entries.insert(entry.path.clone(), entry);
            return Ok(());
        }
        if self.entries.contains_key(&entry.path) {
            return Err(IndexError::Duplicate(key.to_string()));
        }
        self.entries.insert(entry.path.clone(), entry);
        Ok(())
    }

    fn synthesize_ancestors(&mut self) -> Result<(), IndexError> {
        let declared: Vec<VPath> = self.entries.keys().cloned().collect();
        for path in declared {
            for ancestor in path.ancestors() {
                match self.entries.get(&ancestor) {
                    Some(existing) if existing.kind == EntryKind::File => {
                        return Err(IndexError::FileAncestor {
                            file: ancestor.to_string(),
                            child: path.to_string(),
                        });
                    }
                    Some(_) => {}
                    None => {
                        self.entries.insert(
                            ancestor.clone(),
                            IndexEntry::synthesized_directory(ancestor),
                        );
                    }
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, path: &VPath) -> Option<&IndexEntry> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &VPath) -> bool {
        self.entries.contains_key(path)
    }

    /// Direct children of `dir`, ordered by path.
    pub fn children(&self, dir: &VPath) -> Vec<&IndexEntry> {
        self.entries
            .range(dir.clone()..)
            .map(|(_, entry)| entry)
            .filter(|entry| dir.is_parent_of(&entry.path))
            .collect()
    }

    /// Number of entries, the root included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }
}

fn parse_key(key: &str) -> Result<VPath, IndexError> {
    if key.trim().is_empty() {
        return Err(IndexError::InvalidPath(key.to_string()));
    }
    VPath::parse(key).map_err(|_| IndexError::InvalidPath(key.to_string()))
}

fn build_entry(path: VPath, record: ManifestRecord) -> Result<IndexEntry, IndexError> {
    let kind = match record.kind {
        ManifestKind::File => EntryKind::File,
        ManifestKind::Directory => EntryKind::Directory,
    };
    let locator = match record.locator {
        Some(ManifestLocator::Target(target)) => Locator::whole(target),
        Some(ManifestLocator::Range {
            path: target,
            offset,
            length,
        }) => {
            if offset.checked_add(length).is_none() {
                return Err(IndexError::RangeOverflow {
                    path: path.to_string(),
                    offset,
                    length,
                });
            }
            if kind == EntryKind::File && length != record.size {
                return Err(IndexError::RangeSizeMismatch {
                    path: path.to_string(),
                    length,
                    size: record.size,
                });
            }
            Locator::ranged(target, offset, length)
        }
        None => Locator::whole(path.as_str().trim_start_matches('/')),
    };
    let size = match kind {
        EntryKind::File => record.size,
        EntryKind::Directory => 0,
    };
    Ok(IndexEntry {
        path,
        kind,
        size,
        locator,
    })
}
