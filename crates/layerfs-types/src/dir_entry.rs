//! Directory entry types for layer and overlay operations.

use std::fmt;

/// Kind of entry in the merged namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::File => "file",
            EntryKind::Directory => "directory",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of the overlay an entry is served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provenance {
    /// Held in the writable local store.
    Local,
    /// Described by the remote index and fetched from the origin.
    Remote,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::Local => "local",
            Provenance::Remote => "remote",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directory entry as produced by an overlay listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Name of the entry (not full path).
    pub name: String,
    /// Kind of entry.
    pub kind: EntryKind,
    /// Size in bytes (0 for directories).
    pub size: u64,
    /// Layer the entry is served from.
    pub provenance: Provenance,
}

impl DirEntry {
    /// Create a new directory entry.
    pub fn directory(name: impl Into<String>, provenance: Provenance) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
            size: 0,
            provenance,
        }
    }

    /// Create a new file entry.
    pub fn file(name: impl Into<String>, size: u64, provenance: Provenance) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
            size,
            provenance,
        }
    }

    /// Returns true if this entry is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Returns true if this entry is a regular file.
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}
