//! Error taxonomy shared by every overlay, layer, and store operation.

use thiserror::Error;

use crate::dir_entry::EntryKind;

/// Result type for filesystem operations.
pub type FsResult<T> = Result<T, FsError>;

/// Filesystem operation errors.
///
/// Remote fetch failures are deliberately folded into `NotFound`: the
/// overlay cannot tell an absent origin object from an unreachable one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FsError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("not a file: {0}")]
    NotAFile(String),
    #[error("not a directory: {0}")]
    NotADirectory(String),
    #[error("is a directory: {0}")]
    IsADirectory(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("conflict at {path}: local {local} shadows remote {remote}")]
    Conflict {
        path: String,
        local: EntryKind,
        remote: EntryKind,
    },
    #[error("read-only layer")]
    ReadOnly,
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    #[error("store error: {0}")]
    Store(String),
    #[error("io error: {0}")]
    Io(String),
}

impl FsError {
    /// Short stable name for the error class, used in logs.
    pub fn class(&self) -> &'static str {
        match self {
            FsError::NotFound(_) => "not_found",
            FsError::NotAFile(_) => "not_a_file",
            FsError::NotADirectory(_) => "not_a_directory",
            FsError::IsADirectory(_) => "is_a_directory",
            FsError::AlreadyExists(_) => "already_exists",
            FsError::Conflict { .. } => "conflict",
            FsError::ReadOnly => "read_only",
            FsError::InvalidPath(_) => "invalid_path",
            FsError::InvalidOperation(_) => "invalid_operation",
            FsError::Store(_) => "store",
            FsError::Io(_) => "io",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FsError::NotFound(_))
    }
}

impl From<std::io::Error> for FsError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match err.kind() {
            ErrorKind::NotFound => FsError::NotFound(err.to_string()),
            ErrorKind::AlreadyExists => FsError::AlreadyExists(err.to_string()),
            ErrorKind::IsADirectory => FsError::IsADirectory(err.to_string()),
            ErrorKind::NotADirectory => FsError::NotADirectory(err.to_string()),
            ErrorKind::ReadOnlyFilesystem => FsError::ReadOnly,
            _ => FsError::Io(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_map_to_taxonomy() {
        let err: FsError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(err.is_not_found());

        let err: FsError = std::io::Error::other("disk on fire").into();
        assert_eq!(err.class(), "io");
    }

    #[test]
    fn conflict_message_names_both_kinds() {
        let err = FsError::Conflict {
            path: "/Desktop".into(),
            local: EntryKind::File,
            remote: EntryKind::Directory,
        };
        assert_eq!(
            err.to_string(),
            "conflict at /Desktop: local file shadows remote directory"
        );
    }
}
