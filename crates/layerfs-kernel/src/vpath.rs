//! Normalized virtual paths.
//!
//! Every path handed to a layer or to the overlay is a `VPath`: absolute,
//! a single leading `/`, no `.` or `..` segments, no repeated separators, and
//! no trailing separator except for the root itself. Construction is the only
//! place normalization happens, so lookups can compare strings directly.

use std::fmt;

use layerfs_types::{FsError, FsResult};

/// A normalized absolute path in the overlay namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VPath(String);

impl VPath {
    /// The root directory `/`.
    pub fn root() -> Self {
        VPath("/".to_string())
    }

    /// Normalize `path` against `cwd`.
    ///
    /// Relative paths are joined to `cwd`; `.` segments and repeated
    /// separators are dropped; `..` pops a segment and is a no-op at the root.
    /// An empty path resolves to `cwd`.
    pub fn normalize(path: &str, cwd: &VPath) -> FsResult<VPath> {
        if path.contains('\0') {
            return Err(FsError::InvalidPath(path.replace('\0', "\\0")));
        }

        let mut segments: Vec<&str> = if path.starts_with('/') {
            Vec::new()
        } else {
            cwd.segments().collect()
        };

        for segment in path.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                name => segments.push(name),
            }
        }

        Ok(Self::from_segments(&segments))
    }

    /// Normalize a path relative to the root.
    pub fn parse(path: &str) -> FsResult<VPath> {
        Self::normalize(path, &Self::root())
    }

    fn from_segments(segments: &[&str]) -> VPath {
        if segments.is_empty() {
            Self::root()
        } else {
            VPath(format!("/{}", segments.join("/")))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Path segments from the root down, empty for `/`.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// The parent directory, or `None` for the root.
    pub fn parent(&self) -> Option<VPath> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(0) => Some(Self::root()),
            Some(idx) => Some(VPath(self.0[..idx].to_string())),
            None => None,
        }
    }

    /// The final segment, or `None` for the root.
    pub fn file_name(&self) -> Option<&str> {
        if self.is_root() {
            return None;
        }
        self.0.rsplit('/').next()
    }

    /// Join a relative path onto this one and normalize the result.
    pub fn join(&self, relative: &str) -> FsResult<VPath> {
        let relative = relative.trim_start_matches('/');
        Self::normalize(relative, self)
    }

    /// Strict ancestors from the root down to the parent.
    pub fn ancestors(&self) -> Vec<VPath> {
        let segments: Vec<&str> = self.segments().collect();
        (0..segments.len())
            .map(|n| Self::from_segments(&segments[..n]))
            .collect()
    }

    /// True if `self` is a strict ancestor of `other`.
    pub fn is_ancestor_of(&self, other: &VPath) -> bool {
        if self == other {
            return false;
        }
        other.0.starts_with(&self.child_prefix())
    }

    /// The string every descendant path starts with.
    pub fn child_prefix(&self) -> String {
        if self.is_root() {
            "/".to_string()
        } else {
            format!("{}/", self.0)
        }
    }

    /// True if `other` is a direct child of this directory.
    pub fn is_parent_of(&self, other: &VPath) -> bool {
        other.parent().as_ref() == Some(self)
    }

    /// This path relative to `ancestor`, without a leading `/`.
    pub fn relative_to(&self, ancestor: &VPath) -> Option<&str> {
        if self == ancestor {
            return Some("");
        }
        self.0.strip_prefix(&ancestor.child_prefix())
    }
}

impl fmt::Display for VPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Base name of a path, stem and extension rejoined.
///
/// `/docs/report.final.txt` yields `report.final.txt`; a dotfile such as
/// `/.profile` keeps its leading dot and has no extension.
pub fn base_name(path: &VPath) -> Option<String> {
    let name = path.file_name()?;
    let (stem, extension) = split_extension(name);
    Some(format!("{stem}{extension}"))
}

/// Split a file name into stem and extension (extension includes the dot).
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(0) | None => (name, ""),
        Some(idx) => name.split_at(idx),
    }
}
