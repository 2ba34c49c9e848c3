//! Execution context passed to tools.

use std::sync::Arc;

use layerfs_types::FsResult;

use super::traits::ToolSchema;
use crate::overlay::OverlayFs;
use crate::vpath::VPath;

/// Everything a tool may touch: the overlay and the working directory.
pub struct ExecContext {
    /// The merged filesystem.
    pub overlay: Arc<OverlayFs>,
    /// Current working directory. Always normalized.
    pub cwd: VPath,
    /// Previous working directory, for `cd -`.
    pub prev_cwd: Option<VPath>,
    /// Schemas of every registered tool, for `help`.
    pub tool_schemas: Vec<ToolSchema>,
}

impl ExecContext {
    /// A context rooted at `/`.
    pub fn new(overlay: Arc<OverlayFs>) -> Self {
        Self {
            overlay,
            cwd: VPath::root(),
            prev_cwd: None,
            tool_schemas: Vec::new(),
        }
    }

    pub fn set_tool_schemas(&mut self, schemas: Vec<ToolSchema>) {
        self.tool_schemas = schemas;
    }

    /// Normalize a user-supplied path against the working directory.
    pub fn resolve_path(&self, path: &str) -> FsResult<VPath> {
        VPath::normalize(path, &self.cwd)
    }

    /// Change the working directory, remembering the old one for `cd -`.
    pub fn set_cwd(&mut self, path: VPath) {
        self.prev_cwd = Some(std::mem::replace(&mut self.cwd, path));
    }

    pub fn prev_cwd(&self) -> Option<&VPath> {
        self.prev_cwd.as_ref()
    }
}
