//! rm: Remove files and directories.

use async_trait::async_trait;

use layerfs_types::{ExecResult, FsError};

use crate::tools::{ExecContext, ParamSchema, Tool, ToolArgs, ToolSchema};
use crate::vpath::VPath;

/// Rm tool: remove paths from the overlay.
///
/// Remote entries are hidden behind a tombstone; local ones are deleted.
pub struct Rm;

#[async_trait]
impl Tool for Rm {
    fn name(&self) -> &str {
        "rm"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("rm", "Remove files and directories")
            .param(ParamSchema::required("path", "Path(s) to remove"))
            .param(
                ParamSchema::flag("-r", "Remove non-empty directories and their contents")
                    .alias("-R")
                    .alias("--recursive"),
            )
            .param(ParamSchema::flag("-f", "Ignore nonexistent paths").alias("--force"))
            .example("Remove a file", "rm /simple.txt")
            .example("Remove a directory tree", "rm -r /docs")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        if args.positional.is_empty() {
            return ExecResult::failure(1, "rm: missing path argument");
        }
        let recursive = args.has_flag(&["r", "R", "recursive"]);
        let force = args.has_flag(&["f", "force"]);

        for path in &args.positional {
            let resolved = match ctx.resolve_path(path) {
                Ok(p) => p,
                Err(e) => return ExecResult::failure(1, format!("rm: {e}")),
            };
            match remove_path(ctx, &resolved, recursive).await {
                Ok(()) => {}
                Err(FsError::NotFound(_)) if force => {}
                Err(e) => return ExecResult::failure(1, format!("rm: {e}")),
            }
        }
        ExecResult::success("")
    }
}

async fn remove_path(ctx: &ExecContext, path: &VPath, recursive: bool) -> Result<(), FsError> {
    let entry = ctx.overlay.resolve(path).await?;
    if entry.is_dir() && !recursive && !ctx.overlay.list(path).await?.is_empty() {
        return Err(FsError::InvalidOperation(format!(
            "{path}: directory not empty (use -r)"
        )));
    }
    ctx.overlay.remove(path).await
}
