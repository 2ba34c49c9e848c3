//! cd: Change working directory.

use async_trait::async_trait;

use layerfs_types::ExecResult;

use crate::tools::{ExecContext, ParamSchema, Tool, ToolArgs, ToolSchema};
use crate::vpath::VPath;

/// Cd tool: change current working directory.
pub struct Cd;

#[async_trait]
impl Tool for Cd {
    fn name(&self) -> &str {
        "cd"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("cd", "Change current working directory")
            .param(ParamSchema::optional(
                "dir",
                "Directory to change to (default /, use - for previous directory)",
            ))
            .example("Enter a directory", "cd Desktop")
            .example("Go back", "cd -")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let path_arg = args.get_positional(0).unwrap_or("/");

        let resolved: VPath = if path_arg == "-" {
            match ctx.prev_cwd() {
                Some(prev) => prev.clone(),
                None => return ExecResult::failure(1, "cd: no previous directory"),
            }
        } else {
            match ctx.resolve_path(path_arg) {
                Ok(p) => p,
                Err(e) => return ExecResult::failure(1, format!("cd: {e}")),
            }
        };

        match ctx.overlay.resolve(&resolved).await {
            Ok(entry) if entry.is_dir() => {
                ctx.set_cwd(resolved.clone());
                // Like bash, `cd -` prints where it went.
                if path_arg == "-" {
                    ExecResult::success(resolved.to_string())
                } else {
                    ExecResult::success("")
                }
            }
            Ok(entry) if entry.is_file() => {
                ExecResult::failure(1, format!("cd: not a directory: {resolved}"))
            }
            Ok(_) => ExecResult::failure(1, format!("cd: not found: {resolved}")),
            Err(e) => ExecResult::failure(1, format!("cd: {e}")),
        }
    }
}
