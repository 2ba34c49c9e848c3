//! mv: Move or rename files and directories.

use async_trait::async_trait;

use layerfs_types::ExecResult;

use crate::tools::{ExecContext, ParamSchema, Tool, ToolArgs, ToolSchema};
use crate::vpath::base_name;

/// Mv tool: rename within the overlay, recursively for directories.
pub struct Mv;

#[async_trait]
impl Tool for Mv {
    fn name(&self) -> &str {
        "mv"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("mv", "Move or rename files and directories")
            .param(ParamSchema::required("source", "Path to move"))
            .param(ParamSchema::required("dest", "New path, or an existing directory to move into"))
            .example("Rename a file", "mv notes.txt todo.txt")
            .example("Move into a directory", "mv /simple.txt /Documents")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let (Some(source), Some(dest), None) = (
            args.get_positional(0),
            args.get_positional(1),
            args.get_positional(2),
        ) else {
            return ExecResult::failure(1, "mv: usage: mv <source> <dest>");
        };

        let (source, mut dest) = match (ctx.resolve_path(source), ctx.resolve_path(dest)) {
            (Ok(s), Ok(d)) => (s, d),
            (Err(e), _) | (_, Err(e)) => return ExecResult::failure(1, format!("mv: {e}")),
        };

        // Moving onto an existing directory means moving into it.
        if ctx.overlay.is_dir(&dest).await {
            let Some(name) = base_name(&source) else {
                return ExecResult::failure(1, "mv: cannot move /");
            };
            dest = match dest.join(&name) {
                Ok(d) => d,
                Err(e) => return ExecResult::failure(1, format!("mv: {e}")),
            };
        }

        match ctx.overlay.rename(&source, &dest).await {
            Ok(()) => ExecResult::success(""),
            Err(e) => ExecResult::failure(1, format!("mv: {e}")),
        }
    }
}
