//! stat: Show where an entry lives and what it is.

use async_trait::async_trait;

use layerfs_types::ExecResult;

use crate::tools::{ExecContext, ParamSchema, Tool, ToolArgs, ToolSchema};

/// Stat tool: kind, size and serving layer of a path.
pub struct Stat;

#[async_trait]
impl Tool for Stat {
    fn name(&self) -> &str {
        "stat"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("stat", "Show kind, size and layer of a path")
            .param(ParamSchema::required("path", "Path to inspect"))
            .example("Inspect a remote file", "stat /simple.txt")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let Some(path) = args.get_positional(0) else {
            return ExecResult::failure(1, "stat: missing path argument");
        };
        let resolved = match ctx.resolve_path(path) {
            Ok(p) => p,
            Err(e) => return ExecResult::failure(1, format!("stat: {e}")),
        };

        let stat = match ctx.overlay.stat(&resolved).await {
            Ok(stat) => stat,
            Err(e) => return ExecResult::failure(1, format!("stat: {e}")),
        };

        let mut lines = vec![
            format!("path: {}", stat.path),
            format!("kind: {}", stat.kind),
            format!("size: {}", stat.size),
            format!("layer: {}", stat.provenance),
        ];
        if let Some(locator) = &stat.locator {
            lines.push(format!("locator: {locator}"));
        }
        if let Some(content_type) = &stat.content_type {
            lines.push(format!("type: {content_type}"));
        }
        ExecResult::success(lines.join("\n"))
    }
}
