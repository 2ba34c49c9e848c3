//! cat: Print file contents.

use async_trait::async_trait;

use layerfs_types::ExecResult;

use crate::tools::{ExecContext, ParamSchema, Tool, ToolArgs, ToolSchema};

/// Cat tool: print one or more files, in order.
pub struct Cat;

#[async_trait]
impl Tool for Cat {
    fn name(&self) -> &str {
        "cat"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("cat", "Print file contents")
            .param(ParamSchema::required("path", "File path(s) to read"))
            .example("Print a remote file", "cat /simple.txt")
            .example("Print several files", "cat a.txt b.txt")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        if args.positional.is_empty() {
            return ExecResult::failure(1, "cat: missing path argument");
        }

        let mut all_content = String::new();
        for path in &args.positional {
            let resolved = match ctx.resolve_path(path) {
                Ok(p) => p,
                Err(e) => return ExecResult::failure(1, format!("cat: {e}")),
            };
            let data = match ctx.overlay.read(&resolved).await {
                Ok(data) => data,
                Err(e) => return ExecResult::failure(1, format!("cat: {e}")),
            };
            match String::from_utf8(data) {
                Ok(content) => {
                    if !all_content.is_empty() && !all_content.ends_with('\n') {
                        all_content.push('\n');
                    }
                    all_content.push_str(&content);
                }
                Err(_) => return ExecResult::failure(1, format!("cat: {resolved}: invalid UTF-8")),
            }
        }
        ExecResult::success(all_content)
    }
}
