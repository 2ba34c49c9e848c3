//! pwd: Print working directory.

use async_trait::async_trait;

use layerfs_types::ExecResult;

use crate::tools::{ExecContext, Tool, ToolArgs, ToolSchema};

/// Pwd tool: print current working directory.
pub struct Pwd;

#[async_trait]
impl Tool for Pwd {
    fn name(&self) -> &str {
        "pwd"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("pwd", "Print current working directory")
    }

    async fn execute(&self, _args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        ExecResult::success(ctx.cwd.to_string())
    }
}
