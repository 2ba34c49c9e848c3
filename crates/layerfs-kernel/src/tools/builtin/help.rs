//! help: List commands or show one command's usage.

use async_trait::async_trait;

use layerfs_types::ExecResult;

use crate::tools::{ExecContext, ParamSchema, Tool, ToolArgs, ToolSchema};

/// Help tool: overview or per-command usage from tool schemas.
pub struct Help;

#[async_trait]
impl Tool for Help {
    fn name(&self) -> &str {
        "help"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("help", "List commands, or show usage for one")
            .param(ParamSchema::optional("command", "Command to describe"))
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        match args.get_positional(0) {
            None => ExecResult::success(overview(&ctx.tool_schemas)),
            Some(name) => match ctx.tool_schemas.iter().find(|s| s.name == name) {
                Some(schema) => ExecResult::success(schema.help()),
                None => ExecResult::failure(1, format!("help: no such command: {name}")),
            },
        }
    }
}

fn overview(schemas: &[ToolSchema]) -> String {
    let width = schemas
        .iter()
        .map(|s| s.usage().len())
        .max()
        .unwrap_or(0)
        .max("exit | quit".len());

    let mut text = String::from("Commands:\n");
    for schema in schemas {
        text.push_str(&format!(
            "  {:<width$}  {}\n",
            schema.usage(),
            schema.description,
            width = width
        ));
    }
    text.push_str(&format!(
        "  {:<width$}  {}\n",
        "default",
        "Run the demonstration sequence",
        width = width
    ));
    text.push_str(&format!(
        "  {:<width$}  {}\n",
        "exit | quit",
        "Leave the shell",
        width = width
    ));
    text.push_str("\nRun `help <command>` for details.");
    text
}
