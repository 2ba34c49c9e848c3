//! mkdir: Create directories.

use async_trait::async_trait;

use layerfs_types::{ExecResult, FsError};

use crate::tools::{ExecContext, ParamSchema, Tool, ToolArgs, ToolSchema};
use crate::vpath::VPath;

/// Mkdir tool: create local directories.
pub struct Mkdir;

#[async_trait]
impl Tool for Mkdir {
    fn name(&self) -> &str {
        "mkdir"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("mkdir", "Create directories")
            .param(ParamSchema::required("path", "Directory path(s) to create"))
            .param(
                ParamSchema::flag("-p", "Create missing parents; existing directories are fine")
                    .alias("--parents"),
            )
            .example("Create a directory", "mkdir projects")
            .example("Create nested directories", "mkdir -p a/b/c")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        if args.positional.is_empty() {
            return ExecResult::failure(1, "mkdir: missing path argument");
        }
        let parents = args.has_flag(&["p", "parents"]);

        for path in &args.positional {
            let resolved = match ctx.resolve_path(path) {
                Ok(p) => p,
                Err(e) => return ExecResult::failure(1, format!("mkdir: {e}")),
            };
            let outcome = if parents {
                make_all(ctx, &resolved).await
            } else {
                ctx.overlay.mkdir(&resolved).await
            };
            if let Err(e) = outcome {
                return ExecResult::failure(1, format!("mkdir: {e}"));
            }
        }
        ExecResult::success("")
    }
}

/// `mkdir -p`: create each missing ancestor, then the path itself.
async fn make_all(ctx: &ExecContext, path: &VPath) -> Result<(), FsError> {
    let mut chain = path.ancestors();
    chain.push(path.clone());
    for dir in chain.iter().filter(|d| !d.is_root()) {
        match ctx.overlay.mkdir(dir).await {
            Ok(()) => {}
            Err(FsError::AlreadyExists(_)) if ctx.overlay.is_dir(dir).await => {}
            Err(FsError::AlreadyExists(_)) => {
                return Err(FsError::NotADirectory(dir.to_string()));
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{args, ctx};

    #[tokio::test]
    async fn test_mkdir_creates_local_dir() {
        let mut ctx = ctx();
        let result = Mkdir.execute(args(&["/Desktop/projects"]), &mut ctx).await;
        assert!(result.ok(), "{}", result.err);
        assert!(ctx.overlay.is_dir(&VPath::parse("/Desktop/projects").unwrap()).await);
    }

    #[tokio::test]
    async fn test_mkdir_existing_fails() {
        let mut ctx = ctx();
        let result = Mkdir.execute(args(&["/docs"]), &mut ctx).await;
        assert!(!result.ok());
        assert!(result.err.contains("already exists"));
    }

    #[tokio::test]
    async fn test_mkdir_missing_parent_fails() {
        let mut ctx = ctx();
        let result = Mkdir.execute(args(&["/a/b"]), &mut ctx).await;
        assert!(!result.ok());
        assert!(result.err.contains("not found"));
    }

    #[tokio::test]
    async fn test_mkdir_parents() {
        let mut ctx = ctx();
        let result = Mkdir.execute(args(&["-p", "/docs/x/y"]), &mut ctx).await;
        assert!(result.ok(), "{}", result.err);
        assert!(ctx.overlay.is_dir(&VPath::parse("/docs/x/y").unwrap()).await);

        let again = Mkdir.execute(args(&["-p", "/docs/x/y"]), &mut ctx).await;
        assert!(again.ok());
    }

    #[tokio::test]
    async fn test_mkdir_parents_through_file_fails() {
        let mut ctx = ctx();
        let result = Mkdir.execute(args(&["-p", "/simple.txt/x"]), &mut ctx).await;
        assert!(!result.ok());
        assert!(result.err.contains("not a directory"));
    }
}
