//! cp: Copy a file into a directory.

use async_trait::async_trait;
use tracing::info;

use layerfs_types::ExecResult;

use crate::overlay::CopyOutcome;
use crate::tools::{ExecContext, ParamSchema, Tool, ToolArgs, ToolSchema};

/// Cp tool: copy a file into an existing directory, keeping its name.
///
/// Directory sources are skipped rather than recursed into.
pub struct Cp;

#[async_trait]
impl Tool for Cp {
    fn name(&self) -> &str {
        "cp"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("cp", "Copy a file into a directory (directories are skipped)")
            .param(ParamSchema::required("source", "File to copy"))
            .param(ParamSchema::required("destDir", "Existing destination directory"))
            .example("Copy a remote file to the desktop", "cp /simple.txt /Desktop")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let (Some(source), Some(dest), None) = (
            args.get_positional(0),
            args.get_positional(1),
            args.get_positional(2),
        ) else {
            return ExecResult::failure(1, "cp: usage: cp <source> <destDir>");
        };

        let source = match ctx.resolve_path(source) {
            Ok(p) => p,
            Err(e) => return ExecResult::failure(1, format!("cp: {e}")),
        };
        let dest = match ctx.resolve_path(dest) {
            Ok(p) => p,
            Err(e) => return ExecResult::failure(1, format!("cp: {e}")),
        };

        match ctx.overlay.copy(&source, &dest).await {
            Ok(CopyOutcome::Copied { destination }) => {
                info!(source = %source, destination = %destination, "cp");
                ExecResult::success("")
            }
            Ok(CopyOutcome::SkippedDirectory) => {
                info!(source = %source, "cp skipped directory");
                ExecResult::success(format!("cp: skipping directory {source}"))
            }
            Err(e) => ExecResult::failure(1, format!("cp: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vpath::VPath;
    use crate::tools::testing::{args, ctx};
    use layerfs_types::Provenance;

    fn p(s: &str) -> VPath {
        VPath::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_cp_remote_to_remote_dir() {
        let mut ctx = ctx();
        let result = Cp
            .execute(args(&["/simple.txt", "/Desktop"]), &mut ctx)
            .await;
        assert!(result.ok(), "{}", result.err);

        let data = ctx.overlay.read(&p("/Desktop/simple.txt")).await.unwrap();
        assert_eq!(data, b"hello");
        let stat = ctx.overlay.stat(&p("/Desktop/simple.txt")).await.unwrap();
        assert_eq!(stat.provenance, Provenance::Local);
        let source = ctx.overlay.stat(&p("/simple.txt")).await.unwrap();
        assert_eq!(source.provenance, Provenance::Remote);
    }

    #[tokio::test]
    async fn test_cp_relative_paths() {
        let mut ctx = ctx();
        ctx.set_cwd(p("/docs"));
        let result = Cp.execute(args(&["b.md", "../Documents"]), &mut ctx).await;
        assert!(result.ok(), "{}", result.err);
        assert_eq!(
            ctx.overlay.read(&p("/Documents/b.md")).await.unwrap(),
            b"bb"
        );
    }

    #[tokio::test]
    async fn test_cp_directory_is_skipped() {
        let mut ctx = ctx();
        let result = Cp.execute(args(&["/docs", "/Desktop"]), &mut ctx).await;
        assert!(result.ok());
        assert!(result.out.contains("skipping directory"));
        assert!(ctx.overlay.list(&p("/Desktop")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cp_missing_source() {
        let mut ctx = ctx();
        let result = Cp.execute(args(&["/ghost", "/Desktop"]), &mut ctx).await;
        assert!(!result.ok());
        assert!(result.err.contains("not found"));
    }

    #[tokio::test]
    async fn test_cp_missing_destination_creates_nothing() {
        let mut ctx = ctx();
        let result = Cp
            .execute(args(&["/simple.txt", "/new/nested"]), &mut ctx)
            .await;
        assert!(!result.ok());
        assert!(!ctx.overlay.exists(&p("/new")).await);
    }

    #[tokio::test]
    async fn test_cp_usage() {
        let mut ctx = ctx();
        let result = Cp.execute(args(&["/simple.txt"]), &mut ctx).await;
        assert!(!result.ok());
        assert!(result.err.contains("usage"));
    }
}
