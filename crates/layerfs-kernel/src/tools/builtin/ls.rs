//! ls: List directory contents.

use async_trait::async_trait;

use layerfs_types::{DirEntry, EntryKind, ExecResult, Provenance};

use crate::overlay::OverlayEntry;
use crate::tools::{ExecContext, ParamSchema, Tool, ToolArgs, ToolSchema};

/// Ls tool: merged listing of local and remote entries.
pub struct Ls;

#[async_trait]
impl Tool for Ls {
    fn name(&self) -> &str {
        "ls"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("ls", "List directory contents")
            .param(ParamSchema::optional("dir", "Directory to list (default: current)"))
            .param(ParamSchema::flag("-l", "Long format: kind, size, layer, name").alias("--long"))
            .example("List the current directory", "ls")
            .example("Show where each entry comes from", "ls -l /Desktop")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let path = args.get_positional(0).unwrap_or(".");
        let long_format = args.has_flag(&["l", "long"]);

        let resolved = match ctx.resolve_path(path) {
            Ok(p) => p,
            Err(e) => return ExecResult::failure(1, format!("ls: {e}")),
        };

        // A file lists as itself.
        let entries = match ctx.overlay.resolve(&resolved).await {
            Ok(OverlayEntry::Absent) => {
                return ExecResult::failure(1, format!("ls: not found: {resolved}"));
            }
            Ok(entry) if entry.is_file() => {
                let name = resolved.file_name().unwrap_or("/").to_string();
                let size = entry.metadata().map(|m| m.size).unwrap_or(0);
                let provenance = entry.provenance().unwrap_or(Provenance::Remote);
                vec![DirEntry::file(name, size, provenance)]
            }
            Ok(_) => match ctx.overlay.list(&resolved).await {
                Ok(entries) => entries,
                Err(e) => return ExecResult::failure(1, format!("ls: {e}")),
            },
            Err(e) => return ExecResult::failure(1, format!("ls: {e}")),
        };

        if entries.is_empty() {
            return ExecResult::success("");
        }

        let kinds: Vec<EntryKind> = entries.iter().map(|e| e.kind).collect();
        if long_format {
            let rows = entries.iter().map(long_row).collect();
            let headers = ["KIND", "SIZE", "LAYER", "NAME"]
                .iter()
                .map(|h| h.to_string())
                .collect();
            ExecResult::success_table(Some(headers), rows, Some(kinds))
        } else {
            let rows = entries.into_iter().map(|e| vec![e.name]).collect();
            ExecResult::success_table(None, rows, Some(kinds))
        }
    }
}

fn long_row(entry: &DirEntry) -> Vec<String> {
    let kind = match entry.kind {
        EntryKind::Directory => "d",
        EntryKind::File => "-",
    };
    let size = match entry.kind {
        EntryKind::Directory => "-".to_string(),
        EntryKind::File => entry.size.to_string(),
    };
    vec![
        kind.to_string(),
        size,
        entry.provenance.to_string(),
        entry.name.clone(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{args, ctx};
    use crate::vpath::VPath;
    use layerfs_types::DisplayHint;

    #[tokio::test]
    async fn test_ls_root() {
        let mut ctx = ctx();
        let result = Ls.execute(args(&[]), &mut ctx).await;
        assert!(result.ok());
        assert_eq!(result.out, "Desktop\nDocuments\ndocs\nsimple.txt");
    }

    #[tokio::test]
    async fn test_ls_merges_local_and_remote() {
        let mut ctx = ctx();
        let local = VPath::parse("/docs/c.txt").unwrap();
        ctx.overlay.write(&local, b"ccc").await.unwrap();

        let result = Ls.execute(args(&["-l", "docs"]), &mut ctx).await;
        assert!(result.ok());
        let DisplayHint::Table { rows, entry_kinds, .. } = result.hint else {
            panic!("expected table");
        };
        assert_eq!(
            rows,
            vec![
                vec!["-", "1", "remote", "a.txt"],
                vec!["-", "2", "remote", "b.md"],
                vec!["-", "3", "local", "c.txt"],
            ]
        );
        assert_eq!(entry_kinds, Some(vec![EntryKind::File; 3]));
    }

    #[tokio::test]
    async fn test_ls_tags_directories() {
        let mut ctx = ctx();
        let result = Ls.execute(args(&["/"]), &mut ctx).await;
        let DisplayHint::Table { entry_kinds, .. } = result.hint else {
            panic!("expected table");
        };
        assert_eq!(
            entry_kinds,
            Some(vec![
                EntryKind::Directory,
                EntryKind::Directory,
                EntryKind::Directory,
                EntryKind::File,
            ])
        );
    }

    #[tokio::test]
    async fn test_ls_file_lists_itself() {
        let mut ctx = ctx();
        let result = Ls.execute(args(&["/simple.txt"]), &mut ctx).await;
        assert!(result.ok());
        assert_eq!(result.out, "simple.txt");
    }

    #[tokio::test]
    async fn test_ls_empty_dir() {
        let mut ctx = ctx();
        let result = Ls.execute(args(&["/Desktop"]), &mut ctx).await;
        assert!(result.ok());
        assert_eq!(result.out, "");
    }

    #[tokio::test]
    async fn test_ls_missing() {
        let mut ctx = ctx();
        let result = Ls.execute(args(&["/nope"]), &mut ctx).await;
        assert!(!result.ok());
        assert!(result.err.contains("not found"));
    }
}
