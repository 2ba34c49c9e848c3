//! Shared fixture for tool tests.

use std::sync::Arc;

use crate::index::Index;
use crate::overlay::{OverlayFs, OverlayOptions};
use crate::remote::{MemoryOrigin, RemoteSource};
use crate::store::MemoryStore;
use crate::tools::{ExecContext, ToolArgs, ToolRegistry, register_builtins};

pub(crate) const MANIFEST: &str = r#"{
    "/simple.txt": { "kind": "file", "size": 5 },
    "/Desktop": { "kind": "directory" },
    "/Documents": { "kind": "directory" },
    "/docs/a.txt": { "kind": "file", "size": 1 },
    "/docs/b.md": { "kind": "file", "size": 2 }
}"#;

pub(crate) fn overlay() -> Arc<OverlayFs> {
    let index = Index::from_json(MANIFEST).expect("manifest");
    let origin = MemoryOrigin::new()
        .with("simple.txt", "hello")
        .with("docs/a.txt", "a")
        .with("docs/b.md", "bb");
    let lower = RemoteSource::new(Arc::new(index), Arc::new(origin));
    Arc::new(OverlayFs::new(
        Arc::new(lower),
        Arc::new(MemoryStore::new()),
        OverlayOptions::default(),
    ))
}

pub(crate) fn ctx() -> ExecContext {
    let mut registry = ToolRegistry::new();
    register_builtins(&mut registry);
    let mut ctx = ExecContext::new(overlay());
    ctx.set_tool_schemas(registry.schemas());
    ctx
}

pub(crate) fn args(words: &[&str]) -> ToolArgs {
    ToolArgs::parse(words)
}
