//! The Kernel: one overlay session.
//!
//! A `Kernel` owns everything a session needs and nothing is process-wide:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                           Kernel                           │
//! │  ┌──────────────┐  ┌────────────────────────────────────┐  │
//! │  │ ToolRegistry │  │ OverlayFs                          │  │
//! │  │ (ls, cp, ..) │  │   upper: SqliteStore / MemoryStore │  │
//! │  └──────────────┘  │   lower: RemoteSource              │  │
//! │  ┌──────────────┐  │          (Index + Origin)          │  │
//! │  │ ExecContext  │  └────────────────────────────────────┘  │
//! │  │ (cwd)        │                                          │
//! │  └──────────────┘                                          │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`Kernel::init`] loads the manifest and opens the store; a bad manifest is
//! a [`StartupError`] and no kernel is produced. [`Kernel::shutdown`] flushes
//! the store.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

use layerfs_types::{ExecResult, FsError, FsResult};

use crate::index::{Index, IndexError};
use crate::layer::Layer;
use crate::line::split_words;
use crate::overlay::{OverlayFs, OverlayOptions};
use crate::remote::{DirOrigin, HttpOrigin, Origin, OriginError, RemoteSource};
use crate::store::{MemoryStore, SqliteStore};
use crate::tools::{ExecContext, ToolArgs, ToolRegistry, ToolSchema, register_builtins};
use crate::vpath::VPath;

/// The command lines run by `default`, in order.
pub const DEFAULT_MACRO: &[&str] = &[
    "cp /simple.txt /Desktop",
    "cp /simple.txt /Documents",
    "ls Desktop",
    "ls Documents",
];

/// Where the manifest comes from.
#[derive(Debug, Clone)]
pub enum ManifestSource {
    /// A JSON file on disk.
    Path(PathBuf),
    /// A JSON document held in memory.
    Inline(String),
}

/// Where remote file bytes come from.
#[derive(Clone)]
pub enum OriginConfig {
    /// A local directory standing in for the network.
    Dir(PathBuf),
    /// A static HTTP server.
    Http {
        base_url: String,
        timeout: Option<Duration>,
    },
    /// A caller-supplied origin.
    Custom(Arc<dyn Origin>),
}

impl fmt::Debug for OriginConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OriginConfig::Dir(path) => f.debug_tuple("Dir").field(path).finish(),
            OriginConfig::Http { base_url, timeout } => f
                .debug_struct("Http")
                .field("base_url", base_url)
                .field("timeout", timeout)
                .finish(),
            OriginConfig::Custom(origin) => {
                f.debug_tuple("Custom").field(&origin.describe()).finish()
            }
        }
    }
}

/// Which write store backs the local cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    /// Ephemeral; nothing survives the process.
    Memory,
    /// Durable SQLite database at the given path.
    Sqlite(PathBuf),
}

/// Configuration for kernel initialization.
#[derive(Debug, Clone)]
pub struct KernelConfig {
    /// Name of this kernel, used in logs.
    pub name: String,
    pub manifest: ManifestSource,
    /// Origin for remote bytes. `None` means the manifest's own directory.
    pub origin: Option<OriginConfig>,
    pub store: StoreConfig,
    /// Copy remote bytes into the store after the first read.
    pub cache_remote_reads: bool,
}

impl KernelConfig {
    /// A config with an in-memory store and the default origin.
    pub fn named(name: &str, manifest: ManifestSource) -> Self {
        Self {
            name: name.to_string(),
            manifest,
            origin: None,
            store: StoreConfig::Memory,
            cache_remote_reads: false,
        }
    }

    pub fn with_origin(mut self, origin: OriginConfig) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn with_store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }

    pub fn with_cache_remote_reads(mut self, enabled: bool) -> Self {
        self.cache_remote_reads = enabled;
        self
    }

    /// The origin to use, defaulting to the manifest's directory.
    fn resolved_origin(&self) -> Result<OriginConfig, StartupError> {
        if let Some(origin) = &self.origin {
            return Ok(origin.clone());
        }
        match &self.manifest {
            ManifestSource::Path(path) => {
                let dir = path
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("."));
                Ok(OriginConfig::Dir(dir))
            }
            ManifestSource::Inline(_) => Err(StartupError::NoOrigin),
        }
    }
}

/// Fatal startup failures. No kernel exists after one of these.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("manifest: {0}")]
    Manifest(#[from] IndexError),
    #[error("origin: {0}")]
    Origin(#[from] OriginError),
    #[error("an inline manifest needs an explicit origin")]
    NoOrigin,
    #[error("write store: {0}")]
    Store(#[source] FsError),
}

/// One overlay session: filesystem, commands, working directory.
pub struct Kernel {
    name: String,
    overlay: Arc<OverlayFs>,
    tools: Arc<ToolRegistry>,
    ctx: Mutex<ExecContext>,
}

impl Kernel {
    /// Load the manifest, connect the origin, open the store.
    pub async fn init(config: KernelConfig) -> Result<Self, StartupError> {
        let index = match &config.manifest {
            ManifestSource::Path(path) => Index::load(path).await?,
            ManifestSource::Inline(json) => Index::from_json(json)?,
        };

        let origin: Arc<dyn Origin> = match config.resolved_origin()? {
            OriginConfig::Dir(dir) => Arc::new(DirOrigin::new(dir)),
            OriginConfig::Http { base_url, timeout } => {
                Arc::new(HttpOrigin::new(base_url, timeout)?)
            }
            OriginConfig::Custom(origin) => origin,
        };

        let upper: Arc<dyn Layer> = match &config.store {
            StoreConfig::Memory => Arc::new(MemoryStore::new()),
            StoreConfig::Sqlite(path) => {
                Arc::new(SqliteStore::open(path).map_err(StartupError::Store)?)
            }
        };

        info!(
            kernel = %config.name,
            entries = index.len(),
            origin = %origin.describe(),
            store = upper.label(),
            "kernel initialized"
        );

        let lower = Arc::new(RemoteSource::new(Arc::new(index), origin));
        let options = OverlayOptions {
            cache_remote_reads: config.cache_remote_reads,
        };
        let overlay = Arc::new(OverlayFs::new(lower, upper, options));

        let mut registry = ToolRegistry::new();
        register_builtins(&mut registry);
        let tools = Arc::new(registry);

        let mut ctx = ExecContext::new(overlay.clone());
        ctx.set_tool_schemas(tools.schemas());

        Ok(Self {
            name: config.name,
            overlay,
            tools,
            ctx: Mutex::new(ctx),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn overlay(&self) -> &Arc<OverlayFs> {
        &self.overlay
    }

    pub fn tool_schemas(&self) -> Vec<ToolSchema> {
        self.tools.schemas()
    }

    pub async fn cwd(&self) -> VPath {
        self.ctx.lock().await.cwd.clone()
    }

    /// Run one command line. Errors come back as a failed `ExecResult`.
    #[tracing::instrument(level = "debug", skip(self), fields(kernel = %self.name))]
    pub async fn execute(&self, line: &str) -> ExecResult {
        let words = match split_words(line) {
            Ok(words) => words,
            Err(e) => return ExecResult::failure(2, format!("parse error: {e}")),
        };
        if words.is_empty() {
            return ExecResult::success("");
        }

        let mut ctx = self.ctx.lock().await;
        self.ensure_cwd(&mut ctx).await;

        if words[0] == "default" {
            return self.run_default(&mut ctx).await;
        }
        self.dispatch(&mut ctx, words).await
    }

    /// Reset the working directory to `/` if it no longer resolves to one.
    async fn ensure_cwd(&self, ctx: &mut ExecContext) {
        if !ctx.cwd.is_root() && !self.overlay.is_dir(&ctx.cwd).await {
            warn!(cwd = %ctx.cwd, "working directory vanished, returning to /");
            ctx.cwd = VPath::root();
        }
    }

    async fn dispatch(&self, ctx: &mut ExecContext, words: Vec<String>) -> ExecResult {
        let mut words = words.into_iter();
        let Some(name) = words.next() else {
            return ExecResult::success("");
        };
        let Some(tool) = self.tools.get(&name) else {
            warn!(command = %name, "unknown command");
            return ExecResult::failure(127, format!("unknown command: {name}"));
        };

        let rest: Vec<String> = words.collect();
        let args = ToolArgs::parse(&rest);
        let schema = tool.schema();
        if let Some(flag) = schema.unknown_flag(&args) {
            warn!(command = %name, flag = %flag, "unknown option");
            return ExecResult::failure(
                2,
                format!("{name}: unknown option {flag}\nusage: {}", schema.usage()),
            );
        }
        let result = tool.execute(args, ctx).await;
        if !result.ok() {
            warn!(command = %name, code = result.code, error = %result.err, "command failed");
        }
        result
    }

    /// Run every step of [`DEFAULT_MACRO`], carrying on past failures.
    ///
    /// Step errors are interleaved with step output; `err` only counts them.
    async fn run_default(&self, ctx: &mut ExecContext) -> ExecResult {
        let mut out = Vec::new();
        let mut failed = 0;
        for line in DEFAULT_MACRO {
            out.push(format!("> {line}"));
            let words = match split_words(line) {
                Ok(words) => words,
                Err(e) => {
                    out.push(format!("{line}: {e}"));
                    failed += 1;
                    continue;
                }
            };
            let result = self.dispatch(ctx, words).await;
            let ok = result.ok();
            let ExecResult { out: step_out, err: step_err, .. } = result;
            if !step_out.is_empty() {
                out.push(step_out);
            }
            if !ok {
                out.push(step_err);
                failed += 1;
            }
        }

        let mut result = ExecResult::success(out.join("\n"));
        if failed > 0 {
            result.code = 1;
            result.err = format!("default: {failed} of {} steps failed", DEFAULT_MACRO.len());
        }
        result
    }

    /// Flush the store and end the session.
    pub async fn shutdown(self) -> FsResult<()> {
        self.overlay.flush().await?;
        info!(kernel = %self.name, "kernel shut down");
        Ok(())
    }
}
