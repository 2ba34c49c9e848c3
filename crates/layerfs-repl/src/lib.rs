//! layerfs REPL: interactive shell over the overlay filesystem.
//!
//! This crate handles:
//! - Meta-commands: `exit`, `quit`
//! - Command execution via the Kernel
//! - Result formatting with DisplayHints
//! - Command history via rustyline

pub mod config;
pub mod format;

use std::path::Path;

use anyhow::{Context, Result};
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use tokio::runtime::Runtime;

use layerfs_kernel::{Kernel, KernelConfig, paths};
use layerfs_types::{DisplayHint, ExecResult};

/// What the shell should do after a line.
#[derive(Debug, PartialEq, Eq)]
pub enum MetaResult {
    /// Keep reading, printing the output if there is any.
    Continue(Option<String>),
    /// Leave the shell.
    Exit,
}

/// REPL state: a kernel and the runtime that drives it.
pub struct Repl {
    kernel: Kernel,
    runtime: Runtime,
}

impl Repl {
    /// Start a kernel with the given configuration.
    pub fn new(config: KernelConfig) -> Result<Self> {
        let runtime = Runtime::new().context("Failed to create tokio runtime")?;
        let kernel = runtime
            .block_on(Kernel::init(config))
            .context("Failed to start kernel")?;

        Ok(Self { kernel, runtime })
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    /// Run one command line through the kernel.
    pub fn execute(&self, line: &str) -> ExecResult {
        self.runtime.block_on(self.kernel.execute(line))
    }

    /// Prompt showing the current directory.
    pub fn prompt(&self) -> String {
        let cwd = self.runtime.block_on(self.kernel.cwd());
        format!("layerfs:{cwd}> ")
    }

    /// Process a single line of input.
    pub fn process_line(&mut self, line: &str) -> MetaResult {
        let trimmed = line.trim();

        match trimmed {
            "" => MetaResult::Continue(None),
            "exit" | "quit" => MetaResult::Exit,
            _ => {
                let result = self.execute(trimmed);
                MetaResult::Continue(format_result(&result))
            }
        }
    }

    /// Flush the write store and drop the kernel.
    pub fn shutdown(self) -> Result<()> {
        let Repl { kernel, runtime } = self;
        runtime
            .block_on(kernel.shutdown())
            .context("Failed to flush the local cache")
    }
}

/// Format an ExecResult for display.
///
/// Output comes first, then any error text. Returns `None` when there is
/// nothing to print.
pub fn format_result(result: &ExecResult) -> Option<String> {
    let out = if matches!(result.hint, DisplayHint::None) {
        result.out.clone()
    } else {
        format::format_output(result, format::detect_context())
    };

    let mut parts = Vec::new();
    if !out.is_empty() {
        parts.push(out.trim_end_matches('\n').to_string());
    }
    if !result.err.is_empty() {
        parts.push(result.err.trim_end_matches('\n').to_string());
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n"))
    }
}

const BANNER: &str = "Type help for commands, exit to leave.";

/// Save REPL history to disk.
fn save_history(rl: &mut Editor<(), DefaultHistory>, history_path: &Path) {
    if let Some(parent) = history_path.parent()
        && let Err(e) = std::fs::create_dir_all(parent)
    {
        tracing::warn!("Failed to create history directory: {}", e);
    }
    if let Err(e) = rl.save_history(history_path) {
        tracing::warn!("Failed to save history: {}", e);
    }
}

/// Run the interactive REPL until `exit`, `quit` or end of input.
pub fn run(config: KernelConfig) -> Result<()> {
    let mut rl: Editor<(), DefaultHistory> = Editor::new().context("Failed to create editor")?;

    let history_path = paths::history_path();
    if let Err(e) = rl.load_history(&history_path) {
        // Missing history is expected on first run
        let is_not_found = matches!(&e, ReadlineError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound);
        if !is_not_found {
            tracing::warn!("Failed to load history: {}", e);
        }
    }

    let mut repl = Repl::new(config)?;

    println!("layerfs v{}", env!("CARGO_PKG_VERSION"));
    println!("{BANNER}");
    println!();

    loop {
        let prompt = repl.prompt();

        match rl.readline(&prompt) {
            Ok(line) => {
                if !line.trim().is_empty()
                    && let Err(e) = rl.add_history_entry(line.as_str())
                {
                    tracing::warn!("Failed to add history entry: {}", e);
                }

                match repl.process_line(&line) {
                    MetaResult::Continue(Some(output)) => println!("{output}"),
                    MetaResult::Continue(None) => {}
                    MetaResult::Exit => break,
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("^D");
                break;
            }
            Err(err) => {
                eprintln!("Error: {err}");
                break;
            }
        }
    }

    save_history(&mut rl, &history_path);
    repl.shutdown()
}
