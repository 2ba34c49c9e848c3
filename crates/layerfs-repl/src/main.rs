//! layerfs CLI entry point.
//!
//! Usage:
//!   layerfs                          # Interactive shell
//!   layerfs -c <command>             # Execute command and exit
//!   layerfs --manifest site.json     # Use a specific manifest

use std::env;
use std::process::ExitCode;

use anyhow::Result;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use layerfs_repl::config::{Invocation, ShellConfig};
use layerfs_repl::{Repl, format_result};

fn main() -> ExitCode {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    match run() {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let args: Vec<String> = env::args().skip(1).collect();

    let mut config = ShellConfig::load()?;
    match config.apply_args(&args)? {
        Invocation::Help => {
            print_help();
            Ok(ExitCode::SUCCESS)
        }
        Invocation::Version => {
            println!(
                "layerfs {} ({} {})",
                env!("CARGO_PKG_VERSION"),
                env!("LAYERFS_GIT_HASH"),
                env!("LAYERFS_BUILD_DATE")
            );
            Ok(ExitCode::SUCCESS)
        }
        Invocation::Command(cmd) => run_command(&config, &cmd),
        Invocation::Interactive => {
            layerfs_repl::run(config.kernel_config())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Execute a command string and exit.
fn run_command(config: &ShellConfig, cmd: &str) -> Result<ExitCode> {
    let repl = Repl::new(config.kernel_config())?;
    let result = repl.execute(cmd);

    if !result.out.is_empty() || !result.err.is_empty() {
        let mut printed = result.clone();
        printed.err.clear();
        if let Some(out) = format_result(&printed) {
            println!("{out}");
        }
        if !result.err.is_empty() {
            eprintln!("{}", result.err);
        }
    }

    repl.shutdown()?;

    if result.ok() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(u8::try_from(result.code).unwrap_or(1)))
    }
}

fn print_help() {
    println!(
        r#"layerfs v{}

A writable local cache layered over a read-only remote file tree.

Usage:
  layerfs [OPTIONS]              Interactive shell
  layerfs [OPTIONS] -c <command> Execute command and exit

Options:
  --manifest <path>              Manifest file (default: ./index.json)
  --origin <url|dir>             Where remote bytes live (default: manifest's directory)
  --store <path|memory>          Local cache database (default: ~/.cache/layerfs/cache.db)
  --memory                       Use an ephemeral in-memory cache
  --cache-reads                  Keep fetched remote files in the local cache
  --name <name>                  Kernel name shown in logs
  -c <command>                   Execute command string and exit
  -h, --help                     Show this help
  -V, --version                  Show version

Settings are also read from ~/.config/layerfs/config.toml; flags win.

Examples:
  layerfs --manifest site/index.json
  layerfs -c 'ls -l /'
  layerfs --origin https://cdn.example.com/site -c default
"#,
        env!("CARGO_PKG_VERSION")
    );
}
