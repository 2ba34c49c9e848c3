//! Shell configuration.
//!
//! Values come from `~/.config/layerfs/config.toml` when it exists, then
//! command-line flags override them.
//!
//! ```toml
//! name = "default"
//! manifest = "/srv/site/index.json"
//! origin = "https://cdn.example.com/site"
//! store = "memory"
//! cache_remote_reads = true
//! http_timeout_secs = 30
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use layerfs_kernel::paths;
use layerfs_kernel::{KernelConfig, ManifestSource, OriginConfig, StoreConfig};

/// Configuration for the `layerfs` shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShellConfig {
    /// Kernel name, used in logs.
    #[serde(default = "default_name")]
    pub name: String,

    /// Manifest file. Defaults to `index.json` in the working directory.
    #[serde(default)]
    pub manifest: Option<PathBuf>,

    /// Remote origin: an `http(s)://` base URL or a local directory.
    /// Defaults to the manifest's directory.
    #[serde(default)]
    pub origin: Option<String>,

    /// Write store: `memory` or a SQLite database path.
    /// Defaults to `~/.cache/layerfs/cache.db`.
    #[serde(default)]
    pub store: Option<String>,

    /// Copy remote bytes into the store after the first read.
    #[serde(default)]
    pub cache_remote_reads: bool,

    /// Per-request timeout for HTTP origins.
    #[serde(default)]
    pub http_timeout_secs: Option<u64>,
}

fn default_name() -> String {
    "default".to_string()
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            manifest: None,
            origin: None,
            store: None,
            cache_remote_reads: false,
            http_timeout_secs: None,
        }
    }
}

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Interactive,
    Command(String),
    Help,
    Version,
}

impl ShellConfig {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, returns default configuration.
    pub fn load() -> Result<Self> {
        let path = paths::config_path();

        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Apply command-line arguments (without the program name).
    ///
    /// Flags take `--flag value` or `--flag=value`.
    pub fn apply_args(&mut self, args: &[String]) -> Result<Invocation> {
        let mut invocation = Invocation::Interactive;
        let mut iter = args.iter();

        while let Some(arg) = iter.next() {
            let (flag, inline) = match arg.split_once('=') {
                Some((flag, value)) if flag.starts_with("--") => (flag, Some(value.to_string())),
                _ => (arg.as_str(), None),
            };

            let mut value = |name: &str| -> Result<String> {
                match &inline {
                    Some(v) => Ok(v.clone()),
                    None => iter
                        .next()
                        .cloned()
                        .with_context(|| format!("{name} requires a value")),
                }
            };

            match flag {
                "-h" | "--help" => return Ok(Invocation::Help),
                "-V" | "--version" => return Ok(Invocation::Version),
                "-c" => invocation = Invocation::Command(value("-c")?),
                "--manifest" => self.manifest = Some(PathBuf::from(value("--manifest")?)),
                "--origin" => self.origin = Some(value("--origin")?),
                "--store" => self.store = Some(value("--store")?),
                "--name" => self.name = value("--name")?,
                "--memory" => self.store = Some("memory".to_string()),
                "--cache-reads" => self.cache_remote_reads = true,
                unknown => bail!("Unknown option: {unknown}\nRun 'layerfs --help' for usage."),
            }
        }

        Ok(invocation)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.manifest
            .clone()
            .unwrap_or_else(|| PathBuf::from("index.json"))
    }

    /// The configured origin, if one was given.
    pub fn origin_config(&self) -> Option<OriginConfig> {
        let origin = self.origin.as_deref()?;
        if origin.starts_with("http://") || origin.starts_with("https://") {
            return Some(OriginConfig::Http {
                base_url: origin.to_string(),
                timeout: self.http_timeout_secs.map(Duration::from_secs),
            });
        }
        let dir = origin.strip_prefix("file://").unwrap_or(origin);
        Some(OriginConfig::Dir(PathBuf::from(dir)))
    }

    pub fn store_config(&self) -> StoreConfig {
        match self.store.as_deref() {
            None => StoreConfig::Sqlite(paths::default_store_path()),
            Some("memory" | ":memory:") => StoreConfig::Memory,
            Some(path) => StoreConfig::Sqlite(PathBuf::from(path)),
        }
    }

    /// Build the kernel configuration these settings describe.
    pub fn kernel_config(&self) -> KernelConfig {
        let config = KernelConfig::named(&self.name, ManifestSource::Path(self.manifest_path()))
            .with_store(self.store_config())
            .with_cache_remote_reads(self.cache_remote_reads);
        match self.origin_config() {
            Some(origin) => config.with_origin(origin),
            None => config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_file_is_defaults() {
        let config: ShellConfig = toml::from_str("").unwrap();
        assert_eq!(config, ShellConfig::default());
        assert_eq!(config.manifest_path(), PathBuf::from("index.json"));
        assert_eq!(config.store_config(), StoreConfig::Sqlite(paths::default_store_path()));
    }

    #[test]
    fn parses_full_file() {
        let config: ShellConfig = toml::from_str(
            r#"
            name = "site"
            manifest = "/srv/site/index.json"
            origin = "https://cdn.example.com/site"
            store = "memory"
            cache_remote_reads = true
            http_timeout_secs = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.name, "site");
        assert_eq!(config.store_config(), StoreConfig::Memory);
        assert!(config.cache_remote_reads);
        match config.origin_config() {
            Some(OriginConfig::Http { base_url, timeout }) => {
                assert_eq!(base_url, "https://cdn.example.com/site");
                assert_eq!(timeout, Some(Duration::from_secs(5)));
            }
            other => panic!("expected http origin, got {other:?}"),
        }
    }

    #[test]
    fn load_from_reports_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "store = [").unwrap();
        let err = ShellConfig::load_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse config"));
    }

    #[rstest]
    #[case("/srv/site", "/srv/site")]
    #[case("file:///srv/site", "/srv/site")]
    #[case("site", "site")]
    fn local_origins_are_directories(#[case] origin: &str, #[case] expected: &str) {
        let config = ShellConfig {
            origin: Some(origin.to_string()),
            ..ShellConfig::default()
        };
        match config.origin_config() {
            Some(OriginConfig::Dir(dir)) => assert_eq!(dir, PathBuf::from(expected)),
            other => panic!("expected dir origin, got {other:?}"),
        }
    }

    #[test]
    fn flags_override_file_values() {
        let mut config = ShellConfig {
            store: Some("/tmp/a.db".to_string()),
            ..ShellConfig::default()
        };
        let invocation = config
            .apply_args(&args(&[
                "--manifest",
                "site/index.json",
                "--origin=http://localhost:8080",
                "--memory",
                "--cache-reads",
            ]))
            .unwrap();

        assert_eq!(invocation, Invocation::Interactive);
        assert_eq!(config.manifest_path(), PathBuf::from("site/index.json"));
        assert_eq!(config.store_config(), StoreConfig::Memory);
        assert!(config.cache_remote_reads);
        assert!(matches!(config.origin_config(), Some(OriginConfig::Http { .. })));
    }

    #[rstest]
    #[case(&["-c", "ls /"], Invocation::Command("ls /".to_string()))]
    #[case(&["--help"], Invocation::Help)]
    #[case(&["-V"], Invocation::Version)]
    #[case(&[], Invocation::Interactive)]
    fn invocation_modes(#[case] list: &[&str], #[case] expected: Invocation) {
        let mut config = ShellConfig::default();
        assert_eq!(config.apply_args(&args(list)).unwrap(), expected);
    }

    #[test]
    fn missing_flag_value_is_an_error() {
        let mut config = ShellConfig::default();
        let err = config.apply_args(&args(&["--store"])).unwrap_err();
        assert!(err.to_string().contains("--store requires a value"));
    }

    #[test]
    fn unknown_flag_is_an_error() {
        let mut config = ShellConfig::default();
        assert!(config.apply_args(&args(&["--bogus"])).is_err());
    }

    #[test]
    fn kernel_config_carries_settings() {
        let config = ShellConfig {
            name: "k".to_string(),
            store: Some("memory".to_string()),
            origin: Some("/srv".to_string()),
            ..ShellConfig::default()
        };
        let kernel = config.kernel_config();
        assert_eq!(kernel.name, "k");
        assert_eq!(kernel.store, StoreConfig::Memory);
        assert!(matches!(kernel.origin, Some(OriginConfig::Dir(_))));
        assert!(matches!(kernel.manifest, ManifestSource::Path(ref p) if p == Path::new("index.json")));
    }
}
