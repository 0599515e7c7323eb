//! Tiered source loader.
//!
//! Collects sources from several tiers and compiles them in priority order
//! (lowest to highest):
//! 1. **Defaults** - a serialized default value
//! 2. **File** - JSON/YAML files, explicit or discovered in search directories
//! 3. **Environment** - prefixed environment variables
//! 4. **Arguments** - `key=value` assignments from the command line
//!
//! Within a tier, sources keep the order they were added in.

use super::codec::{CodecOptions, flatten_value, unflatten_with};
use super::compile::decode_document;
use super::formats::{assignment_source, env_source, process_env_source, read_source_file};
use super::merge::{merge_sources, to_source};
use super::{FlatConfig, SourceMap};
use crate::error::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn};

/// File extensions tried by directory search, in order.
const SEARCH_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

/// Source tier priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SourceTier {
    /// Serialized defaults (lowest priority)
    Defaults = 0,
    /// Configuration files
    File = 1,
    /// Environment variables
    Environment = 2,
    /// Command-line assignments (highest priority)
    Arguments = 3,
}

impl std::fmt::Display for SourceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceTier::Defaults => write!(f, "defaults"),
            SourceTier::File => write!(f, "file"),
            SourceTier::Environment => write!(f, "environment"),
            SourceTier::Arguments => write!(f, "arguments"),
        }
    }
}

/// A source read by the loader.
#[derive(Debug, Clone)]
pub struct LoadedSource {
    pub tier: SourceTier,
    /// Where the source came from (file path, env prefix, ...)
    pub label: String,
    pub entries: SourceMap,
}

#[derive(Debug, Clone)]
enum Pending {
    Ready(LoadedSource),
    File { path: PathBuf, required: bool },
    Search { dirs: Vec<PathBuf>, base_name: String },
    ProcessEnv { prefix: String },
    Assignments(Vec<String>),
}

/// Builder that layers option sources and compiles them.
///
/// # Example
///
/// ```rust,ignore
/// let options: MyOptions = SourceLoader::new()
///     .defaults(&MyOptions::default())?
///     .search(["/etc/myapp", "."], "myapp")
///     .env("MYAPP_")
///     .args(cli.set)
///     .load()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct SourceLoader {
    pending: Vec<Pending>,
    options: CodecOptions,
}

impl SourceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the codec options used to unflatten the merged source.
    pub fn codec_options(mut self, options: CodecOptions) -> Self {
        self.options = options;
        self
    }

    /// Adds an already-built source.
    pub fn source(
        mut self,
        tier: SourceTier,
        label: impl Into<String>,
        entries: SourceMap,
    ) -> Self {
        self.pending.push(Pending::Ready(LoadedSource {
            tier,
            label: label.into(),
            entries,
        }));
        self
    }

    /// Adds a serialized default value as the lowest tier.
    pub fn defaults<T: Serialize>(self, value: &T) -> Result<Self> {
        let flat = flatten_value(&serde_json::to_value(value)?)?;
        Ok(self.source(SourceTier::Defaults, "defaults", to_source(flat)))
    }

    /// Adds a file that must exist.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.pending.push(Pending::File {
            path: path.as_ref().to_path_buf(),
            required: true,
        });
        self
    }

    /// Adds a file that is skipped when missing.
    pub fn optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.pending.push(Pending::File {
            path: path.as_ref().to_path_buf(),
            required: false,
        });
        self
    }

    /// Searches each directory for `<base_name>.yaml|yml|json`.
    ///
    /// The first match per directory is used; matches from several
    /// directories are layered in the order given.
    pub fn search<I, P>(mut self, dirs: I, base_name: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.pending.push(Pending::Search {
            dirs: dirs.into_iter().map(|d| d.as_ref().to_path_buf()).collect(),
            base_name: base_name.into(),
        });
        self
    }

    /// Searches `<user config dir>/<app>/` for `<base_name>.*`.
    pub fn with_user_config_dir(self, app: &str, base_name: impl Into<String>) -> Self {
        self.with_config_root(dirs::config_dir(), app, base_name)
    }

    fn with_config_root(
        self,
        config_dir: Option<PathBuf>,
        app: &str,
        base_name: impl Into<String>,
    ) -> Self {
        match config_dir {
            Some(config_dir) => self.search([config_dir.join(app)], base_name),
            None => {
                debug!(app = %app, "No user config directory on this platform");
                self
            }
        }
    }

    /// Adds the process environment variables starting with `prefix`.
    pub fn env(mut self, prefix: impl Into<String>) -> Self {
        self.pending.push(Pending::ProcessEnv {
            prefix: prefix.into(),
        });
        self
    }

    /// Adds the given variables starting with `prefix`.
    pub fn env_vars<I, K, V>(self, prefix: &str, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let entries = env_source(prefix, vars);
        self.source(SourceTier::Environment, format!("env:{prefix}"), entries)
    }

    /// Adds `key=value` assignments.
    pub fn args<I, S>(mut self, assignments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pending.push(Pending::Assignments(
            assignments.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Reads every source, ordered by tier.
    pub fn resolve(&self) -> Result<Vec<LoadedSource>> {
        let mut sources = Vec::new();
        for pending in &self.pending {
            match pending {
                Pending::Ready(source) => sources.push(source.clone()),
                Pending::File { path, required } => {
                    if !required && !path.exists() {
                        debug!(path = %path.display(), "Optional source file not found");
                        continue;
                    }
                    sources.push(Self::read_file(path)?);
                }
                Pending::Search { dirs, base_name } => {
                    let found = Self::search_dirs(dirs, base_name)?;
                    if found.is_empty() {
                        warn!(base_name = %base_name, "No source file found in search paths");
                    }
                    sources.extend(found);
                }
                Pending::ProcessEnv { prefix } => {
                    trace!(prefix = %prefix, "Loading environment variables");
                    sources.push(LoadedSource {
                        tier: SourceTier::Environment,
                        label: format!("env:{prefix}"),
                        entries: process_env_source(prefix),
                    });
                }
                Pending::Assignments(assignments) => {
                    sources.push(LoadedSource {
                        tier: SourceTier::Arguments,
                        label: "arguments".to_string(),
                        entries: assignment_source(assignments)?,
                    });
                }
            }
        }
        // Stable: insertion order is kept within a tier.
        sources.sort_by_key(|source| source.tier);
        Ok(sources)
    }

    fn read_file(path: &Path) -> Result<LoadedSource> {
        info!(path = %path.display(), "Loading source file");
        let flat = read_source_file(path)?;
        Ok(LoadedSource {
            tier: SourceTier::File,
            label: path.display().to_string(),
            entries: to_source(flat),
        })
    }

    fn search_dirs(dirs: &[PathBuf], base_name: &str) -> Result<Vec<LoadedSource>> {
        let mut found = Vec::new();
        for dir in dirs {
            let candidate = SEARCH_EXTENSIONS
                .iter()
                .map(|ext| dir.join(format!("{base_name}.{ext}")))
                .find(|path| path.is_file());
            if let Some(path) = candidate {
                found.push(Self::read_file(&path)?);
            }
        }
        Ok(found)
    }

    /// Merges every source.
    pub fn merged(&self) -> Result<FlatConfig> {
        let sources = self.resolve()?;
        for source in &sources {
            debug!(
                tier = %source.tier,
                label = %source.label,
                keys = source.entries.len(),
                "Layering source"
            );
        }
        Ok(merge_sources(sources.into_iter().map(|s| s.entries)))
    }

    /// Merges and unflattens every source.
    pub fn document(&self) -> Result<Value> {
        unflatten_with(&self.merged()?, &self.options)
    }

    /// Merges, unflattens and decodes every source.
    pub fn load<T: DeserializeOwned>(&self) -> Result<T> {
        decode_document(self.document()?)
    }
}
