//! Source arguments shared by the merge and compile subcommands.

use crate::source::{AmbiguityPolicy, CodecOptions, LiteralMode, SourceLoader};
use clap::Args;
use std::path::PathBuf;

/// Arguments selecting the sources to layer
#[derive(Args, Debug)]
pub struct SourceArgs {
    /// Source files, lowest precedence first (.json, .yaml or .yml)
    #[arg(value_name = "FILES")]
    pub files: Vec<PathBuf>,

    /// Read environment variables with this prefix (PREFIX_A__B maps to a.b)
    #[arg(long, value_name = "PREFIX")]
    pub env_prefix: Option<String>,

    /// Set a value with the highest precedence (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// Only accept JSON literals (no bare words)
    #[arg(long)]
    pub strict: bool,
}

impl SourceArgs {
    pub fn codec_options(&self) -> CodecOptions {
        let mode = if self.strict {
            LiteralMode::Strict
        } else {
            LiteralMode::Lenient
        };
        CodecOptions::default().with_literal_mode(mode)
    }

    /// Build a loader layering files, then environment, then `--set`.
    pub fn loader(&self) -> SourceLoader {
        let mut loader = SourceLoader::new().codec_options(self.codec_options());
        for file in &self.files {
            loader = loader.file(file);
        }
        if let Some(ref prefix) = self.env_prefix {
            loader = loader.env(prefix.clone());
        }
        loader.args(self.set.iter().cloned())
    }
}

/// Arguments for the compile subcommand
#[derive(Args, Debug)]
pub struct CompileArgs {
    #[command(flatten)]
    pub sources: SourceArgs,

    /// Fail when a key is both a value and a prefix of other keys
    #[arg(long)]
    pub reject_ambiguous: bool,
}

impl CompileArgs {
    pub fn loader(&self) -> SourceLoader {
        let mut options = self.sources.codec_options();
        if self.reject_ambiguous {
            options = options.with_ambiguity(AmbiguityPolicy::Reject);
        }
        self.sources.loader().codec_options(options)
    }
}
