//! Schema subcommand
//!
//! Reads a type description as JSON or YAML and compiles it into a
//! JSON-Schema document.

use crate::error::{OptionError, Result};
use crate::schema::{SchemaCompiler, TypeDescription};
use crate::source::{SourceFormat, decode_document};
use clap::Args;
use std::path::{Path, PathBuf};

/// Arguments for the schema subcommand
#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Type description file (.json, .yaml or .yml)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Discriminator field for unions that do not name one (default: type)
    #[arg(long, value_name = "FIELD")]
    pub discriminator: Option<String>,

    /// Keyword marking dotted shortcut properties (default: x-dot-shortcut)
    #[arg(long, value_name = "KEYWORD")]
    pub dot_marker: Option<String>,

    /// Output file path (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl SchemaArgs {
    pub fn compiler(&self) -> SchemaCompiler {
        let mut compiler = SchemaCompiler::new();
        if let Some(ref field) = self.discriminator {
            compiler = compiler.with_default_discriminator(field.clone());
        }
        if let Some(ref marker) = self.dot_marker {
            compiler = compiler.with_dot_marker(marker.clone());
        }
        compiler
    }
}

/// Read a serialized [`TypeDescription`].
pub fn read_description(path: &Path) -> Result<TypeDescription> {
    let format = SourceFormat::from_path(path)?;
    if !path.exists() {
        return Err(OptionError::FileNotFound(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path)?;
    decode_document(format.parse(&text)?)
}
