//! CLI command definitions for optionset
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod schema;
pub mod sources;

use clap::{Args, Parser, Subcommand};
use schema::SchemaArgs;
use sources::{CompileArgs, SourceArgs};
use std::path::PathBuf;

/// Layered option sources and JSON-Schema generation
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    /// Output format: json, yaml or pairs
    #[arg(short, long, default_value = "json", global = true)]
    pub format: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Flatten a JSON or YAML file into dotted keys
    Flatten(FileArgs),

    /// Merge sources into one flat source (later sources win)
    Merge(SourceArgs),

    /// Rebuild a nested document from a flat JSON or YAML file
    Unflatten(FileArgs),

    /// Merge sources and rebuild the nested document
    Compile(CompileArgs),

    /// Compile a type description into a JSON-Schema document
    Schema(SchemaArgs),
}

/// A single input file
#[derive(Args, Debug)]
pub struct FileArgs {
    /// Input file (.json, .yaml or .yml)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}
