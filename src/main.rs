//! optionset
//!
//! Flattens, merges and rebuilds layered option sources, and compiles type
//! descriptions into JSON-Schema.

use anyhow::Result;
use clap::Parser;
use optionset::OptionError;
use optionset::cli::schema::{SchemaArgs, read_description};
use optionset::cli::sources::{CompileArgs, SourceArgs};
use optionset::cli::{Cli, Command, FileArgs};
use optionset::format::{OutputFormat, render_document, render_flat};
use optionset::logging::{LogTarget, init_logging};
use optionset::source::{read_flat_file, read_source_file, unflatten};
use serde_json::json;
use tracing::{debug, info};

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&LogTarget::parse(&cli.log), cli.verbose)?;

    let format = OutputFormat::from_str(&cli.format).ok_or_else(|| {
        anyhow::anyhow!(
            "unknown output format `{}` (expected json, yaml or pairs)",
            cli.format
        )
    })?;

    let outcome = match cli.command {
        Command::Flatten(args) => run_flatten(args, format),
        Command::Merge(args) => run_merge(args, format),
        Command::Unflatten(args) => run_unflatten(args, format),
        Command::Compile(args) => run_compile(args, format),
        Command::Schema(args) => run_schema(args, format),
    };

    if let Err(e) = outcome {
        report_error(&e, format);
        std::process::exit(1);
    }
    Ok(())
}

/// Print an error to stderr, as a structured report under `--format json`.
fn report_error(e: &anyhow::Error, format: OutputFormat) {
    if format != OutputFormat::Json {
        eprintln!("Error: {:#}", e);
        return;
    }
    let report = match e.downcast_ref::<OptionError>() {
        Some(err) => serde_json::to_value(err.report()).unwrap_or_else(|_| {
            json!({ "error": err.to_string() })
        }),
        None => json!({
            "code": "INTERNAL_ERROR",
            "message": format!("{:#}", e)
        }),
    };
    eprintln!("{}", report);
}

/// Run the flatten command
fn run_flatten(args: FileArgs, format: OutputFormat) -> Result<()> {
    let flat = read_source_file(&args.file)?;
    debug!(file = %args.file.display(), keys = flat.len(), "Flattened file");
    print!("{}", render_flat(&flat, format)?);
    Ok(())
}

/// Run the merge command
fn run_merge(args: SourceArgs, format: OutputFormat) -> Result<()> {
    let merged = args.loader().merged()?;
    print!("{}", render_flat(&merged, format)?);
    Ok(())
}

/// Run the unflatten command
fn run_unflatten(args: FileArgs, format: OutputFormat) -> Result<()> {
    let flat = read_flat_file(&args.file)?;
    let document = unflatten(&flat)?;
    print!("{}", render_document(&document, format)?);
    Ok(())
}

/// Run the compile command
fn run_compile(args: CompileArgs, format: OutputFormat) -> Result<()> {
    let document = args.loader().document()?;
    print!("{}", render_document(&document, format)?);
    Ok(())
}

/// Run the schema command
fn run_schema(args: SchemaArgs, format: OutputFormat) -> Result<()> {
    let description = read_description(&args.file)?;
    let document = args.compiler().compile(&description)?;
    let rendered = render_document(&document.to_value(), format)?;

    if let Some(ref path) = args.output {
        std::fs::write(path, &rendered)?;
        info!(
            path = %path.display(),
            definitions = document.definitions.len(),
            "Wrote schema"
        );
        eprintln!("Wrote schema to {}", path.display());
    } else {
        print!("{}", rendered);
    }
    Ok(())
}
