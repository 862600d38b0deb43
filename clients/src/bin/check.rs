//! `spdx-check`: imports an SPDX JSON-LD document into an editor session and
//! validates it against the ontology.
//!
//! Optionally re-exports the imported graph as compacted JSON-LD and as
//! N-Triples.
//!
//! **Usage:**
//! ```text
//! spdx-check --ontology <path|url> [--metadata <model.json>] [--config <editor.toml>]
//!            [--export <path>] [--ntriples <path>] <document>
//! ```
//!
//! Exits non-zero if any check fails.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use spdx_editor::{EditorConfig, EditorSession, Position, Severity};
use spdx_ontology::serializer::to_ntriples;
use spdx_ontology::Source;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Validate an SPDX document.
#[derive(Parser)]
#[command(name = "spdx-check", about = "Validate an SPDX JSON-LD document")]
struct Args {
    /// Ontology source: a Turtle or JSON-LD file, or an http(s) URL.
    #[arg(long)]
    ontology: String,

    /// Markdown-derived metadata document (model.json).
    #[arg(long)]
    metadata: Option<PathBuf>,

    /// Editor configuration (TOML).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the re-exported document here.
    #[arg(long)]
    export: Option<PathBuf>,

    /// Write the re-exported graph as N-Triples here.
    #[arg(long)]
    ntriples: Option<PathBuf>,

    /// The document to check.
    document: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EditorConfig::from_path(path)
            .await
            .with_context(|| format!("Failed to read configuration {}", path.display()))?,
        None => EditorConfig::default(),
    };
    let source = Source::parse(&args.ontology);
    let mut session = EditorSession::open(config, &source, args.metadata.as_deref())
        .await
        .with_context(|| format!("Failed to open an editor session on {}", source.name()))?;

    let summary = session
        .import_path(&args.document, Position::default())
        .await
        .with_context(|| format!("Failed to import {}", args.document.display()))?;
    info!(
        nodes = summary.node_ids.len(),
        dropped = summary.dropped,
        root = summary.root.as_deref().unwrap_or("-"),
        "imported document"
    );

    let exported = session.export();

    println!("SPDX Document Report");
    println!("====================");
    println!();

    let mut passed = 0usize;
    let mut failed = 0usize;
    let mut warned = 0usize;

    if summary.dropped > 0 {
        warned += 1;
        println!(
            "[WARN] import/cardinality: {} value(s) beyond maxCount were dropped",
            summary.dropped
        );
    }

    for result in &exported.report.results {
        let status = match result.severity {
            Severity::Pass => {
                passed += 1;
                "PASS"
            }
            Severity::Warning => {
                warned += 1;
                "WARN"
            }
            Severity::Failure => {
                failed += 1;
                "FAIL"
            }
        };
        match &result.node {
            Some(node) => println!("[{status}] {} {node}: {}", result.validator, result.message),
            None => println!("[{status}] {}: {}", result.validator, result.message),
        }
        for detail in &result.details {
            println!("       {detail}");
        }
    }

    println!();
    println!("Summary: {passed} passed, {warned} warnings, {failed} failed");

    if let Some(path) = &args.export {
        let text = exported
            .to_json_string()
            .context("Failed to serialize the exported document")?;
        tokio::fs::write(path, text)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("  Written: {}", path.display());
    }
    if let Some(path) = &args.ntriples {
        tokio::fs::write(path, to_ntriples(&exported.store))
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("  Written: {}", path.display());
    }

    if failed > 0 {
        eprintln!("Validation FAILED: {failed} check(s) did not pass.");
        process::exit(1);
    }

    println!("Validation PASSED.");
    Ok(())
}
