//! `spdx-profiles`: compiles the SPDX ontology and writes the profile
//! snapshots consumed by front ends.
//!
//! **Outputs:**
//! - `<out>/profiles.json`: classes, properties, vocabularies and individuals
//!   grouped by profile
//! - `<out>/iris.json`: the same entities indexed by IRI
//!
//! **Usage:**
//! ```text
//! spdx-profiles --ontology <path|url> [--metadata <model.json>] [--out <path>]
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use spdx_editor::load_model;
use spdx_ontology::Source;
use tracing_subscriber::EnvFilter;

/// Write SPDX profile snapshots.
#[derive(Parser)]
#[command(name = "spdx-profiles", about = "Write SPDX profile snapshots")]
struct Args {
    /// Ontology source: a Turtle or JSON-LD file, or an http(s) URL.
    #[arg(long)]
    ontology: String,

    /// Markdown-derived metadata document (model.json).
    #[arg(long)]
    metadata: Option<PathBuf>,

    /// Output directory for the snapshots.
    #[arg(long, default_value = "public")]
    out: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let source = Source::parse(&args.ontology);
    let model = load_model(&source, args.metadata.as_deref())
        .await
        .with_context(|| format!("Failed to load ontology from {}", source.name()))?;

    println!(
        "SPDX ontology v{}: {} profiles, {} classes, {} properties, {} vocabularies, {} individuals",
        model.info.version.as_deref().unwrap_or("unknown"),
        model.profiles.len(),
        model.class_count(),
        model.property_count(),
        model.vocabulary_count(),
        model.individual_count()
    );

    let out = &args.out;
    tokio::fs::create_dir_all(out)
        .await
        .with_context(|| format!("Failed to create output directory: {}", out.display()))?;

    let profiles = json!({
        "ontology": model.info,
        "profiles": model.profiles,
    });
    write_json(&out.join("profiles.json"), &profiles).await?;
    write_json(&out.join("iris.json"), &serde_json::to_value(model.iris())?).await?;

    println!("Snapshots complete.");
    Ok(())
}

async fn write_json(path: &Path, value: &serde_json::Value) -> Result<()> {
    let text = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize {}", path.display()))?;
    tokio::fs::write(path, text)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("  Written: {}", path.display());
    Ok(())
}
