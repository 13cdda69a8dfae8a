//! Extracts the plain text of an RTF file and writes it to standard output.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

/// Print the plain-text content of an RTF document.
#[derive(Parser, Debug)]
#[command(name = "rtfcat", version, about = "Extract plain text from an RTF file")]
struct Args {
    /// Path to the RTF file to read.
    path: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(err) = run() {
        eprintln!("rtfcat: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    tracing::debug!(path = %args.path.display(), "parsing");
    let doc = rtf_reader::parse_file(&args.path).with_context(|| format!("failed to parse {}", args.path.display()))?;
    println!("{}", doc.plain_text());
    Ok(())
}
