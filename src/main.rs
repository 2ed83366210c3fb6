//! Name Constraints Corpus Generator
//!
//! Command-line entry point: loads the trust-domain configuration, prepares
//! the output directory and runs the full enumeration. The optional first
//! argument names the config file (default: `config.toml`; built-in defaults
//! apply when no file exists).

use anyhow::{Context, Result};
use nameconstraints_corpus::artifacts::ArtifactWriter;
use nameconstraints_corpus::configs::AppConfig;
use nameconstraints_corpus::enumeration::CombinationEnumerator;

fn main() -> Result<()> {
    println!("=== Name Constraints Corpus Generator ===\n");

    let config = match std::env::args().nth(1) {
        Some(path) => AppConfig::from_file(&path)?,
        None => AppConfig::load()?,
    };

    let writer = ArtifactWriter::new(&config.output_dir).with_context(|| {
        format!(
            "Failed to prepare output directory: {}",
            config.output_dir.display()
        )
    })?;
    println!("✓ Output directory: {}\n", writer.output_dir().display());

    let enumerator = CombinationEnumerator::new(&config.trust_domain);
    let manifest = enumerator
        .run(&writer)
        .context("Corpus generation aborted")?;

    println!(
        "\n✓ Generated {} certificate chains",
        manifest.cert_manifest.len()
    );
    println!("✓ Manifest written to {}/manifest.json", writer.output_dir().display());

    Ok(())
}
