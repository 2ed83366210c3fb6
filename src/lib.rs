//! Name Constraints Corpus - X.509 Test-Chain Generator Library
//!
//! Generates a deterministic, exhaustive corpus of X.509 certificate chains
//! exercising the Name Constraints extension against Subject Alternative
//! Name and Common Name variants, together with a machine-readable manifest
//! describing each chain. The corpus is consumed by independent TLS-client
//! test harnesses (in any language) to verify that an implementation
//! correctly enforces name constraints.
//!
//! # Overview
//!
//! Every test case is a three-tier chain hanging off one run-wide trust
//! anchor:
//!
//! ```text
//! Shared Root CA (self-signed, generated once per run)
//!   └── Local Root (carries the Name Constraints under test)
//!       └── Intermediate CA
//!           └── Leaf (carries the CN / SAN identity under test)
//! ```
//!
//! Seven test axes (leaf CN, leaf DNS SAN, leaf IP SAN, and the four
//! permitted/excluded DNS/IP constraint subtrees) are crossed exhaustively
//! in a fixed order, producing 3645 chains with sequential ids. The
//! enumeration order is a durable external contract: consumers key manifest
//! entries by id, so the run is strictly sequential and reproducible.
//!
//! # Quick Start
//!
//! ```no_run
//! use nameconstraints_corpus::artifacts::ArtifactWriter;
//! use nameconstraints_corpus::configs::AppConfig;
//! use nameconstraints_corpus::enumeration::CombinationEnumerator;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::load()?;
//!     let writer = ArtifactWriter::new(&config.output_dir)?;
//!     let manifest = CombinationEnumerator::new(&config.trust_domain).run(&writer)?;
//!     println!("Generated {} chains", manifest.cert_manifest.len());
//!     Ok(())
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`configs`]: trust-domain values and output location, loaded from TOML
//! - [`issue_certificate`]: single-certificate issuance (keys, names,
//!   validity, extensions, signing)
//! - [`chain_factory`]: the fixed local-root / intermediate / leaf tier
//!   composition
//! - [`enumeration`]: the seven-axis cross product and run orchestration
//! - [`manifest`]: the `manifest.json` data model and recorder
//! - [`artifacts`]: PEM and manifest output files
//! - [`errors`]: the fatal error taxonomy
//!
//! # Output Contract
//!
//! The output directory receives `root.crt`, then `<id>.key`, `<id>.crt`
//! and `<id>.chain` per leaf, and finally `manifest.json`. The manifest is
//! written only after the last chain, so its presence marks a complete run;
//! any failure aborts the run without it.

pub mod artifacts;
pub mod chain_factory;
pub mod configs;
pub mod enumeration;
pub mod errors;
pub mod issue_certificate;
pub mod manifest;
