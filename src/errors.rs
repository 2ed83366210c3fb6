//! Error Taxonomy Module
//!
//! All generator failures fall into one of three fatal categories. The run
//! never retries and never writes a partial manifest: a fixture corpus with a
//! gap is worse than no corpus, because consumers key test cases by id and
//! would silently validate against the wrong case.

use thiserror::Error;

/// Fatal generator error.
///
/// Every variant aborts the run. Artifacts already written for earlier
/// combinations remain on disk, but the manifest (written only after the last
/// combination) is not produced, which signals an incomplete run to any
/// tooling that checks for its presence.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// Asymmetric key generation failed (entropy or algorithm failure).
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// Certificate assembly or signing failed (malformed request, name or
    /// extension encoding failure, signature failure).
    #[error("certificate signing failed: {0}")]
    Signing(String),

    /// An artifact could not be written.
    #[error("artifact write failed: {0}")]
    Io(#[from] std::io::Error),
}

impl GeneratorError {
    /// Wrap an openssl error as a key-generation failure.
    pub(crate) fn keygen<E: std::fmt::Display>(context: &str, e: E) -> Self {
        GeneratorError::KeyGeneration(format!("Failed to {}: {}", context, e))
    }

    /// Wrap an openssl error as a signing/encoding failure.
    pub(crate) fn signing<E: std::fmt::Display>(context: &str, e: E) -> Self {
        GeneratorError::Signing(format!("Failed to {}: {}", context, e))
    }
}

pub type Result<T> = std::result::Result<T, GeneratorError>;
