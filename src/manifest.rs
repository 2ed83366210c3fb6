//! Manifest Module
//!
//! The machine-readable output contract: one record per generated leaf, in
//! enumeration order, describing the identity conditions and constraints the
//! chain was built with. Independent harnesses key on `id`, so the recorder
//! is strictly append-only and the document is written once, after the last
//! combination completes. An aborted run therefore leaves no manifest at
//! all, which is how downstream tooling detects an incomplete corpus.

use serde::Serialize;

/// Expected-outcome record for one generated leaf.
///
/// `whitelist`/`blacklist` use the manifest's own canonical order (DNS value
/// before IP value when both are present), independent of the encoding order
/// inside the certificate's Name Constraints extension.
#[derive(Debug, Clone, Serialize)]
pub struct ManifestEntry {
    pub id: u32,
    #[serde(rename = "commonName")]
    pub common_name: Option<String>,
    pub sans: Vec<String>,
    #[serde(rename = "nameConstraints")]
    pub name_constraints: ManifestNameConstraints,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManifestNameConstraints {
    pub whitelist: Vec<String>,
    pub blacklist: Vec<String>,
}

/// The full output document: `{"certManifest": [...]}`.
#[derive(Debug, Serialize)]
pub struct TestManifest {
    #[serde(rename = "certManifest")]
    pub cert_manifest: Vec<ManifestEntry>,
}

/// Accumulates manifest entries in enumeration order.
#[derive(Debug, Default)]
pub struct ManifestRecorder {
    entries: Vec<ManifestEntry>,
}

impl ManifestRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one entry. Entries are immutable once appended; there is no
    /// deduplication.
    pub fn record(&mut self, entry: ManifestEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    /// Consume the recorder into the final document.
    pub fn into_manifest(self) -> TestManifest {
        TestManifest {
            cert_manifest: self.entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_with_no_names_serializes_nulls_and_empty_arrays() {
        let entry = ManifestEntry {
            id: 1,
            common_name: None,
            sans: vec![],
            name_constraints: ManifestNameConstraints {
                whitelist: vec![],
                blacklist: vec![],
            },
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(
            json,
            r#"{"id":1,"commonName":null,"sans":[],"nameConstraints":{"whitelist":[],"blacklist":[]}}"#
        );
    }

    #[test]
    fn test_recorder_appends_in_order() {
        let mut recorder = ManifestRecorder::new();
        assert!(recorder.is_empty());

        for id in 1..=3 {
            recorder.record(ManifestEntry {
                id,
                common_name: None,
                sans: vec![],
                name_constraints: ManifestNameConstraints {
                    whitelist: vec![],
                    blacklist: vec![],
                },
            });
        }

        assert!(!recorder.is_empty());
        assert_eq!(recorder.len(), 3);
        let ids: Vec<u32> = recorder.entries().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let manifest = recorder.into_manifest();
        assert_eq!(manifest.cert_manifest.len(), 3);
    }

    #[test]
    fn test_manifest_document_shape() {
        let mut recorder = ManifestRecorder::new();
        recorder.record(ManifestEntry {
            id: 244,
            common_name: None,
            sans: vec!["test.example.com".to_string()],
            name_constraints: ManifestNameConstraints {
                whitelist: vec![],
                blacklist: vec![],
            },
        });
        let json = serde_json::to_value(recorder.into_manifest()).unwrap();
        assert_eq!(json["certManifest"][0]["id"], 244);
        assert_eq!(json["certManifest"][0]["sans"][0], "test.example.com");
    }
}
