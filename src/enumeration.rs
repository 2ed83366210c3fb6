//! Combination Enumeration Module
//!
//! The test-matrix generator. Seven independent axes, each drawn from the
//! configured trust-domain values plus an "absent" level, are crossed in a
//! fixed nested order to produce 5 x 3^6 = 3645 combinations:
//!
//! | Axis | Meaning                    | Levels |
//! |------|----------------------------|--------|
//! | A    | leaf common name           | 5      |
//! | B    | leaf DNS SAN               | 3      |
//! | C    | leaf IP SAN                | 3      |
//! | D    | permitted-subtree IP entry | 3      |
//! | E    | permitted-subtree DNS entry| 3      |
//! | F    | excluded-subtree IP entry  | 3      |
//! | G    | excluded-subtree DNS entry | 3      |
//!
//! Enumeration order is a durable external contract: consumers key manifest
//! entries by id, so axis A varies slowest and axis G fastest, ids are
//! assigned 1, 2, 3, ... in strict order, and no combination is ever skipped
//! or reordered. Exhaustiveness wins over corpus minimality, so even
//! semantically redundant cases like the all-absent one are generated.

use crate::artifacts::ArtifactWriter;
use crate::chain_factory::build_test_chain;
use crate::configs::TrustDomainValues;
use crate::errors::Result;
use crate::issue_certificate::{
    CertificateIssuanceRequest, GeneralNameKind, KeyMaterial, KeyMaterialBuilder,
    NameConstraintSpec, NameConstraintSubtree, SanEntry, SubjectAltNameSet,
};
use crate::manifest::{ManifestEntry, ManifestNameConstraints, ManifestRecorder, TestManifest};

pub const AXIS_COUNT: usize = 7;

/// Common name the run-wide shared trust anchor carries.
pub const ROOT_COMMON_NAME: &str = "Name Constraints Test Root CA";

/// The seven ordered axes for one run. Each axis is a list of levels, level
/// zero always being "absent".
pub struct TestAxes<'a> {
    levels: [Vec<Option<&'a str>>; AXIS_COUNT],
}

impl<'a> TestAxes<'a> {
    pub fn new(values: &'a TrustDomainValues) -> Self {
        Self {
            levels: [
                // A: leaf common name
                vec![
                    None,
                    Some(values.valid_hostname.as_str()),
                    Some(values.valid_ip.as_str()),
                    Some(values.invalid_hostname.as_str()),
                    Some(values.invalid_ip.as_str()),
                ],
                // B: leaf DNS SAN
                vec![
                    None,
                    Some(values.valid_hostname.as_str()),
                    Some(values.invalid_hostname.as_str()),
                ],
                // C: leaf IP SAN
                vec![
                    None,
                    Some(values.valid_ip.as_str()),
                    Some(values.invalid_ip.as_str()),
                ],
                // D: permitted-subtree IP entry
                vec![
                    None,
                    Some(values.valid_ip_subtree.as_str()),
                    Some(values.invalid_ip_subtree.as_str()),
                ],
                // E: permitted-subtree DNS entry
                vec![
                    None,
                    Some(values.valid_host_subtree.as_str()),
                    Some(values.invalid_host_subtree.as_str()),
                ],
                // F: excluded-subtree IP entry
                vec![
                    None,
                    Some(values.valid_ip_subtree.as_str()),
                    Some(values.invalid_ip_subtree.as_str()),
                ],
                // G: excluded-subtree DNS entry
                vec![
                    None,
                    Some(values.valid_host_subtree.as_str()),
                    Some(values.invalid_host_subtree.as_str()),
                ],
            ],
        }
    }

    /// Total number of combinations (3645 for the standard axis sizes).
    pub fn combination_count(&self) -> usize {
        self.levels.iter().map(Vec::len).product()
    }

    /// Iterate all combinations in the contractual order: axis A outermost,
    /// axis G innermost.
    pub fn combinations(&self) -> impl Iterator<Item = Combination<'a>> + '_ {
        let sizes: [usize; AXIS_COUNT] = std::array::from_fn(|i| self.levels[i].len());
        CartesianIndices::new(sizes).map(move |indices| Combination {
            common_name: self.levels[0][indices[0]],
            dns_san: self.levels[1][indices[1]],
            ip_san: self.levels[2][indices[2]],
            permitted_ip: self.levels[3][indices[3]],
            permitted_dns: self.levels[4][indices[4]],
            excluded_ip: self.levels[5][indices[5]],
            excluded_dns: self.levels[6][indices[6]],
        })
    }
}

/// Odometer over the axis index space: the last (innermost) axis advances
/// fastest, matching the nested-loop order the manifest contract requires.
struct CartesianIndices {
    sizes: [usize; AXIS_COUNT],
    next: Option<[usize; AXIS_COUNT]>,
}

impl CartesianIndices {
    fn new(sizes: [usize; AXIS_COUNT]) -> Self {
        let next = if sizes.iter().all(|&s| s > 0) {
            Some([0; AXIS_COUNT])
        } else {
            None
        };
        Self { sizes, next }
    }
}

impl Iterator for CartesianIndices {
    type Item = [usize; AXIS_COUNT];

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        let mut bumped = current;
        let mut axis = AXIS_COUNT;
        loop {
            if axis == 0 {
                self.next = None;
                break;
            }
            axis -= 1;
            bumped[axis] += 1;
            if bumped[axis] < self.sizes[axis] {
                self.next = Some(bumped);
                break;
            }
            bumped[axis] = 0;
        }
        Some(current)
    }
}

/// One fully resolved point in the test matrix.
#[derive(Debug, Clone, Copy)]
pub struct Combination<'a> {
    pub common_name: Option<&'a str>,
    pub dns_san: Option<&'a str>,
    pub ip_san: Option<&'a str>,
    pub permitted_ip: Option<&'a str>,
    pub permitted_dns: Option<&'a str>,
    pub excluded_ip: Option<&'a str>,
    pub excluded_dns: Option<&'a str>,
}

impl Combination<'_> {
    /// SAN set for the leaf: DNS entry before IP entry.
    pub fn subject_alt_names(&self) -> SubjectAltNameSet {
        let mut entries = Vec::new();
        if let Some(dns) = self.dns_san {
            entries.push(SanEntry {
                kind: GeneralNameKind::Dns,
                value: dns.to_string(),
            });
        }
        if let Some(ip) = self.ip_san {
            entries.push(SanEntry {
                kind: GeneralNameKind::Ip,
                value: ip.to_string(),
            });
        }
        SubjectAltNameSet { entries }
    }

    /// Name Constraints for the local root. Inside the extension each list
    /// puts the IP entry before the DNS entry, the inverse of the manifest's
    /// order. Existing consumers depend on both orders, so the asymmetry is
    /// preserved literally.
    pub fn name_constraints(&self) -> NameConstraintSpec {
        let mut spec = NameConstraintSpec::default();
        if let Some(ip) = self.permitted_ip {
            spec.permitted.push(NameConstraintSubtree {
                kind: GeneralNameKind::Ip,
                value: ip.to_string(),
            });
        }
        if let Some(dns) = self.permitted_dns {
            spec.permitted.push(NameConstraintSubtree {
                kind: GeneralNameKind::Dns,
                value: dns.to_string(),
            });
        }
        if let Some(ip) = self.excluded_ip {
            spec.excluded.push(NameConstraintSubtree {
                kind: GeneralNameKind::Ip,
                value: ip.to_string(),
            });
        }
        if let Some(dns) = self.excluded_dns {
            spec.excluded.push(NameConstraintSubtree {
                kind: GeneralNameKind::Dns,
                value: dns.to_string(),
            });
        }
        spec
    }

    /// Manifest record for this combination. `sans`, `whitelist` and
    /// `blacklist` all list the DNS value before the IP value.
    pub fn manifest_entry(&self, id: u32) -> ManifestEntry {
        let mut sans = Vec::new();
        if let Some(dns) = self.dns_san {
            sans.push(dns.to_string());
        }
        if let Some(ip) = self.ip_san {
            sans.push(ip.to_string());
        }

        let mut whitelist = Vec::new();
        if let Some(dns) = self.permitted_dns {
            whitelist.push(dns.to_string());
        }
        if let Some(ip) = self.permitted_ip {
            whitelist.push(ip.to_string());
        }

        let mut blacklist = Vec::new();
        if let Some(dns) = self.excluded_dns {
            blacklist.push(dns.to_string());
        }
        if let Some(ip) = self.excluded_ip {
            blacklist.push(ip.to_string());
        }

        ManifestEntry {
            id,
            common_name: self.common_name.map(str::to_string),
            sans,
            name_constraints: ManifestNameConstraints {
                whitelist,
                blacklist,
            },
        }
    }
}

/// Run-wide mutable state, owned by the enumerator and never shared: the
/// issuance counters, the next combination id, and the append-only manifest.
struct RunContext {
    builder: KeyMaterialBuilder,
    recorder: ManifestRecorder,
    next_id: u32,
}

/// Drives the full cross product, building and writing one chain per
/// combination, strictly sequentially. Any error aborts the run before the
/// manifest is written.
pub struct CombinationEnumerator<'a> {
    values: &'a TrustDomainValues,
}

impl<'a> CombinationEnumerator<'a> {
    pub fn new(values: &'a TrustDomainValues) -> Self {
        Self { values }
    }

    /// Generate the whole corpus: the shared root, one chain per
    /// combination, and finally the manifest. Returns the manifest that was
    /// written.
    pub fn run(&self, writer: &ArtifactWriter) -> Result<TestManifest> {
        let mut context = RunContext {
            builder: KeyMaterialBuilder::new(),
            recorder: ManifestRecorder::new(),
            next_id: 1,
        };

        // The single run-wide trust anchor, reused as signer for every
        // combination's local root.
        let root = self.build_shared_root(&mut context)?;
        writer.write_root_certificate(&root)?;

        let axes = TestAxes::new(self.values);
        for combination in axes.combinations() {
            let id = context.next_id;
            println!("Generating certificate {}...", id);

            let constraints = combination.name_constraints();
            let sans = combination.subject_alt_names();
            let leaf = build_test_chain(
                &mut context.builder,
                &root,
                id,
                &constraints,
                combination.common_name,
                &sans,
            )?;
            writer.write_leaf_set(id, &leaf)?;

            context.recorder.record(combination.manifest_entry(id));
            context.next_id += 1;
        }

        let manifest = context.recorder.into_manifest();
        writer.write_manifest(&manifest)?;
        Ok(manifest)
    }

    fn build_shared_root(&self, context: &mut RunContext) -> Result<KeyMaterial> {
        context.builder.build(CertificateIssuanceRequest {
            signer: None,
            common_name: Some(ROOT_COMMON_NAME),
            is_authority: true,
            name_constraints: None,
            subject_alt_names: None,
        })
    }
}
