//! Chain Factory Module
//!
//! Composes three certificate issuances into the fixed hierarchy every test
//! case uses:
//!
//! ```text
//! Shared Root CA (run-wide trust anchor)
//!   └── Local Root (carries the Name Constraints under test)
//!       └── Intermediate CA
//!           └── Leaf (carries the CN / SAN identity under test)
//! ```
//!
//! The constraint under test sits one hop below the shared trust anchor and
//! one hop above the leaf. That matches realistic CA hierarchies and avoids
//! testing constraint enforcement only at the trust anchor itself, a known
//! class of validator bug.

use crate::errors::Result;
use crate::issue_certificate::{
    CertificateIssuanceRequest, KeyMaterial, KeyMaterialBuilder, NameConstraintSpec,
    SubjectAltNameSet,
};

/// Build the three-tier chain for one test case and return the leaf.
///
/// The leaf's `chain` field transitively holds
/// `[leaf, intermediate, local root, shared root]`.
pub fn build_test_chain(
    builder: &mut KeyMaterialBuilder,
    root: &KeyMaterial,
    cert_id: u32,
    constraints: &NameConstraintSpec,
    leaf_common_name: Option<&str>,
    leaf_sans: &SubjectAltNameSet,
) -> Result<KeyMaterial> {
    let local_root_cn = format!("Local Root for {}", cert_id);
    let local_root = builder.build(CertificateIssuanceRequest {
        signer: Some(root),
        common_name: Some(&local_root_cn),
        is_authority: true,
        name_constraints: Some(constraints),
        subject_alt_names: None,
    })?;

    let intermediate_cn = format!("Intermediate CA for {}", cert_id);
    let intermediate = builder.build(CertificateIssuanceRequest {
        signer: Some(&local_root),
        common_name: Some(&intermediate_cn),
        is_authority: true,
        name_constraints: None,
        subject_alt_names: None,
    })?;

    builder.build(CertificateIssuanceRequest {
        signer: Some(&intermediate),
        common_name: leaf_common_name,
        is_authority: false,
        name_constraints: None,
        subject_alt_names: Some(leaf_sans),
    })
}
