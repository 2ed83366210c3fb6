//! Certificate Issuance Module
//!
//! The single unit of PKI correctness: turns one declarative
//! [`CertificateIssuanceRequest`] into one issued certificate with its
//! signing key and full chain of trust. Every certificate in the corpus,
//! from the shared root through each local root and intermediate down to
//! the leaves, comes through here.
//!
//! # Certificate Properties
//! - **Version**: X.509v3
//! - **Key Size**: RSA 2048-bit
//! - **Signature Algorithm**: SHA-256 with RSA
//! - **Basic Constraints**: critical, CA flag from the request
//! - **Name Constraints**: non-critical, only when requested and non-empty
//! - **Subject Alternative Name**: non-critical, only when requested and non-empty
//! - **Serial Number**: run-scoped monotonic counter
//! - **Validity**: now .. now + 12 months, clamped to the signer's notAfter
//!
//! A child certificate never outlives its issuer, and no two certificates in
//! one run share a subject name: the OU field carries a run-scoped sequence
//! number so that chain building stays unambiguous for validators that match
//! on subject/issuer names.

use openssl::asn1::{Asn1Time, Asn1TimeRef};
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::x509::extension::{BasicConstraints, SubjectAlternativeName};
use openssl::x509::{X509, X509Extension, X509Name};
use std::cmp::Ordering;

use crate::errors::{GeneratorError, Result};

const X509_VERSION_3: i32 = 2; // X509 version 3 is represented by 2
const RSA_KEY_SIZE: u32 = 2048;
const VALIDITY_DAYS: u32 = 365; // 12 months

const SUBJECT_COUNTRY: &str = "US";
const SUBJECT_STATE: &str = "California";
const SUBJECT_LOCALITY: &str = "Los Gatos";
const SUBJECT_ORGANIZATION: &str = "Name Constraints Corpus";
const SUBJECT_ORG_UNIT: &str = "TLS Test Engineering";

/// The kind of a general name in a SAN entry or constraint subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneralNameKind {
    Dns,
    Ip,
}

impl GeneralNameKind {
    /// Tag used by openssl's extension configuration mini-language.
    fn conf_tag(self) -> &'static str {
        match self {
            GeneralNameKind::Dns => "DNS",
            GeneralNameKind::Ip => "IP",
        }
    }
}

/// One entry in a permitted or excluded name-constraints list.
#[derive(Debug, Clone)]
pub struct NameConstraintSubtree {
    pub kind: GeneralNameKind,
    pub value: String,
}

/// Content of the Name Constraints extension: ordered permitted and excluded
/// subtree lists. The extension is omitted entirely when both are empty.
#[derive(Debug, Clone, Default)]
pub struct NameConstraintSpec {
    pub permitted: Vec<NameConstraintSubtree>,
    pub excluded: Vec<NameConstraintSubtree>,
}

impl NameConstraintSpec {
    pub fn is_empty(&self) -> bool {
        self.permitted.is_empty() && self.excluded.is_empty()
    }

    /// Render the extension value in openssl's configuration syntax,
    /// preserving list order exactly as supplied.
    fn to_conf_value(&self) -> String {
        let mut entries = Vec::new();
        for subtree in &self.permitted {
            entries.push(format!(
                "permitted;{}:{}",
                subtree.kind.conf_tag(),
                subtree.value
            ));
        }
        for subtree in &self.excluded {
            entries.push(format!(
                "excluded;{}:{}",
                subtree.kind.conf_tag(),
                subtree.value
            ));
        }
        entries.join(",")
    }
}

/// One Subject Alternative Name entry.
#[derive(Debug, Clone)]
pub struct SanEntry {
    pub kind: GeneralNameKind,
    pub value: String,
}

/// Content of the SAN extension: an ordered list of entries. Omitted from
/// the certificate when empty.
#[derive(Debug, Clone, Default)]
pub struct SubjectAltNameSet {
    pub entries: Vec<SanEntry>,
}

impl SubjectAltNameSet {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Declarative input for issuing one certificate. Constructed fresh per
/// call; there is no shared builder state between issuances.
pub struct CertificateIssuanceRequest<'a> {
    /// Signing authority. `None` means self-signed root of trust.
    pub signer: Option<&'a KeyMaterial>,
    /// Optional CN appended to the fixed organizational subject template.
    pub common_name: Option<&'a str>,
    /// Encoded into the critical BasicConstraints extension.
    pub is_authority: bool,
    /// Name Constraints extension content; omitted when `None` or empty.
    pub name_constraints: Option<&'a NameConstraintSpec>,
    /// SAN extension content; omitted when `None` or empty.
    pub subject_alt_names: Option<&'a SubjectAltNameSet>,
}

/// One issued certificate together with its private key and chain of trust.
///
/// `chain[0]` is the certificate itself; `chain[i]` is signed by
/// `chain[i + 1]`; the last element is self-signed.
pub struct KeyMaterial {
    pub private_key: PKey<Private>,
    pub chain: Vec<X509>,
}

impl KeyMaterial {
    /// The issued certificate itself (head of the chain).
    pub fn certificate(&self) -> &X509 {
        &self.chain[0]
    }
}

/// Issues certificates, carrying the run-scoped counters that make serial
/// numbers and subject names unique across the whole run.
///
/// Serial numbers come from a monotonic counter rather than a clock so that
/// fast generation cannot outpace clock resolution into a collision.
pub struct KeyMaterialBuilder {
    next_serial: u32,
    next_subject_seq: u32,
}

impl KeyMaterialBuilder {
    pub fn new() -> Self {
        Self {
            next_serial: 1,
            next_subject_seq: 1,
        }
    }

    /// Issue one certificate from a declarative request.
    ///
    /// # Errors
    /// Returns [`GeneratorError::KeyGeneration`] if RSA key generation fails
    /// and [`GeneratorError::Signing`] for any assembly or signing failure.
    /// No partial result is returned on failure.
    pub fn build(&mut self, request: CertificateIssuanceRequest<'_>) -> Result<KeyMaterial> {
        // Generate a fresh RSA key pair
        let rsa = openssl::rsa::Rsa::generate(RSA_KEY_SIZE)
            .map_err(|e| GeneratorError::keygen("generate RSA keypair", e))?;
        let private_key = PKey::from_rsa(rsa)
            .map_err(|e| GeneratorError::keygen("create private key", e))?;

        let mut builder = X509::builder()
            .map_err(|e| GeneratorError::signing("create X509 builder", e))?;

        builder
            .set_version(X509_VERSION_3)
            .map_err(|e| GeneratorError::signing("set version", e))?;

        let serial = self.next_serial;
        self.next_serial += 1;
        let serial_bn = BigNum::from_u32(serial)
            .map_err(|e| GeneratorError::signing("create serial number", e))?;
        let asn1_serial = serial_bn
            .to_asn1_integer()
            .map_err(|e| GeneratorError::signing("encode serial number", e))?;
        builder
            .set_serial_number(&asn1_serial)
            .map_err(|e| GeneratorError::signing("set serial number", e))?;

        let subject_name = self.build_subject_name(request.common_name)?;
        builder
            .set_subject_name(&subject_name)
            .map_err(|e| GeneratorError::signing("set subject", e))?;

        // Issuer is the signer's subject, or our own subject when self-signed
        match request.signer {
            Some(signer) => builder
                .set_issuer_name(signer.certificate().subject_name())
                .map_err(|e| GeneratorError::signing("set issuer from signer", e))?,
            None => builder
                .set_issuer_name(&subject_name)
                .map_err(|e| GeneratorError::signing("set issuer", e))?,
        }

        let not_before = Asn1Time::days_from_now(0)
            .map_err(|e| GeneratorError::signing("create not_before", e))?;
        builder
            .set_not_before(&not_before)
            .map_err(|e| GeneratorError::signing("set not_before", e))?;

        // 12 months out, clamped so a child never outlives its issuer
        let not_after = Asn1Time::days_from_now(VALIDITY_DAYS)
            .map_err(|e| GeneratorError::signing("create not_after", e))?;
        let mut effective_not_after: &Asn1TimeRef = &not_after;
        if let Some(signer) = request.signer {
            let issuer_not_after = signer.certificate().not_after();
            let ordering = not_after
                .compare(issuer_not_after)
                .map_err(|e| GeneratorError::signing("compare validity windows", e))?;
            if ordering == Ordering::Greater {
                effective_not_after = issuer_not_after;
            }
        }
        builder
            .set_not_after(effective_not_after)
            .map_err(|e| GeneratorError::signing("set not_after", e))?;

        builder
            .set_pubkey(&private_key)
            .map_err(|e| GeneratorError::signing("set public key", e))?;

        // Basic Constraints: always present, always critical
        let mut bc = BasicConstraints::new();
        bc.critical();
        if request.is_authority {
            bc.ca();
        }
        let bc_extension = bc
            .build()
            .map_err(|e| GeneratorError::signing("build BasicConstraints", e))?;
        builder
            .append_extension(bc_extension)
            .map_err(|e| GeneratorError::signing("add BasicConstraints", e))?;

        // Name Constraints: non-critical, only when non-empty. The openssl
        // crate has no typed builder for this extension; the configuration
        // mini-language is the only route, which also keeps the configured
        // subtree values opaque end to end.
        if let Some(constraints) = request.name_constraints.filter(|c| !c.is_empty()) {
            let nc_extension = {
                let context = builder.x509v3_context(
                    request.signer.map(|signer| &**signer.certificate()),
                    None,
                );
                #[allow(deprecated)]
                X509Extension::new_nid(
                    None,
                    Some(&context),
                    Nid::NAME_CONSTRAINTS,
                    &constraints.to_conf_value(),
                )
                .map_err(|e| GeneratorError::signing("build NameConstraints", e))?
            };
            builder
                .append_extension(nc_extension)
                .map_err(|e| GeneratorError::signing("add NameConstraints", e))?;
        }

        // Subject Alternative Name: non-critical, only when non-empty
        if let Some(sans) = request.subject_alt_names.filter(|s| !s.is_empty()) {
            let mut san = SubjectAlternativeName::new();
            for entry in &sans.entries {
                match entry.kind {
                    GeneralNameKind::Dns => san.dns(&entry.value),
                    GeneralNameKind::Ip => san.ip(&entry.value),
                };
            }
            let san_extension = {
                let context = builder.x509v3_context(
                    request.signer.map(|signer| &**signer.certificate()),
                    None,
                );
                san.build(&context)
                    .map_err(|e| GeneratorError::signing("build SubjectAlternativeName", e))?
            };
            builder
                .append_extension(san_extension)
                .map_err(|e| GeneratorError::signing("add SubjectAlternativeName", e))?;
        }

        // Sign with the signer's key, or our own when self-signed
        let signing_key = match request.signer {
            Some(signer) => &signer.private_key,
            None => &private_key,
        };
        builder
            .sign(signing_key, MessageDigest::sha256())
            .map_err(|e| GeneratorError::signing("sign certificate", e))?;

        let certificate = builder.build();

        let mut chain = vec![certificate];
        if let Some(signer) = request.signer {
            chain.extend(signer.chain.iter().cloned());
        }

        Ok(KeyMaterial { private_key, chain })
    }

    /// Fixed organizational template plus a run-scoped sequence number in the
    /// OU field, plus the optional CN. The sequence number is what keeps
    /// subjects unique across the many authorities generated in one run.
    fn build_subject_name(&mut self, common_name: Option<&str>) -> Result<X509Name> {
        let seq = self.next_subject_seq;
        self.next_subject_seq += 1;

        let mut name_builder = X509Name::builder()
            .map_err(|e| GeneratorError::signing("create name builder", e))?;
        name_builder
            .append_entry_by_nid(Nid::COUNTRYNAME, SUBJECT_COUNTRY)
            .map_err(|e| GeneratorError::signing("set country", e))?;
        name_builder
            .append_entry_by_nid(Nid::STATEORPROVINCENAME, SUBJECT_STATE)
            .map_err(|e| GeneratorError::signing("set state/province", e))?;
        name_builder
            .append_entry_by_nid(Nid::LOCALITYNAME, SUBJECT_LOCALITY)
            .map_err(|e| GeneratorError::signing("set locality", e))?;
        name_builder
            .append_entry_by_nid(Nid::ORGANIZATIONNAME, SUBJECT_ORGANIZATION)
            .map_err(|e| GeneratorError::signing("set organization", e))?;
        name_builder
            .append_entry_by_nid(
                Nid::ORGANIZATIONALUNITNAME,
                &format!("{} ({})", SUBJECT_ORG_UNIT, seq),
            )
            .map_err(|e| GeneratorError::signing("set organizational unit", e))?;
        if let Some(cn) = common_name {
            name_builder
                .append_entry_by_nid(Nid::COMMONNAME, cn)
                .map_err(|e| GeneratorError::signing("set CN", e))?;
        }
        Ok(name_builder.build())
    }
}

impl Default for KeyMaterialBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name_der(name: &openssl::x509::X509NameRef) -> Vec<u8> {
        name.to_der().unwrap()
    }

    fn self_signed_root(builder: &mut KeyMaterialBuilder) -> KeyMaterial {
        builder
            .build(CertificateIssuanceRequest {
                signer: None,
                common_name: Some("Test Root"),
                is_authority: true,
                name_constraints: None,
                subject_alt_names: None,
            })
            .unwrap()
    }

    #[test]
    fn test_self_signed_root() {
        let mut builder = KeyMaterialBuilder::new();
        let root = self_signed_root(&mut builder);

        assert_eq!(root.chain.len(), 1);
        let cert = root.certificate();
        assert_eq!(name_der(cert.subject_name()), name_der(cert.issuer_name()));
        // Self-signature must verify with its own public key
        let pubkey = cert.public_key().unwrap();
        assert!(cert.verify(&pubkey).unwrap());
    }

    #[test]
    fn test_child_chain_and_issuer_linkage() {
        let mut builder = KeyMaterialBuilder::new();
        let root = self_signed_root(&mut builder);
        let child = builder
            .build(CertificateIssuanceRequest {
                signer: Some(&root),
                common_name: None,
                is_authority: true,
                name_constraints: None,
                subject_alt_names: None,
            })
            .unwrap();

        assert_eq!(child.chain.len(), 2);
        assert_eq!(
            name_der(child.certificate().issuer_name()),
            name_der(root.certificate().subject_name())
        );
        // Signed by the root's key, not its own
        let root_pubkey = root.certificate().public_key().unwrap();
        assert!(child.certificate().verify(&root_pubkey).unwrap());
    }

    #[test]
    fn test_subjects_are_unique_without_common_name() {
        let mut builder = KeyMaterialBuilder::new();
        let request = || CertificateIssuanceRequest {
            signer: None,
            common_name: None,
            is_authority: true,
            name_constraints: None,
            subject_alt_names: None,
        };
        let a = builder.build(request()).unwrap();
        let b = builder.build(request()).unwrap();
        assert_ne!(
            name_der(a.certificate().subject_name()),
            name_der(b.certificate().subject_name())
        );
    }

    #[test]
    fn test_serial_numbers_are_unique() {
        let mut builder = KeyMaterialBuilder::new();
        let a = self_signed_root(&mut builder);
        let b = self_signed_root(&mut builder);
        let serial_a = a.certificate().serial_number().to_bn().unwrap();
        let serial_b = b.certificate().serial_number().to_bn().unwrap();
        assert_ne!(serial_a, serial_b);
    }

    #[test]
    fn test_child_not_after_clamped_to_issuer() {
        let mut builder = KeyMaterialBuilder::new();
        let root = self_signed_root(&mut builder);
        let child = builder
            .build(CertificateIssuanceRequest {
                signer: Some(&root),
                common_name: None,
                is_authority: false,
                name_constraints: None,
                subject_alt_names: None,
            })
            .unwrap();
        let ordering = child
            .certificate()
            .not_after()
            .compare(root.certificate().not_after())
            .unwrap();
        assert_ne!(ordering, Ordering::Greater);
    }

    #[test]
    fn test_san_extension_present_and_ordered() {
        let mut builder = KeyMaterialBuilder::new();
        let root = self_signed_root(&mut builder);
        let sans = SubjectAltNameSet {
            entries: vec![
                SanEntry {
                    kind: GeneralNameKind::Dns,
                    value: "test.example.com".to_string(),
                },
                SanEntry {
                    kind: GeneralNameKind::Ip,
                    value: "10.0.0.1".to_string(),
                },
            ],
        };
        let leaf = builder
            .build(CertificateIssuanceRequest {
                signer: Some(&root),
                common_name: None,
                is_authority: false,
                name_constraints: None,
                subject_alt_names: Some(&sans),
            })
            .unwrap();

        let names = leaf.certificate().subject_alt_names().unwrap();
        let names: Vec<_> = names.iter().collect();
        assert_eq!(names.len(), 2);
        assert_eq!(names[0].dnsname(), Some("test.example.com"));
        assert_eq!(names[1].ipaddress(), Some(&[10u8, 0, 0, 1][..]));
    }

    #[test]
    fn test_empty_san_set_is_omitted() {
        let mut builder = KeyMaterialBuilder::new();
        let root = self_signed_root(&mut builder);
        let empty = SubjectAltNameSet::default();
        let leaf = builder
            .build(CertificateIssuanceRequest {
                signer: Some(&root),
                common_name: Some("no-sans"),
                is_authority: false,
                name_constraints: None,
                subject_alt_names: Some(&empty),
            })
            .unwrap();
        assert!(leaf.certificate().subject_alt_names().is_none());
    }

    #[test]
    fn test_name_constraints_extension_encoding() {
        use x509_parser::prelude::*;

        let mut builder = KeyMaterialBuilder::new();
        let root = self_signed_root(&mut builder);
        let spec = NameConstraintSpec {
            permitted: vec![
                NameConstraintSubtree {
                    kind: GeneralNameKind::Ip,
                    value: "10.0.0.0/255.0.0.0".to_string(),
                },
                NameConstraintSubtree {
                    kind: GeneralNameKind::Dns,
                    value: "example.com".to_string(),
                },
            ],
            excluded: vec![NameConstraintSubtree {
                kind: GeneralNameKind::Dns,
                value: "invalid.example".to_string(),
            }],
        };
        let ca = builder
            .build(CertificateIssuanceRequest {
                signer: Some(&root),
                common_name: Some("Constrained CA"),
                is_authority: true,
                name_constraints: Some(&spec),
                subject_alt_names: None,
            })
            .unwrap();

        let der = ca.certificate().to_der().unwrap();
        let (_, parsed) = X509Certificate::from_der(&der).unwrap();
        let nc = parsed
            .name_constraints()
            .unwrap()
            .expect("name constraints extension present");
        assert!(!nc.critical);
        let permitted = nc.value.permitted_subtrees.as_ref().unwrap();
        assert_eq!(permitted.len(), 2);
        // Extension encodes the IP entry before the DNS entry
        assert!(matches!(permitted[0].base, GeneralName::IPAddress(_)));
        assert!(matches!(
            permitted[1].base,
            GeneralName::DNSName("example.com")
        ));
        let excluded = nc.value.excluded_subtrees.as_ref().unwrap();
        assert_eq!(excluded.len(), 1);
    }

    #[test]
    fn test_empty_name_constraints_is_omitted() {
        use x509_parser::prelude::*;

        let mut builder = KeyMaterialBuilder::new();
        let root = self_signed_root(&mut builder);
        let empty = NameConstraintSpec::default();
        let ca = builder
            .build(CertificateIssuanceRequest {
                signer: Some(&root),
                common_name: Some("Unconstrained CA"),
                is_authority: true,
                name_constraints: Some(&empty),
                subject_alt_names: None,
            })
            .unwrap();

        let der = ca.certificate().to_der().unwrap();
        let (_, parsed) = X509Certificate::from_der(&der).unwrap();
        assert!(parsed.name_constraints().unwrap().is_none());
    }

    #[test]
    fn test_basic_constraints_critical_and_ca_flag() {
        use x509_parser::prelude::*;

        let mut builder = KeyMaterialBuilder::new();
        let root = self_signed_root(&mut builder);
        let leaf = builder
            .build(CertificateIssuanceRequest {
                signer: Some(&root),
                common_name: None,
                is_authority: false,
                name_constraints: None,
                subject_alt_names: None,
            })
            .unwrap();

        for (material, expect_ca) in [(&root, true), (&leaf, false)] {
            let der = material.certificate().to_der().unwrap();
            let (_, parsed) = X509Certificate::from_der(&der).unwrap();
            let bc = parsed
                .basic_constraints()
                .unwrap()
                .expect("basic constraints present");
            assert!(bc.critical);
            assert_eq!(bc.value.ca, expect_ca);
        }
    }
}
