// SPDX-FileCopyrightText: © 2025 The dice-verify contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Structural TcbInfo revocation matching for DICE chains.
//!
//! A DICE CRL entry can revoke by serial number or by a structural constraint
//! over the certificate's measurement records. The constraint match is
//! deliberately asymmetric: an entry can blacklist a firmware family broadly
//! by setting few fields, but can never match a record that lacks a field the
//! entry specifically requires.

use tracing::debug;

use dice_types::{Certificate, CertificateRevocationList, FwId, TcbInfo};

/// Why a CRL entry revokes a certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevocationReason {
    SerialNumber,
    TcbInfo,
}

/// Finds the reason, if any, this CRL revokes the certificate.
///
/// Serial-number matching runs first; it is the cheapest check and takes
/// priority over measurement matching.
pub fn revocation_reason(
    crl: &CertificateRevocationList,
    certificate: &Certificate,
) -> Option<RevocationReason> {
    if is_revoked_by_serial(crl, certificate) {
        return Some(RevocationReason::SerialNumber);
    }
    if is_revoked_by_tcb_info(crl, certificate) {
        return Some(RevocationReason::TcbInfo);
    }
    None
}

/// True when any CRL entry lists exactly the certificate's serial number.
pub fn is_revoked_by_serial(crl: &CertificateRevocationList, certificate: &Certificate) -> bool {
    crl.entries
        .iter()
        .any(|entry| entry.serial_number == certificate.serial_number)
}

fn is_revoked_by_tcb_info(crl: &CertificateRevocationList, certificate: &Certificate) -> bool {
    if certificate.tcb_infos.is_empty() {
        return false;
    }

    crl.entries
        .iter()
        .filter_map(|entry| entry.tcb_revocation.as_ref())
        .any(|revocation| {
            let constraints = revocation.constraints();
            let matched = !constraints.is_empty()
                && contains_all_reference_measurements(&certificate.tcb_infos, constraints);
            if matched {
                debug!(
                    "Certificate {} matches TcbInfo revocation constraints ({} constraints).",
                    certificate.subject,
                    constraints.len()
                );
            }
            matched
        })
}

/// True when every reference constraint is satisfied by at least one of the
/// certificate's own measurement records.
pub fn contains_all_reference_measurements(
    measurements: &[TcbInfo],
    references: &[TcbInfo],
) -> bool {
    references
        .iter()
        .all(|reference| measurements.iter().any(|m| matches_reference(m, reference)))
}

/// Field-subset match of one candidate record against one reference.
///
/// Fields absent in the reference are wildcards. Fields present must be
/// present and equal in the candidate, except vendor-info, which matches by
/// byte prefix: the reference bytes must equal the candidate's first bytes.
pub fn matches_reference(candidate: &TcbInfo, reference: &TcbInfo) -> bool {
    field_matches(&candidate.vendor, &reference.vendor)
        && field_matches(&candidate.model, &reference.model)
        && field_matches(&candidate.version, &reference.version)
        && field_matches(&candidate.layer, &reference.layer)
        && field_matches(&candidate.index, &reference.index)
        && fwids_match(&candidate.fwids, &reference.fwids)
        && field_matches(&candidate.flags, &reference.flags)
        && vendor_info_matches(&candidate.vendor_info, &reference.vendor_info)
}

fn field_matches<T: PartialEq>(candidate: &Option<T>, reference: &Option<T>) -> bool {
    match reference {
        None => true,
        Some(required) => candidate.as_ref() == Some(required),
    }
}

fn fwids_match(candidate: &[FwId], reference: &[FwId]) -> bool {
    reference.is_empty() || candidate == reference
}

fn vendor_info_matches(candidate: &Option<Vec<u8>>, reference: &Option<Vec<u8>>) -> bool {
    match reference {
        None => true,
        Some(required) => candidate
            .as_ref()
            .is_some_and(|bytes| bytes.len() >= required.len() && bytes.starts_with(required)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{build_crl, tcb_entry, CertBuilder, TestCa, FRESH};
    use dice_types::TcbRevocation;

    fn record(vendor: &str, model: &str) -> TcbInfo {
        TcbInfo {
            vendor: Some(vendor.to_string()),
            model: Some(model.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn reference_with_fewer_fields_matches_superset_candidate() {
        let candidate = TcbInfo {
            vendor: Some("acme".to_string()),
            model: Some("fm9".to_string()),
            layer: Some(1),
            ..Default::default()
        };
        let reference = TcbInfo {
            vendor: Some("acme".to_string()),
            ..Default::default()
        };
        assert!(matches_reference(&candidate, &reference));
        // The reverse direction never matches: the candidate lacks a field
        // the reference requires.
        assert!(!matches_reference(&reference, &candidate));
    }

    #[test]
    fn absent_candidate_field_fails_a_present_reference_field() {
        let candidate = TcbInfo {
            vendor: Some("acme".to_string()),
            ..Default::default()
        };
        let reference = TcbInfo {
            vendor: Some("acme".to_string()),
            layer: Some(0),
            ..Default::default()
        };
        assert!(!matches_reference(&candidate, &reference));
    }

    #[test]
    fn zero_is_distinct_from_absent() {
        let candidate = TcbInfo {
            layer: Some(0),
            ..Default::default()
        };
        let reference = TcbInfo {
            layer: Some(0),
            ..Default::default()
        };
        assert!(matches_reference(&candidate, &reference));
        assert!(!matches_reference(&TcbInfo::default(), &reference));
    }

    #[test]
    fn vendor_info_matches_by_prefix() {
        let candidate = TcbInfo {
            vendor_info: Some(vec![0x12, 0x34]),
            ..Default::default()
        };
        let short_reference = TcbInfo {
            vendor_info: Some(vec![0x12]),
            ..Default::default()
        };
        let long_reference = TcbInfo {
            vendor_info: Some(vec![0x12, 0x34]),
            ..Default::default()
        };
        assert!(matches_reference(&candidate, &short_reference));
        assert!(matches_reference(&candidate, &long_reference));

        // A reference longer than the candidate never matches.
        let shorter_candidate = TcbInfo {
            vendor_info: Some(vec![0x12]),
            ..Default::default()
        };
        assert!(!matches_reference(&shorter_candidate, &long_reference));
    }

    #[test]
    fn fwid_digests_must_be_equal_when_reference_lists_them() {
        let fwid = FwId {
            hash_alg: "sha384".to_string(),
            digest: vec![0xaa; 48],
        };
        let candidate = TcbInfo {
            fwids: vec![fwid.clone()],
            ..Default::default()
        };
        let matching = TcbInfo {
            fwids: vec![fwid],
            ..Default::default()
        };
        let different = TcbInfo {
            fwids: vec![FwId {
                hash_alg: "sha384".to_string(),
                digest: vec![0xbb; 48],
            }],
            ..Default::default()
        };
        assert!(matches_reference(&candidate, &matching));
        assert!(!matches_reference(&candidate, &different));
    }

    #[test]
    fn serial_match_takes_priority_over_tcb_info() {
        let ca = TestCa::new("CN=ca");
        let device = TestCa::new("CN=device");
        let certificate = CertBuilder::leaf("CN=device")
            .serial(&[0x01, 0x02])
            .tcb_info(record("acme", "fm9"))
            .build(&device, &ca);

        let crl = build_crl(
            &ca,
            FRESH,
            vec![tcb_entry(
                &[0x01, 0x02],
                TcbRevocation::Single(record("acme", "fm9")),
            )],
        );
        assert_eq!(
            revocation_reason(&crl, &certificate),
            Some(RevocationReason::SerialNumber)
        );
    }

    #[test]
    fn multi_constraint_requires_a_match_for_every_entry() {
        let ca = TestCa::new("CN=ca");
        let device = TestCa::new("CN=device");
        let certificate = CertBuilder::leaf("CN=device")
            .serial(&[0x10])
            .tcb_info(record("acme", "fm9"))
            .tcb_info(record("acme", "rom"))
            .build(&device, &ca);

        let both_present = build_crl(
            &ca,
            FRESH,
            vec![tcb_entry(
                &[0x99],
                TcbRevocation::Multi(vec![record("acme", "fm9"), record("acme", "rom")]),
            )],
        );
        assert_eq!(
            revocation_reason(&both_present, &certificate),
            Some(RevocationReason::TcbInfo)
        );

        let one_missing = build_crl(
            &ca,
            FRESH,
            vec![tcb_entry(
                &[0x99],
                TcbRevocation::Multi(vec![record("acme", "fm9"), record("acme", "other")]),
            )],
        );
        assert_eq!(revocation_reason(&one_missing, &certificate), None);
    }

    #[test]
    fn certificate_without_tcb_infos_is_never_structurally_revoked() {
        let ca = TestCa::new("CN=ca");
        let device = TestCa::new("CN=device");
        let certificate = CertBuilder::leaf("CN=device")
            .serial(&[0x10])
            .build(&device, &ca);

        let crl = build_crl(
            &ca,
            FRESH,
            vec![tcb_entry(
                &[0x99],
                TcbRevocation::Single(TcbInfo::default()),
            )],
        );
        assert_eq!(revocation_reason(&crl, &certificate), None);
    }
}
