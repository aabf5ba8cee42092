// SPDX-FileCopyrightText: © 2025 The dice-verify contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Shared types for DICE attestation chain verification.
//!
//! This crate contains type definitions shared across the verification crates:
//! - dice-qvl (chain, revocation and measurement verification)
//! - spdm-discovery (multi-slot chain discovery over SPDM)
//!
//! Certificates and CRLs arrive here already decoded: the proprietary codec
//! and ASN.1 parsing live behind the `CertificateParser` and `CrlProvider`
//! collaborators, which fill in these structures field by field.

use serde::{Deserialize, Serialize};
use serde_human_bytes as hex_bytes;

/// ECDSA public key of a certificate subject.
#[derive(Debug, Clone)]
pub enum PublicKey {
    P256(p256::ecdsa::VerifyingKey),
    P384(p384::ecdsa::VerifyingKey),
}

/// Key usage bits relevant to chain validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyUsage {
    pub digital_signature: bool,
    pub key_cert_sign: bool,
}

/// Basic constraints extension value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasicConstraints {
    pub ca: bool,
    /// Path length constraint; `None` means unrestricted.
    pub path_len: Option<u32>,
}

/// UEID (device identity) extension payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UeidExtension {
    /// Unique device id the certificate is bound to.
    pub uid: Vec<u8>,
    /// Device family code, used to decide IID applicability.
    pub family: u8,
}

/// One firmware measurement digest within a TcbInfo record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FwId {
    /// Digest algorithm OID or name (e.g. "sha384").
    pub hash_alg: String,
    #[serde(with = "hex_bytes")]
    pub digest: Vec<u8>,
}

/// DICE TCB info measurement record.
///
/// Every field is optional: a structurally absent field is distinct from a
/// zero or empty value, and revocation matching treats absent fields in a
/// reference record as wildcards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TcbInfo {
    pub vendor: Option<String>,
    pub model: Option<String>,
    pub version: Option<String>,
    pub layer: Option<u32>,
    pub index: Option<u32>,
    /// Firmware digests; empty when the record carries none.
    #[serde(default)]
    pub fwids: Vec<FwId>,
    pub flags: Option<String>,
    /// Vendor-specific bytes, matched by prefix during revocation checks.
    pub vendor_info: Option<Vec<u8>>,
}

impl TcbInfo {
    /// A record with no fields set at all.
    pub fn is_empty(&self) -> bool {
        *self == TcbInfo::default()
    }
}

/// A certificate decoded by an external parser.
///
/// Index 0 of a chain is the leaf, the last element the root. The verifier
/// never touches the encoding; `der` is carried only for content digests and
/// `tbs`/`signature` for signature checks against the issuer key.
#[derive(Debug, Clone)]
pub struct Certificate {
    pub subject: String,
    pub issuer: String,
    pub serial_number: Vec<u8>,
    pub public_key: PublicKey,
    /// Full encoded certificate.
    pub der: Vec<u8>,
    /// The signed (to-be-signed) portion of the encoding.
    pub tbs: Vec<u8>,
    /// DER-encoded ECDSA signature over `tbs`, made by the issuer.
    pub signature: Vec<u8>,
    pub basic_constraints: Option<BasicConstraints>,
    pub key_usage: Option<KeyUsage>,
    pub subject_key_id: Option<Vec<u8>>,
    pub authority_key_id: Option<Vec<u8>>,
    /// CRL distribution point URL, if the certificate carries one.
    pub crl_url: Option<String>,
    /// Extended key usage OIDs.
    pub extended_key_usage: Vec<String>,
    pub ueid: Option<UeidExtension>,
    /// TcbInfo records from single and multi TcbInfo extensions, in order.
    pub tcb_infos: Vec<TcbInfo>,
    /// OIDs of extensions the parser saw marked critical.
    pub critical_extensions: Vec<String>,
}

impl Certificate {
    pub fn serial_hex(&self) -> String {
        hex::encode(&self.serial_number)
    }
}

/// Revocation payload of a CRL entry.
#[derive(Debug, Clone)]
pub enum TcbRevocation {
    Single(TcbInfo),
    /// Ordered constraint list decoded from a multi-TcbInfo payload.
    Multi(Vec<TcbInfo>),
}

impl TcbRevocation {
    /// The constraint list this payload imposes; a single payload is a
    /// one-element list.
    pub fn constraints(&self) -> &[TcbInfo] {
        match self {
            TcbRevocation::Single(tcb_info) => std::slice::from_ref(tcb_info),
            TcbRevocation::Multi(tcb_infos) => tcb_infos,
        }
    }
}

/// One revoked-certificate entry of a CRL.
#[derive(Debug, Clone)]
pub struct CrlEntry {
    pub serial_number: Vec<u8>,
    /// Structural revocation constraints, present on DICE CRL entries only.
    pub tcb_revocation: Option<TcbRevocation>,
}

/// An issuer-scoped certificate revocation list, already decoded.
#[derive(Debug, Clone)]
pub struct CertificateRevocationList {
    pub issuer: String,
    /// Next scheduled update, as seconds since the Unix epoch.
    pub next_update: Option<u64>,
    /// The signed portion of the encoding.
    pub tbs: Vec<u8>,
    /// DER-encoded ECDSA signature over `tbs`.
    pub signature: Vec<u8>,
    pub entries: Vec<CrlEntry>,
}

/// Pinned root certificate digests per attestation scheme.
///
/// Hex-encoded SHA-256 digests of the root certificate encoding. An empty or
/// all-blank set disables anchoring for that scheme; test and development
/// deployments use this escape deliberately.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrustedRootHashes {
    #[serde(default)]
    pub s10: Vec<String>,
    #[serde(default)]
    pub dice: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tcb_info_decodes_with_absent_fields_and_hex_digests() {
        let json = r#"{
            "vendor": "intel.com",
            "model": "Agilex",
            "fwids": [{"hash_alg": "sha384", "digest": "aabb"}]
        }"#;
        let tcb_info: TcbInfo = serde_json::from_str(json).unwrap();
        assert_eq!(tcb_info.vendor.as_deref(), Some("intel.com"));
        assert_eq!(tcb_info.layer, None);
        assert_eq!(tcb_info.fwids[0].digest, vec![0xaa, 0xbb]);
        assert!(!tcb_info.is_empty());
    }

    #[test]
    fn empty_tcb_info_record_is_detected() {
        let tcb_info: TcbInfo = serde_json::from_str("{}").unwrap();
        assert!(tcb_info.is_empty());
    }

    #[test]
    fn trusted_root_hashes_default_missing_schemes_to_empty() {
        let hashes: TrustedRootHashes = serde_json::from_str(r#"{"dice": ["ab12"]}"#).unwrap();
        assert!(hashes.s10.is_empty());
        assert_eq!(hashes.dice, vec!["ab12".to_string()]);
    }
}
