// SPDX-FileCopyrightText: © 2025 The dice-verify contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Synthetic certificate chains for unit tests.
//!
//! Certificates are built with real P-256 keys and real ECDSA signatures so
//! the signature walk, CRL signer search and self-signed detection run the
//! same code paths as production input.

use p256::ecdsa::{signature::Signer, Signature, SigningKey};
use rand_core::OsRng;
use sha2::{Digest, Sha256};

use dice_types::{
    BasicConstraints, Certificate, CertificateRevocationList, CrlEntry, KeyUsage, PublicKey,
    TcbInfo, TcbRevocation, UeidExtension,
};

use crate::oids;

/// A named key pair acting as one chain participant.
pub(crate) struct TestCa {
    pub subject: String,
    pub key: SigningKey,
}

impl TestCa {
    pub fn new(subject: &str) -> Self {
        Self {
            subject: subject.to_string(),
            key: SigningKey::random(&mut OsRng),
        }
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey::P256(*self.key.verifying_key())
    }

    /// Truncated digest of the public key, used as SKI/AKI value.
    pub fn key_id(&self) -> Vec<u8> {
        let point = self.key.verifying_key().to_encoded_point(false);
        Sha256::digest(point.as_bytes())[..20].to_vec()
    }

    pub fn self_signed(&self) -> Certificate {
        CertBuilder::ca(&self.subject).build(self, self)
    }

    /// Issues a CA certificate for `subject` named `subject_name`.
    pub fn issue(&self, subject: &TestCa, subject_name: &str) -> Certificate {
        CertBuilder::ca(subject_name).build(subject, self)
    }

    pub fn sign_der(&self, message: &[u8]) -> Vec<u8> {
        let signature: Signature = self.key.sign(message);
        signature.to_der().as_bytes().to_vec()
    }
}

pub(crate) struct CertBuilder {
    subject: String,
    serial: Option<Vec<u8>>,
    basic_constraints: Option<BasicConstraints>,
    key_usage: Option<KeyUsage>,
    crl_url: Option<String>,
    extended_key_usage: Vec<String>,
    ueid: Option<UeidExtension>,
    tcb_infos: Vec<TcbInfo>,
    critical_extensions: Vec<String>,
}

impl CertBuilder {
    /// A CA certificate: cert-sign key usage, CA:true without path length.
    pub fn ca(subject: &str) -> Self {
        Self {
            subject: subject.to_string(),
            serial: None,
            basic_constraints: Some(BasicConstraints {
                ca: true,
                path_len: None,
            }),
            key_usage: Some(KeyUsage {
                digital_signature: false,
                key_cert_sign: true,
            }),
            crl_url: None,
            extended_key_usage: Vec::new(),
            ueid: None,
            tcb_infos: Vec::new(),
            critical_extensions: vec![oids::BASIC_CONSTRAINTS.to_string()],
        }
    }

    /// A leaf certificate: digital-signature key usage, no CA constraint.
    pub fn leaf(subject: &str) -> Self {
        Self {
            subject: subject.to_string(),
            serial: None,
            basic_constraints: None,
            key_usage: Some(KeyUsage {
                digital_signature: true,
                key_cert_sign: false,
            }),
            crl_url: None,
            extended_key_usage: Vec::new(),
            ueid: None,
            tcb_infos: Vec::new(),
            critical_extensions: Vec::new(),
        }
    }

    pub fn serial(mut self, serial: &[u8]) -> Self {
        self.serial = Some(serial.to_vec());
        self
    }

    pub fn crl_url(mut self, url: &str) -> Self {
        self.crl_url = Some(url.to_string());
        self
    }

    pub fn eku(mut self, purpose: &str) -> Self {
        self.extended_key_usage.push(purpose.to_string());
        self
    }

    pub fn ueid(mut self, uid: &[u8], family: u8) -> Self {
        self.ueid = Some(UeidExtension {
            uid: uid.to_vec(),
            family,
        });
        self
    }

    pub fn tcb_info(mut self, tcb_info: TcbInfo) -> Self {
        self.tcb_infos.push(tcb_info);
        self
    }

    pub fn build(self, subject: &TestCa, issuer: &TestCa) -> Certificate {
        let serial = self
            .serial
            .unwrap_or_else(|| Sha256::digest(self.subject.as_bytes())[..8].to_vec());
        let mut tbs = Vec::new();
        tbs.extend_from_slice(self.subject.as_bytes());
        tbs.extend_from_slice(issuer.subject.as_bytes());
        tbs.extend_from_slice(&serial);
        tbs.extend_from_slice(&subject.key_id());
        let signature = issuer.sign_der(&tbs);
        let mut der = tbs.clone();
        der.extend_from_slice(&signature);
        Certificate {
            subject: self.subject,
            issuer: issuer.subject.clone(),
            serial_number: serial,
            public_key: subject.public_key(),
            der,
            tbs,
            signature,
            basic_constraints: self.basic_constraints,
            key_usage: self.key_usage,
            subject_key_id: Some(subject.key_id()),
            authority_key_id: Some(issuer.key_id()),
            crl_url: self.crl_url,
            extended_key_usage: self.extended_key_usage,
            ueid: self.ueid,
            tcb_infos: self.tcb_infos,
            critical_extensions: self.critical_extensions,
        }
    }
}

/// Builds a CRL signed by `signer` listing the given entries.
pub(crate) fn build_crl(
    signer: &TestCa,
    next_update: Option<u64>,
    entries: Vec<CrlEntry>,
) -> CertificateRevocationList {
    let mut tbs = Vec::new();
    tbs.extend_from_slice(signer.subject.as_bytes());
    for entry in &entries {
        tbs.extend_from_slice(&entry.serial_number);
    }
    let signature = signer.sign_der(&tbs);
    CertificateRevocationList {
        issuer: signer.subject.clone(),
        next_update,
        tbs,
        signature,
        entries,
    }
}

pub(crate) fn serial_entry(serial: &[u8]) -> CrlEntry {
    CrlEntry {
        serial_number: serial.to_vec(),
        tcb_revocation: None,
    }
}

pub(crate) fn tcb_entry(serial: &[u8], revocation: TcbRevocation) -> CrlEntry {
    CrlEntry {
        serial_number: serial.to_vec(),
        tcb_revocation: Some(revocation),
    }
}

/// In-memory CRL provider keyed by distribution point URL.
#[derive(Default)]
pub(crate) struct MapCrlProvider {
    pub crls: std::collections::HashMap<String, CertificateRevocationList>,
}

impl MapCrlProvider {
    pub fn with(mut self, url: &str, crl: CertificateRevocationList) -> Self {
        self.crls.insert(url.to_string(), crl);
        self
    }
}

impl crate::traits::CrlProvider for MapCrlProvider {
    fn get_crl(&self, url: &str) -> anyhow::Result<CertificateRevocationList> {
        self.crls
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no CRL at {url}"))
    }
}

/// Far-future next-update timestamp for CRLs that should count as fresh.
pub(crate) const FRESH: Option<u64> = Some(u64::MAX);
