// SPDX-FileCopyrightText: © 2025 The dice-verify contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Structural verification of a certificate chain.
//!
//! The validator runs every check of the chain contract: issuer signatures,
//! critical-extension whitelisting, key usage, root basic constraints, device
//! identity (UEID) binding, subject-key-identifier continuity, root-hash
//! anchoring, revocation and leaf extended key usage. How an individual
//! failed check is surfaced is up to the injected [`FailureHandler`]; the
//! schemes differ in whether they abort or collect.

use tracing::{debug, error, info, warn};

use dice_types::Certificate;

use crate::{
    oids,
    revocation::{CrlExpiryPolicy, CrlVerifier, RevocationCheck, RevocationOutcome,
        RevocationPredicate},
    root_hash, sig,
    traits::CrlProvider,
    ChainVerificationError,
};

/// Everything one structural verification needs, fixed up front.
#[derive(Clone, Copy)]
pub struct VerifyRequest<'a> {
    /// The chain, leaf first, root last.
    pub chain: &'a [Certificate],
    /// Pinned root digests; empty disables anchoring.
    pub trusted_root_hashes: &'a [String],
    /// Device identity every UEID-bearing certificate must encode.
    pub device_id: &'a [u8],
    /// EKU OIDs of which the leaf must carry at least one; empty means no
    /// requirement.
    pub leaf_key_purposes: &'a [&'a str],
    /// Critical-extension OIDs tolerated beyond the common X.509 set.
    pub known_extension_oids: &'a [&'a str],
    /// Whether the leaf itself must carry a CRL distribution point.
    pub require_leaf_crl: bool,
    pub expiry_policy: CrlExpiryPolicy,
    /// Wall-clock seconds since the Unix epoch for CRL staleness checks.
    pub now: u64,
}

/// How a scheme reacts to an individual failed check.
pub trait FailureHandler {
    fn handle(&mut self, error: ChainVerificationError) -> Result<(), ChainVerificationError>;
}

/// Aborts on the first failed check.
pub struct FailFast;

impl FailureHandler for FailFast {
    fn handle(&mut self, error: ChainVerificationError) -> Result<(), ChainVerificationError> {
        Err(error)
    }
}

/// Records failures and keeps checking, for flows that want a full report.
#[derive(Default)]
pub struct Recording {
    pub failures: Vec<ChainVerificationError>,
}

impl FailureHandler for Recording {
    fn handle(&mut self, error: ChainVerificationError) -> Result<(), ChainVerificationError> {
        warn!("Recorded chain verification failure: {error}");
        self.failures.push(error);
        Ok(())
    }
}

/// Structural chain validator composing revocation and root anchoring.
pub struct ChainVerifier<'a> {
    crl_verifier: CrlVerifier<'a>,
}

impl<'a> ChainVerifier<'a> {
    pub fn new(provider: &'a dyn CrlProvider, predicate: &'a dyn RevocationPredicate) -> Self {
        Self {
            crl_verifier: CrlVerifier::new(provider, predicate),
        }
    }

    /// Runs every check of the chain contract. Failed checks go through
    /// `handler`; fatal revocation conditions (unverifiable CRL signature,
    /// revoked intermediate, collaborator failure) abort regardless.
    pub fn verify(
        &self,
        request: &VerifyRequest,
        handler: &mut dyn FailureHandler,
    ) -> Result<(), ChainVerificationError> {
        info!(
            "Performing X509 validation of certificate chain with {} certificates.",
            request.chain.len()
        );

        if request.chain.len() < 2 {
            // Nothing below can index leaf and root separately.
            return handler.handle(ChainVerificationError::Structural(
                "chain must contain at least two certificates".to_string(),
            ));
        }

        if !self.verify_signatures_and_extensions(request) {
            handler.handle(ChainVerificationError::Structural(
                "parent signature verification in X509 attestation chain failed".to_string(),
            ))?;
        }

        if !self.verify_root_constraints(request) {
            handler.handle(ChainVerificationError::Structural(
                "root certificate does not satisfy CA basic constraints".to_string(),
            ))?;
        }

        if !self.verify_ueid(request) {
            handler.handle(ChainVerificationError::Structural(
                "certificate in X509 attestation chain has invalid UEID extension value"
                    .to_string(),
            ))?;
        }

        if !self.verify_key_identifier_continuity(request) {
            handler.handle(ChainVerificationError::Structural(
                "certificate in X509 attestation chain has invalid SKI extension value"
                    .to_string(),
            ))?;
        }

        if let Some(root) = request.chain.last() {
            if !root_hash::verify_root_hash(root, request.trusted_root_hashes) {
                handler.handle(ChainVerificationError::UntrustedRoot(format!(
                    "root certificate {} is not anchored to a trusted root hash",
                    root.subject
                )))?;
            }
        }

        self.verify_revocation(request, handler)?;

        if !self.verify_leaf_key_purposes(request) {
            handler.handle(ChainVerificationError::Structural(
                "leaf certificate has invalid key usages".to_string(),
            ))?;
        }

        Ok(())
    }

    fn verify_signatures_and_extensions(&self, request: &VerifyRequest) -> bool {
        let chain = request.chain;
        for position in 0..chain.len() {
            let certificate = &chain[position];
            // The root verifies against itself; everything else against its
            // successor in the chain.
            let issuer = chain.get(position + 1).unwrap_or(certificate);
            if !sig::verify_certificate_signature(certificate, issuer) {
                error!(
                    "Signature of certificate {} does not verify against issuer {}.",
                    certificate.subject, issuer.subject
                );
                return false;
            }
            if !self.critical_extensions_known(certificate, request) {
                return false;
            }
            if !self.key_usage_allows(certificate, position == 0) {
                return false;
            }
        }
        true
    }

    fn critical_extensions_known(
        &self,
        certificate: &Certificate,
        request: &VerifyRequest,
    ) -> bool {
        for oid in &certificate.critical_extensions {
            let known = oids::COMMON_EXTENSION_OIDS.contains(&oid.as_str())
                || request.known_extension_oids.contains(&oid.as_str());
            if !known {
                error!(
                    "Certificate {} carries unknown critical extension {}.",
                    certificate.subject, oid
                );
                return false;
            }
        }
        true
    }

    fn key_usage_allows(&self, certificate: &Certificate, is_leaf: bool) -> bool {
        let Some(key_usage) = certificate.key_usage else {
            return true;
        };
        let allowed = if is_leaf {
            key_usage.digital_signature
        } else {
            key_usage.key_cert_sign
        };
        if !allowed {
            error!(
                "Certificate {} key usage does not permit its role in the chain.",
                certificate.subject
            );
        }
        allowed
    }

    /// The last certificate must be a true root: CA:true with no path length
    /// restriction, not an intermediate placed last.
    fn verify_root_constraints(&self, request: &VerifyRequest) -> bool {
        let Some(root) = request.chain.last() else {
            return false;
        };
        match root.basic_constraints {
            Some(bc) if bc.ca && bc.path_len.is_none() => true,
            other => {
                error!(
                    "Root certificate {} basic constraints are not CA without path length: {:?}",
                    root.subject, other
                );
                false
            }
        }
    }

    /// Every certificate carrying a UEID extension must encode exactly the
    /// attested device id; one mismatch fails the whole chain.
    fn verify_ueid(&self, request: &VerifyRequest) -> bool {
        for certificate in request.chain {
            let Some(ueid) = &certificate.ueid else {
                debug!(
                    "Certificate does not contain UEID extension: {}",
                    certificate.subject
                );
                continue;
            };
            if ueid.uid != request.device_id {
                error!(
                    "Certificate {} has UEID extension with uid that does not match device id.\
                     \nExpected: {}\nActual: {}",
                    certificate.subject,
                    hex::encode(request.device_id),
                    hex::encode(&ueid.uid)
                );
                return false;
            }
        }
        true
    }

    /// A certificate naming its issuer's key must name the key identifier its
    /// issuer actually carries.
    fn verify_key_identifier_continuity(&self, request: &VerifyRequest) -> bool {
        let chain = request.chain;
        for position in 0..chain.len().saturating_sub(1) {
            let certificate = &chain[position];
            let issuer = &chain[position + 1];
            let Some(authority_key_id) = &certificate.authority_key_id else {
                continue;
            };
            if issuer.subject_key_id.as_ref() != Some(authority_key_id) {
                error!(
                    "Certificate {} authority key identifier does not match \
                     subject key identifier of issuer {}.",
                    certificate.subject, issuer.subject
                );
                return false;
            }
        }
        true
    }

    fn verify_revocation(
        &self,
        request: &VerifyRequest,
        handler: &mut dyn FailureHandler,
    ) -> Result<(), ChainVerificationError> {
        let check = RevocationCheck {
            chain: request.chain,
            require_leaf_crl: request.require_leaf_crl,
            expiry_policy: request.expiry_policy,
            now: request.now,
        };
        match self.crl_verifier.verify(&check) {
            Ok(RevocationOutcome::Valid) => Ok(()),
            Ok(RevocationOutcome::LeafRevoked(reason)) => {
                handler.handle(ChainVerificationError::DeviceRevoked(format!(
                    "device {} is revoked ({:?})",
                    hex::encode(request.device_id),
                    reason
                )))
            }
            // A missing required distribution point is an ordinary failed
            // check; everything else from the walk is fatal.
            Err(error @ ChainVerificationError::Structural(_)) => handler.handle(error),
            Err(error) => Err(error),
        }
    }

    fn verify_leaf_key_purposes(&self, request: &VerifyRequest) -> bool {
        if request.leaf_key_purposes.is_empty() {
            return true;
        }
        let Some(leaf) = request.chain.first() else {
            return false;
        };
        let matched = leaf
            .extended_key_usage
            .iter()
            .any(|purpose| request.leaf_key_purposes.contains(&purpose.as_str()));
        if !matched {
            error!(
                "Leaf certificate {} extended key usage {:?} contains none of {:?}.",
                leaf.subject, leaf.extended_key_usage, request.leaf_key_purposes
            );
        }
        matched
    }
}
