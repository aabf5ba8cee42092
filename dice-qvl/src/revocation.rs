// SPDX-FileCopyrightText: © 2025 The dice-verify contributors
//
// SPDX-License-Identifier: Apache-2.0

//! CRL-based revocation verification along a certificate chain.
//!
//! The walk runs from the leaf toward the root. Each certificate that carries
//! a CRL distribution point has its CRL fetched, signature-checked against the
//! remaining chain suffix and queried through a pluggable predicate. Once any
//! certificate has required a CRL, every certificate above it must carry one
//! too; the leaf's requirement alone is relaxable per scheme.

use tracing::{debug, error, warn};

use dice_types::{Certificate, CertificateRevocationList};

use crate::{
    sig,
    tcb_match::{self, RevocationReason},
    traits::CrlProvider,
    ChainVerificationError,
};

/// What to do about a CRL that is missing its next-update time or is past it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CrlExpiryPolicy {
    /// Log a warning and continue. The deployed default.
    #[default]
    Warn,
    /// Treat a stale or undated CRL as a structural failure.
    Reject,
}

/// One revocation pass over a chain, fixed up front.
#[derive(Clone, Copy)]
pub struct RevocationCheck<'a> {
    /// The chain, leaf first, root last.
    pub chain: &'a [Certificate],
    /// Whether the leaf itself must carry a CRL distribution point.
    pub require_leaf_crl: bool,
    pub expiry_policy: CrlExpiryPolicy,
    /// Wall-clock seconds since the Unix epoch for the staleness check.
    pub now: u64,
}

/// Result of a revocation walk that completed without a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevocationOutcome {
    Valid,
    /// The leaf (device) certificate is revoked. Terminal for this chain but
    /// not an internal fault; schemes decide how to surface it.
    LeafRevoked(RevocationReason),
}

/// Decides whether a CRL revokes a certificate.
pub trait RevocationPredicate {
    fn revocation_reason(
        &self,
        crl: &CertificateRevocationList,
        certificate: &Certificate,
    ) -> Option<RevocationReason>;
}

/// Exact serial-number matching, used by the legacy S10 scheme.
pub struct SerialNumberPredicate;

impl RevocationPredicate for SerialNumberPredicate {
    fn revocation_reason(
        &self,
        crl: &CertificateRevocationList,
        certificate: &Certificate,
    ) -> Option<RevocationReason> {
        tcb_match::is_revoked_by_serial(crl, certificate).then_some(RevocationReason::SerialNumber)
    }
}

/// Serial-number or structural TcbInfo matching, used by DICE chains.
pub struct DiceRevocationPredicate;

impl RevocationPredicate for DiceRevocationPredicate {
    fn revocation_reason(
        &self,
        crl: &CertificateRevocationList,
        certificate: &Certificate,
    ) -> Option<RevocationReason> {
        tcb_match::revocation_reason(crl, certificate)
    }
}

/// Walks a chain from leaf toward root, locating and checking CRLs.
pub struct CrlVerifier<'a> {
    provider: &'a dyn CrlProvider,
    predicate: &'a dyn RevocationPredicate,
}

impl<'a> CrlVerifier<'a> {
    pub fn new(provider: &'a dyn CrlProvider, predicate: &'a dyn RevocationPredicate) -> Self {
        Self {
            provider,
            predicate,
        }
    }

    pub fn verify(
        &self,
        check: &RevocationCheck,
    ) -> Result<RevocationOutcome, ChainVerificationError> {
        let chain = check.chain;
        let mut require_crl = check.require_leaf_crl;

        for position in 0..chain.len() {
            // The root terminates the walk; no certificate remains to issue
            // a CRL for it.
            if position + 1 == chain.len() {
                break;
            }
            let certificate = &chain[position];
            debug!(
                "Checking if certificate is revoked based on CRL: {}",
                certificate.subject
            );

            let Some(url) = certificate.crl_url.as_deref() else {
                if require_crl {
                    error!(
                        "Certificate does not have required CRLDistributionPoints extension: {}",
                        certificate.subject
                    );
                    return Err(ChainVerificationError::Structural(format!(
                        "certificate {} has no CRL distribution point",
                        certificate.subject
                    )));
                }
                debug!(
                    "Certificate does not have CRLDistributionPoints extension \
                     but it was not required: {}",
                    certificate.subject
                );
                require_crl = true;
                continue;
            };

            let crl = self.provider.get_crl(url)?;
            self.check_freshness(&crl, check)?;
            self.verify_crl_signature(&crl, &chain[position + 1..])?;

            if let Some(reason) = self.predicate.revocation_reason(&crl, certificate) {
                if position > 0 {
                    error!(
                        "Intermediate certificate {} with serial number {} is revoked ({:?}).",
                        certificate.subject,
                        certificate.serial_hex(),
                        reason
                    );
                    return Err(ChainVerificationError::IntermediateRevoked(format!(
                        "certificate {} with serial number {}",
                        certificate.subject,
                        certificate.serial_hex()
                    )));
                }
                warn!(
                    "Device certificate {} with serial number {} is revoked ({:?}).",
                    certificate.subject,
                    certificate.serial_hex(),
                    reason
                );
                return Ok(RevocationOutcome::LeafRevoked(reason));
            }

            require_crl = true;
        }

        Ok(RevocationOutcome::Valid)
    }

    /// Scans the remaining chain for a certificate whose key validates the
    /// CRL signature. The signer need not be the direct issuer; an ancestor
    /// may sign CRLs for its whole subtree.
    fn verify_crl_signature(
        &self,
        crl: &CertificateRevocationList,
        candidates: &[Certificate],
    ) -> Result<(), ChainVerificationError> {
        for candidate in candidates {
            if sig::verify_crl_signature(crl, candidate) {
                debug!(
                    "Verified CRL signature using public key of certificate: {}",
                    candidate.subject
                );
                return Ok(());
            }
            debug!(
                "Failed to verify CRL signature using public key of certificate: {}",
                candidate.subject
            );
        }
        Err(ChainVerificationError::RevocationSignature(format!(
            "CRL issued by {} is not signed by any remaining chain certificate",
            crl.issuer
        )))
    }

    fn check_freshness(
        &self,
        crl: &CertificateRevocationList,
        check: &RevocationCheck,
    ) -> Result<(), ChainVerificationError> {
        let complaint = match crl.next_update {
            None => Some(format!("CRL issued by {} has no next-update time", crl.issuer)),
            Some(next_update) if next_update < check.now => Some(format!(
                "CRL issued by {} is past its next-update time",
                crl.issuer
            )),
            _ => None,
        };
        let Some(complaint) = complaint else {
            return Ok(());
        };
        match check.expiry_policy {
            CrlExpiryPolicy::Warn => {
                warn!("{complaint}.");
                Ok(())
            }
            CrlExpiryPolicy::Reject => Err(ChainVerificationError::Structural(complaint)),
        }
    }
}
