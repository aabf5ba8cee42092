// SPDX-FileCopyrightText: © 2025 The dice-verify contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Attestation chain verification library.
//!
//! This crate decides whether a certificate chain retrieved from an untrusted
//! device is structurally valid, anchored to a pinned root, not revoked and
//! bound to the claimed device identity. It runs on the verifier side and
//! operates purely on already-decoded certificate and CRL structures; fetching
//! and parsing are injected collaborators (see [`traits`]).
//!
//! # Architecture
//! - [`chain`] - structural chain verification (signatures, extensions,
//!   identity binding), composing the checks below
//! - [`revocation`] - CRL walk with pluggable revocation predicates
//! - [`tcb_match`] - structural TcbInfo revocation matching for DICE chains
//! - [`root_hash`] - trust anchoring against pinned root digests
//! - [`scheme`] - the S10 (legacy serial-based) and DICE scheme front-ends

use thiserror::Error;

pub mod chain;
pub mod oids;
pub mod revocation;
pub mod root_hash;
pub mod scheme;
pub mod sig;
pub mod tcb_match;
pub mod traits;

#[cfg(test)]
pub(crate) mod testutil;

/// Why a certificate chain failed verification.
///
/// Messages name the specific failed check; operators diagnose devices from
/// these strings, so a generic failure is never surfaced.
#[derive(Debug, Error)]
pub enum ChainVerificationError {
    /// Bad signature, extension, constraint or identity binding in the chain.
    #[error("structural chain verification failed: {0}")]
    Structural(String),

    /// The root certificate digest is not in the pinned trusted set.
    #[error("root hash mismatch: {0}")]
    UntrustedRoot(String),

    /// No certificate in the remaining chain validates the CRL signature.
    /// Always fatal.
    #[error("CRL signature verification failed: {0}")]
    RevocationSignature(String),

    /// The leaf (device) certificate is revoked. Terminal for the chain but
    /// not an internal-consistency fault.
    #[error("device is revoked: {0}")]
    DeviceRevoked(String),

    /// A certificate above the leaf is revoked. Always fatal.
    #[error("intermediate certificate is revoked: {0}")]
    IntermediateRevoked(String),

    /// An injected collaborator (CRL fetch, parser) failed.
    #[error("collaborator failure: {0:#}")]
    Collaborator(#[from] anyhow::Error),
}
