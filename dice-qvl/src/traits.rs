// SPDX-FileCopyrightText: © 2025 The dice-verify contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Collaborator interfaces injected into the verification engine.
//!
//! Implementations own all I/O: HTTP fetching, the proprietary certificate
//! codec, persistent cache storage. Calls may block; a caller wanting
//! timeouts implements them inside the collaborator.

use anyhow::Result;
use dice_types::{Certificate, CertificateRevocationList};

/// Fetches a CRL from a distribution point URL.
pub trait CrlProvider {
    fn get_crl(&self, url: &str) -> Result<CertificateRevocationList>;
}

/// Decodes raw chain bytes into an ordered certificate sequence, root last.
pub trait CertificateParser {
    fn parse_chain(&self, bytes: &[u8]) -> Result<Vec<Certificate>>;
}

/// Externally owned cache of device ids already found revoked.
///
/// The cache is advisory: the authoritative CRL check always runs, so a late
/// `mark_revoked` at worst permits one use of a truly revoked device.
pub trait RevocationCache {
    fn is_revoked(&self, device_id: &[u8]) -> bool;
    fn mark_revoked(&self, device_id: &[u8]);
}

/// Best-effort operator guidance when no valid chain can be found.
///
/// Implementations must not panic and have no way to fail; they typically log
/// onboarding instructions for the device at hand.
pub trait DiagnosticsFallback {
    fn run(&self, device_id: &[u8]);
}
