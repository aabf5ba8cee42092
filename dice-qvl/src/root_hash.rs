// SPDX-FileCopyrightText: © 2025 The dice-verify contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Trust anchoring by root certificate digest pinning.

use sha2::{Digest, Sha256};
use tracing::{debug, error};

use dice_types::Certificate;

/// Checks the certificate's content digest against a pinned allow-list.
///
/// `trusted_hashes` holds hex-encoded SHA-256 digests, compared
/// case-insensitively. An empty or all-blank set disables anchoring and
/// accepts every certificate; test and development deployments rely on this
/// escape, production configurations always pin at least one digest.
pub fn verify_root_hash(certificate: &Certificate, trusted_hashes: &[String]) -> bool {
    let pinned: Vec<&str> = trusted_hashes
        .iter()
        .map(|hash| hash.trim())
        .filter(|hash| !hash.is_empty())
        .collect();

    if pinned.is_empty() {
        debug!("No trusted root hash configured, anchoring disabled.");
        return true;
    }

    let digest = hex::encode(Sha256::digest(&certificate.der));
    let trusted = pinned.iter().any(|hash| hash.eq_ignore_ascii_case(&digest));
    if !trusted {
        error!(
            "Root certificate {} digest {} is not in the trusted set.",
            certificate.subject, digest
        );
    }
    trusted
}
