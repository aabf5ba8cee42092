// SPDX-FileCopyrightText: © 2025 The dice-verify contributors
//
// SPDX-License-Identifier: Apache-2.0

//! ECDSA signature checks over already-decoded structures.

use p256::ecdsa::signature::Verifier;

use dice_types::{Certificate, CertificateRevocationList, PublicKey};

/// Verifies a DER-encoded ECDSA signature over `message` with `key`.
///
/// An undecodable signature counts as a failed verification, not an error;
/// the input comes from an untrusted device.
pub fn verify_signature(key: &PublicKey, message: &[u8], signature_der: &[u8]) -> bool {
    match key {
        PublicKey::P256(verifying_key) => {
            let Ok(signature) = p256::ecdsa::Signature::from_der(signature_der) else {
                return false;
            };
            verifying_key.verify(message, &signature).is_ok()
        }
        PublicKey::P384(verifying_key) => {
            let Ok(signature) = p384::ecdsa::Signature::from_der(signature_der) else {
                return false;
            };
            verifying_key.verify(message, &signature).is_ok()
        }
    }
}

/// True when `child`'s signature verifies against `parent`'s public key.
pub fn verify_certificate_signature(child: &Certificate, parent: &Certificate) -> bool {
    verify_signature(&parent.public_key, &child.tbs, &child.signature)
}

/// True when the CRL's signature verifies against `candidate`'s public key.
pub fn verify_crl_signature(crl: &CertificateRevocationList, candidate: &Certificate) -> bool {
    verify_signature(&candidate.public_key, &crl.tbs, &crl.signature)
}

/// A certificate that issued itself: subject equals issuer and the signature
/// verifies with its own key.
pub fn is_self_signed(certificate: &Certificate) -> bool {
    certificate.subject == certificate.issuer
        && verify_certificate_signature(certificate, certificate)
}
