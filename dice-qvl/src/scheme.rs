// SPDX-FileCopyrightText: © 2025 The dice-verify contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Scheme front-ends over the structural chain validator.
//!
//! The S10 (legacy) scheme binds the device id to the leaf serial number and
//! requires a CRL for every certificate including the leaf. The DICE scheme
//! binds identity through UEID extensions, tolerates a leaf without a
//! distribution point and revokes structurally through TcbInfo records.

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info};

use dice_types::{Certificate, TrustedRootHashes};

use crate::{
    chain::{ChainVerifier, FailFast, VerifyRequest},
    oids,
    revocation::{CrlExpiryPolicy, DiceRevocationPredicate, SerialNumberPredicate},
    traits::{CrlProvider, RevocationCache},
    ChainVerificationError,
};

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

/// Legacy serial-based attestation scheme.
pub struct S10Verifier<'a> {
    crl_provider: &'a dyn CrlProvider,
    trusted_root_hashes: &'a TrustedRootHashes,
    expiry_policy: CrlExpiryPolicy,
}

impl<'a> S10Verifier<'a> {
    pub fn new(
        crl_provider: &'a dyn CrlProvider,
        trusted_root_hashes: &'a TrustedRootHashes,
    ) -> Self {
        Self {
            crl_provider,
            trusted_root_hashes,
            expiry_policy: CrlExpiryPolicy::default(),
        }
    }

    pub fn expiry_policy(mut self, expiry_policy: CrlExpiryPolicy) -> Self {
        self.expiry_policy = expiry_policy;
        self
    }

    /// Verifies a complete chain for the device. The leaf certificate's
    /// serial number must equal the device id.
    pub fn verify_chain(
        &self,
        device_id: &[u8],
        chain: &[Certificate],
    ) -> Result<(), ChainVerificationError> {
        let leaf = chain.first().ok_or_else(|| {
            ChainVerificationError::Structural("chain contains no certificates".to_string())
        })?;
        if leaf.serial_number != device_id {
            return Err(ChainVerificationError::Structural(format!(
                "certificate serial number {} does not match device id {}",
                leaf.serial_hex(),
                hex::encode(device_id)
            )));
        }

        let request = VerifyRequest {
            chain,
            trusted_root_hashes: &self.trusted_root_hashes.s10,
            device_id,
            leaf_key_purposes: &[oids::EKU_CODE_SIGNING],
            known_extension_oids: &[],
            require_leaf_crl: true,
            expiry_policy: self.expiry_policy,
            now: unix_now(),
        };
        ChainVerifier::new(self.crl_provider, &SerialNumberPredicate)
            .verify(&request, &mut FailFast)
    }
}

/// DICE measurement-based attestation scheme.
pub struct DiceVerifier<'a> {
    crl_provider: &'a dyn CrlProvider,
    revocation_cache: &'a dyn RevocationCache,
    trusted_root_hashes: &'a TrustedRootHashes,
    expiry_policy: CrlExpiryPolicy,
}

impl<'a> DiceVerifier<'a> {
    pub fn new(
        crl_provider: &'a dyn CrlProvider,
        revocation_cache: &'a dyn RevocationCache,
        trusted_root_hashes: &'a TrustedRootHashes,
    ) -> Self {
        Self {
            crl_provider,
            revocation_cache,
            trusted_root_hashes,
            expiry_policy: CrlExpiryPolicy::default(),
        }
    }

    pub fn expiry_policy(mut self, expiry_policy: CrlExpiryPolicy) -> Self {
        self.expiry_policy = expiry_policy;
        self
    }

    /// Verifies one DICE chain against the device identity.
    pub fn verify_chain(
        &self,
        device_id: &[u8],
        chain: &[Certificate],
    ) -> Result<(), ChainVerificationError> {
        let request = VerifyRequest {
            chain,
            trusted_root_hashes: &self.trusted_root_hashes.dice,
            device_id,
            leaf_key_purposes: &[oids::EKU_ATTEST_INIT, oids::EKU_ATTEST_LOC],
            known_extension_oids: oids::DICE_EXTENSION_OIDS,
            require_leaf_crl: false,
            expiry_policy: self.expiry_policy,
            now: unix_now(),
        };
        ChainVerifier::new(self.crl_provider, &DiceRevocationPredicate)
            .verify(&request, &mut FailFast)
    }

    /// Verifies the primary (attestation) chain and, when present, the
    /// secondary (IID) chain, consulting the revocation cache around the
    /// flow. The authoritative CRL checks always run regardless of cache
    /// state observed by concurrent verifications.
    pub fn verify_chains(
        &self,
        device_id: &[u8],
        primary: &[Certificate],
        secondary: Option<&[Certificate]>,
    ) -> Result<(), ChainVerificationError> {
        if self.revocation_cache.is_revoked(device_id) {
            return Err(ChainVerificationError::DeviceRevoked(format!(
                "device {} is recorded as revoked",
                hex::encode(device_id)
            )));
        }

        debug!(
            "Verifying chain with {} certificates.",
            primary.len()
        );
        self.mark_if_revoked(device_id, self.verify_chain(device_id, primary))?;

        if let Some(secondary) = secondary.filter(|chain| !chain.is_empty()) {
            debug!(
                "Verifying IID chain with {} certificates.",
                secondary.len()
            );
            self.mark_if_revoked(device_id, self.verify_chain(device_id, secondary))?;
        }

        info!("Verified device chains for {}.", hex::encode(device_id));
        Ok(())
    }

    fn mark_if_revoked(
        &self,
        device_id: &[u8],
        result: Result<(), ChainVerificationError>,
    ) -> Result<(), ChainVerificationError> {
        if matches!(result, Err(ChainVerificationError::DeviceRevoked(_))) {
            self.revocation_cache.mark_revoked(device_id);
        }
        result
    }
}
