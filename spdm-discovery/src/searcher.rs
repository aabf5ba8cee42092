// SPDX-FileCopyrightText: © 2025 The dice-verify contributors
//
// SPDX-License-Identifier: Apache-2.0

//! The slot-by-slot chain search.

use tracing::{debug, error, info, warn};

use dice_qvl::{
    root_hash, scheme::DiceVerifier, sig,
    traits::{CertificateParser, DiagnosticsFallback},
};
use dice_types::{Certificate, TrustedRootHashes};

use crate::{policy, DiscoveryError, SlotChain, SlotTransport, ValidChains};

/// Searches device slots for chains satisfying the discovery policy.
pub struct ChainSearcher<'a> {
    transport: &'a dyn SlotTransport,
    parser: &'a dyn CertificateParser,
    verifier: &'a DiceVerifier<'a>,
    trusted_root_hashes: &'a TrustedRootHashes,
    fallback: &'a dyn DiagnosticsFallback,
}

impl<'a> ChainSearcher<'a> {
    pub fn new(
        transport: &'a dyn SlotTransport,
        parser: &'a dyn CertificateParser,
        verifier: &'a DiceVerifier<'a>,
        trusted_root_hashes: &'a TrustedRootHashes,
        fallback: &'a dyn DiagnosticsFallback,
    ) -> Self {
        Self {
            transport,
            parser,
            verifier,
            trusted_root_hashes,
            fallback,
        }
    }

    /// Walks the filled slots in device order until the chain policy is met.
    ///
    /// Per-slot failures (unparseable bytes, untrusted root, failed chain
    /// verification) are logged and skipped; slots past the point where the
    /// policy is met are never inspected.
    pub fn search_valid_chains(&self, device_id: &[u8]) -> Result<ValidChains, DiscoveryError> {
        info!("*** REQUESTING CERTIFICATE CHAINS ***");
        let filled_slots = match self.transport.get_filled_slots() {
            Ok(slots) => {
                info!("Filled slots: {:?}", slots);
                slots
            }
            Err(e) => {
                error!("GET_DIGEST failed - no filled slots available: {e:#}");
                return Err(self.not_found(device_id));
            }
        };

        let mut valid_chains = ValidChains::new(device_id);
        for slot_id in filled_slots {
            if policy::is_policy_met(&valid_chains) {
                debug!("Policy met, skipping remaining slots.");
                break;
            }
            self.search_in_slot(slot_id, &mut valid_chains);
        }

        if !policy::is_policy_met(&valid_chains) {
            return Err(self.not_found(device_id));
        }
        Ok(valid_chains)
    }

    fn not_found(&self, device_id: &[u8]) -> DiscoveryError {
        self.fallback.run(device_id);
        DiscoveryError::NotFound {
            device_id: hex::encode(device_id),
        }
    }

    fn search_in_slot(&self, slot_id: u8, valid_chains: &mut ValidChains) {
        info!("Requesting chain from slot {}.", slot_id);
        let Some(chain) = self.fetch_trusted_chain(slot_id) else {
            info!("Trusted chain not found in slot {}.", slot_id);
            return;
        };

        let chain_type = policy::classify(&chain);
        debug!(
            "Slot {} holds a {:?} chain with {} certificates.",
            slot_id,
            chain_type,
            chain.len()
        );
        if policy::equivalent_chain_validated(valid_chains, chain_type) {
            debug!("Equivalent chain already validated, skipping slot {}.", slot_id);
            return;
        }

        match self
            .verifier
            .verify_chains(valid_chains.device_id(), &chain, None)
        {
            Ok(()) => {
                info!("Accepted {:?} chain from slot {}.", chain_type, slot_id);
                valid_chains.add(SlotChain {
                    slot_id,
                    chain_type,
                    certificates: chain,
                });
            }
            Err(e) => {
                warn!(
                    "Failed to validate SPDM chain of certificates from slot {}: {}",
                    slot_id, e
                );
            }
        }
    }

    /// Fetches, parses and root-trusts the chain in one slot. Any failure
    /// disqualifies the slot without aborting discovery.
    fn fetch_trusted_chain(&self, slot_id: u8) -> Option<Vec<Certificate>> {
        let bytes = match self.transport.get_certificate_chain(slot_id) {
            Ok(bytes) if !bytes.is_empty() => bytes,
            Ok(_) => {
                warn!("Slot {} returned an empty certificate chain.", slot_id);
                return None;
            }
            Err(e) => {
                warn!("GET_CERTIFICATE failed for slot {}: {e:#}", slot_id);
                return None;
            }
        };

        let chain = match self.parser.parse_chain(&bytes) {
            Ok(chain) if !chain.is_empty() => chain,
            Ok(_) => {
                warn!("Slot {} parsed to an empty chain.", slot_id);
                return None;
            }
            Err(e) => {
                warn!("Failed to parse chain of certificates: {e:#}");
                return None;
            }
        };

        let root = chain.last()?;
        if !sig::is_self_signed(root) {
            warn!(
                "Chain in slot {} does not end in a self-signed root.",
                slot_id
            );
            return None;
        }
        if !root_hash::verify_root_hash(root, &self.trusted_root_hashes.dice) {
            warn!("Root of chain in slot {} is not trusted.", slot_id);
            return None;
        }
        Some(chain)
    }
}
