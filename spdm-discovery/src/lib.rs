// SPDX-FileCopyrightText: © 2025 The dice-verify contributors
//
// SPDX-License-Identifier: Apache-2.0

//! SPDM multi-slot certificate chain discovery.
//!
//! SPDM devices hold certificate chains in numbered slots queried via
//! GET_DIGEST and GET_CERTIFICATE. Discovery walks the filled slots in order,
//! parses and root-trusts each candidate chain, classifies it as an
//! attestation or IID chain and verifies it through the DICE chain verifier,
//! stopping as soon as the accepted set satisfies the chain policy. Per-slot
//! failures never abort the search; only an exhausted slot list with an unmet
//! policy does.

use std::collections::HashMap;

use anyhow::Result;
use thiserror::Error;

use dice_types::Certificate;

pub mod policy;
mod searcher;

pub use searcher::ChainSearcher;

/// Classification of a device-held chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainType {
    /// Primary measurement chain rooted in the efuse UDS.
    Attestation,
    /// Identity-independent-derivation variant rooted in the PUF UDS.
    Iid,
}

/// A chain accepted from one device slot.
#[derive(Debug, Clone)]
pub struct SlotChain {
    pub slot_id: u8,
    pub chain_type: ChainType,
    /// Leaf first, root last.
    pub certificates: Vec<Certificate>,
}

/// Chains accepted so far, keyed by type. Grows only; discovery never
/// replaces an accepted chain.
#[derive(Debug)]
pub struct ValidChains {
    device_id: Vec<u8>,
    chains: HashMap<ChainType, SlotChain>,
}

impl ValidChains {
    pub fn new(device_id: &[u8]) -> Self {
        Self {
            device_id: device_id.to_vec(),
            chains: HashMap::new(),
        }
    }

    pub fn device_id(&self) -> &[u8] {
        &self.device_id
    }

    pub fn get(&self, chain_type: ChainType) -> Option<&SlotChain> {
        self.chains.get(&chain_type)
    }

    pub fn add(&mut self, chain: SlotChain) {
        self.chains.insert(chain.chain_type, chain);
    }
}

/// Queries certificate slots on the device. May block.
pub trait SlotTransport {
    /// Slot ids that hold a certificate chain, in device order.
    fn get_filled_slots(&self) -> Result<Vec<u8>>;

    /// Raw chain bytes held in one slot.
    fn get_certificate_chain(&self, slot_id: u8) -> Result<Vec<u8>>;
}

/// Discovery failed to produce a policy-satisfying set of chains.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Every filled slot was examined (or the slot query itself failed)
    /// without satisfying the chain policy.
    #[error("no valid certificate chain found on device {device_id}")]
    NotFound { device_id: String },
}
