// SPDX-FileCopyrightText: © 2025 The dice-verify contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Chain classification and the discovery termination policy.

use dice_types::Certificate;

use crate::{ChainType, ValidChains};

/// Device family codes whose DICE derivation includes an IID PUF alias, read
/// from the UEID extension of the attestation leaf.
pub const IID_CAPABLE_FAMILIES: &[u8] = &[0x34, 0x35];

/// Subject token marking certificates issued under the IID UDS.
const IID_UDS_SUBJECT_TOKEN: &str = "iiduds";

/// Classifies a chain from the naming of its certificates: IID UDS chains
/// carry the IID marker in their subjects, everything else attests the
/// primary efuse identity.
pub fn classify(chain: &[Certificate]) -> ChainType {
    let is_iid = chain.iter().any(|certificate| {
        certificate
            .subject
            .to_ascii_lowercase()
            .contains(IID_UDS_SUBJECT_TOKEN)
    });
    if is_iid {
        ChainType::Iid
    } else {
        ChainType::Attestation
    }
}

/// Whether the device behind this attestation leaf also derives an IID
/// identity that discovery must find.
pub fn requires_iid_chain(leaf: &Certificate) -> bool {
    leaf.ueid
        .as_ref()
        .is_some_and(|ueid| IID_CAPABLE_FAMILIES.contains(&ueid.family))
}

/// Discovery is done once an attestation chain is accepted and either an IID
/// chain is accepted too or the attestation leaf shows none is applicable.
pub fn is_policy_met(valid: &ValidChains) -> bool {
    let Some(attestation) = valid.get(ChainType::Attestation) else {
        return false;
    };
    if valid.get(ChainType::Iid).is_some() {
        return true;
    }
    attestation
        .certificates
        .first()
        .is_some_and(|leaf| !requires_iid_chain(leaf))
}

/// Whether a candidate of this type is redundant given the accepted set:
/// a chain of the same type is already held, or the candidate is IID and the
/// accepted attestation leaf shows the device derives no IID identity.
pub fn equivalent_chain_validated(valid: &ValidChains, chain_type: ChainType) -> bool {
    if valid.get(chain_type).is_some() {
        return true;
    }
    chain_type == ChainType::Iid
        && valid
            .get(ChainType::Attestation)
            .and_then(|held| held.certificates.first())
            .is_some_and(|leaf| !requires_iid_chain(leaf))
}
