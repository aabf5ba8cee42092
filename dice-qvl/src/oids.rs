// SPDX-FileCopyrightText: © 2025 The dice-verify contributors
//
// SPDX-License-Identifier: Apache-2.0

//! OIDs used during chain verification.

/// X.509 basic constraints extension.
pub const BASIC_CONSTRAINTS: &str = "2.5.29.19";
/// X.509 key usage extension.
pub const KEY_USAGE: &str = "2.5.29.15";
/// X.509 extended key usage extension.
pub const EXTENDED_KEY_USAGE: &str = "2.5.29.37";
/// X.509 subject key identifier extension.
pub const SUBJECT_KEY_IDENTIFIER: &str = "2.5.29.14";
/// X.509 authority key identifier extension.
pub const AUTHORITY_KEY_IDENTIFIER: &str = "2.5.29.35";
/// X.509 authority information access extension.
pub const AUTHORITY_INFO_ACCESS: &str = "1.3.6.1.5.5.7.1.1";
/// X.509 CRL distribution points extension.
pub const CRL_DISTRIBUTION_POINTS: &str = "2.5.29.31";

/// TCG DICE TcbInfo measurement extension.
pub const TCG_DICE_TCB_INFO: &str = "2.23.133.5.4.1";
/// TCG DICE UEID (device identity) extension.
pub const TCG_DICE_UEID: &str = "2.23.133.5.4.4";
/// TCG DICE multi TcbInfo measurement extension.
pub const TCG_DICE_MULTI_TCB_INFO: &str = "2.23.133.5.4.5";

/// Extended key usage: code signing, expected on S10 attestation leaves.
pub const EKU_CODE_SIGNING: &str = "1.3.6.1.5.5.7.3.3";
/// Extended key usage: attestation at initialization, expected on DICE leaves.
pub const EKU_ATTEST_INIT: &str = "2.23.133.8.3";
/// Extended key usage: attestation of location, expected on DICE leaves.
pub const EKU_ATTEST_LOC: &str = "2.23.133.8.5";

/// Critical extensions any chain may carry without being rejected.
pub const COMMON_EXTENSION_OIDS: &[&str] = &[
    BASIC_CONSTRAINTS,
    KEY_USAGE,
    EXTENDED_KEY_USAGE,
    SUBJECT_KEY_IDENTIFIER,
    AUTHORITY_KEY_IDENTIFIER,
    AUTHORITY_INFO_ACCESS,
    CRL_DISTRIBUTION_POINTS,
];

/// Additional critical extensions allowed on DICE measurement chains.
pub const DICE_EXTENSION_OIDS: &[&str] =
    &[TCG_DICE_TCB_INFO, TCG_DICE_MULTI_TCB_INFO, TCG_DICE_UEID];
