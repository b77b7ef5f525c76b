//! Pin membership checks for the certificate and public key pinning modes.
//! An empty chain or an empty pinned set never matches.

use std::collections::BTreeSet;

use crate::crypto::public_key::subject_public_key;
use crate::domain::types::PinningMode;

/// Whether `chain` satisfies `mode` against the pinned material.
/// `PinningMode::None` imposes no constraint and always matches.
pub fn matches(
    mode: PinningMode,
    chain: &[Vec<u8>],
    pinned_certificates: &BTreeSet<Vec<u8>>,
    pinned_public_keys: &BTreeSet<Vec<u8>>,
) -> bool {
    let found = match mode {
        PinningMode::None => return true,
        PinningMode::Certificate => matching_certificate(chain, pinned_certificates),
        PinningMode::PublicKey => matching_public_key(chain, pinned_public_keys),
    };
    match found {
        Some(index) => {
            tracing::debug!(%mode, index, "pinned certificate found in chain");
            true
        }
        None => false,
    }
}

/// Index of the first chain certificate that byte-equals a pinned certificate.
pub fn matching_certificate(
    chain: &[Vec<u8>],
    pinned_certificates: &BTreeSet<Vec<u8>>,
) -> Option<usize> {
    if pinned_certificates.is_empty() {
        return None;
    }
    chain.iter().position(|der| pinned_certificates.contains(der))
}

/// Index of the first chain certificate whose subject public key is pinned.
/// Stops extracting keys at the first match.
pub fn matching_public_key(
    chain: &[Vec<u8>],
    pinned_public_keys: &BTreeSet<Vec<u8>>,
) -> Option<usize> {
    if pinned_public_keys.is_empty() {
        return None;
    }
    chain.iter().position(|der| {
        subject_public_key(der)
            .map(|key| pinned_public_keys.contains(&key))
            .unwrap_or(false)
    })
}
