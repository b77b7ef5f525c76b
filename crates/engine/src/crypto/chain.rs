//! Certificate chain extraction.

use openssl::x509::X509;

use crate::domain::types::{ServerTrust, TrustEvaluation};

/// Certificates presented by the server, leaf first.
pub fn presented_chain(trust: &dyn ServerTrust) -> Vec<Vec<u8>> {
    trust.presented_chain()
}

/// The chain pinning should look at: the validated chain when the platform
/// produced one, otherwise what the server presented.
pub fn chain_for_pinning(trust: &dyn ServerTrust, evaluation: Option<&TrustEvaluation>) -> Vec<Vec<u8>> {
    match evaluation.and_then(|e| e.chain.as_ref()) {
        Some(chain) if !chain.is_empty() => chain.clone(),
        _ => presented_chain(trust),
    }
}

/// Split a PEM bundle into DER certificates. Blocks that do not parse are
/// dropped; an unreadable bundle yields an empty chain.
pub fn der_chain_from_pem(pem: &[u8]) -> Vec<Vec<u8>> {
    match X509::stack_from_pem(pem) {
        Ok(certs) => certs.iter().filter_map(|c| c.to_der().ok()).collect(),
        Err(e) => {
            tracing::debug!(error = %e, "PEM bundle did not parse");
            Vec::new()
        }
    }
}
