use crate::domain::error::EngineResult;

use super::core::TrustAnchors;

/// Outcome of running the platform's chain validation once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustEvaluation {
    pub valid: bool,
    /// Validated chain (leaf first, anchor last) when the platform built one.
    pub chain: Option<Vec<Vec<u8>>>,
}

impl TrustEvaluation {
    pub fn invalid() -> Self {
        Self { valid: false, chain: None }
    }
}

/// Capability over a server's presented certificate chain, created per
/// handshake by the connection layer and read-only during evaluation.
///
/// Implementations wrap the local TLS/crypto library; the engine ships an
/// OpenSSL-backed one in `adapters::openssl`.
pub trait ServerTrust {
    /// DER certificates as presented by the server, leaf first.
    fn presented_chain(&self) -> Vec<Vec<u8>>;

    /// Validate the presented chain against the given anchors.
    fn evaluate(&self, anchors: TrustAnchors<'_>) -> EngineResult<TrustEvaluation>;

    /// Whether the leaf certificate is valid for `domain` (CN/SAN, wildcard aware).
    fn matches_domain(&self, domain: &str) -> EngineResult<bool>;
}

impl<T: ServerTrust + ?Sized> ServerTrust for &T {
    fn presented_chain(&self) -> Vec<Vec<u8>> {
        (**self).presented_chain()
    }

    fn evaluate(&self, anchors: TrustAnchors<'_>) -> EngineResult<TrustEvaluation> {
        (**self).evaluate(anchors)
    }

    fn matches_domain(&self, domain: &str) -> EngineResult<bool> {
        (**self).matches_domain(domain)
    }
}
