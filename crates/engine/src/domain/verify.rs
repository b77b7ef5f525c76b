// crates/engine/src/domain/verify.rs
use serde::Serialize;

/// Why a server was trusted.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum Acceptance {
    /// No pinning; the chain validated against the system anchors.
    SystemTrust,
    /// No pinning; the chain did not validate but invalid certificates are allowed.
    InvalidCertificatesAllowed,
    /// A presented (or validated) certificate byte-equals a pinned certificate.
    CertificatePinned,
    /// A certificate in the chain carries a pinned public key.
    PublicKeyPinned,
}

/// Why a server was rejected. Purely diagnostic; callers of `evaluate` only
/// see `false`.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    DomainMismatch,
    UntrustedChain,
    /// Pinning is enabled but nothing is pinned.
    NoPinnedCertificates,
    EmptyChain,
    PinMismatch,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum TrustDecision {
    Accepted(Acceptance),
    Rejected(Rejection),
}

impl TrustDecision {
    pub fn is_trusted(&self) -> bool {
        matches!(self, TrustDecision::Accepted(_))
    }

    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            TrustDecision::Accepted(_) => None,
            TrustDecision::Rejected(r) => Some(*r),
        }
    }
}

impl From<TrustDecision> for bool {
    fn from(decision: TrustDecision) -> Self {
        decision.is_trusted()
    }
}
