// crates/engine/src/lib.rs

//! Public facade for the TrustPin engine.
//! Decides whether a server's certificate chain should be trusted, optionally
//! pinned to known certificates or public keys. Re-exports the types
//! consumers (connection layers, FFI) need.

pub mod adapters;
pub mod crypto;
pub mod domain;

use domain::error::EngineResult;

/// Evaluate `trust` against `policy`. A `None` domain skips domain validation.
pub fn evaluate_server_trust(
    policy: &SecurityPolicy,
    trust: &dyn ServerTrust,
    domain: Option<&str>,
) -> bool {
    policy.evaluate(trust, domain)
}

/// Same as [`evaluate_server_trust`] but reports which check decided.
pub fn evaluate_server_trust_detailed(
    policy: &SecurityPolicy,
    trust: &dyn ServerTrust,
    domain: Option<&str>,
) -> TrustDecision {
    policy.evaluate_detailed(trust, domain)
}

/// No pinning, invalid certificates rejected, domain names validated.
pub fn default_policy() -> SecurityPolicy {
    SecurityPolicy::default_policy()
}

/// Policy pinning the certificates found next to the executable (or in
/// `TRUSTPIN_CERT_DIR`).
pub fn policy_with_pinning_mode(mode: PinningMode) -> EngineResult<SecurityPolicy> {
    #[cfg(not(feature = "bundle"))]
    {
        let _ = mode;
        return Err(domain::error::EngineError::Feature("bundle"));
    }
    #[cfg(feature = "bundle")]
    {
        let certificates = adapters::bundle::default_pinned_certificates().iter().cloned();
        Ok(SecurityPolicy::with_pinned_certificates(mode, certificates))
    }
}

/// Policy pinning whatever `source` supplies.
#[cfg(feature = "bundle")]
pub fn policy_from_source(
    mode: PinningMode,
    source: &dyn CertificateSource,
) -> EngineResult<SecurityPolicy> {
    Ok(SecurityPolicy::with_pinned_certificates(mode, source.certificates()?))
}

pub fn policy_with_pinned_certificates<I>(mode: PinningMode, certificates: I) -> SecurityPolicy
where
    I: IntoIterator<Item = Vec<u8>>,
{
    SecurityPolicy::with_pinned_certificates(mode, certificates)
}

// Re-exports for convenience
pub use adapters::openssl::OpenSslServerTrust;
#[cfg(feature = "bundle")]
pub use adapters::bundle::{certificates_in_dir, BundleDirectory, CertificateSource};
pub use crypto::public_key::subject_public_key;
pub use domain::error::EngineError;
pub use domain::policy::SecurityPolicy;
pub use domain::types::{EngineDefaults, PinningMode, PolicyConfig, ServerTrust, TrustAnchors, TrustEvaluation};
pub use domain::verify::{Acceptance, Rejection, TrustDecision};
