// crates/engine/src/domain/policy.rs

//! Server trust evaluation: domain check, chain validation, pin matching.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::crypto::chain::chain_for_pinning;
use crate::domain::error::EngineResult;
use crate::domain::pinning;
use crate::domain::types::{PinningMode, PolicyConfig, ServerTrust, TrustAnchors, TrustEvaluation};
use crate::domain::verify::{Acceptance, Rejection, TrustDecision};

/// Decide whether to trust `trust` for `domain` under `config`.
///
/// Steps run in a fixed order and the first failing one decides:
/// 1. domain match (when requested and a non-empty domain is given),
/// 2. without pinning: system chain validity, or `allow_invalid_certificates`,
/// 3. with pinning: a non-empty pinned set, then chain validity against the
///    system roots plus the pinned certificates (skippable only through
///    `allow_invalid_certificates`),
/// 4. pin membership over the validated chain, or the presented chain when
///    validation did not produce one.
pub fn decide(config: &PolicyConfig, trust: &dyn ServerTrust, domain: Option<&str>) -> TrustDecision {
    let mode = config.pinning_mode();
    let domain = domain.filter(|d| !d.is_empty());

    if config.validates_domain_name {
        if let Some(domain) = domain {
            let matched = trust.matches_domain(domain).unwrap_or_else(|e| {
                tracing::warn!(domain, error = %e, "domain check failed to run");
                false
            });
            if !matched {
                tracing::debug!(domain, "certificate is not valid for domain");
                return TrustDecision::Rejected(Rejection::DomainMismatch);
            }
        }
    }

    if !mode.is_pinning() {
        if config.allow_invalid_certificates && config.validates_domain_name && domain.is_some() {
            tracing::warn!("domain validation without pinning cannot authenticate an invalid chain");
        }
        let valid = run_evaluation(trust, TrustAnchors::System).map_or(false, |e| e.valid);
        return if valid {
            TrustDecision::Accepted(Acceptance::SystemTrust)
        } else if config.allow_invalid_certificates {
            tracing::warn!("accepting chain that failed validation: invalid certificates allowed");
            TrustDecision::Accepted(Acceptance::InvalidCertificatesAllowed)
        } else {
            tracing::debug!("chain failed system validation");
            TrustDecision::Rejected(Rejection::UntrustedChain)
        };
    }

    let pinned = config.pinned_certificates();
    if pinned.is_empty() {
        tracing::debug!(%mode, "pinning enabled with no pinned certificates");
        return TrustDecision::Rejected(Rejection::NoPinnedCertificates);
    }

    let evaluation = run_evaluation(trust, TrustAnchors::SystemAndPinned(pinned)).filter(|e| e.valid);
    if evaluation.is_none() {
        if !config.allow_invalid_certificates {
            tracing::debug!(%mode, "chain failed validation against system and pinned anchors");
            return TrustDecision::Rejected(Rejection::UntrustedChain);
        }
        tracing::warn!(%mode, "chain failed validation: continuing to pin check, invalid certificates allowed");
    }

    let chain = chain_for_pinning(trust, evaluation.as_ref());
    if chain.is_empty() {
        tracing::debug!("no certificates to match against pins");
        return TrustDecision::Rejected(Rejection::EmptyChain);
    }

    if pinning::matches(mode, &chain, pinned, config.pinned_public_keys()) {
        TrustDecision::Accepted(if mode == PinningMode::PublicKey {
            Acceptance::PublicKeyPinned
        } else {
            Acceptance::CertificatePinned
        })
    } else {
        tracing::debug!(%mode, chain_len = chain.len(), "no pinned certificate in chain");
        TrustDecision::Rejected(Rejection::PinMismatch)
    }
}

fn run_evaluation(trust: &dyn ServerTrust, anchors: TrustAnchors<'_>) -> Option<TrustEvaluation> {
    match trust.evaluate(anchors) {
        Ok(evaluation) => Some(evaluation),
        Err(e) => {
            tracing::warn!(error = %e, "trust evaluation failed to run");
            None
        }
    }
}

/// Shareable security policy.
///
/// Evaluations read an immutable snapshot of the configuration; updates build
/// a new configuration and swap it in, so an evaluation never observes a
/// half-applied change.
pub struct SecurityPolicy {
    config: RwLock<Arc<PolicyConfig>>,
}

impl SecurityPolicy {
    pub fn new(config: PolicyConfig) -> Self {
        Self { config: RwLock::new(Arc::new(config)) }
    }

    /// No pinning, invalid certificates rejected, domain names validated.
    pub fn default_policy() -> Self {
        Self::new(PolicyConfig::secure_default())
    }

    pub fn with_pinned_certificates<I>(mode: PinningMode, certificates: I) -> Self
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        Self::new(PolicyConfig::with_pinned_certificates(mode, certificates))
    }

    /// Current configuration snapshot.
    pub fn config(&self) -> Arc<PolicyConfig> {
        let guard = self.config.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    pub fn replace(&self, config: PolicyConfig) {
        let mut guard = self.config.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Arc::new(config);
    }

    /// Apply `f` to a copy of the configuration and publish the result.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut PolicyConfig),
    {
        let mut guard = self.config.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut next = PolicyConfig::clone(&guard);
        f(&mut next);
        *guard = Arc::new(next);
    }

    pub fn pinning_mode(&self) -> PinningMode {
        self.config().pinning_mode()
    }

    pub fn set_pinned_certificates<I>(&self, certificates: I)
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        self.update(|c| c.set_pinned_certificates(certificates));
    }

    pub fn set_allow_invalid_certificates(&self, allow: bool) {
        self.update(|c| c.allow_invalid_certificates = allow);
    }

    pub fn set_validates_domain_name(&self, validate: bool) {
        self.update(|c| c.validates_domain_name = validate);
    }

    /// Whether the server trust should be accepted. A `None` domain skips the
    /// domain check for this call.
    pub fn evaluate(&self, trust: &dyn ServerTrust, domain: Option<&str>) -> bool {
        self.evaluate_detailed(trust, domain).is_trusted()
    }

    pub fn evaluate_detailed(&self, trust: &dyn ServerTrust, domain: Option<&str>) -> TrustDecision {
        let config = self.config();
        decide(&config, trust, domain)
    }

    pub fn to_json(&self) -> EngineResult<String> {
        self.config().to_json()
    }

    pub fn from_json(json: &str) -> EngineResult<Self> {
        PolicyConfig::from_json(json).map(Self::new)
    }
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        Self::default_policy()
    }
}

impl Clone for SecurityPolicy {
    fn clone(&self) -> Self {
        Self::new(PolicyConfig::clone(&self.config()))
    }
}

impl std::fmt::Debug for SecurityPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SecurityPolicy").field(&*self.config()).finish()
    }
}

impl From<PolicyConfig> for SecurityPolicy {
    fn from(config: PolicyConfig) -> Self {
        Self::new(config)
    }
}

impl Serialize for SecurityPolicy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        PolicyConfig::serialize(&self.config(), serializer)
    }
}

impl<'de> Deserialize<'de> for SecurityPolicy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        PolicyConfig::deserialize(deserializer).map(Self::new)
    }
}
