use std::sync::Arc;

use trustpin_engine as tp;
use trustpin_engine::domain::error::EngineError;

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum FfiError {
    #[error("{message}")]
    Generic { message: String },
}

impl From<EngineError> for FfiError {
    fn from(e: EngineError) -> Self {
        FfiError::Generic {
            message: e.to_string(),
        }
    }
}

// ===== FFI types mirroring the public Rust API (FFI-friendly) =====

#[derive(uniffi::Enum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiPinningMode { None, PublicKey, Certificate }

impl From<FfiPinningMode> for tp::PinningMode {
    fn from(v: FfiPinningMode) -> Self {
        match v { FfiPinningMode::None => tp::PinningMode::None, FfiPinningMode::PublicKey => tp::PinningMode::PublicKey, FfiPinningMode::Certificate => tp::PinningMode::Certificate }
    }
}

impl From<tp::PinningMode> for FfiPinningMode {
    fn from(v: tp::PinningMode) -> Self {
        match v { tp::PinningMode::None => FfiPinningMode::None, tp::PinningMode::PublicKey => FfiPinningMode::PublicKey, tp::PinningMode::Certificate => FfiPinningMode::Certificate }
    }
}

#[derive(uniffi::Record, Debug, Clone, PartialEq, Eq)]
pub struct FfiPolicyConfig {
    pub pinning_mode: FfiPinningMode,
    pub pinned_certificates: Vec<Vec<u8>>, // raw certificate bytes, normally DER
    pub allow_invalid_certificates: bool,
    pub validates_domain_name: bool,
}

impl From<FfiPolicyConfig> for tp::PolicyConfig {
    fn from(v: FfiPolicyConfig) -> Self {
        let mut cfg = tp::PolicyConfig::with_pinned_certificates(v.pinning_mode.into(), v.pinned_certificates);
        cfg.allow_invalid_certificates = v.allow_invalid_certificates;
        cfg.validates_domain_name = v.validates_domain_name;
        cfg
    }
}

impl From<&tp::PolicyConfig> for FfiPolicyConfig {
    fn from(v: &tp::PolicyConfig) -> Self {
        FfiPolicyConfig {
            pinning_mode: v.pinning_mode().into(),
            pinned_certificates: v.pinned_certificates().iter().cloned().collect(),
            allow_invalid_certificates: v.allow_invalid_certificates,
            validates_domain_name: v.validates_domain_name,
        }
    }
}

impl FfiPolicyConfig {
    pub fn defaults() -> Self {
        Self::from(&tp::PolicyConfig::secure_default())
    }
}

// ===== Decision mappings =====

#[derive(uniffi::Enum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiAcceptance { SystemTrust, InvalidCertificatesAllowed, CertificatePinned, PublicKeyPinned }

#[derive(uniffi::Enum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiRejection { DomainMismatch, UntrustedChain, NoPinnedCertificates, EmptyChain, PinMismatch }

#[derive(uniffi::Record, Debug, Clone, PartialEq, Eq)]
pub struct FfiTrustDecision {
    pub trusted: bool,
    pub acceptance: Option<FfiAcceptance>,
    pub rejection: Option<FfiRejection>,
}

impl From<tp::TrustDecision> for FfiTrustDecision {
    fn from(v: tp::TrustDecision) -> Self {
        match v {
            tp::TrustDecision::Accepted(a) => FfiTrustDecision {
                trusted: true,
                acceptance: Some(match a { tp::Acceptance::SystemTrust => FfiAcceptance::SystemTrust, tp::Acceptance::InvalidCertificatesAllowed => FfiAcceptance::InvalidCertificatesAllowed, tp::Acceptance::CertificatePinned => FfiAcceptance::CertificatePinned, tp::Acceptance::PublicKeyPinned => FfiAcceptance::PublicKeyPinned }),
                rejection: None,
            },
            tp::TrustDecision::Rejected(r) => FfiTrustDecision {
                trusted: false,
                acceptance: None,
                rejection: Some(match r { tp::Rejection::DomainMismatch => FfiRejection::DomainMismatch, tp::Rejection::UntrustedChain => FfiRejection::UntrustedChain, tp::Rejection::NoPinnedCertificates => FfiRejection::NoPinnedCertificates, tp::Rejection::EmptyChain => FfiRejection::EmptyChain, tp::Rejection::PinMismatch => FfiRejection::PinMismatch }),
            },
        }
    }
}

// ===== Policy object =====

/// Shared policy handle. Foreign callers pass the presented chain as DER
/// blobs, leaf first.
#[derive(uniffi::Object, Debug)]
pub struct FfiSecurityPolicy {
    inner: tp::SecurityPolicy,
}

#[uniffi::export]
impl FfiSecurityPolicy {
    #[uniffi::constructor]
    pub fn new(config: FfiPolicyConfig) -> Arc<Self> {
        Arc::new(Self { inner: tp::SecurityPolicy::new(config.into()) })
    }

    #[uniffi::constructor]
    pub fn default_policy() -> Arc<Self> {
        Arc::new(Self { inner: tp::default_policy() })
    }

    #[uniffi::constructor]
    pub fn from_json(json: String) -> Result<Arc<Self>, FfiError> {
        let inner = tp::SecurityPolicy::from_json(&json)?;
        Ok(Arc::new(Self { inner }))
    }

    pub fn config(&self) -> FfiPolicyConfig {
        FfiPolicyConfig::from(&*self.inner.config())
    }

    pub fn to_json(&self) -> Result<String, FfiError> {
        self.inner.to_json().map_err(FfiError::from)
    }

    pub fn set_pinned_certificates(&self, certificates: Vec<Vec<u8>>) {
        self.inner.set_pinned_certificates(certificates);
    }

    pub fn set_allow_invalid_certificates(&self, allow: bool) {
        self.inner.set_allow_invalid_certificates(allow);
    }

    pub fn set_validates_domain_name(&self, validate: bool) {
        self.inner.set_validates_domain_name(validate);
    }

    pub fn evaluate(&self, chain: Vec<Vec<u8>>, domain: Option<String>) -> bool {
        self.evaluate_detailed(chain, domain).trusted
    }

    pub fn evaluate_detailed(&self, chain: Vec<Vec<u8>>, domain: Option<String>) -> FfiTrustDecision {
        let trust = tp::OpenSslServerTrust::new(chain);
        self.inner.evaluate_detailed(&trust, domain.as_deref()).into()
    }
}

// ===== High-level API, mirroring Rust surface =====

#[uniffi::export]
pub fn default_policy_config_ffi() -> FfiPolicyConfig {
    FfiPolicyConfig::defaults()
}

#[uniffi::export]
pub fn policy_with_pinning_mode_ffi(mode: FfiPinningMode) -> Result<Arc<FfiSecurityPolicy>, FfiError> {
    let inner = tp::policy_with_pinning_mode(mode.into())?;
    Ok(Arc::new(FfiSecurityPolicy { inner }))
}

#[uniffi::export]
pub fn evaluate_server_trust_ffi(policy: Arc<FfiSecurityPolicy>, chain: Vec<Vec<u8>>, domain: Option<String>) -> bool {
    policy.evaluate(chain, domain)
}

#[cfg(feature = "bundle")]
#[uniffi::export]
pub fn certificates_in_dir_ffi(dir: String) -> Result<Vec<Vec<u8>>, FfiError> {
    let certificates = tp::certificates_in_dir(dir)?;
    Ok(certificates.into_iter().collect())
}

#[uniffi::export]
pub fn public_key_for_certificate_ffi(certificate: Vec<u8>) -> Option<Vec<u8>> {
    tp::subject_public_key(&certificate)
}

uniffi::setup_scaffolding!();
