use std::collections::BTreeSet;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::crypto::public_key::public_keys_for;
use crate::domain::error::EngineResult;

use super::core::PinningMode;

/// Centralized defaults for TrustPin.
/// All opinionated defaults should be defined here for consistency.
pub struct EngineDefaults;

impl EngineDefaults {
    // Security defaults
    pub const PINNING_MODE: PinningMode = PinningMode::None; // System trust only
    pub const ALLOW_INVALID_CERTIFICATES: bool = false; // Fail closed on broken chains
    pub const VALIDATES_DOMAIN_NAME: bool = true; // Wrong-host certificates never pass

    // Bundle loading defaults
    pub const CERTIFICATE_EXTENSION: &'static str = "cer"; // DER files shipped with the app
    pub const CERT_DIR_ENV: &'static str = "TRUSTPIN_CERT_DIR"; // Overrides the executable's directory
}

/// Pinning policy record: mode, pinned certificates and the two flags.
///
/// The pinning mode is fixed at construction. The public keys of the pinned
/// certificates are derived on first use and cached until the pinned set is
/// replaced.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pinning_mode: PinningMode,
    pinned_certificates: BTreeSet<Vec<u8>>,
    /// Trust servers whose chain does not validate. Never bypasses pin matching.
    pub allow_invalid_certificates: bool,
    /// Check the leaf against the requested domain before anything else.
    pub validates_domain_name: bool,
    #[serde(skip)]
    pinned_public_keys: OnceCell<BTreeSet<Vec<u8>>>,
}

impl PolicyConfig {
    /// Secure opinionated defaults: no pinning, no invalid chains, domain checked.
    pub fn secure_default() -> Self {
        Self {
            pinning_mode: EngineDefaults::PINNING_MODE,
            pinned_certificates: BTreeSet::new(),
            allow_invalid_certificates: EngineDefaults::ALLOW_INVALID_CERTIFICATES,
            validates_domain_name: EngineDefaults::VALIDATES_DOMAIN_NAME,
            pinned_public_keys: OnceCell::new(),
        }
    }

    pub fn with_pinning_mode(mode: PinningMode) -> Self {
        Self {
            pinning_mode: mode,
            ..Self::secure_default()
        }
    }

    pub fn with_pinned_certificates<I>(mode: PinningMode, certificates: I) -> Self
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        Self {
            pinning_mode: mode,
            pinned_certificates: certificates.into_iter().collect(),
            ..Self::secure_default()
        }
    }

    pub fn pinning_mode(&self) -> PinningMode {
        self.pinning_mode
    }

    pub fn pinned_certificates(&self) -> &BTreeSet<Vec<u8>> {
        &self.pinned_certificates
    }

    /// Replace the pinned set and drop the cached public keys.
    pub fn set_pinned_certificates<I>(&mut self, certificates: I)
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        self.pinned_certificates = certificates.into_iter().collect();
        self.pinned_public_keys = OnceCell::new();
    }

    /// Subject public keys (SPKI DER) of the pinned certificates. Entries that
    /// fail to parse contribute nothing.
    pub fn pinned_public_keys(&self) -> &BTreeSet<Vec<u8>> {
        self.pinned_public_keys.get_or_init(|| {
            let keys: BTreeSet<Vec<u8>> = public_keys_for(&self.pinned_certificates).into_iter().collect();
            tracing::debug!(
                certificates = self.pinned_certificates.len(),
                keys = keys.len(),
                "derived pinned public keys"
            );
            keys
        })
    }

    pub fn to_json(&self) -> EngineResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> EngineResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self::secure_default()
    }
}

impl PartialEq for PolicyConfig {
    fn eq(&self, other: &Self) -> bool {
        self.pinning_mode == other.pinning_mode
            && self.pinned_certificates == other.pinned_certificates
            && self.allow_invalid_certificates == other.allow_invalid_certificates
            && self.validates_domain_name == other.validates_domain_name
    }
}

impl Eq for PolicyConfig {}

impl std::fmt::Debug for PolicyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyConfig")
            .field("pinning_mode", &self.pinning_mode)
            .field("pinned_certificates_len", &self.pinned_certificates.len())
            .field("allow_invalid_certificates", &self.allow_invalid_certificates)
            .field("validates_domain_name", &self.validates_domain_name)
            .finish()
    }
}
