use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PinningModeError {
    #[error("Invalid pinning mode '{0}': expected 'none', 'public-key' or 'certificate'")]
    Unknown(String),
}

/// How presented certificates are compared against the pinned set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PinningMode {
    /// No pinning; only ordinary chain validation applies.
    #[default]
    None,
    /// Accept when any certificate in the chain carries a pinned public key.
    PublicKey,
    /// Accept when any certificate in the chain byte-equals a pinned certificate.
    Certificate,
}

impl PinningMode {
    pub fn is_pinning(self) -> bool {
        !matches!(self, PinningMode::None)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PinningMode::None => "none",
            PinningMode::PublicKey => "public-key",
            PinningMode::Certificate => "certificate",
        }
    }
}

impl fmt::Display for PinningMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PinningMode {
    type Err = PinningModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(PinningMode::None),
            "public-key" | "publickey" | "public_key" => Ok(PinningMode::PublicKey),
            "certificate" | "cert" => Ok(PinningMode::Certificate),
            _ => Err(PinningModeError::Unknown(s.to_string())),
        }
    }
}

/// Anchor set handed to the platform's chain validation.
#[derive(Debug, Clone, Copy)]
pub enum TrustAnchors<'a> {
    /// Built-in (or explicitly configured) system roots only.
    System,
    /// System roots plus the pinned certificates as additional anchors.
    SystemAndPinned(&'a BTreeSet<Vec<u8>>),
}
