//! Certificate byte handling: chain extraction and public key derivation.

pub mod chain;
pub mod public_key;
