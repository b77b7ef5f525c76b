//! Subject public key extraction.
//!
//! Keys are compared in their DER `SubjectPublicKeyInfo` encoding, which is
//! identical for the same key no matter which certificate carries it.

use openssl::x509::X509;

/// SPKI DER of the certificate's subject public key, or `None` when the bytes
/// are not a parseable DER certificate.
pub fn subject_public_key(certificate_der: &[u8]) -> Option<Vec<u8>> {
    let cert = match X509::from_der(certificate_der) {
        Ok(cert) => cert,
        Err(e) => {
            tracing::debug!(error = %e, "skipping malformed certificate");
            return None;
        }
    };
    cert.public_key()
        .and_then(|key| key.public_key_to_der())
        .map_err(|e| tracing::debug!(error = %e, "certificate key is not exportable"))
        .ok()
}

/// Public keys for every certificate, in iteration order. Certificates
/// without an extractable key are left out.
pub fn public_keys_for<'a, I>(certificates: I) -> Vec<Vec<u8>>
where
    I: IntoIterator<Item = &'a Vec<u8>>,
{
    certificates.into_iter().filter_map(|der| subject_public_key(der)).collect()
}
