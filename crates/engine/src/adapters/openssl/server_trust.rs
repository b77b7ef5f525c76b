// adapters/openssl/server_trust.rs

use std::collections::BTreeSet;
use std::net::IpAddr;

use openssl::ssl::SslRef;
use openssl::stack::Stack;
use openssl::x509::store::{X509Store, X509StoreBuilder};
use openssl::x509::verify::{X509VerifyFlags, X509VerifyParam};
use openssl::x509::X509PurposeId;
use openssl::x509::{X509StoreContext, X509};

use crate::crypto::chain::der_chain_from_pem;
use crate::domain::error::{EngineError, EngineResult};
use crate::domain::types::{ServerTrust, TrustAnchors, TrustEvaluation};

/// Server trust over a DER chain, validated with OpenSSL's X509 store.
///
/// System anchors are OpenSSL's default verify paths unless explicit roots
/// are configured with [`OpenSslServerTrust::with_system_roots`].
#[derive(Debug, Clone)]
pub struct OpenSslServerTrust {
  chain: Vec<Vec<u8>>,
  system_roots: Option<Vec<Vec<u8>>>,
}

impl OpenSslServerTrust {
  /// `chain` is DER, leaf first, as presented by the server.
  pub fn new(chain: Vec<Vec<u8>>) -> Self {
    Self { chain, system_roots: None }
  }

  /// Best-effort: PEM blocks that do not parse are dropped.
  pub fn from_pem(pem: &[u8]) -> Self {
    Self::new(der_chain_from_pem(pem))
  }

  /// Chain of a completed client handshake.
  pub fn from_ssl(ssl: &SslRef) -> Self {
    let mut chain: Vec<Vec<u8>> = ssl
      .peer_cert_chain()
      .map(|stack| stack.iter().filter_map(|cert| cert.to_der().ok()).collect())
      .unwrap_or_default();
    if chain.is_empty() {
      if let Some(leaf) = ssl.peer_certificate().and_then(|c| c.to_der().ok()) {
        chain.push(leaf);
      }
    }
    Self::new(chain)
  }

  /// Use `roots` (DER) instead of the default verify paths as system anchors.
  pub fn with_system_roots(mut self, roots: Vec<Vec<u8>>) -> Self {
    self.system_roots = Some(roots);
    self
  }

  fn build_store(&self, pinned: Option<&BTreeSet<Vec<u8>>>) -> EngineResult<X509Store> {
    let mut builder = X509StoreBuilder::new()?;
    match &self.system_roots {
      Some(roots) => add_anchors(&mut builder, roots.iter(), "system root"),
      None => builder.set_default_paths()?,
    }

    let mut param = X509VerifyParam::new()?;
    if let Some(pinned) = pinned {
      add_anchors(&mut builder, pinned.iter(), "pinned certificate");
      // any pinned certificate may terminate the chain, not only self-signed roots
      param.set_flags(X509VerifyFlags::PARTIAL_CHAIN)?;
    }
    builder.set_param(&param)?;
    // leaf must be usable for TLS server authentication
    builder.set_purpose(X509PurposeId::SSL_SERVER)?;
    Ok(builder.build())
  }

  fn leaf_and_intermediates(&self) -> EngineResult<(X509, Stack<X509>)> {
    let (leaf, rest) = self
      .chain
      .split_first()
      .ok_or_else(|| EngineError::Certificate("server presented no certificates".into()))?;
    let leaf = X509::from_der(leaf)?;
    let mut intermediates = Stack::new()?;
    for der in rest {
      match X509::from_der(der) {
        Ok(cert) => intermediates.push(cert)?,
        Err(e) => tracing::debug!(error = %e, "skipping malformed intermediate"),
      }
    }
    Ok((leaf, intermediates))
  }
}

fn add_anchors<'a>(
  builder: &mut X509StoreBuilder,
  anchors: impl Iterator<Item = &'a Vec<u8>>,
  kind: &'static str,
) {
  for der in anchors {
    let cert = match X509::from_der(der) {
      Ok(cert) => cert,
      Err(e) => {
        tracing::debug!(kind, error = %e, "skipping malformed anchor");
        continue;
      }
    };
    // duplicates are rejected by older OpenSSL releases; the anchor is present either way
    if let Err(e) = builder.add_cert(cert) {
      tracing::debug!(kind, error = %e, "anchor not added to store");
    }
  }
}

enum DomainIdentity<'a> {
  Host(&'a str),
  Ip(IpAddr),
}

impl<'a> DomainIdentity<'a> {
  /// `None` for domains that name nothing: empty after dropping brackets or
  /// trailing dots, or carrying a NUL byte.
  fn parse(domain: &'a str) -> Option<Self> {
    if domain.contains('\0') {
      return None;
    }
    let bare = domain.strip_prefix('[').and_then(|d| d.strip_suffix(']')).unwrap_or(domain);
    if let Ok(ip) = bare.parse::<IpAddr>() {
      return Some(Self::Ip(ip));
    }
    let host = domain.trim_end_matches('.');
    if host.is_empty() || host.starts_with('[') {
      return None;
    }
    Some(Self::Host(host))
  }
}

impl ServerTrust for OpenSslServerTrust {
  fn presented_chain(&self) -> Vec<Vec<u8>> {
    self.chain.clone()
  }

  fn evaluate(&self, anchors: TrustAnchors<'_>) -> EngineResult<TrustEvaluation> {
    let pinned = match anchors {
      TrustAnchors::System => None,
      TrustAnchors::SystemAndPinned(pinned) => Some(pinned),
    };
    let store = self.build_store(pinned)?;
    let (leaf, intermediates) = self.leaf_and_intermediates()?;

    let mut ctx = X509StoreContext::new()?;
    let evaluation = ctx.init(&store, &leaf, &intermediates, |c| {
      if !c.verify_cert()? {
        tracing::debug!(error = %c.error(), depth = c.error_depth(), "chain verification failed");
        return Ok(TrustEvaluation::invalid());
      }
      let chain = c
        .chain()
        .map(|chain| chain.iter().filter_map(|cert| cert.to_der().ok()).collect());
      Ok(TrustEvaluation { valid: true, chain })
    })?;
    Ok(evaluation)
  }

  /// Host (or IP literal) check of the leaf, delegated to OpenSSL.
  ///
  /// The leaf is verified on its own as a partial-chain anchor with time
  /// checks off, so a failed verification can only come from the identity
  /// check.
  fn matches_domain(&self, domain: &str) -> EngineResult<bool> {
    let leaf = self
      .chain
      .first()
      .ok_or_else(|| EngineError::Certificate("server presented no certificates".into()))?;
    let leaf = X509::from_der(leaf)?;

    // an empty host would clear OpenSSL's host list and skip the identity check
    let Some(identity) = DomainIdentity::parse(domain) else {
      tracing::debug!(domain, "domain is not a usable host name");
      return Ok(false);
    };
    let mut param = X509VerifyParam::new()?;
    param.set_flags(X509VerifyFlags::PARTIAL_CHAIN | X509VerifyFlags::NO_CHECK_TIME)?;
    match identity {
      DomainIdentity::Ip(ip) => param.set_ip(ip)?,
      DomainIdentity::Host(host) => param.set_host(host)?,
    }

    let mut builder = X509StoreBuilder::new()?;
    builder.add_cert(leaf.clone())?;
    builder.set_param(&param)?;
    let store = builder.build();

    let empty: Stack<X509> = Stack::new()?;
    let mut ctx = X509StoreContext::new()?;
    let matched = ctx.init(&store, &leaf, &empty, |c| {
      let ok = c.verify_cert()?;
      if !ok {
        tracing::debug!(domain, error = %c.error(), "leaf does not match domain");
      }
      Ok(ok)
    })?;
    Ok(matched)
  }
}
