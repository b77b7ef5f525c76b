#![allow(dead_code)]

use std::cell::RefCell;
use std::net::IpAddr;

use rcgen::{
    BasicConstraints, Certificate, CertificateParams, DistinguishedName, DnType, IsCa, KeyPair,
    SanType,
};
use trustpin_engine as tp;

/// A generated certificate and the exact DER bytes handed to the engine.
///
/// ECDSA signatures are randomized, so the DER is captured once and reused.
pub struct Issued {
    pub cert: Certificate,
    pub der: Vec<u8>,
}

fn named_params(common_name: &str) -> CertificateParams {
    let mut params = CertificateParams::new(Vec::<String>::new());
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, common_name);
    params.distinguished_name = dn;
    params
}

pub fn ca_params(common_name: &str) -> CertificateParams {
    let mut params = named_params(common_name);
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params
}

pub fn leaf_params(common_name: &str, dns_names: &[&str]) -> CertificateParams {
    let mut params = named_params(common_name);
    params.subject_alt_names = dns_names
        .iter()
        .map(|n| SanType::DnsName(n.to_string()))
        .collect();
    params
}

pub fn ip_leaf_params(common_name: &str, ip: IpAddr) -> CertificateParams {
    let mut params = named_params(common_name);
    params.subject_alt_names = vec![SanType::IpAddress(ip)];
    params
}

pub fn self_signed(params: CertificateParams) -> Issued {
    let cert = Certificate::from_params(params).expect("cert");
    let der = cert.serialize_der().expect("der");
    Issued { cert, der }
}

pub fn signed_by(params: CertificateParams, issuer: &Issued) -> Issued {
    let cert = Certificate::from_params(params).expect("cert");
    let der = cert.serialize_der_with_signer(&issuer.cert).expect("der");
    Issued { cert, der }
}

/// Fresh ECDSA P-256 key in PEM form, so several certificates can share it.
pub fn key_pem() -> String {
    KeyPair::generate(&rcgen::PKCS_ECDSA_P256_SHA256)
        .expect("keypair")
        .serialize_pem()
}

pub fn with_key(mut params: CertificateParams, key_pem: &str) -> CertificateParams {
    params.key_pair = Some(KeyPair::from_pem(key_pem).expect("key from pem"));
    params
}

/// Root -> intermediate -> leaf, leaf valid for `dns_names`.
pub struct TestPki {
    pub root: Issued,
    pub intermediate: Issued,
    pub leaf: Issued,
}

impl TestPki {
    pub fn new(dns_names: &[&str]) -> Self {
        Self::with_leaf(leaf_params("leaf", dns_names))
    }

    pub fn with_leaf(leaf: CertificateParams) -> Self {
        let root = self_signed(ca_params("TrustPin Test Root"));
        let intermediate = signed_by(ca_params("TrustPin Test Intermediate"), &root);
        let leaf = signed_by(leaf, &intermediate);
        Self { root, intermediate, leaf }
    }

    /// Chain as a server presents it: leaf, then intermediate.
    pub fn chain(&self) -> Vec<Vec<u8>> {
        vec![self.leaf.der.clone(), self.intermediate.der.clone()]
    }

    /// Trust whose system anchors are exactly this PKI's root.
    pub fn trust(&self) -> tp::OpenSslServerTrust {
        tp::OpenSslServerTrust::new(self.chain()).with_system_roots(vec![self.root.der.clone()])
    }

    /// Same chain, but the system anchors know nothing about this PKI.
    pub fn untrusted(&self) -> tp::OpenSslServerTrust {
        tp::OpenSslServerTrust::new(self.chain()).with_system_roots(Vec::new())
    }
}

/// Scripted `ServerTrust` that records which primitives were invoked.
#[derive(Default)]
pub struct MockTrust {
    pub chain: Vec<Vec<u8>>,
    pub domains: Vec<String>,
    pub system_valid: bool,
    pub pinned_valid: bool,
    pub validated_chain: Option<Vec<Vec<u8>>>,
    pub fail_evaluation: bool,
    pub calls: RefCell<Vec<&'static str>>,
}

impl MockTrust {
    pub fn new(chain: Vec<Vec<u8>>) -> Self {
        Self { chain, ..Default::default() }
    }

    pub fn valid_for(mut self, domain: &str) -> Self {
        self.domains.push(domain.to_string());
        self
    }

    pub fn system_valid(mut self) -> Self {
        self.system_valid = true;
        self.pinned_valid = true;
        self
    }

    pub fn pinned_valid(mut self) -> Self {
        self.pinned_valid = true;
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }
}

impl tp::ServerTrust for MockTrust {
    fn presented_chain(&self) -> Vec<Vec<u8>> {
        self.calls.borrow_mut().push("chain");
        self.chain.clone()
    }

    fn evaluate(&self, anchors: tp::TrustAnchors<'_>) -> Result<tp::TrustEvaluation, tp::EngineError> {
        let valid = match anchors {
            tp::TrustAnchors::System => {
                self.calls.borrow_mut().push("evaluate:system");
                self.system_valid
            }
            tp::TrustAnchors::SystemAndPinned(_) => {
                self.calls.borrow_mut().push("evaluate:pinned");
                self.pinned_valid
            }
        };
        if self.fail_evaluation {
            return Err(tp::EngineError::Certificate("platform unavailable".into()));
        }
        Ok(tp::TrustEvaluation {
            valid,
            chain: if valid { self.validated_chain.clone() } else { None },
        })
    }

    fn matches_domain(&self, domain: &str) -> Result<bool, tp::EngineError> {
        self.calls.borrow_mut().push("domain");
        Ok(self.domains.iter().any(|d| d == domain))
    }
}
