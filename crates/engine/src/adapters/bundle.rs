// adapters/bundle.rs

//! Pinned certificate loading from a directory of certificate files.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;

use crate::domain::error::{EngineError, EngineResult};
use crate::domain::types::EngineDefaults;

/// Supplier of raw certificate bytes for a pinned set.
pub trait CertificateSource {
  fn certificates(&self) -> EngineResult<BTreeSet<Vec<u8>>>;
}

impl<F> CertificateSource for F
where
  F: Fn() -> EngineResult<BTreeSet<Vec<u8>>>,
{
  fn certificates(&self) -> EngineResult<BTreeSet<Vec<u8>>> {
    self()
  }
}

/// Certificate files directly inside `root` with a given extension.
/// File contents are returned unmodified.
#[derive(Debug, Clone)]
pub struct BundleDirectory {
  root: PathBuf,
  extension: String,
}

impl BundleDirectory {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self {
      root: root.into(),
      extension: EngineDefaults::CERTIFICATE_EXTENSION.to_string(),
    }
  }

  pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
    self.extension = extension.into().trim_start_matches('.').to_string();
    self
  }

  pub fn root(&self) -> &Path {
    &self.root
  }
}

impl CertificateSource for BundleDirectory {
  fn certificates(&self) -> EngineResult<BTreeSet<Vec<u8>>> {
    if !self.root.is_dir() {
      return Err(EngineError::Config(format!(
        "certificate directory not found: {}",
        self.root.display()
      )));
    }
    let root = self
      .root
      .to_str()
      .ok_or_else(|| EngineError::Config("certificate directory is not valid UTF-8".into()))?;
    let pattern = format!("{}/*.{}", glob::Pattern::escape(root), self.extension);

    let mut certificates = BTreeSet::new();
    for entry in glob::glob(&pattern)? {
      let path = entry.map_err(|e| EngineError::Io(e.into()))?;
      if !path.is_file() {
        continue;
      }
      let bytes = std::fs::read(&path)?;
      tracing::debug!(path = %path.display(), len = bytes.len(), "loaded certificate");
      certificates.insert(bytes);
    }
    Ok(certificates)
  }
}

/// Raw bytes of every `.cer` file directly inside `dir`.
pub fn certificates_in_dir(dir: impl AsRef<Path>) -> EngineResult<BTreeSet<Vec<u8>>> {
  BundleDirectory::new(dir.as_ref()).certificates()
}

/// Directory searched by [`default_pinned_certificates`]: `TRUSTPIN_CERT_DIR`
/// when set, otherwise the directory holding the running executable.
pub fn default_certificate_dir() -> EngineResult<PathBuf> {
  if let Some(dir) = std::env::var_os(EngineDefaults::CERT_DIR_ENV) {
    return Ok(PathBuf::from(dir));
  }
  let exe = std::env::current_exe()?;
  exe
    .parent()
    .map(Path::to_path_buf)
    .ok_or_else(|| EngineError::Config("executable has no parent directory".into()))
}

static DEFAULT_PINNED: OnceCell<BTreeSet<Vec<u8>>> = OnceCell::new();

/// Certificates from [`default_certificate_dir`], loaded once per process.
/// A failed load yields an empty set, which makes any pinning policy built
/// from it reject every server.
pub fn default_pinned_certificates() -> &'static BTreeSet<Vec<u8>> {
  DEFAULT_PINNED.get_or_init(|| {
    match default_certificate_dir().and_then(|dir| BundleDirectory::new(dir).certificates()) {
      Ok(certificates) => certificates,
      Err(e) => {
        tracing::warn!(error = %e, "no default pinned certificates loaded");
        BTreeSet::new()
      }
    }
  })
}
