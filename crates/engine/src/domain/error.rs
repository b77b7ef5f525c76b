// crates/engine/src/domain/error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
  #[error("configuration: {0}")]
  Config(String),

  #[error(transparent)]
  Io(#[from] std::io::Error),

  #[error(transparent)]
  Json(#[from] serde_json::Error),

  #[cfg(feature = "bundle")]
  #[error(transparent)]
  Glob(#[from] glob::PatternError),

  #[error(transparent)]
  OpenSsl(#[from] openssl::error::ErrorStack),

  #[error("certificate: {0}")]
  Certificate(String),

  #[error("feature not enabled: {0}")]
  Feature(&'static str),
}

pub type EngineResult<T> = Result<T, EngineError>;
