use thiserror::Error;

use crate::config::ConfigError;
use crate::crypto::aead::AeadError;
use crate::crypto::kem::KemError;
use crate::protocol::wire::FramingError;

/// Fatal engine errors.
///
/// Authentication and unwrap failures are not errors; they are reported as a
/// [`SoftFailure`](crate::suite::SoftFailure) inside the operation result.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("invalid algorithm: {0}")]
    InvalidAlgorithm(String),

    #[error("key material does not belong to this suite")]
    KeyMismatch,

    #[error(transparent)]
    Framing(#[from] FramingError),

    #[error(transparent)]
    Aead(#[from] AeadError),

    #[error(transparent)]
    Kem(#[from] KemError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
