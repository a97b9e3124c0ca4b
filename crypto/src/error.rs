use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// The address is not base58, has the wrong length, or is not a point
    /// on the curve.
    #[error("invalid wallet address: {0}")]
    InvalidAddress(String),
}
