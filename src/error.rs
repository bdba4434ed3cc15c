use thiserror::Error;

/// Stable error taxonomy for the decoding layer.
///
/// Never logged internally; callers decide whether and how to surface a
/// failure. `IntegrityFailure` carries the 0-based page index so a caller
/// doing a best-effort pass can report which page to re-check.
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("invalid master key")]
    InvalidKey,

    #[error("invalid or truncated input")]
    InvalidInput,

    #[error("integrity check failed on page {page_index}")]
    IntegrityFailure { page_index: u32 },

    #[error("malformed media container")]
    InvalidContainer,

    #[error("invalid PKCS#7 padding")]
    InvalidPadding,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid hex: {0}")]
    HexDecode(#[from] hex::FromHexError),
}

pub type Result<T> = std::result::Result<T, CryptoError>;
