/// Cryptographic and low-level encoding errors.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    // General errors
    #[error("null or empty input")]
    NullInput,
    #[error("invalid key")]
    InvalidKey,

    // Randomness errors
    #[error("randomness source failed")]
    RngFailure,

    // Symmetric cipher errors
    #[error("invalid key length: {got}")]
    InvalidKeyLength { got: usize },
    #[error("invalid iv length")]
    InvalidIvLength,
    #[error("content encryption failed")]
    EncryptionFailure,
    #[error("invalid padding")]
    InvalidPadding,

    // Key transport errors
    #[error("recipient key too small: modulus holds {modulus} bytes, need {need}")]
    KeyTooSmall { modulus: usize, need: usize },
    #[error("key wrap operation failed")]
    WrapFailure,

    // Buffer errors
    #[error("buffer length not enough: need {need}, got {got}")]
    BufferTooSmall { need: usize, got: usize },

    // Encoding/Decoding errors
    #[error("decode: asn1 buffer failed")]
    DecodeAsn1Fail,
}

/// PKI certificate and CMS message errors.
#[derive(Debug, thiserror::Error)]
pub enum PkiError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("certificate parse error: {0}")]
    CertificateParse(String),
    #[error("unsupported key type: {0}")]
    UnsupportedKeyType(String),
    #[error("cms error: {0}")]
    CmsError(String),
    #[error("crypto error: {0}")]
    CryptoError(#[from] CryptoError),
}
