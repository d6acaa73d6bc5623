/*!
Error handling for the envelope layer.

Every failure surfaces as a typed [`Error`]. Cryptographic failures carry as
little detail as possible; [`Error::kind`] maps each variant onto the stable
error codes callers match on across providers.
*/

use std::io;
use thiserror::Error;

/// Result type for envelope operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for envelope operations
#[derive(Error, Debug)]
pub enum Error {
    /// Key material of the wrong size or type, or an unsupported key size
    #[error("Invalid argument: {0}")]
    InvalidArg(String),

    /// Malformed DER or key envelope on import
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Symmetric authentication check failed
    #[error("HMAC verification failed")]
    InvalidHmac,

    /// Truncated or malformed envelope or stream
    #[error("Invalid stream: {0}")]
    InvalidStream(String),

    /// The stream was canceled
    #[error("Stream canceled")]
    StreamCanceled,

    /// The asymmetric decryption primitive rejected the ciphertext
    #[error("Invalid cipher text")]
    InvalidCipherText,

    /// The CRC-32 integrity prefix did not match the decrypted message
    #[error("CRC32 check failed")]
    InvalidCrc32,

    /// A primitive provider failed (limited details for security)
    #[error("Primitive provider failed")]
    Provider(#[source] ProviderError),

    /// IO error from a stream adapter
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Provider failures with limited details to prevent leaking information
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The random generator failed
    #[error("Random generation failed")]
    RandomFailed,

    /// AES-CBC setup, update or finalization failed
    #[error("Cipher operation failed")]
    CipherFailed,

    /// HMAC computation failed
    #[error("MAC operation failed")]
    MacFailed,

    /// An RSA primitive failed
    #[error("RSA operation failed")]
    RsaFailed,

    /// The provider does not support this key size (in bytes or bits)
    #[error("Unsupported key size: {0}")]
    UnsupportedKeySize(usize),

    /// An offloaded primitive task did not complete
    #[error("Provider task failed")]
    TaskFailed,
}

impl From<ProviderError> for Error {
    fn from(error: ProviderError) -> Self {
        Error::Provider(error)
    }
}

/// Stable error codes shared by every provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArg,
    InvalidKey,
    InvalidHmac,
    InvalidStream,
    StreamCanceled,
    InvalidCipherText,
    InvalidCrc32,
    Provider,
    Io,
    Internal,
}

impl ErrorKind {
    /// The error code as a string, e.g. `"INVALID_HMAC"`
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidArg => "INVALID_ARG",
            ErrorKind::InvalidKey => "INVALID_KEY",
            ErrorKind::InvalidHmac => "INVALID_HMAC",
            ErrorKind::InvalidStream => "INVALID_STREAM",
            ErrorKind::StreamCanceled => "STREAM_CANCELED",
            ErrorKind::InvalidCipherText => "INVALID_CIPHER_TEXT",
            ErrorKind::InvalidCrc32 => "INVALID_CRC32",
            ErrorKind::Provider => "PROVIDER_ERROR",
            ErrorKind::Io => "IO_ERROR",
            ErrorKind::Internal => "INTERNAL_ERROR",
        }
    }
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidArg(_) => ErrorKind::InvalidArg,
            Error::InvalidKey(_) => ErrorKind::InvalidKey,
            Error::InvalidHmac => ErrorKind::InvalidHmac,
            Error::InvalidStream(_) => ErrorKind::InvalidStream,
            Error::StreamCanceled => ErrorKind::StreamCanceled,
            Error::InvalidCipherText => ErrorKind::InvalidCipherText,
            Error::InvalidCrc32 => ErrorKind::InvalidCrc32,
            Error::Provider(_) => ErrorKind::Provider,
            Error::Io(_) => ErrorKind::Io,
            Error::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// Convert a string to an Error::InvalidArg
pub fn invalid_arg<T, S: Into<String>>(msg: S) -> Result<T> {
    Err(Error::InvalidArg(msg.into()))
}

/// Convert a string to an Error::InvalidKey
pub fn invalid_key<T, S: Into<String>>(msg: S) -> Result<T> {
    Err(Error::InvalidKey(msg.into()))
}

/// Convert a string to an Error::InvalidStream
pub fn invalid_stream<T, S: Into<String>>(msg: S) -> Result<T> {
    Err(Error::InvalidStream(msg.into()))
}

/// Convert from Error to io::Error (for the stream adapters)
impl From<Error> for io::Error {
    fn from(error: Error) -> Self {
        match error {
            Error::Io(io_error) => io_error,
            Error::InvalidArg(msg) => io::Error::new(io::ErrorKind::InvalidInput, msg),
            Error::InvalidKey(msg) => io::Error::new(io::ErrorKind::InvalidInput, msg),
            Error::InvalidHmac => {
                io::Error::new(io::ErrorKind::InvalidData, "HMAC verification failed")
            }
            Error::InvalidStream(msg) => io::Error::new(io::ErrorKind::UnexpectedEof, msg),
            Error::StreamCanceled => io::Error::new(io::ErrorKind::Other, "Stream canceled"),
            Error::InvalidCipherText => {
                io::Error::new(io::ErrorKind::InvalidData, "Invalid cipher text")
            }
            Error::InvalidCrc32 => io::Error::new(io::ErrorKind::InvalidData, "CRC32 check failed"),
            Error::Provider(_) => io::Error::new(io::ErrorKind::Other, "Primitive provider failed"),
            Error::Internal(msg) => io::Error::new(io::ErrorKind::Other, msg),
        }
    }
}
