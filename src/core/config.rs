/*!
Configuration for the envelope layer.

This module provides the supported key sizes as typed values and a
configuration struct collecting the defaults used when generating keys,
encrypting asymmetrically and driving streams.
*/

use std::time::Duration;

use crate::core::constants::{MAX_CHUNK_SIZE, PROGRESS_INTERVAL};
use crate::core::error::{invalid_arg, Result};
use crate::core::streaming::StreamOptions;

/// Supported symmetric key sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymmetricKeySize {
    /// AES-128 with a 128-bit HMAC key
    Aes128,
    /// AES-192 with a 192-bit HMAC key
    Aes192,
    /// AES-256 with a 256-bit HMAC key
    Aes256,
}

impl Default for SymmetricKeySize {
    fn default() -> Self {
        SymmetricKeySize::Aes256
    }
}

impl SymmetricKeySize {
    /// Look up a key size by its bit length
    pub fn from_bits(bits: usize) -> Result<Self> {
        match bits {
            128 => Ok(SymmetricKeySize::Aes128),
            192 => Ok(SymmetricKeySize::Aes192),
            256 => Ok(SymmetricKeySize::Aes256),
            other => invalid_arg(format!("unsupported symmetric key size: {} bits", other)),
        }
    }

    /// Look up a key size from the length of one key half
    pub fn from_half_len(len: usize) -> Result<Self> {
        Self::from_bits(len * 8)
    }

    /// Key size in bits
    pub fn bits(&self) -> usize {
        match self {
            SymmetricKeySize::Aes128 => 128,
            SymmetricKeySize::Aes192 => 192,
            SymmetricKeySize::Aes256 => 256,
        }
    }

    /// Length of each key half (authentication or encryption) in bytes
    pub fn half_len(&self) -> usize {
        self.bits() / 8
    }

    /// Length of the exported key material in bytes
    pub fn material_len(&self) -> usize {
        self.bits() / 4
    }
}

/// Supported RSA modulus sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AsymmetricKeySize {
    Rsa1024,
    Rsa2048,
    Rsa4096,
}

impl Default for AsymmetricKeySize {
    fn default() -> Self {
        AsymmetricKeySize::Rsa4096
    }
}

impl AsymmetricKeySize {
    /// Look up a key size by its modulus bit length
    pub fn from_bits(bits: usize) -> Result<Self> {
        match bits {
            1024 => Ok(AsymmetricKeySize::Rsa1024),
            2048 => Ok(AsymmetricKeySize::Rsa2048),
            4096 => Ok(AsymmetricKeySize::Rsa4096),
            other => invalid_arg(format!("unsupported RSA key size: {} bits", other)),
        }
    }

    /// Modulus size in bits
    pub fn bits(&self) -> usize {
        match self {
            AsymmetricKeySize::Rsa1024 => 1024,
            AsymmetricKeySize::Rsa2048 => 2048,
            AsymmetricKeySize::Rsa4096 => 4096,
        }
    }

    /// Modulus size in bytes
    pub fn bytes(&self) -> usize {
        self.bits() / 8
    }
}

/// Defaults for key generation, asymmetric encryption and streaming
#[derive(Debug, Clone)]
pub struct EnvelopeConfig {
    /// Size used when generating symmetric keys
    pub symmetric_key_size: SymmetricKeySize,
    /// Size used when generating RSA keys
    pub asymmetric_key_size: AsymmetricKeySize,
    /// Whether asymmetric encryption prefixes a CRC-32
    pub use_crc: bool,
    /// Minimum interval between throttled progress notifications
    pub progress_interval: Duration,
    /// Read size used by the I/O adapters
    pub chunk_size: usize,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            symmetric_key_size: SymmetricKeySize::default(),
            asymmetric_key_size: AsymmetricKeySize::default(),
            use_crc: true,
            progress_interval: PROGRESS_INTERVAL,
            chunk_size: MAX_CHUNK_SIZE,
        }
    }
}

impl EnvelopeConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a configuration with specific key sizes
    pub fn with_key_sizes(symmetric: SymmetricKeySize, asymmetric: AsymmetricKeySize) -> Self {
        Self {
            symmetric_key_size: symmetric,
            asymmetric_key_size: asymmetric,
            ..Self::default()
        }
    }

    /// Smallest supported keys, for constrained environments and fast tests
    pub fn compact() -> Self {
        Self::with_key_sizes(SymmetricKeySize::Aes128, AsymmetricKeySize::Rsa1024)
    }

    /// Largest supported keys
    pub fn high_security() -> Self {
        Self::with_key_sizes(SymmetricKeySize::Aes256, AsymmetricKeySize::Rsa4096)
    }

    /// Override the chunk size used by the I/O adapters
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    /// Override the progress throttle interval
    pub fn progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Stream options carrying this configuration's progress interval
    pub fn stream_options(&self) -> StreamOptions {
        StreamOptions::new().progress_interval(self.progress_interval)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return invalid_arg("chunk size must be greater than zero");
        }
        if self.progress_interval.is_zero() {
            return invalid_arg("progress interval must be greater than zero");
        }
        Ok(())
    }
}
