/*!
Constants for the envelope formats.

This module contains the wire-level sizes shared by the symmetric and
asymmetric envelopes, plus the streaming defaults.
*/

use std::time::Duration;

/// Default chunk size for the streaming I/O adapters (16KB)
pub const MAX_CHUNK_SIZE: usize = 16384;

/// Minimum time between two throttled progress notifications
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(30);

/// Size constants for the envelopes
pub mod sizes {
    /// AES block size in bytes
    pub const BLOCK_SIZE: usize = 16;

    /// Size of the CBC initialization vector in bytes
    pub const IV_SIZE: usize = 16;

    /// Size of the HMAC-SHA256 trailer in bytes
    pub const HMAC_SIZE: usize = 32;

    /// Smallest well-formed symmetric envelope (IV and HMAC, no ciphertext)
    pub const MIN_ENVELOPE_SIZE: usize = IV_SIZE + HMAC_SIZE;

    /// Size of the CRC-32 integrity prefix in bytes
    pub const CRC_SIZE: usize = 4;

    /// SHA-256 constants
    pub mod sha256 {
        /// Size of a SHA-256 digest in bytes
        pub const DIGEST_SIZE: usize = 32;
    }

    /// SHA-1 constants (OAEP hash and MGF1)
    pub mod sha1 {
        /// Size of a SHA-1 digest in bytes
        pub const DIGEST_SIZE: usize = 20;
    }

    /// Symmetric key constants
    pub mod symmetric {
        /// Supported AES key sizes in bits
        pub const SUPPORTED_KEY_BITS: [usize; 3] = [128, 192, 256];
    }

    /// RSA key constants
    pub mod asymmetric {
        /// Supported modulus sizes in bits
        pub const SUPPORTED_KEY_BITS: [usize; 3] = [1024, 2048, 4096];

        /// OAEP overhead with SHA-1: two digests plus two framing bytes
        pub const OAEP_OVERHEAD: usize = 2 * super::sha1::DIGEST_SIZE + 2;
    }
}
