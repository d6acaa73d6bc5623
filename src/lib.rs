/*!
# Envelope Crypto

Portable authenticated-encryption envelopes whose wire format does not depend
on which primitive provider performs the arithmetic.

## Overview

- Symmetric envelopes: `IV || AES-CBC ciphertext || HMAC-SHA256`, as one-shot
  operations or as push/finish streams with cancellation and progress
- Asymmetric envelopes: RSA-OAEP (SHA-1) over a CRC-32 guarded payload and
  RSA-PSS (SHA-256) signatures with a modulus-derived salt length
- DER key codec accepting bare PKCS#1 or wrapped SPKI/PKCS#8 keys
- Swappable providers behind [`PrimitiveProvider`] (inline) and, with the
  `async` feature, `AsyncPrimitiveProvider` (awaited)

Envelopes produced through one provider open through any other.

```no_run
use std::sync::Arc;
use envelope_crypto::{SoftwareProvider, SymmetricKey, SymmetricKeySize};

# fn main() -> envelope_crypto::Result<()> {
let key = SymmetricKey::generate(SymmetricKeySize::Aes256, Arc::new(SoftwareProvider::new()))?;
let sealed = key.encrypt(b"hello")?;
assert_eq!(key.decrypt(&sealed)?, b"hello");
# Ok(())
# }
```
*/

// Core envelope components
pub mod core;

// Reader/writer adapters
pub mod io;

// Serialization support (optional)
#[cfg(feature = "serde-support")]
pub mod serde;

// Re-export commonly used types for convenience
pub use crate::core::asymmetric::{PrivateKey, PublicKey};
pub use crate::core::config::{AsymmetricKeySize, EnvelopeConfig, SymmetricKeySize};
pub use crate::core::constants::{sizes, MAX_CHUNK_SIZE, PROGRESS_INTERVAL};
pub use crate::core::error::{Error, ErrorKind, ProviderError, Result};
pub use crate::core::provider::{CipherContext, MacContext, PrimitiveProvider, SoftwareProvider};
pub use crate::core::streaming::{
    CancelHandle, DecryptState, DecryptStream, EncryptState, EncryptStream, StreamOptions,
};
pub use crate::core::symmetric::SymmetricKey;

// Asynchronous providers and streams (enabled with the "async" feature)
#[cfg(feature = "async")]
pub use crate::core::provider::{
    AsyncCipherContext, AsyncMacContext, AsyncPrimitiveProvider, OffloadedProvider,
};
#[cfg(feature = "async")]
pub use crate::core::streaming::{AsyncDecryptStream, AsyncEncryptStream};
