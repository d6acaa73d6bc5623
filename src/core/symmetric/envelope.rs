/*!
Symmetric envelope layout.

```text
IV (16 bytes) || AES-CBC ciphertext (PKCS#7 padded) || HMAC-SHA256(IV || ciphertext) (32 bytes)
```

These helpers only slice and compare; the primitive calls live with the key
types so they can be issued either inline or awaited.
*/

use subtle::ConstantTimeEq;

use crate::core::constants::sizes::{HMAC_SIZE, IV_SIZE, MIN_ENVELOPE_SIZE};
use crate::core::error::{invalid_stream, Result};

/// Borrowed view of the three envelope regions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopeParts<'a> {
    pub iv: &'a [u8],
    pub ciphertext: &'a [u8],
    pub hmac: &'a [u8],
    /// `IV || ciphertext`, the authenticated region
    pub authenticated: &'a [u8],
}

/// Split an envelope into its regions
pub fn split(envelope: &[u8]) -> Result<EnvelopeParts<'_>> {
    if envelope.len() < MIN_ENVELOPE_SIZE {
        return invalid_stream(format!(
            "envelope is {} bytes, expected at least {}",
            envelope.len(),
            MIN_ENVELOPE_SIZE
        ));
    }
    let (authenticated, hmac) = envelope.split_at(envelope.len() - HMAC_SIZE);
    let (iv, ciphertext) = authenticated.split_at(IV_SIZE);
    Ok(EnvelopeParts {
        iv,
        ciphertext,
        hmac,
        authenticated,
    })
}

/// Start an envelope buffer: the IV followed by the ciphertext
pub fn begin(iv: &[u8], ciphertext: &[u8]) -> Vec<u8> {
    let mut envelope = Vec::with_capacity(iv.len() + ciphertext.len() + HMAC_SIZE);
    envelope.extend_from_slice(iv);
    envelope.extend_from_slice(ciphertext);
    envelope
}

/// Constant-time tag comparison
pub fn tags_match(expected: &[u8], computed: &[u8]) -> bool {
    expected.len() == computed.len() && bool::from(expected.ct_eq(computed))
}
