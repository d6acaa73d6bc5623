/*!
Lookahead buffer for the decrypt stream.

The trailing HMAC is only recognizable once the input ends, so the last
[`HMAC_SIZE`] bytes seen so far are always held back. Everything before them
(after the IV) is safe to hand to the decryptor.
*/

use bytes::{Bytes, BytesMut};

use crate::core::constants::sizes::{HMAC_SIZE, IV_SIZE};
use crate::core::error::{invalid_stream, Result};

/// Bytes released by one [`Lookahead::feed`] call
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Released {
    /// The IV, released exactly once
    pub iv: Option<Bytes>,
    /// Ciphertext that can no longer be part of the trailer
    pub ciphertext: Bytes,
}

#[derive(Debug, Default)]
pub struct Lookahead {
    buffer: BytesMut,
    iv_taken: bool,
}

impl Lookahead {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer `chunk` and release whatever is no longer ambiguous
    pub fn feed(&mut self, chunk: &[u8]) -> Released {
        self.buffer.extend_from_slice(chunk);

        let iv = if !self.iv_taken && self.buffer.len() >= IV_SIZE {
            self.iv_taken = true;
            Some(self.buffer.split_to(IV_SIZE).freeze())
        } else {
            None
        };

        let ciphertext = if self.iv_taken && self.buffer.len() > HMAC_SIZE {
            let releasable = self.buffer.len() - HMAC_SIZE;
            self.buffer.split_to(releasable).freeze()
        } else {
            Bytes::new()
        };

        Released { iv, ciphertext }
    }

    /// Whether the IV has been released
    pub fn has_iv(&self) -> bool {
        self.iv_taken
    }

    /// Bytes currently held back
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// End of input: the held-back bytes must be exactly one HMAC
    pub fn finish(&mut self) -> Result<Bytes> {
        if !self.iv_taken {
            return invalid_stream(format!(
                "stream ended after {} bytes, before the IV was complete",
                self.buffer.len()
            ));
        }
        if self.buffer.len() != HMAC_SIZE {
            return invalid_stream(format!(
                "stream ended with {} trailing bytes, expected a {}-byte HMAC",
                self.buffer.len(),
                HMAC_SIZE
            ));
        }
        Ok(self.buffer.split().freeze())
    }
}
