/*!
Incremental symmetric decryption.
*/

use std::sync::Arc;

use bytes::Bytes;

use crate::core::{
    error::{Error, Result},
    provider::{CipherContext, MacContext, PrimitiveProvider},
    streaming::{
        lookahead::{Lookahead, Released},
        progress::{StreamControl, StreamOptions, Terminal},
    },
    symmetric::{envelope, SymmetricKeyMaterial},
};

#[cfg(feature = "async")]
use crate::core::provider::{AsyncCipherContext, AsyncMacContext, AsyncPrimitiveProvider};

/// Observable state of a decrypt stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecryptState {
    /// Fewer than 16 bytes received
    AwaitingIv,
    /// IV consumed, holding back bytes that may belong to the HMAC
    Buffering,
    /// Ciphertext has been released to the decryptor
    Decrypting,
    /// End of input reached, HMAC check and final block pending
    Finalizing,
    /// HMAC verified, final block emitted
    Done,
    Failed,
    Canceled,
}

/// Provider-independent part of a decrypt stream
struct Core {
    control: StreamControl,
    lookahead: Lookahead,
    phase: DecryptState,
}

impl Core {
    fn new(options: StreamOptions) -> Self {
        Self {
            control: StreamControl::new(options),
            lookahead: Lookahead::new(),
            phase: DecryptState::AwaitingIv,
        }
    }

    fn state(&self) -> DecryptState {
        match self.control.terminal() {
            Some(Terminal::Finished) => DecryptState::Done,
            Some(Terminal::Failed) => DecryptState::Failed,
            Some(Terminal::Canceled) => DecryptState::Canceled,
            None => self.phase,
        }
    }

    fn feed(&mut self, chunk: &[u8]) -> Released {
        let released = self.lookahead.feed(chunk);
        if !released.ciphertext.is_empty() {
            self.phase = DecryptState::Decrypting;
        } else if self.phase == DecryptState::AwaitingIv && self.lookahead.has_iv() {
            self.phase = DecryptState::Buffering;
        }
        released
    }

    fn trailer(&mut self) -> Result<Bytes> {
        self.phase = DecryptState::Finalizing;
        self.lookahead.finish()
    }

    fn complete(&mut self) {
        self.control.complete();
        log::debug!("decrypt stream finished after {} bytes", self.control.processed());
    }
}

fn verify_trailer(expected: &[u8], computed: &[u8]) -> Result<()> {
    if envelope::tags_match(expected, computed) {
        Ok(())
    } else {
        log::warn!("decrypt stream failed HMAC verification");
        Err(Error::InvalidHmac)
    }
}

fn missing_engine() -> Error {
    Error::Internal("decryptor used before the IV was received".into())
}

struct Engine {
    cipher: Box<dyn CipherContext>,
    mac: Box<dyn MacContext>,
}

/// Push-based decryptor driven inline by a [`PrimitiveProvider`].
///
/// # Authentication
///
/// Plaintext is returned from [`push`](Self::push) *before* the HMAC trailer
/// has been checked; only [`finish`](Self::finish) verifies it. A stream whose
/// `finish` fails (with `INVALID_HMAC`, `INVALID_STREAM` or a cipher error)
/// has produced unauthenticated output that must be discarded. Callers that
/// need authenticate-before-use semantics must buffer everything until
/// `finish` returns `Ok`, or use [`SymmetricKey::decrypt`].
///
/// [`SymmetricKey::decrypt`]: crate::core::symmetric::SymmetricKey::decrypt
pub struct DecryptStream<P> {
    material: SymmetricKeyMaterial,
    provider: Arc<P>,
    core: Core,
    engine: Option<Engine>,
}

impl<P: PrimitiveProvider> DecryptStream<P> {
    pub fn new(material: SymmetricKeyMaterial, provider: Arc<P>, options: StreamOptions) -> Self {
        Self {
            material,
            provider,
            core: Core::new(options),
            engine: None,
        }
    }

    /// Feed envelope bytes, returning any plaintext that became available
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<u8>> {
        self.core.control.begin()?;
        let result = self.decrypt_chunk(chunk);
        self.core.control.settle(result, chunk.len())
    }

    /// Verify the HMAC trailer and flush the final block
    pub fn finish(&mut self) -> Result<Vec<u8>> {
        self.core.control.begin()?;
        let result = self.verify_and_flush();
        let tail = self.core.control.settle(result, 0)?;
        self.core.complete();
        Ok(tail)
    }

    pub fn state(&self) -> DecryptState {
        self.core.state()
    }

    /// Input bytes consumed so far
    pub fn processed(&self) -> u64 {
        self.core.control.processed()
    }

    fn decrypt_chunk(&mut self, chunk: &[u8]) -> Result<Vec<u8>> {
        let released = self.core.feed(chunk);
        if let Some(iv) = released.iv {
            let cipher = self
                .provider
                .aes_cbc_decryptor(self.material.encryption_key(), &iv)?;
            let mut mac = self
                .provider
                .hmac_sha256_context(self.material.authentication_key())?;
            mac.update(&iv);
            self.engine = Some(Engine { cipher, mac });
            log::debug!("decrypt stream started ({})", self.provider.name());
        }
        if released.ciphertext.is_empty() {
            return Ok(Vec::new());
        }
        let engine = self.engine.as_mut().ok_or_else(missing_engine)?;
        engine.mac.update(&released.ciphertext);
        engine.cipher.update(&released.ciphertext)
    }

    fn verify_and_flush(&mut self) -> Result<Vec<u8>> {
        let trailer = self.core.trailer()?;
        let Engine { cipher, mac } = self.engine.take().ok_or_else(missing_engine)?;
        verify_trailer(&trailer, &mac.finalize())?;
        cipher.finalize()
    }
}

#[cfg(feature = "async")]
struct AsyncEngine<P: AsyncPrimitiveProvider> {
    cipher: P::Cipher,
    mac: P::Mac,
}

/// Push-based decryptor awaiting an [`AsyncPrimitiveProvider`].
///
/// Same authentication caveat as [`DecryptStream`]: plaintext from `push` is
/// unauthenticated until `finish` succeeds.
#[cfg(feature = "async")]
pub struct AsyncDecryptStream<P: AsyncPrimitiveProvider> {
    material: SymmetricKeyMaterial,
    provider: Arc<P>,
    core: Core,
    engine: Option<AsyncEngine<P>>,
}

#[cfg(feature = "async")]
impl<P: AsyncPrimitiveProvider> AsyncDecryptStream<P> {
    pub fn new(material: SymmetricKeyMaterial, provider: Arc<P>, options: StreamOptions) -> Self {
        Self {
            material,
            provider,
            core: Core::new(options),
            engine: None,
        }
    }

    pub async fn push(&mut self, chunk: &[u8]) -> Result<Vec<u8>> {
        self.core.control.begin()?;
        let result = self.decrypt_chunk(chunk).await;
        self.core.control.settle(result, chunk.len())
    }

    pub async fn finish(&mut self) -> Result<Vec<u8>> {
        self.core.control.begin()?;
        let result = self.verify_and_flush().await;
        let tail = self.core.control.settle(result, 0)?;
        self.core.complete();
        Ok(tail)
    }

    pub fn state(&self) -> DecryptState {
        self.core.state()
    }

    pub fn processed(&self) -> u64 {
        self.core.control.processed()
    }

    async fn decrypt_chunk(&mut self, chunk: &[u8]) -> Result<Vec<u8>> {
        let released = self.core.feed(chunk);
        if let Some(iv) = released.iv {
            let cipher = self
                .provider
                .aes_cbc_decryptor(self.material.encryption_key(), &iv)
                .await?;
            let mut mac = self
                .provider
                .hmac_sha256_context(self.material.authentication_key())
                .await?;
            mac.update(iv.to_vec()).await?;
            self.engine = Some(AsyncEngine { cipher, mac });
            log::debug!("async decrypt stream started ({})", self.provider.name());
        }
        if released.ciphertext.is_empty() {
            return Ok(Vec::new());
        }
        let engine = self.engine.as_mut().ok_or_else(missing_engine)?;
        engine.mac.update(released.ciphertext.to_vec()).await?;
        engine.cipher.update(released.ciphertext.to_vec()).await
    }

    async fn verify_and_flush(&mut self) -> Result<Vec<u8>> {
        let trailer = self.core.trailer()?;
        let AsyncEngine { cipher, mac } = self.engine.take().ok_or_else(missing_engine)?;
        verify_trailer(&trailer, &mac.finalize().await?)?;
        cipher.finalize().await
    }
}
